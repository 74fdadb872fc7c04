//! Renamer configuration
//!
//! The configuration record is built once at startup and is read-only
//! afterwards. Discovery and file formats belong to the CLI; this module only
//! validates the final values.

use crate::error::{Error, Result};
use crate::security::SecureString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Template used when no `default` key is configured
pub const DEFAULT_TEMPLATE: &str = "%epno. %romanji_name - %english_name (%anime_type, %src) [%crc32] - %group_short_name.%file_type";

/// Key of the default template in flat configuration maps
pub const DEFAULT_TEMPLATE_KEY: &str = "default";

/// AniDB account credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Credentials {
    pub user: String,
    pub pass: SecureString,
}

impl Credentials {
    /// Create credentials, rejecting an empty user or password
    pub fn new(user: impl Into<String>, pass: impl Into<SecureString>) -> Result<Self> {
        let credentials = Self {
            user: user.into(),
            pass: pass.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() || self.pass.is_empty() {
            return Err(Error::config("No username or password in config"));
        }
        Ok(())
    }
}

/// Filename templates: one default plus optional per-category overrides
///
/// Categories are matched against the `anime_type` field of a lookup
/// (`TV`, `Movie`, `OVA`...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateSet {
    pub default: String,
    #[serde(flatten)]
    pub categories: BTreeMap<String, String>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            default: DEFAULT_TEMPLATE.to_string(),
            categories: BTreeMap::new(),
        }
    }
}

impl TemplateSet {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            categories: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>, template: impl Into<String>) -> Self {
        self.categories.insert(category.into(), template.into());
        self
    }

    /// Template for `category`, or the default one
    pub fn select(&self, category: Option<&str>) -> &str {
        category
            .and_then(|c| self.categories.get(c))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    /// Every configured template, default first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default.as_str()).chain(self.categories.values().map(String::as_str))
    }
}

/// Network and pacing parameters for the AniDB session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server `host:port`
    pub server: String,
    /// Local UDP port; AniDB expects a fixed one
    pub local_port: u16,
    pub client_name: String,
    pub client_version: String,
    /// Minimum gap between two rate-limited requests
    pub request_delay_ms: u64,
    /// Idle time after which a PING is sent
    pub keepalive_secs: u64,
    pub response_timeout_secs: u64,
    /// How long the worker waits on an empty queue per iteration
    pub poll_interval_ms: u64,
    /// Idle time before the idle indicator is shown
    pub idle_indicator_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server: format!(
                "{}:{}",
                crate::protocol::DEFAULT_SERVER,
                crate::protocol::DEFAULT_PORT
            ),
            local_port: crate::protocol::DEFAULT_LOCAL_PORT,
            client_name: "aniren".to_string(),
            client_version: "3".to_string(),
            request_delay_ms: crate::protocol::REQUEST_DELAY_SECS * 1000,
            keepalive_secs: crate::protocol::KEEPALIVE_SECS,
            response_timeout_secs: 30,
            poll_interval_ms: 100,
            idle_indicator_secs: 3,
        }
    }
}

impl NetworkConfig {
    /// Configuration for talking to a local mock server
    pub fn local(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            local_port: 0,
            request_delay_ms: 150,
            response_timeout_secs: 2,
            poll_interval_ms: 20,
            ..Self::default()
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_indicator(&self) -> Duration {
        Duration::from_secs(self.idle_indicator_secs)
    }
}

/// Complete, validated renamer configuration
#[derive(Debug, Clone)]
pub struct RenamerConfig {
    pub credentials: Credentials,
    pub templates: TemplateSet,
    pub network: NetworkConfig,
}

impl RenamerConfig {
    pub fn new(credentials: Credentials, templates: TemplateSet, network: NetworkConfig) -> Result<Self> {
        credentials.validate()?;
        Ok(Self {
            credentials,
            templates,
            network,
        })
    }

    /// Build from a flat `key=value` map
    ///
    /// `user` and `pass` are the credentials, `default` is the default
    /// template and every other key is a category template.
    pub fn from_map(map: &BTreeMap<String, String>, network: NetworkConfig) -> Result<Self> {
        let (Some(user), Some(pass)) = (map.get("user"), map.get("pass")) else {
            return Err(Error::config("No username or password in config"));
        };

        let mut templates = TemplateSet::default();
        for (key, value) in map {
            match key.as_str() {
                "user" | "pass" => {}
                DEFAULT_TEMPLATE_KEY => templates.default = value.clone(),
                category => {
                    templates
                        .categories
                        .insert(category.to_string(), value.clone());
                }
            }
        }

        Self::new(Credentials::new(user.as_str(), pass.as_str())?, templates, network)
    }
}
