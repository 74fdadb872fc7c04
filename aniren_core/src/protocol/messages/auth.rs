//! Authentication-related messages
//!
//! This module contains AUTH, LOGOUT and PING command implementations, and the
//! session key check applied to AUTH responses.

use crate::protocol::messages::{AniDBCommand, encode_value};
use crate::security::SecureString;
use regex::Regex;
use std::sync::LazyLock;

/// Shape of a session key handed out by LOGIN ACCEPTED
static SESSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{4,8}$").expect("valid session token pattern"));

/// Check whether `candidate` looks like an AniDB session key
pub fn is_session_token(candidate: &str) -> bool {
    SESSION_TOKEN.is_match(candidate)
}

/// Extract the session key from an AUTH response message
///
/// The key is the first word of the message (`"iQUO2 LOGIN ACCEPTED"`).
pub fn session_token_from(message: &str) -> Option<&str> {
    message
        .split(' ')
        .next()
        .filter(|token| is_session_token(token))
}

/// AUTH command for authenticating with the AniDB server
#[derive(Clone)]
pub struct AuthCommand {
    /// Username
    pub user: String,
    /// Password
    pub pass: SecureString,
    /// Protocol version
    pub protover: String,
    /// Client name
    pub client: String,
    /// Client version
    pub clientver: String,
    /// NAT mode (1 if behind NAT)
    pub nat: Option<u8>,
    /// Response encoding
    pub enc: Option<String>,
}

impl std::fmt::Debug for AuthCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCommand")
            .field("user", &"***")
            .field("pass", &"***") // Never log passwords
            .field("protover", &self.protover)
            .field("client", &self.client)
            .field("clientver", &self.clientver)
            .field("nat", &self.nat)
            .field("enc", &self.enc)
            .finish()
    }
}

impl AuthCommand {
    /// Create a new AUTH command with required fields
    pub fn new(
        user: impl Into<String>,
        pass: impl Into<SecureString>,
        client: impl Into<String>,
        clientver: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            protover: crate::protocol::PROTOCOL_VERSION.to_string(),
            client: client.into(),
            clientver: clientver.into(),
            nat: None,
            enc: Some("utf-8".to_string()),
        }
    }

    /// Enable NAT mode
    pub fn with_nat(mut self) -> Self {
        self.nat = Some(1);
        self
    }

    /// Encode with both credentials masked, for diagnostics
    pub fn encode_redacted(&self) -> String {
        let mut params = vec!["user=******".to_string(), "pass=******".to_string()];
        params.extend(
            self.parameters()
                .into_iter()
                .skip(2)
                .map(|(key, value)| format!("{key}={}", encode_value(&value))),
        );
        format!("{} {}", self.name(), params.join("&"))
    }
}

impl AniDBCommand for AuthCommand {
    fn name(&self) -> &str {
        "AUTH"
    }

    // user and pass must stay first: encode_redacted relies on it
    fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("user", self.user.clone()),
            ("pass", self.pass.expose_secret()),
            ("protover", self.protover.clone()),
            ("client", self.client.clone()),
            ("clientver", self.clientver.clone()),
        ];

        if let Some(nat) = self.nat {
            params.push(("nat", nat.to_string()));
        }
        if let Some(enc) = &self.enc {
            params.push(("enc", enc.clone()));
        }

        params
    }

    fn skips_rate_limit(&self) -> bool {
        true
    }
}

/// LOGOUT command
#[derive(Debug, Clone)]
pub struct LogoutCommand {
    /// Session tag
    pub session: String,
}

impl LogoutCommand {
    /// Create a new LOGOUT command
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }
}

impl AniDBCommand for LogoutCommand {
    fn name(&self) -> &str {
        "LOGOUT"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("s", self.session.clone())]
    }

    fn skips_rate_limit(&self) -> bool {
        true
    }
}

/// PING command, used as a session keep-alive
#[derive(Debug, Clone, Default)]
pub struct PingCommand;

impl PingCommand {
    /// Create a new PING command
    pub fn new() -> Self {
        Self
    }
}

impl AniDBCommand for PingCommand {
    fn name(&self) -> &str {
        "PING"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn skips_rate_limit(&self) -> bool {
        true
    }
}
