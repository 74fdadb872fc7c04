//! Configuration discovery and layered loading
//!
//! Two file formats are accepted. Files ending in `.toml` are read as TOML;
//! anything else is the flat `key=value` format, where `user` and `pass` are
//! the credentials and every other key is a filename template.

use aniren_core::config::DEFAULT_TEMPLATE_KEY;
use aniren_core::security::SecureString;
use aniren_core::{Credentials, NetworkConfig, RenamerConfig, TemplateSet};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable prefix; `__` separates nested keys
pub const ENV_PREFIX: &str = "ANIREN_";

#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<SecureString>,

    /// `default` plus one entry per category
    #[serde(default)]
    pub templates: BTreeMap<String, String>,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl AppConfig {
    /// Validate and convert into the record the core consumes
    pub fn into_renamer_config(self) -> aniren_core::Result<RenamerConfig> {
        let credentials = Credentials::new(
            self.user.unwrap_or_default(),
            self.pass.unwrap_or_default(),
        )?;

        let mut templates = TemplateSet::default();
        for (key, value) in self.templates {
            if key == DEFAULT_TEMPLATE_KEY {
                templates.default = value;
            } else {
                templates.categories.insert(key, value);
            }
        }

        RenamerConfig::new(credentials, templates, self.network)
    }
}

/// Flat file contents, shaped like `AppConfig` for figment
///
/// The password stays a plain `String` here: `SecureString` serializes masked.
#[derive(Serialize, Debug, Default, PartialEq, Eq)]
struct FlatFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass: Option<String>,
    templates: BTreeMap<String, String>,
}

/// Parse the flat `key=value` format
///
/// Blank lines and lines starting with `#` are skipped. Lines are split at the
/// first `=` and both sides trimmed.
fn parse_flat(content: &str) -> FlatFile {
    let mut file = FlatFile::default();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            warn!("Ignoring config line {} without '='", number + 1);
            continue;
        };

        let (key, value) = (key.trim(), value.trim().to_string());
        match key {
            "user" => file.user = Some(value),
            "pass" => file.pass = Some(value),
            _ => {
                file.templates.insert(key.to_string(), value);
            }
        }
    }

    file
}

/// Locations searched when no explicit path is given, in order
pub fn candidate_paths(home: Option<&Path>, xdg_config: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = home {
        paths.push(home.join(".anidb.conf"));
        paths.push(home.join(".config/anidb.conf"));
        paths.push(home.join(".config/.anidb.conf"));
    }

    match (xdg_config, home) {
        (Some(xdg), _) => paths.push(xdg.join("aniren/config.toml")),
        (None, Some(home)) => paths.push(home.join(".config/aniren/config.toml")),
        (None, None) => {}
    }

    paths.push(cwd.join(".anidb.conf"));
    paths
}

/// Finds the configuration file and loads it with environment overrides
pub struct ConfigManager {
    explicit: Option<PathBuf>,
    candidates: Vec<PathBuf>,
}

impl ConfigManager {
    /// Create a manager searching the standard locations
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let home = dirs::home_dir();
        let xdg = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self::with_candidates(
            explicit,
            candidate_paths(home.as_deref(), xdg.as_deref(), &cwd),
        )
    }

    /// Create a manager with a fixed search list (for testing)
    pub fn with_candidates(explicit: Option<PathBuf>, candidates: Vec<PathBuf>) -> Self {
        Self {
            explicit,
            candidates,
        }
    }

    /// The file that will be loaded, if any
    pub fn discover(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            if path.is_file() {
                return Some(path.clone());
            }
            warn!(
                "Config file {} not found, searching default locations",
                path.display()
            );
        }

        self.candidates.iter().find(|path| path.is_file()).cloned()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        match self.discover() {
            Some(path) if is_toml(&path) => {
                debug!("Loading TOML config from {}", path.display());
                figment = figment.merge(Toml::file(&path));
            }
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                figment = figment.merge(Serialized::defaults(parse_flat(&content)));
            }
            None => warn!("No config file found"),
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().context("Failed to load configuration")
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_flat() {
        let file = parse_flat(
            "# account\nuser = me\npass=p=w\n\nnot a pair\ndefault=%epno - %romanji_name\nMovie = %romanji_name (%year)\n",
        );

        assert_eq!(file.user.as_deref(), Some("me"));
        assert_eq!(file.pass.as_deref(), Some("p=w"));
        assert_eq!(file.templates.len(), 2);
        assert_eq!(file.templates["default"], "%epno - %romanji_name");
        assert_eq!(file.templates["Movie"], "%romanji_name (%year)");
    }

    #[test]
    fn test_candidate_order() {
        let home = Path::new("/home/u");
        let cwd = Path::new("/work");

        assert_eq!(
            candidate_paths(Some(home), None, cwd),
            vec![
                PathBuf::from("/home/u/.anidb.conf"),
                PathBuf::from("/home/u/.config/anidb.conf"),
                PathBuf::from("/home/u/.config/.anidb.conf"),
                PathBuf::from("/home/u/.config/aniren/config.toml"),
                PathBuf::from("/work/.anidb.conf"),
            ]
        );

        let with_xdg = candidate_paths(Some(home), Some(Path::new("/xdg")), cwd);
        assert_eq!(with_xdg[3], PathBuf::from("/xdg/aniren/config.toml"));

        assert_eq!(
            candidate_paths(None, None, cwd),
            vec![PathBuf::from("/work/.anidb.conf")]
        );
    }

    #[test]
    fn test_discover_prefers_first_existing() {
        let dir = TempDir::new().unwrap();
        let second = write(&dir, "b.conf", "user=b");
        let third = write(&dir, "c.conf", "user=c");
        let manager = ConfigManager::with_candidates(
            None,
            vec![dir.path().join("a.conf"), second.clone(), third],
        );

        assert_eq!(manager.discover(), Some(second));
    }

    #[test]
    fn test_missing_explicit_path_falls_back() {
        let dir = TempDir::new().unwrap();
        let fallback = write(&dir, "fallback.conf", "user=x");
        let manager = ConfigManager::with_candidates(
            Some(dir.path().join("missing.conf")),
            vec![fallback.clone()],
        );

        assert_eq!(manager.discover(), Some(fallback));
    }

    #[test]
    fn test_load_flat_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            ".anidb.conf",
            "user=me\npass=secret\ndefault=%epno\nOVA=%romanji_name OVA\n",
        );
        let config = ConfigManager::with_candidates(Some(path), vec![])
            .load()
            .unwrap()
            .into_renamer_config()
            .unwrap();

        assert_eq!(config.credentials.user, "me");
        assert_eq!(config.credentials.pass.expose_secret(), "secret");
        assert_eq!(config.templates.default, "%epno");
        assert_eq!(config.templates.select(Some("OVA")), "%romanji_name OVA");
        assert_eq!(config.network, NetworkConfig::default());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "aniren/config.toml",
            r#"
user = "me"
pass = "secret"

[templates]
Movie = "%romanji_name (%year)"

[network]
server = "127.0.0.1:9100"
request_delay_ms = 2500
"#,
        );
        let config = ConfigManager::with_candidates(None, vec![path])
            .load()
            .unwrap()
            .into_renamer_config()
            .unwrap();

        assert_eq!(config.credentials.pass.expose_secret(), "secret");
        assert_eq!(config.templates.default, aniren_core::config::DEFAULT_TEMPLATE);
        assert_eq!(config.templates.select(Some("Movie")), "%romanji_name (%year)");
        assert_eq!(config.network.server, "127.0.0.1:9100");
        assert_eq!(config.network.request_delay_ms, 2500);
        assert_eq!(config.network.local_port, NetworkConfig::default().local_port);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "only-templates.conf", "default=%epno\n");
        let err = ConfigManager::with_candidates(Some(path), vec![])
            .load()
            .unwrap()
            .into_renamer_config()
            .unwrap_err();

        assert!(err.to_string().contains("No username or password"));
    }
}
