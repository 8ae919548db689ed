// ── Configuration ──
//
// Optional `selflens.yaml` in the data directory:
//
//   server:
//     bind: 0.0.0.0
//     port: 10000
//     public_dir: public

use std::fs;
use std::path::{Path, PathBuf};

use selflens_core::Result;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "selflens.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

// ── Helpers ──

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

// ── Public API ──

/// Load `selflens.yaml` from the data directory, falling back to defaults
/// when the file is missing, blank, or unreadable as YAML.
pub fn load_config(data_dir: &Path) -> Result<Config> {
    let config_path = data_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            log::warn!("ignoring {}: {}", config_path.display(), e);
            Ok(Config::default())
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "server:\n  port: 8080\n").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_blank_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "\n  \n").unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "server: [not, a, map").unwrap();
        assert_eq!(load_config(tmp.path()).unwrap(), Config::default());
    }
}
