//! Router and command metadata loaded from TOML.
//!
//! ```toml
//! prefix = "!"
//! separator = " "
//!
//! [commands.shout]
//! name = "shout"
//! aliases = ["shout", "yell"]
//! help = "Repeat a quote loudly"
//! usable_global_flags = ["autodelete", "help"]
//!
//! [commands.shout.flags]
//! repeat = "times to repeat the quote"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::GlobalFlag;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Metadata keyed by command id.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandMeta>,
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_separator() -> String {
    " ".to_string()
}

impl Default for FlowerConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            separator: default_separator(),
            commands: BTreeMap::new(),
        }
    }
}

impl FlowerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), commands = config.commands.len(), "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn command(&self, id: &str) -> Option<&CommandMeta> {
        self.commands.get(id)
    }
}

/// Descriptive metadata of one command. Unset fields keep what the builder
/// already has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMeta {
    pub name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub help: Option<String>,
    pub prefix: Option<String>,
    pub example: Option<String>,
    #[serde(default)]
    pub see: Vec<String>,
    pub bot_runnable: Option<bool>,
    pub usable_global_flags: Option<Vec<GlobalFlag>>,
    /// Help text per flag name.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
prefix = "?"

[commands.send]
aliases = ["send", "s"]
help = "Send a quote"
usable_global_flags = ["autodelete", "help"]

[commands.send.flags]
pipe = "channel to send to"
"#;

    #[test]
    fn test_parse_sample() {
        let config = FlowerConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.prefix, "?");
        assert_eq!(config.separator, " ");

        let send = config.command("send").unwrap();
        assert_eq!(send.aliases, vec!["send", "s"]);
        assert_eq!(send.name, None);
        assert_eq!(
            send.usable_global_flags,
            Some(vec![GlobalFlag::AutoDelete, GlobalFlag::Help])
        );
        assert_eq!(send.flags.get("pipe").map(String::as_str), Some("channel to send to"));
        assert!(config.command("missing").is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(FlowerConfig::from_toml_str("").unwrap(), FlowerConfig::default());
    }

    #[test]
    fn test_unknown_global_flag_is_rejected() {
        let error =
            FlowerConfig::from_toml_str("[commands.x]\nusable_global_flags = [\"verbose\"]\n")
                .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = FlowerConfig::load(file.path()).unwrap();
        assert!(config.command("send").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = FlowerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
        assert!(error.to_string().contains("absent.toml"));
    }
}
