//! Global configuration types for Worklink.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls
//! message bounds and history paging.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Worklink chat service.
///
/// Loaded from `~/.worklink/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Maximum accepted message content length, in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Number of messages returned by a history fetch when the caller
    /// does not ask for a specific page size.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: u32,
}

fn default_max_message_chars() -> usize {
    4_000
}

fn default_history_page_size() -> u32 {
    100
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            history_page_size: default_history_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.max_message_chars, 4_000);
        assert_eq!(config.history_page_size, 100);
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let toml_str = "";
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_message_chars, 4_000);
        assert_eq!(config.history_page_size, 100);
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
max_message_chars = 280
history_page_size = 25
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_message_chars, 280);
        assert_eq!(config.history_page_size, 25);
    }

    #[test]
    fn test_global_config_serde_roundtrip() {
        let config = GlobalConfig {
            max_message_chars: 1_000,
            history_page_size: 50,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GlobalConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_message_chars, 1_000);
        assert_eq!(parsed.history_page_size, 50);
    }
}
