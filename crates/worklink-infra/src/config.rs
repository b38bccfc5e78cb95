//! Global configuration loader for Worklink.
//!
//! Reads `config.toml` from the data directory (`~/.worklink/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use worklink_types::config::GlobalConfig;

/// Maximum history page size a client may request (safety cap).
const MAX_PAGE_SIZE: i64 = 500;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Resolve the effective page size for a history query.
///
/// Priority:
/// 1. Per-request override from the `limit` query parameter
/// 2. Global default from `config.toml` (`history_page_size`)
///
/// A cap of 500 rows is enforced regardless of source.
pub fn resolve_page_limit(global_config: &GlobalConfig, requested: Option<i64>) -> i64 {
    let limit = requested.unwrap_or(global_config.history_page_size as i64);
    limit.clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_message_chars, 4_000);
        assert_eq!(config.history_page_size, 100);
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
max_message_chars = 2000
history_page_size = 25
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_message_chars, 2_000);
        assert_eq!(config.history_page_size, 25);
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.max_message_chars, 4_000);
    }

    #[test]
    fn resolve_page_limit_with_request_override() {
        let global = GlobalConfig::default();
        assert_eq!(resolve_page_limit(&global, Some(10)), 10);
    }

    #[test]
    fn resolve_page_limit_without_override_uses_global() {
        let global = GlobalConfig::default();
        assert_eq!(resolve_page_limit(&global, None), 100);
    }

    #[test]
    fn resolve_page_limit_enforces_cap() {
        let global = GlobalConfig::default();
        assert_eq!(resolve_page_limit(&global, Some(100_000)), 500);
        assert_eq!(resolve_page_limit(&global, Some(0)), 1);
    }
}
