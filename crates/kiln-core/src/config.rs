use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// User configuration, read from `config.toml`.
///
/// Every field has a default so a partial (or absent) file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReplConfig {
    /// Prompt shown before each submission.
    pub prompt: String,
    /// Print the parse tree of every submission before it runs.
    pub show_tree: bool,
    /// Print the bound program of every submission before it runs.
    pub show_program: bool,
    /// Replay stored submissions when the shell starts.
    pub replay_on_start: bool,
    /// Overrides the platform submission directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,
    /// Default tracing filter when `KILN_LOG` is not set.
    pub log_level: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "» ".to_string(),
            show_tree: false,
            show_program: false,
            replay_on_start: true,
            store_dir: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ReplConfig = toml::from_str("show_tree = true").unwrap();
        assert!(config.show_tree);
        assert!(config.replay_on_start);
        assert_eq!(config.prompt, "» ");
        assert_eq!(config.store_dir, None);
    }

    #[test]
    fn test_store_dir_override() {
        let config: ReplConfig = toml::from_str(r#"store_dir = "/tmp/kiln""#).unwrap();
        assert_eq!(config.store_dir, Some(PathBuf::from("/tmp/kiln")));
    }
}
