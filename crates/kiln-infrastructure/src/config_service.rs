//! Loads `ReplConfig` from `config.toml`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kiln_core::{KilnError, ReplConfig, Result};

use crate::paths::KilnPaths;

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// The path was named by the user rather than defaulted.
    explicit: bool,
}

impl ConfigService {
    /// Uses `path` when given, otherwise the platform config file.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self {
                path,
                explicit: true,
            }),
            None => Ok(Self {
                path: KilnPaths::config_file()?,
                explicit: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration.
    ///
    /// A missing default file yields the defaults. A missing file the user
    /// asked for is an error, and so is a file that does not parse.
    pub fn load(&self) -> Result<ReplConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound && !self.explicit => {
                tracing::debug!(
                    "[Config] No config at {}, using defaults",
                    self.path.display()
                );
                return Ok(ReplConfig::default());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(KilnError::not_found(
                    "config file",
                    self.path.display().to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let config: ReplConfig = toml::from_str(&content)?;
        tracing::debug!("[Config] Loaded {}", self.path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(path: PathBuf, explicit: bool) -> ConfigService {
        ConfigService { path, explicit }
    }

    #[test]
    fn test_missing_default_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = service(temp_dir.path().join("config.toml"), false);
        assert_eq!(service.load().unwrap(), ReplConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.toml");
        let error = ConfigService::new(Some(path)).unwrap().load().unwrap_err();
        assert!(error.is_not_found());
    }

    #[test]
    fn test_loads_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "prompt = \"> \"\nshow_program = true\n").unwrap();

        let config = service(path, false).load().unwrap();
        assert_eq!(config.prompt, "> ");
        assert!(config.show_program);
        assert!(!config.show_tree);
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "show_tree = \"yes\"").unwrap();

        let error = service(path, true).load().unwrap_err();
        assert!(error.is_serialization());
    }
}
