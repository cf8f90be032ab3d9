//! Platform paths for Kiln's files.
//!
//! ```text
//! <config dir>/kiln/             # e.g. ~/.config/kiln/
//! └── config.toml
//!
//! <local data dir>/kiln/         # e.g. ~/.local/share/kiln/
//! ├── Submissions/               # one file per accepted submission
//! │   ├── submission0000
//! │   └── submission0001
//! └── logs/
//!     └── kiln.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

use kiln_core::KilnError;

const APP_DIR: &str = "kiln";

/// Errors that can occur during path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The platform has no local data directory.
    DataDirNotFound,
    /// The platform has no configuration directory.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::DataDirNotFound => write!(f, "Cannot find local data directory"),
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for KilnError {
    fn from(e: PathError) -> Self {
        KilnError::config(e.to_string())
    }
}

/// Platform locations of Kiln's configuration, submissions and logs.
///
/// Directories are only computed here; callers create them when they first
/// write into them.
pub struct KilnPaths;

impl KilnPaths {
    /// Returns the Kiln data directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the data directory (e.g., `~/.local/share/kiln/`)
    /// - `Err(PathError::DataDirNotFound)`: The platform has no local data directory
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::DataDirNotFound)
    }

    /// Returns the directory holding stored submissions.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: `<data dir>/Submissions`
    /// - `Err(PathError)`: Could not determine the data directory
    pub fn submissions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("Submissions"))
    }

    /// Returns the directory the rolling log files are written to.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }

    /// Returns the Kiln configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to the config directory (e.g., `~/.config/kiln/`)
    /// - `Err(PathError::ConfigDirNotFound)`: The platform has no configuration directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the default configuration file.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to `config.toml`
    /// - `Err(PathError)`: Could not determine the config directory
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
