pub mod config_service;
pub mod dir_submission_repository;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::dir_submission_repository::DirSubmissionRepository;
pub use crate::paths::{KilnPaths, PathError};
