//! Shared fixtures for the unit tests of this crate.

use std::sync::{Arc, Mutex};

use kiln_core::{KilnError, Result, SubmissionRepository};
use kiln_engine::KilnEngine;

use crate::shell::Shell;

/// In-memory repository sharing its records with the test.
#[derive(Clone, Default)]
pub(crate) struct MockSubmissionRepository {
    pub(crate) records: Arc<Mutex<Vec<String>>>,
    pub(crate) fail_appends: bool,
}

impl SubmissionRepository for MockSubmissionRepository {
    fn list_ordered(&self) -> Result<Vec<String>> {
        Ok(self.records.lock().unwrap().clone())
    }

    fn append(&self, text: &str) -> Result<()> {
        if self.fail_appends {
            return Err(KilnError::io("disk full"));
        }
        self.records.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

pub(crate) fn shell(repository: &MockSubmissionRepository) -> Shell<KilnEngine, Vec<u8>> {
    colored::control::set_override(false);
    Shell::new(
        Arc::new(KilnEngine::new()),
        Box::new(repository.clone()),
        Vec::new(),
    )
}

/// Drains everything the shell has written so far.
pub(crate) fn take_output(shell: &mut Shell<KilnEngine, Vec<u8>>) -> String {
    String::from_utf8(std::mem::take(shell.writer_mut())).unwrap()
}
