//! Directory-backed submission store.
//!
//! Each accepted submission is one file, `submission` followed by a 4-digit
//! zero-padded sequence number, holding the raw submission text.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use kiln_core::{KilnError, Result, SubmissionRepository};

use crate::paths::KilnPaths;

const FILE_PREFIX: &str = "submission";
const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct DirSubmissionRepository {
    directory: PathBuf,
}

impl DirSubmissionRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Creates a repository in the platform submissions directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(KilnPaths::submissions_dir()?))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_name(sequence: u32) -> String {
        format!("{}{:04}", FILE_PREFIX, sequence)
    }

    /// Parses the sequence number out of a record file name.
    ///
    /// Anything else living in the directory (temp files, editor backups) is
    /// not a record.
    fn sequence_of(file_name: &str) -> Option<u32> {
        let digits = file_name.strip_prefix(FILE_PREFIX)?;
        if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Record paths sorted by sequence number.
    fn records(&self) -> Result<Vec<(u32, PathBuf)>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(sequence) = name.to_str().and_then(Self::sequence_of) {
                records.push((sequence, entry.path()));
            }
        }
        records.sort_by_key(|(sequence, _)| *sequence);
        Ok(records)
    }

    fn next_sequence(&self) -> Result<u32> {
        match self.records()?.last() {
            Some((sequence, _)) => sequence
                .checked_add(1)
                .ok_or_else(|| KilnError::internal("submission sequence exhausted")),
            None => Ok(0),
        }
    }
}

impl SubmissionRepository for DirSubmissionRepository {
    /// A record that cannot be read as text is logged and skipped; it stays
    /// on disk and keeps its sequence number.
    fn list_ordered(&self) -> Result<Vec<String>> {
        let records = self.records()?;
        let mut texts = Vec::with_capacity(records.len());
        for (_, path) in records {
            match fs::read_to_string(&path) {
                Ok(text) => texts.push(text),
                Err(e) => tracing::warn!("[Store] Skipping {}: {}", path.display(), e),
            }
        }
        tracing::debug!(
            "[Store] Listed {} submission(s) from {}",
            texts.len(),
            self.directory.display()
        );
        Ok(texts)
    }

    fn append(&self, text: &str) -> Result<()> {
        fs::create_dir_all(&self.directory)?;

        let name = Self::file_name(self.next_sequence()?);
        let path = self.directory.join(&name);
        let tmp_path = self.directory.join(format!("{}{}", name, TMP_SUFFIX));

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(text.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &path)?;
        tracing::debug!("[Store] Appended {}", path.display());
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        match fs::remove_dir_all(&self.directory) {
            Ok(()) => {
                tracing::info!("[Store] Cleared {}", self.directory.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repository(temp_dir: &TempDir) -> DirSubmissionRepository {
        DirSubmissionRepository::new(temp_dir.path().join("Submissions"))
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        assert!(repository.list_ordered().unwrap().is_empty());
    }

    #[test]
    fn test_append_writes_numbered_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);

        repository.append("var x = 1").unwrap();
        repository.append("x + 1").unwrap();

        let first = repository.directory().join("submission0000");
        let second = repository.directory().join("submission0001");
        assert_eq!(fs::read_to_string(first).unwrap(), "var x = 1");
        assert_eq!(fs::read_to_string(second).unwrap(), "x + 1");
        assert_eq!(
            repository.list_ordered().unwrap(),
            vec!["var x = 1".to_string(), "x + 1".to_string()]
        );
    }

    #[test]
    fn test_list_orders_by_sequence_and_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        let directory = repository.directory();
        fs::create_dir_all(directory).unwrap();
        fs::write(directory.join("submission0010"), "ten").unwrap();
        fs::write(directory.join("submission0002"), "two").unwrap();
        fs::write(directory.join("submission0003.tmp"), "partial").unwrap();
        fs::write(directory.join("notes.txt"), "ignored").unwrap();

        assert_eq!(
            repository.list_ordered().unwrap(),
            vec!["two".to_string(), "ten".to_string()]
        );

        repository.append("eleven").unwrap();
        assert!(directory.join("submission0011").exists());
    }

    #[test]
    fn test_clear_all_restarts_numbering() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        repository.append("a").unwrap();
        repository.append("b").unwrap();

        repository.clear_all().unwrap();
        assert!(!repository.directory().exists());
        assert!(repository.list_ordered().unwrap().is_empty());

        repository.append("c").unwrap();
        assert!(repository.directory().join("submission0000").exists());
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        repository.clear_all().unwrap();
        repository.clear_all().unwrap();
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        repository.append("var a = 1").unwrap();
        fs::write(
            repository.directory().join("submission0001"),
            [0x66, 0xff, 0xfe, 0x0a],
        )
        .unwrap();
        repository.append("a + 1").unwrap();

        assert_eq!(
            repository.list_ordered().unwrap(),
            vec!["var a = 1".to_string(), "a + 1".to_string()]
        );
        assert!(repository.directory().join("submission0002").exists());
    }

    #[test]
    fn test_multiline_text_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let repository = repository(&temp_dir);
        let text = "function f(a) {\r\n  return a\n}\n";
        repository.append(text).unwrap();
        assert_eq!(repository.list_ordered().unwrap(), vec![text.to_string()]);
    }
}
