//! Submission repository trait.

use crate::error::Result;

/// Durable, ordered log of accepted submissions.
///
/// Records are raw submission texts. They are only ever appended one at a
/// time or removed all together.
pub trait SubmissionRepository {
    /// Returns every stored submission in acceptance order.
    fn list_ordered(&self) -> Result<Vec<String>>;

    /// Appends a submission after all existing ones.
    fn append(&self, text: &str) -> Result<()>;

    /// Removes every stored submission. Succeeds when nothing is stored.
    fn clear_all(&self) -> Result<()>;
}
