//! The interactive session: state, store, commands and settings in one place.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use kiln_core::{Engine, Result, SubmissionRepository};

use crate::commands::{
    COMMAND_PREFIX, CommandDescriptor, CommandOutcome, builtin_commands, is_command,
};
use crate::state::SessionState;

/// An interactive session writing its output to `out`.
///
/// The shell only ever sees finished submissions; reading and line editing
/// belong to the front end.
pub struct Shell<E: Engine, W: Write> {
    pub(crate) engine: Arc<E>,
    pub(crate) state: SessionState<E::Compilation>,
    pub(crate) store: Box<dyn SubmissionRepository>,
    pub(crate) commands: Vec<CommandDescriptor<E, W>>,
    pub(crate) show_tree: bool,
    pub(crate) show_program: bool,
    /// Set while stored submissions are re-evaluated; suppresses persistence.
    pub(crate) replaying: bool,
    pub(crate) out: W,
}

impl<E: Engine, W: Write> Shell<E, W> {
    /// Creates a session with no compilation, no variables and both
    /// display toggles off.
    ///
    /// # Arguments
    ///
    /// * `engine` - Language engine, shared with the line editor's helper
    /// * `store` - Where accepted submissions are persisted
    /// * `out` - Destination of values, diagnostics and command output
    pub fn new(engine: Arc<E>, store: Box<dyn SubmissionRepository>, out: W) -> Self {
        Self {
            engine,
            state: SessionState::new(),
            store,
            commands: builtin_commands(),
            show_tree: false,
            show_program: false,
            replaying: false,
            out,
        }
    }

    /// Handles one finished submission, command or program text.
    ///
    /// Blank text is ignored. Diagnostics and command usage errors are
    /// written to the output and are not errors here.
    ///
    /// # Returns
    ///
    /// - `Ok(CommandOutcome)`: What the front end should do next
    /// - `Err(KilnError)`: Writing the output or persisting the submission failed
    pub fn submit(&mut self, text: &str) -> Result<CommandOutcome> {
        if is_command(text) {
            return self.execute_command(text);
        }
        if !text.trim().is_empty() {
            self.evaluate_submission(text)?;
        }
        Ok(CommandOutcome::Continue)
    }

    /// Re-evaluates every stored submission in order without storing them again.
    ///
    /// A record that fails is reported like any other submission and replay
    /// moves on.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of records found in the store
    /// - `Err(KilnError)`: The store could not be listed or output failed
    pub fn replay(&mut self) -> Result<usize> {
        let records = self.store.list_ordered()?;
        if records.is_empty() {
            return Ok(0);
        }

        let notice = format!("Loaded {} submission(s)", records.len());
        writeln!(self.out, "{}", notice.dimmed())?;
        tracing::info!("[Session] Replaying {} stored submission(s)", records.len());

        self.replaying = true;
        let result = records
            .iter()
            .try_for_each(|record| self.evaluate_submission(record));
        self.replaying = false;
        result?;

        Ok(records.len())
    }

    /// Command names with their prefix, for completion.
    pub fn command_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| format!("{}{}", COMMAND_PREFIX, command.name))
            .collect()
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn state(&self) -> &SessionState<E::Compilation> {
        &self.state
    }

    /// The submission store, for inspection.
    pub fn store(&self) -> &dyn SubmissionRepository {
        self.store.as_ref()
    }

    pub fn show_tree(&self) -> bool {
        self.show_tree
    }

    pub fn set_show_tree(&mut self, show_tree: bool) {
        self.show_tree = show_tree;
    }

    pub fn show_program(&self) -> bool {
        self.show_program
    }

    pub fn set_show_program(&mut self, show_program: bool) {
        self.show_program = show_program;
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Mutable access to the output, e.g. to drain a buffer.
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockSubmissionRepository, shell, take_output};
    use kiln_core::Value;

    #[test]
    fn test_submission_prints_value_and_is_stored() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);

        shell.submit("var x = 1").unwrap();
        shell.submit("x + 1").unwrap();

        assert_eq!(take_output(&mut shell), "2\n");
        assert_eq!(
            *repository.records.lock().unwrap(),
            vec!["var x = 1".to_string(), "x + 1".to_string()]
        );
    }

    #[test]
    fn test_commands_and_blank_input_are_not_stored() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);

        assert_eq!(shell.submit(":ls").unwrap(), CommandOutcome::Continue);
        assert_eq!(shell.submit("   ").unwrap(), CommandOutcome::Continue);
        assert_eq!(shell.submit(":cls").unwrap(), CommandOutcome::ClearScreen);
        assert_eq!(shell.submit(":exit").unwrap(), CommandOutcome::Exit);
        assert!(repository.records.lock().unwrap().is_empty());
    }

    #[test]
    fn test_replay_restores_state_without_storing_again() {
        let repository = MockSubmissionRepository::default();
        repository
            .records
            .lock()
            .unwrap()
            .extend(["var x = 40".to_string(), "x = x + 2".to_string()]);
        let mut shell = shell(&repository);

        assert_eq!(shell.replay().unwrap(), 2);
        assert_eq!(take_output(&mut shell), "Loaded 2 submission(s)\n42\n");
        assert_eq!(repository.records.lock().unwrap().len(), 2);
        assert!(!shell.replaying);

        shell.submit("x").unwrap();
        assert_eq!(take_output(&mut shell), "42\n");
        assert_eq!(repository.records.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_replay_of_empty_store_prints_nothing() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);
        assert_eq!(shell.replay().unwrap(), 0);
        assert!(take_output(&mut shell).is_empty());
    }

    #[test]
    fn test_store_failure_propagates() {
        let repository = MockSubmissionRepository {
            fail_appends: true,
            ..Default::default()
        };
        let mut shell = shell(&repository);
        let error = shell.submit("1").unwrap_err();
        assert!(error.is_io());
    }

    #[test]
    fn test_toggles() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);

        shell.submit(":showTree").unwrap();
        assert!(shell.show_tree());
        shell.submit(":showProgram").unwrap();
        assert!(shell.show_program());
        assert_eq!(
            take_output(&mut shell),
            "Showing parse trees.\nShowing bound programs.\n"
        );

        shell.submit("1").unwrap();
        let output = take_output(&mut shell);
        assert!(output.starts_with("CompilationUnit\n"));
        assert!(output.ends_with("1\n1\n"));

        shell.submit(":showTree").unwrap();
        assert!(!shell.show_tree());
    }

    #[test]
    fn test_usage_errors() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);

        shell.submit(":nope").unwrap();
        shell.submit(":dump").unwrap();
        shell.submit(":ls extra").unwrap();
        assert_eq!(
            take_output(&mut shell),
            "Unknown command ':nope'\n\
             Wrong number of arguments, usage: :dump <functionName>\n\
             Wrong number of arguments, usage: :ls\n"
        );
    }

    #[test]
    fn test_command_names() {
        let repository = MockSubmissionRepository::default();
        let shell = shell(&repository);
        let names = shell.command_names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&":showProgram".to_string()));
        assert!(names.contains(&":load".to_string()));
    }

    #[test]
    fn test_value_of_last_expression_only() {
        let repository = MockSubmissionRepository::default();
        let mut shell = shell(&repository);
        shell.submit("var a = 1\na + 1\na + 2").unwrap();
        assert_eq!(take_output(&mut shell), "3\n");
        let id = kiln_core::VariableId {
            generation: 1,
            ordinal: 0,
        };
        assert_eq!(shell.state().variables().get(&id), Some(&Value::Integer(1)));
    }
}
