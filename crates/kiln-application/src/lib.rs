//! Session layer of the Kiln shell.
//!
//! Everything between the line editor and the language engine: rendering,
//! deciding when input is complete, commands, session state and the
//! evaluation of submissions.

pub mod commands;
pub mod completeness;
pub mod orchestrator;
pub mod renderer;
pub mod shell;
pub mod state;

#[cfg(test)]
mod test_support;

pub use commands::{COMMAND_PREFIX, CommandError, CommandOutcome, is_command};
pub use completeness::is_complete;
pub use renderer::{Style, StyledSpans, highlight, render_line, styled_spans};
pub use shell::Shell;
pub use state::SessionState;
