use std::borrow::Cow::{self, Owned};
use std::sync::Arc;

use kiln_application::{COMMAND_PREFIX, highlight, is_complete};
use kiln_core::Engine;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

/// Editor helper: syntax coloring, multi-line input and command completion.
pub struct ReplHelper<E: Engine> {
    engine: Arc<E>,
    commands: Vec<String>,
}

impl<E: Engine> ReplHelper<E> {
    pub fn new(engine: Arc<E>, commands: Vec<String>) -> Self {
        Self { engine, commands }
    }

    /// Commands starting with the typed prefix, if the line is a bare command name.
    fn matching_commands<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let is_name = line.starts_with(COMMAND_PREFIX) && !line.contains(char::is_whitespace);
        self.commands
            .iter()
            .filter(move |command| is_name && command.starts_with(line))
    }
}

impl<E: Engine> Helper for ReplHelper<E> {}

impl<E: Engine> Completer for ReplHelper<E> {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = self
            .matching_commands(&line[..pos])
            .map(|command| Pair {
                display: command.clone(),
                replacement: command.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl<E: Engine> Highlighter for ReplHelper<E> {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Owned(highlight(self.engine.as_ref(), line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl<E: Engine> Hinter for ReplHelper<E> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let line = &line[..pos];
        self.matching_commands(line)
            .find(|command| command.len() > line.len())
            .map(|command| command[line.len()..].to_string())
    }
}

impl<E: Engine> Validator for ReplHelper<E> {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        if is_complete(self.engine.as_ref(), ctx.input()) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}
