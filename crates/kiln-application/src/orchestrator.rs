//! Evaluation of one program submission.
//!
//! Parse, optionally print the tree, chain onto the current compilation,
//! optionally print the bound program, evaluate. A submission with any
//! diagnostic leaves the session exactly as it found it.

use std::io::Write;

use colored::Colorize;
use kiln_core::{Compilation, Diagnostic, Engine, Result, SyntaxTree, Value};

use crate::shell::Shell;

impl<E: Engine, W: Write> Shell<E, W> {
    pub(crate) fn evaluate_submission(&mut self, text: &str) -> Result<()> {
        let tree = self.engine.parse(text);
        if self.show_tree {
            let mut buffer = Vec::new();
            tree.write_tree(&mut buffer)?;
            write!(self.out, "{}", String::from_utf8_lossy(&buffer).bright_black())?;
        }

        let previous = self.state.current_handle().cloned();
        let compilation = self.engine.chain(previous, tree);
        if self.show_program {
            let mut buffer = Vec::new();
            compilation.emit_tree(None, &mut buffer)?;
            write!(self.out, "{}", String::from_utf8_lossy(&buffer).bright_black())?;
        }

        let snapshot = self.state.variables().clone();
        let evaluation = compilation.evaluate(self.state.variables_mut());

        if !evaluation.diagnostics.is_empty() {
            *self.state.variables_mut() = snapshot;
            tracing::debug!(
                "[Session] Submission rejected with {} diagnostic(s)",
                evaluation.diagnostics.len()
            );
            return self.write_diagnostics(text, &evaluation.diagnostics);
        }

        if let Some(value) = &evaluation.value {
            self.write_value(value)?;
        }
        self.state.commit(compilation);

        if !self.replaying {
            self.store.append(text)?;
        }
        tracing::debug!("[Session] Committed submission ({} bytes)", text.len());
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        writeln!(self.out, "{}", value.to_string().magenta())?;
        Ok(())
    }

    /// Writes each diagnostic as `(line, column): message` followed by the
    /// offending source line with the diagnosed span highlighted.
    fn write_diagnostics(&mut self, text: &str, diagnostics: &[Diagnostic]) -> Result<()> {
        for diagnostic in diagnostics {
            let location = SourceLocation::of(text, diagnostic.span.start);
            let header = format!(
                "({}, {}): {}",
                location.line + 1,
                location.column + 1,
                diagnostic.message
            );
            writeln!(self.out, "{}", header.red())?;

            let line = &text[location.line_start..location.line_end];
            let start = diagnostic.span.start.clamp(location.line_start, location.line_end);
            let end = diagnostic.span.end.clamp(start, location.line_end);
            match (
                text.get(location.line_start..start),
                text.get(start..end),
                text.get(end..location.line_end),
            ) {
                (Some(prefix), Some(error), Some(suffix)) => {
                    writeln!(self.out, "    {}{}{}", prefix, error.red(), suffix)?
                }
                _ => writeln!(self.out, "    {}", line)?,
            }
        }
        Ok(())
    }
}

/// Zero-based position of a byte offset in multi-line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceLocation {
    line: usize,
    column: usize,
    line_start: usize,
    /// End of the line's content, before any `\r\n` or `\n`.
    line_end: usize,
}

impl SourceLocation {
    fn of(text: &str, offset: usize) -> Self {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &text[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let mut line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
        if text[line_start..line_end].ends_with('\r') {
            line_end -= 1;
        }
        let column = text[line_start..offset].chars().count();

        Self {
            line,
            column,
            line_start,
            line_end,
        }
    }
}
