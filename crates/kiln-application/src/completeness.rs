//! Decides whether buffered input is ready to be submitted.

use kiln_core::{Engine, SyntaxTree};

use crate::commands::is_command;

/// Returns `true` when `text` should be submitted, `false` to keep reading.
pub fn is_complete<E: Engine>(engine: &E, text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }

    // Commands are single-line and never parsed.
    if is_command(text) {
        return true;
    }

    if ends_with_two_empty_lines(text) {
        return true;
    }

    let tree = engine.parse(text);
    match tree.last_member_token() {
        Some(token) => !token.is_missing,
        None => true,
    }
}

/// Two consecutive empty lines force a submission, even if it is unfinished.
fn ends_with_two_empty_lines(text: &str) -> bool {
    let mut lines = text
        .split('\n')
        .rev()
        .map(|line| line.strip_suffix('\r').unwrap_or(line));
    matches!((lines.next(), lines.next()), (Some(""), Some("")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_engine::KilnEngine;

    fn complete(text: &str) -> bool {
        is_complete(&KilnEngine::new(), text)
    }

    #[test]
    fn test_empty_text_is_complete() {
        assert!(complete(""));
        assert!(complete("   \n\t"));
    }

    #[test]
    fn test_dangling_operator_is_incomplete() {
        assert!(!complete("1 +"));
        assert!(!complete("1 +\n"));
        assert!(complete("1 +\n\n"));
        assert!(complete("1 +\r\n\r\n"));
    }

    #[test]
    fn test_blank_but_not_empty_lines_do_not_force() {
        assert!(!complete("1 +\n  \n "));
    }

    #[test]
    fn test_open_block_is_incomplete_until_closed() {
        assert!(!complete("function f(a) {"));
        assert!(!complete("function f(a) {\n  return a"));
        assert!(complete("function f(a) {\n  return a\n}"));
    }

    #[test]
    fn test_commands_complete_immediately() {
        assert!(complete(":ls"));
        assert!(complete("  :load \"unfinished"));
    }

    #[test]
    fn test_diagnostics_alone_do_not_hold_input() {
        assert!(complete("var x = \"open"));
        assert!(complete("1 + 2 $ 3"));
        assert!(complete("// only a comment"));
    }

    #[test]
    fn test_stray_tokens_keep_reading() {
        assert!(!complete(")"));
        assert!(!complete("1 + )"));
        assert!(!complete("}"));
        assert!(!complete("1 + $"));
        assert!(complete(")\n\n"));
    }

    #[test]
    fn test_deeply_nested_input_does_not_overflow() {
        assert!(!complete(&"(".repeat(10_000)));
        assert!(!complete(&"{".repeat(10_000)));
        assert!(complete(&format!("{}\n\n", "(".repeat(10_000))));
    }
}
