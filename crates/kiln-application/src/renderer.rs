//! Syntax-colored rendering of input lines.
//!
//! A line is tokenized by the engine and cut into styled spans that cover it
//! exactly: joining the span texts gives back the input byte for byte, even
//! when the tokens overlap, leave gaps or the line does not lex cleanly.
//! Each painted span carries its own reset, so a style never leaks into the
//! next span or into later output.

use std::iter::Peekable;
use std::vec::IntoIter;

use colored::{ColoredString, Colorize};
use kiln_core::{Engine, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Keyword,
    Identifier,
    Number,
    String,
    Default,
}

impl Style {
    pub fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Keyword => Style::Keyword,
            TokenKind::Identifier => Style::Identifier,
            TokenKind::Number => Style::Number,
            TokenKind::String => Style::String,
            _ => Style::Default,
        }
    }

    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Style::Keyword => text.blue(),
            Style::Identifier => text.yellow(),
            Style::Number => text.cyan(),
            Style::String => text.magenta(),
            Style::Default => text.normal(),
        }
    }
}

/// Iterator over the `(style, text)` spans of one line.
pub struct StyledSpans<'a> {
    line: &'a str,
    tokens: Peekable<IntoIter<Token>>,
    /// Byte offset of the first character not yet yielded; always a char boundary.
    position: usize,
}

impl<'a> StyledSpans<'a> {
    pub fn new(line: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            line,
            tokens: tokens.into_iter().peekable(),
            position: 0,
        }
    }

    /// Moves `end` forward to the nearest char boundary inside the line.
    fn boundary(&self, end: usize) -> usize {
        let mut end = end.min(self.line.len());
        while !self.line.is_char_boundary(end) {
            end += 1;
        }
        end
    }

    fn take(&mut self, style: Style, end: usize) -> (Style, &'a str) {
        let text = &self.line[self.position..end];
        self.position = end;
        (style, text)
    }
}

impl<'a> Iterator for StyledSpans<'a> {
    type Item = (Style, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.position >= self.line.len() {
                return None;
            }

            let Some((kind, span)) = self
                .tokens
                .peek()
                .map(|token| (token.kind, token.span.clone()))
            else {
                // Nothing left to classify the tail with.
                return Some(self.take(Style::Default, self.line.len()));
            };

            if span.is_empty() || span.end <= self.position {
                self.tokens.next();
                continue;
            }

            if span.start > self.position {
                let end = self.boundary(span.start);
                if end > self.position {
                    return Some(self.take(Style::Default, end));
                }
            }

            // Overlapping tokens are clamped to start where the previous span ended.
            let style = Style::of(kind);
            let end = self.boundary(span.end);
            self.tokens.next();
            if end > self.position {
                return Some(self.take(style, end));
            }
        }
    }
}

pub fn styled_spans<'a, E: Engine>(engine: &E, line: &'a str) -> StyledSpans<'a> {
    StyledSpans::new(line, engine.parse_tokens(line))
}

/// Renders one line with every span painted.
pub fn render_line<E: Engine>(engine: &E, line: &str) -> String {
    styled_spans(engine, line)
        .map(|(style, text)| style.paint(text).to_string())
        .collect()
}

/// Renders multi-line text, tokenizing each line on its own.
pub fn highlight<E: Engine>(engine: &E, text: &str) -> String {
    text.split('\n')
        .map(|line| render_line(engine, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_engine::KilnEngine;

    fn token(kind: TokenKind, span: std::ops::Range<usize>, line: &str) -> Token {
        Token {
            kind,
            text: line.get(span.clone()).unwrap_or_default().to_string(),
            span,
            is_missing: false,
        }
    }

    fn joined(spans: StyledSpans<'_>) -> String {
        spans.map(|(_, text)| text).collect()
    }

    #[test]
    fn test_spans_classify_tokens() {
        let engine = KilnEngine::new();
        let spans: Vec<(Style, &str)> = styled_spans(&engine, "var x = 42").collect();
        assert_eq!(
            spans,
            vec![
                (Style::Keyword, "var"),
                (Style::Default, " "),
                (Style::Identifier, "x"),
                (Style::Default, " "),
                (Style::Default, "="),
                (Style::Default, " "),
                (Style::Number, "42"),
            ]
        );
    }

    #[test]
    fn test_malformed_lines_render_verbatim() {
        let engine = KilnEngine::new();
        for line in ["\"abc", "1 + $ @", "function f(", "  ", "é = \"ü"] {
            assert_eq!(joined(styled_spans(&engine, line)), line);
        }
        let spans: Vec<(Style, &str)> = styled_spans(&engine, "\"abc").collect();
        assert_eq!(spans, vec![(Style::String, "\"abc")]);
    }

    #[test]
    fn test_gaps_are_filled_with_default() {
        let line = "let   x";
        let tokens = vec![
            token(TokenKind::Keyword, 0..3, line),
            token(TokenKind::Identifier, 6..7, line),
        ];
        let spans: Vec<(Style, &str)> = StyledSpans::new(line, tokens).collect();
        assert_eq!(
            spans,
            vec![
                (Style::Keyword, "let"),
                (Style::Default, "   "),
                (Style::Identifier, "x"),
            ]
        );
    }

    #[test]
    fn test_overlaps_and_out_of_range_spans_are_clamped() {
        let line = "abcdef";
        let tokens = vec![
            token(TokenKind::Identifier, 0..4, line),
            token(TokenKind::Number, 2..5, line),
            token(TokenKind::Keyword, 5..40, line),
        ];
        let spans: Vec<(Style, &str)> = StyledSpans::new(line, tokens).collect();
        assert_eq!(
            spans,
            vec![
                (Style::Identifier, "abcd"),
                (Style::Number, "e"),
                (Style::Keyword, "f"),
            ]
        );
    }

    #[test]
    fn test_spans_inside_a_character_are_widened() {
        let line = "ü1";
        let tokens = vec![token(TokenKind::Number, 1..3, line)];
        assert_eq!(joined(StyledSpans::new(line, tokens)), line);
    }

    #[test]
    fn test_render_without_color_is_identity() {
        colored::control::set_override(false);
        let engine = KilnEngine::new();
        let text = "function f(a) {\n  return a + 1\n}";
        assert_eq!(highlight(&engine, text), text);
        assert_eq!(render_line(&engine, "let y = \"s\""), "let y = \"s\"");
    }
}
