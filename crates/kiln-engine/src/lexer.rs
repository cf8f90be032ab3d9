//! Tokenizer for the Kiln language.

use std::ops::Range;

use kiln_core::{Diagnostic, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    EndOfFile,
    BadToken,
    Whitespace,
    Comment,

    Number,
    String,
    Identifier,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Equals,
    EqualsEquals,
    BangEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    AmpersandAmpersand,
    PipePipe,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,

    VarKeyword,
    LetKeyword,
    FunctionKeyword,
    ReturnKeyword,
    IfKeyword,
    ElseKeyword,
    WhileKeyword,
    TrueKeyword,
    FalseKeyword,
}

impl SyntaxKind {
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "var" => Self::VarKeyword,
            "let" => Self::LetKeyword,
            "function" => Self::FunctionKeyword,
            "return" => Self::ReturnKeyword,
            "if" => Self::IfKeyword,
            "else" => Self::ElseKeyword,
            "while" => Self::WhileKeyword,
            "true" => Self::TrueKeyword,
            "false" => Self::FalseKeyword,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::VarKeyword
                | Self::LetKeyword
                | Self::FunctionKeyword
                | Self::ReturnKeyword
                | Self::IfKeyword
                | Self::ElseKeyword
                | Self::WhileKeyword
                | Self::TrueKeyword
                | Self::FalseKeyword
        )
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }

    pub fn token_kind(self) -> TokenKind {
        match self {
            Self::EndOfFile => TokenKind::EndOfFile,
            Self::BadToken => TokenKind::Bad,
            Self::Whitespace => TokenKind::Whitespace,
            Self::Comment => TokenKind::Comment,
            Self::Number => TokenKind::Number,
            Self::String => TokenKind::String,
            Self::Identifier => TokenKind::Identifier,
            kind if kind.is_keyword() => TokenKind::Keyword,
            _ => TokenKind::Punctuation,
        }
    }

    /// Binding power of a prefix operator, 0 when `self` is not one.
    pub fn unary_precedence(self) -> u8 {
        match self {
            Self::Plus | Self::Minus | Self::Bang => 6,
            _ => 0,
        }
    }

    /// Binding power of an infix operator, 0 when `self` is not one.
    pub fn binary_precedence(self) -> u8 {
        match self {
            Self::Star | Self::Slash | Self::Percent => 5,
            Self::Plus | Self::Minus => 4,
            Self::EqualsEquals
            | Self::BangEquals
            | Self::Less
            | Self::LessEquals
            | Self::Greater
            | Self::GreaterEquals => 3,
            Self::AmpersandAmpersand => 2,
            Self::PipePipe => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxToken {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: Range<usize>,
    pub is_missing: bool,
}

impl SyntaxToken {
    /// A token the parser had to invent; it has no text and an empty span at `position`.
    pub fn missing(kind: SyntaxKind, position: usize) -> Self {
        Self {
            kind,
            text: String::new(),
            span: position..position,
            is_missing: true,
        }
    }

    pub fn to_token(&self) -> Token {
        Token {
            kind: self.kind.token_kind(),
            text: self.text.clone(),
            span: self.span.clone(),
            is_missing: self.is_missing,
        }
    }
}

/// Splits `text` into tokens, trivia included, ending with an end-of-file token.
pub fn tokenize(text: &str) -> (Vec<SyntaxToken>, Vec<Diagnostic>) {
    let mut lexer = Lexer {
        text,
        position: 0,
        diagnostics: Vec::new(),
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.lex();
        let done = token.kind == SyntaxKind::EndOfFile;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, lexer.diagnostics)
}

struct Lexer<'a> {
    text: &'a str,
    position: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer<'_> {
    fn peek(&self, offset: usize) -> Option<char> {
        self.text[self.position..].chars().nth(offset)
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.peek(0) {
            if !predicate(c) {
                break;
            }
            self.position += c.len_utf8();
        }
    }

    fn lex(&mut self) -> SyntaxToken {
        let start = self.position;
        let Some(current) = self.peek(0) else {
            return SyntaxToken {
                kind: SyntaxKind::EndOfFile,
                text: String::new(),
                span: start..start,
                is_missing: false,
            };
        };

        let kind = match current {
            c if c.is_whitespace() => {
                self.advance_while(char::is_whitespace);
                SyntaxKind::Whitespace
            }
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => {
                self.advance_while(|c| c.is_alphanumeric() || c == '_');
                SyntaxKind::keyword(&self.text[start..self.position])
                    .unwrap_or(SyntaxKind::Identifier)
            }
            '"' => self.read_string(start),
            '/' if self.peek(1) == Some('/') => {
                self.advance_while(|c| c != '\n');
                SyntaxKind::Comment
            }
            _ => self.read_punctuation(current, start),
        };

        SyntaxToken {
            kind,
            text: self.text[start..self.position].to_string(),
            span: start..self.position,
            is_missing: false,
        }
    }

    fn read_number(&mut self, start: usize) -> SyntaxKind {
        self.advance_while(|c| c.is_ascii_digit());
        let text = &self.text[start..self.position];
        if text.parse::<i64>().is_err() {
            self.diagnostics.push(Diagnostic::new(
                start..self.position,
                format!("The number {} isn't a valid integer", text),
            ));
        }
        SyntaxKind::Number
    }

    fn read_string(&mut self, start: usize) -> SyntaxKind {
        // Opening quote.
        self.position += 1;
        loop {
            match self.peek(0) {
                None | Some('\n') | Some('\r') => {
                    self.diagnostics.push(Diagnostic::new(
                        start..start + 1,
                        "Unterminated string literal",
                    ));
                    break;
                }
                Some('"') => {
                    self.position += 1;
                    break;
                }
                Some('\\') => {
                    self.position += 1;
                    if let Some(escaped) = self.peek(0).filter(|c| *c != '\n') {
                        self.position += escaped.len_utf8();
                    }
                }
                Some(c) => self.position += c.len_utf8(),
            }
        }
        SyntaxKind::String
    }

    fn read_punctuation(&mut self, current: char, start: usize) -> SyntaxKind {
        let next = self.peek(1);
        let (kind, width) = match (current, next) {
            ('=', Some('=')) => (SyntaxKind::EqualsEquals, 2),
            ('!', Some('=')) => (SyntaxKind::BangEquals, 2),
            ('<', Some('=')) => (SyntaxKind::LessEquals, 2),
            ('>', Some('=')) => (SyntaxKind::GreaterEquals, 2),
            ('&', Some('&')) => (SyntaxKind::AmpersandAmpersand, 2),
            ('|', Some('|')) => (SyntaxKind::PipePipe, 2),
            ('+', _) => (SyntaxKind::Plus, 1),
            ('-', _) => (SyntaxKind::Minus, 1),
            ('*', _) => (SyntaxKind::Star, 1),
            ('/', _) => (SyntaxKind::Slash, 1),
            ('%', _) => (SyntaxKind::Percent, 1),
            ('!', _) => (SyntaxKind::Bang, 1),
            ('=', _) => (SyntaxKind::Equals, 1),
            ('<', _) => (SyntaxKind::Less, 1),
            ('>', _) => (SyntaxKind::Greater, 1),
            ('(', _) => (SyntaxKind::OpenParen, 1),
            (')', _) => (SyntaxKind::CloseParen, 1),
            ('{', _) => (SyntaxKind::OpenBrace, 1),
            ('}', _) => (SyntaxKind::CloseBrace, 1),
            (',', _) => (SyntaxKind::Comma, 1),
            _ => {
                self.position += current.len_utf8();
                self.diagnostics.push(Diagnostic::new(
                    start..self.position,
                    format!("Bad character input: '{}'", current),
                ));
                return SyntaxKind::BadToken;
            }
        };
        self.position += width;
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<SyntaxKind> {
        tokenize(text)
            .0
            .into_iter()
            .map(|token| token.kind)
            .filter(|kind| !kind.is_trivia())
            .collect()
    }

    #[test]
    fn test_tokens_cover_input() {
        let text = "var x = 10 // ten\nif x >= 3 { \"ok\" }";
        let (tokens, diagnostics) = tokenize(text);
        assert!(diagnostics.is_empty());
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_keywords_and_operators() {
        assert_eq!(
            kinds("let a = !b && c != 2"),
            vec![
                SyntaxKind::LetKeyword,
                SyntaxKind::Identifier,
                SyntaxKind::Equals,
                SyntaxKind::Bang,
                SyntaxKind::Identifier,
                SyntaxKind::AmpersandAmpersand,
                SyntaxKind::Identifier,
                SyntaxKind::BangEquals,
                SyntaxKind::Number,
                SyntaxKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_reported_but_kept() {
        let (tokens, diagnostics) = tokenize("\"abc");
        assert_eq!(tokens[0].kind, SyntaxKind::String);
        assert_eq!(tokens[0].text, "\"abc");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Unterminated string literal");
    }

    #[test]
    fn test_bad_character() {
        let (tokens, diagnostics) = tokenize("1 $ 2");
        assert!(tokens.iter().any(|t| t.kind == SyntaxKind::BadToken && t.text == "$"));
        assert_eq!(diagnostics[0].message, "Bad character input: '$'");
    }

    #[test]
    fn test_integer_overflow_is_diagnosed() {
        let (_, diagnostics) = tokenize("99999999999999999999");
        assert_eq!(diagnostics.len(), 1);
    }
}
