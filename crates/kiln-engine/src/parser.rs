//! Recursive-descent parser.
//!
//! The parser never fails. When an expected token is absent it reports a
//! diagnostic and synthesizes a zero-width token flagged `is_missing`, which
//! lets the shell tell an unfinished submission from a finished one.

use kiln_core::{Diagnostic, Value};

use crate::ast::{Block, CompilationUnit, Expression, FunctionDeclaration, Member, Statement};
use crate::lexer::{SyntaxKind, SyntaxToken, tokenize};

/// Deepest nesting of statements and expressions the parser descends into.
const MAX_NESTING_DEPTH: usize = 128;

pub fn parse(text: &str) -> (CompilationUnit, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = tokenize(text);
    let mut parser = Parser {
        tokens: tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect(),
        position: 0,
        diagnostics: Vec::new(),
        last_consumed: None,
        depth: 0,
    };
    let unit = parser.parse_compilation_unit();
    diagnostics.append(&mut parser.diagnostics);
    (unit, diagnostics)
}

struct Parser {
    /// Non-trivia tokens; always ends with `EndOfFile`.
    tokens: Vec<SyntaxToken>,
    position: usize,
    diagnostics: Vec<Diagnostic>,
    last_consumed: Option<SyntaxToken>,
    depth: usize,
}

impl Parser {
    fn peek(&self, offset: usize) -> &SyntaxToken {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn current(&self) -> &SyntaxToken {
        self.peek(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current().kind == kind
    }

    fn next_token(&mut self) -> SyntaxToken {
        let token = self.current().clone();
        if token.kind != SyntaxKind::EndOfFile {
            self.position += 1;
        }
        self.last_consumed = Some(token.clone());
        token
    }

    fn match_token(&mut self, kind: SyntaxKind) -> SyntaxToken {
        if self.at(kind) {
            return self.next_token();
        }
        let span = self.current().span.clone();
        let found = self.current().kind;
        self.diagnostics.push(Diagnostic::new(
            span.clone(),
            format!("Unexpected token <{:?}>, expected <{:?}>", found, kind),
        ));
        let token = SyntaxToken::missing(kind, span.start);
        self.last_consumed = Some(token.clone());
        token
    }

    fn parse_compilation_unit(&mut self) -> CompilationUnit {
        let mut members = Vec::new();
        let mut last_token = None;
        while !self.at(SyntaxKind::EndOfFile) {
            let start = self.position;
            members.push(self.parse_member());
            last_token = self.last_consumed.clone();
            // Skip a token the member could not use, so parsing always advances.
            if self.position == start {
                self.next_token();
            }
        }
        let end_of_file = self.current().clone();
        CompilationUnit {
            members,
            last_token,
            end_of_file,
        }
    }

    fn parse_member(&mut self) -> Member {
        if self.at(SyntaxKind::FunctionKeyword) {
            Member::Function(self.parse_function_declaration())
        } else {
            Member::Statement(self.parse_statement())
        }
    }

    fn parse_function_declaration(&mut self) -> FunctionDeclaration {
        let keyword = self.match_token(SyntaxKind::FunctionKeyword);
        let identifier = self.match_token(SyntaxKind::Identifier);
        self.match_token(SyntaxKind::OpenParen);
        let mut parameters = Vec::new();
        while !self.at(SyntaxKind::CloseParen) && !self.at(SyntaxKind::EndOfFile) {
            parameters.push(self.match_token(SyntaxKind::Identifier));
            if self.at(SyntaxKind::Comma) {
                self.next_token();
            } else {
                break;
            }
        }
        self.match_token(SyntaxKind::CloseParen);
        let body = self.parse_block();
        FunctionDeclaration {
            keyword,
            identifier,
            parameters,
            body,
        }
    }

    fn parse_block(&mut self) -> Block {
        let open = self.match_token(SyntaxKind::OpenBrace);
        let mut statements = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) && !self.at(SyntaxKind::EndOfFile) {
            let start = self.position;
            statements.push(self.parse_statement());
            if self.position == start {
                self.next_token();
            }
        }
        let close = self.match_token(SyntaxKind::CloseBrace);
        Block {
            open,
            statements,
            close,
        }
    }

    fn parse_statement(&mut self) -> Statement {
        if self.depth >= MAX_NESTING_DEPTH {
            return Statement::Expression(self.too_deep());
        }
        self.depth += 1;
        let statement = self.parse_statement_kind();
        self.depth -= 1;
        statement
    }

    fn parse_statement_kind(&mut self) -> Statement {
        match self.current().kind {
            SyntaxKind::OpenBrace => Statement::Block(self.parse_block()),
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword => {
                let keyword = self.next_token();
                let identifier = self.match_token(SyntaxKind::Identifier);
                self.match_token(SyntaxKind::Equals);
                let initializer = self.parse_expression();
                Statement::Variable {
                    keyword,
                    identifier,
                    initializer,
                }
            }
            SyntaxKind::IfKeyword => {
                let keyword = self.next_token();
                let condition = self.parse_expression();
                let then = Box::new(self.parse_statement());
                let otherwise = if self.at(SyntaxKind::ElseKeyword) {
                    self.next_token();
                    Some(Box::new(self.parse_statement()))
                } else {
                    None
                };
                Statement::If {
                    keyword,
                    condition,
                    then,
                    otherwise,
                }
            }
            SyntaxKind::WhileKeyword => {
                let keyword = self.next_token();
                let condition = self.parse_expression();
                let body = Box::new(self.parse_statement());
                Statement::While {
                    keyword,
                    condition,
                    body,
                }
            }
            SyntaxKind::ReturnKeyword => {
                let keyword = self.next_token();
                let expression = if self.at(SyntaxKind::CloseBrace) || self.at(SyntaxKind::EndOfFile)
                {
                    None
                } else {
                    Some(self.parse_expression())
                };
                Statement::Return {
                    keyword,
                    expression,
                }
            }
            _ => Statement::Expression(self.parse_expression()),
        }
    }

    fn parse_expression(&mut self) -> Expression {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> Expression {
        if self.at(SyntaxKind::Identifier) && self.peek(1).kind == SyntaxKind::Equals {
            let identifier = self.next_token();
            self.next_token();
            let expression = Box::new(self.parse_expression());
            return Expression::Assignment {
                identifier,
                expression,
            };
        }
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, parent_precedence: u8) -> Expression {
        let unary_precedence = self.current().kind.unary_precedence();
        let mut left = if unary_precedence != 0 && unary_precedence >= parent_precedence {
            let operator = self.next_token();
            let operand = Box::new(self.nested(|parser| parser.parse_binary(unary_precedence)));
            Expression::Unary { operator, operand }
        } else {
            self.parse_primary()
        };

        loop {
            let precedence = self.current().kind.binary_precedence();
            if precedence == 0 || precedence <= parent_precedence {
                break;
            }
            let operator = self.next_token();
            let right = Box::new(self.parse_binary(precedence));
            left = Expression::Binary {
                left: Box::new(left),
                operator,
                right,
            };
        }
        left
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Expression) -> Expression {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.too_deep();
        }
        self.depth += 1;
        let expression = parse(self);
        self.depth -= 1;
        expression
    }

    /// Stands in a missing identifier for a construct nested past
    /// `MAX_NESTING_DEPTH`. Nothing is consumed.
    fn too_deep(&mut self) -> Expression {
        let span = self.current().span.clone();
        self.diagnostics
            .push(Diagnostic::new(span.clone(), "Input is nested too deeply"));
        let identifier = SyntaxToken::missing(SyntaxKind::Identifier, span.start);
        self.last_consumed = Some(identifier.clone());
        Expression::Name { identifier }
    }

    fn parse_primary(&mut self) -> Expression {
        match self.current().kind {
            SyntaxKind::OpenParen => {
                let open = self.next_token();
                let expression = Box::new(self.parse_expression());
                let close = self.match_token(SyntaxKind::CloseParen);
                Expression::Parenthesized {
                    open,
                    expression,
                    close,
                }
            }
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                let token = self.next_token();
                let value = Value::Boolean(token.kind == SyntaxKind::TrueKeyword);
                Expression::Literal { token, value }
            }
            SyntaxKind::Number => {
                let token = self.next_token();
                // Out-of-range literals were already reported by the lexer.
                let value = Value::Integer(token.text.parse().unwrap_or(0));
                Expression::Literal { token, value }
            }
            SyntaxKind::String => {
                let token = self.next_token();
                let value = Value::String(unescape(&token.text));
                Expression::Literal { token, value }
            }
            SyntaxKind::Identifier if self.peek(1).kind == SyntaxKind::OpenParen => {
                let identifier = self.next_token();
                self.next_token();
                let mut arguments = Vec::new();
                while !self.at(SyntaxKind::CloseParen) && !self.at(SyntaxKind::EndOfFile) {
                    arguments.push(self.parse_expression());
                    if self.at(SyntaxKind::Comma) {
                        self.next_token();
                    } else {
                        break;
                    }
                }
                let close = self.match_token(SyntaxKind::CloseParen);
                Expression::Call {
                    identifier,
                    arguments,
                    close,
                }
            }
            _ => Expression::Name {
                identifier: self.match_token(SyntaxKind::Identifier),
            },
        }
    }
}

/// Strips the quotes of a string literal and resolves its escapes.
fn unescape(literal: &str) -> String {
    let inner = literal.strip_prefix('"').unwrap_or(literal);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some(other) => value.push(other),
            None => {}
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_is_missing(text: &str) -> Option<bool> {
        parse(text).0.last_token.map(|token| token.is_missing)
    }

    #[test]
    fn test_complete_declaration() {
        let (unit, diagnostics) = parse("var x = 1");
        assert!(diagnostics.is_empty());
        assert_eq!(unit.members.len(), 1);
        assert_eq!(last_is_missing("var x = 1"), Some(false));
    }

    #[test]
    fn test_dangling_operator_ends_with_missing_token() {
        assert_eq!(last_is_missing("1 +"), Some(true));
    }

    #[test]
    fn test_open_block_ends_with_missing_token() {
        assert_eq!(last_is_missing("function f(a) {\n  return a"), Some(true));
        assert_eq!(last_is_missing("function f(a) {\n  return a\n}"), Some(false));
        assert_eq!(last_is_missing("if true {"), Some(true));
    }

    #[test]
    fn test_empty_text_has_no_members() {
        let (unit, diagnostics) = parse("  // nothing here\n");
        assert!(unit.members.is_empty());
        assert!(unit.last_token.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_precedence() {
        let (unit, _) = parse("1 + 2 * 3");
        let Member::Statement(Statement::Expression(Expression::Binary { operator, right, .. })) =
            &unit.members[0]
        else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator.kind, SyntaxKind::Plus);
        assert!(matches!(**right, Expression::Binary { .. }));
    }

    #[test]
    fn test_stray_token_does_not_loop() {
        let (unit, diagnostics) = parse(") )");
        assert!(!diagnostics.is_empty());
        assert!(!unit.members.is_empty());
    }

    #[test]
    fn test_skipped_stray_token_is_not_the_last_token() {
        assert_eq!(last_is_missing(")"), Some(true));
        assert_eq!(last_is_missing("1 + )"), Some(true));
        assert_eq!(last_is_missing("}"), Some(true));
        assert_eq!(last_is_missing("1 )\n2"), Some(false));
    }

    #[test]
    fn test_deep_nesting_is_reported() {
        let text = "(".repeat(10_000);
        let (unit, diagnostics) = parse(&text);
        assert!(
            diagnostics
                .iter()
                .any(|diagnostic| diagnostic.message == "Input is nested too deeply")
        );
        assert!(unit.last_token.unwrap().is_missing);

        let blocks = "{".repeat(10_000);
        assert_eq!(last_is_missing(&blocks), Some(true));
        assert_eq!(last_is_missing(&"-".repeat(10_000)), Some(true));
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let text = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        let (_, diagnostics) = parse(&text);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""a\"b\n""#), "a\"b\n");
        assert_eq!(unescape("\"open"), "open");
    }
}
