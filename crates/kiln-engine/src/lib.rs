//! Reference language engine for the Kiln shell.
//!
//! A small statement language with integers, booleans, strings, global and
//! local variables, functions and control flow. Each submission is bound on
//! top of the previous one so declarations accumulate across a session.

pub mod ast;
pub mod binder;
pub mod compilation;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;

use std::sync::Arc;

use kiln_core::{Engine, Token};

pub use compilation::{KilnCompilation, ParsedTree};

#[derive(Debug, Clone, Copy, Default)]
pub struct KilnEngine;

impl KilnEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for KilnEngine {
    type Tree = ParsedTree;
    type Compilation = KilnCompilation;

    fn parse_tokens(&self, line: &str) -> Vec<Token> {
        let (tokens, _) = lexer::tokenize(line);
        tokens.iter().map(|token| token.to_token()).collect()
    }

    fn parse(&self, text: &str) -> ParsedTree {
        ParsedTree::parse(text)
    }

    fn empty_compilation(&self) -> Arc<KilnCompilation> {
        Arc::new(KilnCompilation::empty())
    }

    fn chain(&self, previous: Option<Arc<KilnCompilation>>, tree: ParsedTree) -> Arc<KilnCompilation> {
        Arc::new(KilnCompilation::chain(previous, tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{Compilation, TokenKind, Value, Variables};

    #[test]
    fn test_parse_tokens_classifies_line() {
        let engine = KilnEngine::new();
        let kinds: Vec<TokenKind> = engine
            .parse_tokens("let s = \"hi\" // note")
            .into_iter()
            .map(|token| token.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Punctuation,
                TokenKind::Whitespace,
                TokenKind::String,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_chain_from_empty() {
        let engine = KilnEngine::new();
        let empty = engine.empty_compilation();
        assert!(empty.symbols().is_empty());

        let mut variables = Variables::new();
        let first = engine.chain(Some(empty), engine.parse("let answer = 42"));
        assert!(first.evaluate(&mut variables).diagnostics.is_empty());
        let second = engine.chain(Some(first), engine.parse("answer"));
        assert_eq!(
            second.evaluate(&mut variables).value,
            Some(Value::Integer(42))
        );
    }
}
