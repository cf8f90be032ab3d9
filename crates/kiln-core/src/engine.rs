//! The boundary between the shell and a language engine.
//!
//! The shell never looks inside a compilation: it parses text, chains a new
//! compilation off the previous one, evaluates it against the session's
//! variables and asks it for its symbols. Everything else belongs to the
//! engine implementing these traits.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::ops::Range;
use std::sync::Arc;

/// Display class of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Punctuation,
    Whitespace,
    Comment,
    /// Text the lexer could not classify.
    Bad,
    EndOfFile,
}

/// A lexical unit of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte range of the token in the text it was lexed from.
    pub span: Range<usize>,
    /// Set when the parser manufactured the token because the real one was absent.
    pub is_missing: bool,
}

/// An error or warning produced while parsing, binding or evaluating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Range<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl Value {
    /// Name of the value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
        }
    }
}

/// Identity of a global variable.
///
/// `generation` is the depth of the declaring submission in the compilation
/// chain and `ordinal` the declaration order inside it, so replaying the same
/// submissions reproduces the same identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    pub generation: usize,
    pub ordinal: usize,
}

/// Values of global variables, carried from one submission to the next.
pub type Variables = HashMap<VariableId, Value>;

/// Symbol categories, in the order `ls` lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Function,
    Variable,
}

/// A symbol visible in a compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Source-like rendering, e.g. `function add(a, b)` or `let limit`.
    pub signature: String,
}

/// Outcome of evaluating a compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub value: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A parsed submission.
pub trait SyntaxTree {
    /// Last token of the last top-level member, never the end-of-input marker.
    ///
    /// Returns `None` when the text has no members.
    fn last_member_token(&self) -> Option<&Token>;

    fn write_tree(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

/// An immutable compilation covering every submission accepted so far.
pub trait Compilation {
    /// Symbols visible at the end of this compilation.
    fn symbols(&self) -> Vec<Symbol>;

    /// Runs this compilation's own submission against `variables`.
    ///
    /// On failure `variables` may have been partially updated; callers that
    /// need all-or-nothing semantics restore their own snapshot.
    fn evaluate(&self, variables: &mut Variables) -> Evaluation;

    /// Writes the bound program, or one function's body when `function` is given.
    fn emit_tree(&self, function: Option<&Symbol>, out: &mut dyn io::Write) -> io::Result<()>;
}

/// A language engine.
pub trait Engine {
    type Tree: SyntaxTree;
    type Compilation: Compilation;

    /// Tokenizes one line, trivia included. Never fails.
    fn parse_tokens(&self, line: &str) -> Vec<Token>;

    /// Parses a whole submission. Never fails; problems become diagnostics.
    fn parse(&self, text: &str) -> Self::Tree;

    /// A compilation with no submissions.
    fn empty_compilation(&self) -> Arc<Self::Compilation>;

    /// Builds a compilation for `tree` on top of `previous`.
    fn chain(
        &self,
        previous: Option<Arc<Self::Compilation>>,
        tree: Self::Tree,
    ) -> Arc<Self::Compilation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::String("hi".to_string()).to_string(), "hi");
    }

    #[test]
    fn test_symbol_kind_ordering() {
        let mut kinds = vec![SymbolKind::Variable, SymbolKind::Function];
        kinds.sort();
        assert_eq!(kinds, vec![SymbolKind::Function, SymbolKind::Variable]);
    }
}
