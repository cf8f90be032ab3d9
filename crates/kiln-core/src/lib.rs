pub mod config;
pub mod engine;
pub mod error;
pub mod submission;

// Re-export common error type
pub use error::{KilnError, Result};

pub use config::ReplConfig;
pub use engine::{
    Compilation, Diagnostic, Engine, Evaluation, Symbol, SymbolKind, SyntaxTree, Token, TokenKind,
    Value, VariableId, Variables,
};
pub use submission::SubmissionRepository;
