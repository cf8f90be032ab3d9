//! Syntax nodes produced by the parser.

use std::io::{self, Write};
use std::ops::Range;

use kiln_core::Value;

use crate::lexer::SyntaxToken;

#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub members: Vec<Member>,
    /// Last token consumed or synthesized by the final member.
    pub last_token: Option<SyntaxToken>,
    pub end_of_file: SyntaxToken,
}

#[derive(Debug, Clone)]
pub enum Member {
    Function(FunctionDeclaration),
    Statement(Statement),
}

#[derive(Debug, Clone)]
pub struct FunctionDeclaration {
    pub keyword: SyntaxToken,
    pub identifier: SyntaxToken,
    pub parameters: Vec<SyntaxToken>,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub open: SyntaxToken,
    pub statements: Vec<Statement>,
    pub close: SyntaxToken,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Block(Block),
    Variable {
        keyword: SyntaxToken,
        identifier: SyntaxToken,
        initializer: Expression,
    },
    If {
        keyword: SyntaxToken,
        condition: Expression,
        then: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },
    While {
        keyword: SyntaxToken,
        condition: Expression,
        body: Box<Statement>,
    },
    Return {
        keyword: SyntaxToken,
        expression: Option<Expression>,
    },
    Expression(Expression),
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal {
        token: SyntaxToken,
        value: Value,
    },
    Name {
        identifier: SyntaxToken,
    },
    Assignment {
        identifier: SyntaxToken,
        expression: Box<Expression>,
    },
    Unary {
        operator: SyntaxToken,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: SyntaxToken,
        right: Box<Expression>,
    },
    Parenthesized {
        open: SyntaxToken,
        expression: Box<Expression>,
        close: SyntaxToken,
    },
    Call {
        identifier: SyntaxToken,
        arguments: Vec<Expression>,
        close: SyntaxToken,
    },
}

impl Expression {
    pub fn span(&self) -> Range<usize> {
        match self {
            Expression::Literal { token, .. } => token.span.clone(),
            Expression::Name { identifier } => identifier.span.clone(),
            Expression::Assignment {
                identifier,
                expression,
            } => identifier.span.start..expression.span().end,
            Expression::Unary { operator, operand } => operator.span.start..operand.span().end,
            Expression::Binary { left, right, .. } => left.span().start..right.span().end,
            Expression::Parenthesized { open, close, .. } => open.span.start..close.span.end,
            Expression::Call {
                identifier, close, ..
            } => identifier.span.start..close.span.end,
        }
    }
}

// ============================================================================
// Tree printing
// ============================================================================

fn write_token(out: &mut dyn Write, indent: usize, token: &SyntaxToken) -> io::Result<()> {
    if token.is_missing {
        writeln!(out, "{:indent$}{:?} (missing)", "", token.kind, indent = indent)
    } else {
        writeln!(
            out,
            "{:indent$}{:?} {:?}",
            "",
            token.kind,
            token.text,
            indent = indent
        )
    }
}

fn write_node(out: &mut dyn Write, indent: usize, name: &str) -> io::Result<()> {
    writeln!(out, "{:indent$}{}", "", name, indent = indent)
}

impl CompilationUnit {
    pub fn write_tree(&self, out: &mut dyn Write) -> io::Result<()> {
        write_node(out, 0, "CompilationUnit")?;
        for member in &self.members {
            match member {
                Member::Function(function) => function.write_tree(out, 2)?,
                Member::Statement(statement) => statement.write_tree(out, 2)?,
            }
        }
        write_token(out, 2, &self.end_of_file)
    }
}

impl FunctionDeclaration {
    fn write_tree(&self, out: &mut dyn Write, indent: usize) -> io::Result<()> {
        write_node(out, indent, "FunctionDeclaration")?;
        write_token(out, indent + 2, &self.keyword)?;
        write_token(out, indent + 2, &self.identifier)?;
        for parameter in &self.parameters {
            write_node(out, indent + 2, "Parameter")?;
            write_token(out, indent + 4, parameter)?;
        }
        self.body.write_tree(out, indent + 2)
    }
}

impl Block {
    fn write_tree(&self, out: &mut dyn Write, indent: usize) -> io::Result<()> {
        write_node(out, indent, "BlockStatement")?;
        write_token(out, indent + 2, &self.open)?;
        for statement in &self.statements {
            statement.write_tree(out, indent + 2)?;
        }
        write_token(out, indent + 2, &self.close)
    }
}

impl Statement {
    fn write_tree(&self, out: &mut dyn Write, indent: usize) -> io::Result<()> {
        let inner = indent + 2;
        match self {
            Statement::Block(block) => block.write_tree(out, indent),
            Statement::Variable {
                keyword,
                identifier,
                initializer,
            } => {
                write_node(out, indent, "VariableDeclaration")?;
                write_token(out, inner, keyword)?;
                write_token(out, inner, identifier)?;
                initializer.write_tree(out, inner)
            }
            Statement::If {
                keyword,
                condition,
                then,
                otherwise,
            } => {
                write_node(out, indent, "IfStatement")?;
                write_token(out, inner, keyword)?;
                condition.write_tree(out, inner)?;
                then.write_tree(out, inner)?;
                if let Some(otherwise) = otherwise {
                    write_node(out, inner, "ElseClause")?;
                    otherwise.write_tree(out, inner + 2)?;
                }
                Ok(())
            }
            Statement::While {
                keyword,
                condition,
                body,
            } => {
                write_node(out, indent, "WhileStatement")?;
                write_token(out, inner, keyword)?;
                condition.write_tree(out, inner)?;
                body.write_tree(out, inner)
            }
            Statement::Return {
                keyword,
                expression,
            } => {
                write_node(out, indent, "ReturnStatement")?;
                write_token(out, inner, keyword)?;
                match expression {
                    Some(expression) => expression.write_tree(out, inner),
                    None => Ok(()),
                }
            }
            Statement::Expression(expression) => {
                write_node(out, indent, "ExpressionStatement")?;
                expression.write_tree(out, inner)
            }
        }
    }
}

impl Expression {
    fn write_tree(&self, out: &mut dyn Write, indent: usize) -> io::Result<()> {
        let inner = indent + 2;
        match self {
            Expression::Literal { token, .. } => {
                write_node(out, indent, "LiteralExpression")?;
                write_token(out, inner, token)
            }
            Expression::Name { identifier } => {
                write_node(out, indent, "NameExpression")?;
                write_token(out, inner, identifier)
            }
            Expression::Assignment {
                identifier,
                expression,
            } => {
                write_node(out, indent, "AssignmentExpression")?;
                write_token(out, inner, identifier)?;
                expression.write_tree(out, inner)
            }
            Expression::Unary { operator, operand } => {
                write_node(out, indent, "UnaryExpression")?;
                write_token(out, inner, operator)?;
                operand.write_tree(out, inner)
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                write_node(out, indent, "BinaryExpression")?;
                left.write_tree(out, inner)?;
                write_token(out, inner, operator)?;
                right.write_tree(out, inner)
            }
            Expression::Parenthesized {
                open,
                expression,
                close,
            } => {
                write_node(out, indent, "ParenthesizedExpression")?;
                write_token(out, inner, open)?;
                expression.write_tree(out, inner)?;
                write_token(out, inner, close)
            }
            Expression::Call {
                identifier,
                arguments,
                close,
            } => {
                write_node(out, indent, "CallExpression")?;
                write_token(out, inner, identifier)?;
                for argument in arguments {
                    argument.write_tree(out, inner)?;
                }
                write_token(out, inner, close)
            }
        }
    }
}
