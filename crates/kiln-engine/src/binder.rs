//! Name resolution and semantic checks.
//!
//! Binding turns one submission's syntax into a [`BoundProgram`] on top of the
//! global scope left by the previous submissions. Earlier declarations stay
//! visible until a later submission shadows them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;
use std::sync::Arc;

use kiln_core::{Diagnostic, Value, VariableId};

use crate::ast::{Block, CompilationUnit, Expression, FunctionDeclaration, Member, Statement};
use crate::lexer::{SyntaxKind, SyntaxToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId {
    pub generation: usize,
    pub ordinal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Global(VariableId),
    /// Index into the current call frame.
    Local(usize),
}

#[derive(Debug, Clone)]
pub struct VariableRef {
    pub name: String,
    pub slot: Slot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Print => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    Function(FunctionId),
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Identity,
    Negate,
    Not,
}

impl UnaryOp {
    fn from_kind(kind: SyntaxKind) -> Self {
        match kind {
            SyntaxKind::Minus => Self::Negate,
            SyntaxKind::Bang => Self::Not,
            _ => Self::Identity,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Identity => "+",
            Self::Negate => "-",
            Self::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
    And,
    Or,
}

impl BinaryOp {
    fn from_kind(kind: SyntaxKind) -> Option<Self> {
        let op = match kind {
            SyntaxKind::Plus => Self::Add,
            SyntaxKind::Minus => Self::Subtract,
            SyntaxKind::Star => Self::Multiply,
            SyntaxKind::Slash => Self::Divide,
            SyntaxKind::Percent => Self::Remainder,
            SyntaxKind::EqualsEquals => Self::Equals,
            SyntaxKind::BangEquals => Self::NotEquals,
            SyntaxKind::Less => Self::Less,
            SyntaxKind::LessEquals => Self::LessOrEquals,
            SyntaxKind::Greater => Self::Greater,
            SyntaxKind::GreaterEquals => Self::GreaterOrEquals,
            SyntaxKind::AmpersandAmpersand => Self::And,
            SyntaxKind::PipePipe => Self::Or,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Less => "<",
            Self::LessOrEquals => "<=",
            Self::Greater => ">",
            Self::GreaterOrEquals => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
pub enum BoundStatement {
    Block(Vec<BoundStatement>),
    Variable {
        variable: VariableRef,
        read_only: bool,
        initializer: BoundExpression,
    },
    If {
        condition: BoundExpression,
        then: Box<BoundStatement>,
        otherwise: Option<Box<BoundStatement>>,
    },
    While {
        condition: BoundExpression,
        body: Box<BoundStatement>,
    },
    Return(Option<BoundExpression>),
    Expression(BoundExpression),
}

#[derive(Debug, Clone)]
pub enum BoundExpression {
    /// Stands in for an expression that failed to bind; never evaluated.
    Error,
    Literal(Value),
    Variable {
        variable: VariableRef,
        span: Range<usize>,
    },
    Assignment {
        variable: VariableRef,
        expression: Box<BoundExpression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<BoundExpression>,
        span: Range<usize>,
    },
    Binary {
        left: Box<BoundExpression>,
        op: BinaryOp,
        right: Box<BoundExpression>,
        span: Range<usize>,
    },
    Call {
        name: String,
        callee: Callee,
        arguments: Vec<BoundExpression>,
        span: Range<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalVariable {
    pub id: VariableId,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub id: FunctionId,
    pub name: String,
    pub parameters: Vec<String>,
}

impl FunctionSymbol {
    pub fn signature(&self) -> String {
        format!("function {}({})", self.name, self.parameters.join(", "))
    }
}

#[derive(Debug, Clone)]
pub struct BoundFunction {
    pub symbol: FunctionSymbol,
    /// Frame size: parameters first, then every local declared in the body.
    pub locals: usize,
    pub body: Vec<BoundStatement>,
}

/// Names visible at the top level after a submission.
#[derive(Debug, Clone, Default)]
pub struct GlobalScope {
    pub variables: BTreeMap<String, GlobalVariable>,
    pub functions: BTreeMap<String, FunctionSymbol>,
}

#[derive(Debug, Clone, Default)]
pub struct BoundProgram {
    pub scope: GlobalScope,
    /// Functions declared by this submission.
    pub functions: Vec<Arc<BoundFunction>>,
    pub statements: Vec<BoundStatement>,
    /// Frame size for locals declared in top-level blocks.
    pub locals: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn bind(previous: &GlobalScope, generation: usize, unit: &CompilationUnit) -> BoundProgram {
    let mut binder = Binder {
        generation,
        scope: previous.clone(),
        declared: HashSet::new(),
        next_variable: 0,
        scopes: Vec::new(),
        locals: 0,
        in_function: false,
        diagnostics: Vec::new(),
    };

    let mut declarations = Vec::new();
    for member in &unit.members {
        if let Member::Function(declaration) = member
            && let Some(symbol) = binder.declare_function(declaration, declarations.len())
        {
            declarations.push((symbol, declaration));
        }
    }

    let mut statements = Vec::new();
    for member in &unit.members {
        if let Member::Statement(statement) = member {
            statements.push(binder.bind_statement(statement));
        }
    }
    let locals = binder.locals;

    let functions = declarations
        .into_iter()
        .map(|(symbol, declaration)| Arc::new(binder.bind_function(symbol, declaration)))
        .collect();

    BoundProgram {
        scope: binder.scope,
        functions,
        statements,
        locals,
        diagnostics: binder.diagnostics,
    }
}

#[derive(Debug, Clone, Copy)]
struct LocalVariable {
    slot: usize,
    read_only: bool,
}

struct Binder {
    generation: usize,
    scope: GlobalScope,
    /// Global names declared by this submission.
    declared: HashSet<String>,
    next_variable: usize,
    /// Block scopes; empty at the top level.
    scopes: Vec<HashMap<String, LocalVariable>>,
    locals: usize,
    in_function: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Binder {
    fn report(&mut self, span: Range<usize>, message: String) {
        self.diagnostics.push(Diagnostic::new(span, message));
    }

    fn declare_function(
        &mut self,
        declaration: &FunctionDeclaration,
        ordinal: usize,
    ) -> Option<FunctionSymbol> {
        let identifier = &declaration.identifier;
        if identifier.is_missing {
            return None;
        }
        let name = identifier.text.clone();
        if !self.declared.insert(name.clone()) {
            self.report(
                identifier.span.clone(),
                format!("'{}' is already declared", name),
            );
            return None;
        }
        let symbol = FunctionSymbol {
            id: FunctionId {
                generation: self.generation,
                ordinal,
            },
            name: name.clone(),
            parameters: declaration
                .parameters
                .iter()
                .map(|parameter| parameter.text.clone())
                .collect(),
        };
        self.scope.variables.remove(&name);
        self.scope.functions.insert(name, symbol.clone());
        Some(symbol)
    }

    fn bind_function(
        &mut self,
        symbol: FunctionSymbol,
        declaration: &FunctionDeclaration,
    ) -> BoundFunction {
        self.in_function = true;
        self.locals = 0;
        self.scopes = vec![HashMap::new()];
        for parameter in &declaration.parameters {
            if parameter.is_missing {
                continue;
            }
            self.declare_variable(parameter, false);
        }
        let body = self.bind_block(&declaration.body);
        let locals = self.locals;
        self.scopes.clear();
        self.in_function = false;
        BoundFunction {
            symbol,
            locals,
            body,
        }
    }

    fn declare_variable(&mut self, identifier: &SyntaxToken, read_only: bool) -> Slot {
        let name = identifier.text.clone();
        if let Some(scope) = self.scopes.last_mut() {
            let slot = self.locals;
            self.locals += 1;
            if scope
                .insert(name.clone(), LocalVariable { slot, read_only })
                .is_some()
                && !identifier.is_missing
            {
                self.report(
                    identifier.span.clone(),
                    format!("'{}' is already declared", name),
                );
            }
            return Slot::Local(slot);
        }

        if !identifier.is_missing && !self.declared.insert(name.clone()) {
            self.report(
                identifier.span.clone(),
                format!("'{}' is already declared", name),
            );
        }
        let id = VariableId {
            generation: self.generation,
            ordinal: self.next_variable,
        };
        self.next_variable += 1;
        self.scope.functions.remove(&name);
        self.scope
            .variables
            .insert(name, GlobalVariable { id, read_only });
        Slot::Global(id)
    }

    fn lookup_variable(&self, name: &str) -> Option<(Slot, bool)> {
        for scope in self.scopes.iter().rev() {
            if let Some(local) = scope.get(name) {
                return Some((Slot::Local(local.slot), local.read_only));
            }
        }
        self.scope
            .variables
            .get(name)
            .map(|global| (Slot::Global(global.id), global.read_only))
    }

    fn bind_block(&mut self, block: &Block) -> Vec<BoundStatement> {
        self.scopes.push(HashMap::new());
        let statements = block
            .statements
            .iter()
            .map(|statement| self.bind_statement(statement))
            .collect();
        self.scopes.pop();
        statements
    }

    fn bind_statement(&mut self, statement: &Statement) -> BoundStatement {
        match statement {
            Statement::Block(block) => BoundStatement::Block(self.bind_block(block)),
            Statement::Variable {
                keyword,
                identifier,
                initializer,
            } => {
                // Bound first so `var x = x + 1` reads the shadowed `x`.
                let initializer = self.bind_expression(initializer);
                let read_only = keyword.kind == SyntaxKind::LetKeyword;
                let slot = self.declare_variable(identifier, read_only);
                BoundStatement::Variable {
                    variable: VariableRef {
                        name: identifier.text.clone(),
                        slot,
                    },
                    read_only,
                    initializer,
                }
            }
            Statement::If {
                condition,
                then,
                otherwise,
                ..
            } => BoundStatement::If {
                condition: self.bind_expression(condition),
                then: Box::new(self.bind_statement(then)),
                otherwise: otherwise
                    .as_ref()
                    .map(|otherwise| Box::new(self.bind_statement(otherwise))),
            },
            Statement::While {
                condition, body, ..
            } => BoundStatement::While {
                condition: self.bind_expression(condition),
                body: Box::new(self.bind_statement(body)),
            },
            Statement::Return {
                keyword,
                expression,
            } => {
                if !self.in_function {
                    self.report(
                        keyword.span.clone(),
                        "The 'return' keyword can only be used inside functions".to_string(),
                    );
                }
                BoundStatement::Return(
                    expression
                        .as_ref()
                        .map(|expression| self.bind_expression(expression)),
                )
            }
            Statement::Expression(expression) => {
                BoundStatement::Expression(self.bind_expression(expression))
            }
        }
    }

    fn bind_expression(&mut self, expression: &Expression) -> BoundExpression {
        match expression {
            Expression::Literal { value, .. } => BoundExpression::Literal(value.clone()),
            Expression::Name { identifier } => {
                if identifier.is_missing {
                    return BoundExpression::Error;
                }
                match self.lookup_variable(&identifier.text) {
                    Some((slot, _)) => BoundExpression::Variable {
                        variable: VariableRef {
                            name: identifier.text.clone(),
                            slot,
                        },
                        span: identifier.span.clone(),
                    },
                    None => {
                        self.report(
                            identifier.span.clone(),
                            format!("Variable '{}' doesn't exist", identifier.text),
                        );
                        BoundExpression::Error
                    }
                }
            }
            Expression::Assignment {
                identifier,
                expression,
            } => {
                let bound = self.bind_expression(expression);
                match self.lookup_variable(&identifier.text) {
                    Some((_, true)) => {
                        self.report(
                            identifier.span.clone(),
                            format!(
                                "Variable '{}' is read-only and cannot be assigned to",
                                identifier.text
                            ),
                        );
                        BoundExpression::Error
                    }
                    Some((slot, false)) => BoundExpression::Assignment {
                        variable: VariableRef {
                            name: identifier.text.clone(),
                            slot,
                        },
                        expression: Box::new(bound),
                    },
                    None => {
                        self.report(
                            identifier.span.clone(),
                            format!("Variable '{}' doesn't exist", identifier.text),
                        );
                        BoundExpression::Error
                    }
                }
            }
            Expression::Unary { operator, operand } => BoundExpression::Unary {
                op: UnaryOp::from_kind(operator.kind),
                operand: Box::new(self.bind_expression(operand)),
                span: expression.span(),
            },
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.bind_expression(left);
                let right = self.bind_expression(right);
                match BinaryOp::from_kind(operator.kind) {
                    Some(op) => BoundExpression::Binary {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                        span: expression.span(),
                    },
                    None => BoundExpression::Error,
                }
            }
            Expression::Parenthesized { expression, .. } => self.bind_expression(expression),
            Expression::Call {
                identifier,
                arguments,
                ..
            } => self.bind_call(identifier, arguments, expression.span()),
        }
    }

    fn bind_call(
        &mut self,
        identifier: &SyntaxToken,
        arguments: &[Expression],
        span: Range<usize>,
    ) -> BoundExpression {
        let arguments: Vec<BoundExpression> = arguments
            .iter()
            .map(|argument| self.bind_expression(argument))
            .collect();
        let name = identifier.text.as_str();

        let resolved = match self.scope.functions.get(name) {
            Some(function) => Some((Callee::Function(function.id), function.parameters.len())),
            None => Builtin::lookup(name).map(|builtin| (Callee::Builtin(builtin), builtin.arity())),
        };
        let Some((callee, arity)) = resolved else {
            let message = if self.lookup_variable(name).is_some() {
                format!("'{}' is not a function", name)
            } else {
                format!("Function '{}' doesn't exist", name)
            };
            self.report(identifier.span.clone(), message);
            return BoundExpression::Error;
        };

        if arguments.len() != arity {
            self.report(
                span,
                format!(
                    "Function '{}' requires {} arguments but was given {}",
                    name,
                    arity,
                    arguments.len()
                ),
            );
            return BoundExpression::Error;
        }

        BoundExpression::Call {
            name: name.to_string(),
            callee,
            arguments,
            span,
        }
    }
}
