//! Tree-walking evaluator over bound programs.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use kiln_core::{Diagnostic, Value, Variables};

use crate::binder::{
    BinaryOp, BoundExpression, BoundFunction, BoundStatement, Builtin, Callee, FunctionId, Slot,
    UnaryOp, VariableRef,
};

pub const MAX_CALL_DEPTH: usize = 256;

type Frame = Vec<Option<Value>>;

enum Flow {
    Normal,
    Return(Option<Value>),
}

pub struct Evaluator<'a> {
    functions: &'a HashMap<FunctionId, Arc<BoundFunction>>,
    globals: &'a mut Variables,
    depth: usize,
    last_value: Option<Value>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        functions: &'a HashMap<FunctionId, Arc<BoundFunction>>,
        globals: &'a mut Variables,
    ) -> Self {
        Self {
            functions,
            globals,
            depth: 0,
            last_value: None,
        }
    }

    /// Runs top-level statements and returns the value of the last top-level
    /// expression statement.
    pub fn run(
        mut self,
        statements: &[BoundStatement],
        locals: usize,
    ) -> Result<Option<Value>, Diagnostic> {
        let mut frame: Frame = vec![None; locals];
        for statement in statements {
            if let BoundStatement::Expression(expression) = statement {
                self.last_value = self.evaluate(expression, &mut frame)?;
                continue;
            }
            self.execute(statement, &mut frame)?;
        }
        Ok(self.last_value)
    }

    fn execute(&mut self, statement: &BoundStatement, frame: &mut Frame) -> Result<Flow, Diagnostic> {
        match statement {
            BoundStatement::Block(statements) => {
                for statement in statements {
                    if let Flow::Return(value) = self.execute(statement, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            BoundStatement::Variable {
                variable,
                initializer,
                ..
            } => {
                let value = self.evaluate_value(initializer, frame, 0..0)?;
                self.store(variable, value, frame);
                Ok(Flow::Normal)
            }
            BoundStatement::If {
                condition,
                then,
                otherwise,
            } => {
                if self.evaluate_condition(condition, frame)? {
                    self.execute(then, frame)
                } else if let Some(otherwise) = otherwise {
                    self.execute(otherwise, frame)
                } else {
                    Ok(Flow::Normal)
                }
            }
            BoundStatement::While { condition, body } => {
                while self.evaluate_condition(condition, frame)? {
                    if let Flow::Return(value) = self.execute(body, frame)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            BoundStatement::Return(expression) => {
                let value = match expression {
                    Some(expression) => self.evaluate(expression, frame)?,
                    None => None,
                };
                Ok(Flow::Return(value))
            }
            BoundStatement::Expression(expression) => {
                self.evaluate(expression, frame)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn evaluate_condition(
        &mut self,
        condition: &BoundExpression,
        frame: &mut Frame,
    ) -> Result<bool, Diagnostic> {
        match self.evaluate_value(condition, frame, 0..0)? {
            Value::Boolean(value) => Ok(value),
            other => Err(Diagnostic::new(
                span_of(condition),
                format!("Condition must be a boolean, not {}", other.type_name()),
            )),
        }
    }

    /// Evaluates an expression that must produce a value.
    fn evaluate_value(
        &mut self,
        expression: &BoundExpression,
        frame: &mut Frame,
        fallback: Range<usize>,
    ) -> Result<Value, Diagnostic> {
        self.evaluate(expression, frame)?.ok_or_else(|| {
            let span = span_of(expression);
            let span = if span.is_empty() { fallback } else { span };
            Diagnostic::new(span, "Expression does not produce a value")
        })
    }

    fn evaluate(
        &mut self,
        expression: &BoundExpression,
        frame: &mut Frame,
    ) -> Result<Option<Value>, Diagnostic> {
        match expression {
            BoundExpression::Error => Err(Diagnostic::new(0..0, "Cannot evaluate invalid code")),
            BoundExpression::Literal(value) => Ok(Some(value.clone())),
            BoundExpression::Variable { variable, span } => {
                let value = match variable.slot {
                    Slot::Global(id) => self.globals.get(&id).cloned(),
                    Slot::Local(slot) => frame.get(slot).cloned().flatten(),
                };
                value.map(Some).ok_or_else(|| {
                    Diagnostic::new(
                        span.clone(),
                        format!("Variable '{}' has no value", variable.name),
                    )
                })
            }
            BoundExpression::Assignment {
                variable,
                expression,
            } => {
                let value = self.evaluate_value(expression, frame, 0..0)?;
                self.store(variable, value.clone(), frame);
                Ok(Some(value))
            }
            BoundExpression::Unary { op, operand, span } => {
                let value = self.evaluate_value(operand, frame, span.clone())?;
                unary(*op, value, span).map(Some)
            }
            BoundExpression::Binary {
                left,
                op,
                right,
                span,
            } => self.evaluate_binary(left, *op, right, span, frame).map(Some),
            BoundExpression::Call {
                name,
                callee,
                arguments,
                span,
            } => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate_value(argument, frame, span.clone())?);
                }
                match callee {
                    Callee::Builtin(Builtin::Print) => {
                        for value in values {
                            println!("{}", value);
                        }
                        Ok(None)
                    }
                    Callee::Function(id) => self.call(name, *id, values, span),
                }
            }
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &BoundExpression,
        op: BinaryOp,
        right: &BoundExpression,
        span: &Range<usize>,
        frame: &mut Frame,
    ) -> Result<Value, Diagnostic> {
        let left = self.evaluate_value(left, frame, span.clone())?;
        // Short-circuit before touching the right operand.
        match (op, &left) {
            (BinaryOp::And, Value::Boolean(false)) => return Ok(Value::Boolean(false)),
            (BinaryOp::Or, Value::Boolean(true)) => return Ok(Value::Boolean(true)),
            _ => {}
        }
        let right = self.evaluate_value(right, frame, span.clone())?;
        binary(op, left, right, span)
    }

    fn call(
        &mut self,
        name: &str,
        id: FunctionId,
        arguments: Vec<Value>,
        span: &Range<usize>,
    ) -> Result<Option<Value>, Diagnostic> {
        let Some(function) = self.functions.get(&id).cloned() else {
            return Err(Diagnostic::new(
                span.clone(),
                format!("Function '{}' has no body", name),
            ));
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Diagnostic::new(
                span.clone(),
                format!("Maximum call depth of {} exceeded", MAX_CALL_DEPTH),
            ));
        }

        let mut frame: Frame = vec![None; function.locals.max(arguments.len())];
        for (slot, value) in arguments.into_iter().enumerate() {
            frame[slot] = Some(value);
        }

        self.depth += 1;
        let mut result = Ok(None);
        for statement in &function.body {
            match self.execute(statement, &mut frame) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(value)) => {
                    result = Ok(value);
                    break;
                }
                Err(diagnostic) => {
                    result = Err(diagnostic);
                    break;
                }
            }
        }
        self.depth -= 1;
        result
    }

    fn store(&mut self, variable: &VariableRef, value: Value, frame: &mut Frame) {
        match variable.slot {
            Slot::Global(id) => {
                self.globals.insert(id, value);
            }
            Slot::Local(slot) => {
                if slot >= frame.len() {
                    frame.resize(slot + 1, None);
                }
                frame[slot] = Some(value);
            }
        }
    }
}

fn span_of(expression: &BoundExpression) -> Range<usize> {
    match expression {
        BoundExpression::Variable { span, .. }
        | BoundExpression::Unary { span, .. }
        | BoundExpression::Binary { span, .. }
        | BoundExpression::Call { span, .. } => span.clone(),
        BoundExpression::Assignment { expression, .. } => span_of(expression),
        BoundExpression::Error | BoundExpression::Literal(_) => 0..0,
    }
}

fn unary(op: UnaryOp, value: Value, span: &Range<usize>) -> Result<Value, Diagnostic> {
    match (op, value) {
        (UnaryOp::Identity, Value::Integer(value)) => Ok(Value::Integer(value)),
        (UnaryOp::Negate, Value::Integer(value)) => value
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| Diagnostic::new(span.clone(), "Integer overflow")),
        (UnaryOp::Not, Value::Boolean(value)) => Ok(Value::Boolean(!value)),
        (op, value) => Err(Diagnostic::new(
            span.clone(),
            format!(
                "Unary operator '{}' is not defined for type {}",
                op.symbol(),
                value.type_name()
            ),
        )),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value, span: &Range<usize>) -> Result<Value, Diagnostic> {
    use Value::{Boolean, Integer};

    let overflow = || Diagnostic::new(span.clone(), "Integer overflow");
    let value = match (op, &left, &right) {
        (BinaryOp::Add, Integer(a), Integer(b)) => Integer(a.checked_add(*b).ok_or_else(overflow)?),
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
        (BinaryOp::Subtract, Integer(a), Integer(b)) => {
            Integer(a.checked_sub(*b).ok_or_else(overflow)?)
        }
        (BinaryOp::Multiply, Integer(a), Integer(b)) => {
            Integer(a.checked_mul(*b).ok_or_else(overflow)?)
        }
        (BinaryOp::Divide | BinaryOp::Remainder, Integer(_), Integer(0)) => {
            return Err(Diagnostic::new(span.clone(), "Division by zero"));
        }
        (BinaryOp::Divide, Integer(a), Integer(b)) => {
            Integer(a.checked_div(*b).ok_or_else(overflow)?)
        }
        (BinaryOp::Remainder, Integer(a), Integer(b)) => {
            Integer(a.checked_rem(*b).ok_or_else(overflow)?)
        }
        (BinaryOp::Equals, _, _) => Boolean(left == right),
        (BinaryOp::NotEquals, _, _) => Boolean(left != right),
        (BinaryOp::Less, Integer(a), Integer(b)) => Boolean(a < b),
        (BinaryOp::LessOrEquals, Integer(a), Integer(b)) => Boolean(a <= b),
        (BinaryOp::Greater, Integer(a), Integer(b)) => Boolean(a > b),
        (BinaryOp::GreaterOrEquals, Integer(a), Integer(b)) => Boolean(a >= b),
        (BinaryOp::And | BinaryOp::Or, Boolean(_), Boolean(b)) => Boolean(*b),
        _ => {
            return Err(Diagnostic::new(
                span.clone(),
                format!(
                    "Binary operator '{}' is not defined for types {} and {}",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ),
            ));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{GlobalScope, bind};
    use crate::parser::parse;

    fn run(text: &str) -> Result<Option<Value>, Diagnostic> {
        let (unit, diagnostics) = parse(text);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let program = bind(&GlobalScope::default(), 1, &unit);
        assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
        let functions = program
            .functions
            .iter()
            .map(|function| (function.symbol.id, function.clone()))
            .collect();
        let mut globals = Variables::new();
        Evaluator::new(&functions, &mut globals).run(&program.statements, program.locals)
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        assert_eq!(run("1 + 2 * 3").unwrap(), Some(Value::Integer(7)));
        assert_eq!(run("(1 + 2) * 3 == 9").unwrap(), Some(Value::Boolean(true)));
        assert_eq!(run("-7 % 3").unwrap(), Some(Value::Integer(-1)));
    }

    #[test]
    fn test_strings_concatenate() {
        assert_eq!(
            run("\"kiln\" + \"!\"").unwrap(),
            Some(Value::String("kiln!".to_string()))
        );
    }

    #[test]
    fn test_declarations_do_not_produce_values() {
        assert_eq!(run("var x = 1").unwrap(), None);
        assert_eq!(run("var x = 1\nx = x + 4").unwrap(), Some(Value::Integer(5)));
    }

    #[test]
    fn test_loops_and_recursion() {
        let text = "function fib(n) {\n  if n < 2 { return n }\n  return fib(n - 1) + fib(n - 2)\n}\n\
                    var i = 0\nvar total = 0\nwhile i < 5 { total = total + fib(i) i = i + 1 }\ntotal";
        assert_eq!(run(text).unwrap(), Some(Value::Integer(7)));
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(run("1 / 0").unwrap_err().message, "Division by zero");
        assert_eq!(
            run("1 + true").unwrap_err().message,
            "Binary operator '+' is not defined for types integer and boolean"
        );
        assert_eq!(
            run("if 1 { 2 }").unwrap_err().message,
            "Condition must be a boolean, not integer"
        );
        assert_eq!(
            run("function f(n) { return f(n) }\nf(1)").unwrap_err().message,
            format!("Maximum call depth of {} exceeded", MAX_CALL_DEPTH)
        );
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        assert_eq!(run("false && 1 / 0 == 0").unwrap(), Some(Value::Boolean(false)));
    }
}
