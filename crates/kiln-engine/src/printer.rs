//! Writes bound programs back out as indented pseudo-source.

use std::io::{self, Write};

use kiln_core::Value;

use crate::binder::{BoundExpression, BoundFunction, BoundStatement};

const INDENT: usize = 4;

pub fn write_function(out: &mut dyn Write, function: &BoundFunction) -> io::Result<()> {
    writeln!(out, "{} {{", function.symbol.signature())?;
    for statement in &function.body {
        write_statement(out, statement, INDENT)?;
    }
    writeln!(out, "}}")
}

pub fn write_statement(out: &mut dyn Write, statement: &BoundStatement, indent: usize) -> io::Result<()> {
    let pad = "";
    match statement {
        BoundStatement::Block(statements) => {
            writeln!(out, "{pad:indent$}{{")?;
            for statement in statements {
                write_statement(out, statement, indent + INDENT)?;
            }
            writeln!(out, "{pad:indent$}}}")
        }
        BoundStatement::Variable {
            variable,
            read_only,
            initializer,
        } => {
            let keyword = if *read_only { "let" } else { "var" };
            writeln!(
                out,
                "{pad:indent$}{} {} = {}",
                keyword,
                variable.name,
                expression_text(initializer)
            )
        }
        BoundStatement::If {
            condition,
            then,
            otherwise,
        } => {
            writeln!(out, "{pad:indent$}if {}", expression_text(condition))?;
            write_nested(out, then, indent)?;
            if let Some(otherwise) = otherwise {
                writeln!(out, "{pad:indent$}else")?;
                write_nested(out, otherwise, indent)?;
            }
            Ok(())
        }
        BoundStatement::While { condition, body } => {
            writeln!(out, "{pad:indent$}while {}", expression_text(condition))?;
            write_nested(out, body, indent)
        }
        BoundStatement::Return(Some(expression)) => {
            writeln!(out, "{pad:indent$}return {}", expression_text(expression))
        }
        BoundStatement::Return(None) => writeln!(out, "{pad:indent$}return"),
        BoundStatement::Expression(expression) => {
            writeln!(out, "{pad:indent$}{}", expression_text(expression))
        }
    }
}

/// Blocks keep the parent's indent; single statements are pushed in one level.
fn write_nested(out: &mut dyn Write, statement: &BoundStatement, indent: usize) -> io::Result<()> {
    match statement {
        BoundStatement::Block(_) => write_statement(out, statement, indent),
        _ => write_statement(out, statement, indent + INDENT),
    }
}

/// Renders an expression fully parenthesized so grouping is explicit.
pub fn expression_text(expression: &BoundExpression) -> String {
    match expression {
        BoundExpression::Error => "?".to_string(),
        BoundExpression::Literal(Value::String(value)) => format!("{:?}", value),
        BoundExpression::Literal(value) => value.to_string(),
        BoundExpression::Variable { variable, .. } => variable.name.clone(),
        BoundExpression::Assignment {
            variable,
            expression,
        } => format!("{} = {}", variable.name, expression_text(expression)),
        BoundExpression::Unary { op, operand, .. } => {
            format!("{}{}", op.symbol(), expression_text(operand))
        }
        BoundExpression::Binary {
            left, op, right, ..
        } => format!(
            "({} {} {})",
            expression_text(left),
            op.symbol(),
            expression_text(right)
        ),
        BoundExpression::Call {
            name, arguments, ..
        } => {
            let arguments: Vec<String> = arguments.iter().map(expression_text).collect();
            format!("{}({})", name, arguments.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{GlobalScope, bind};
    use crate::parser::parse;

    fn printed(text: &str) -> String {
        let (unit, _) = parse(text);
        let program = bind(&GlobalScope::default(), 1, &unit);
        let mut out = Vec::new();
        for function in &program.functions {
            write_function(&mut out, function).unwrap();
        }
        for statement in &program.statements {
            write_statement(&mut out, statement, 0).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_statements_are_parenthesized() {
        assert_eq!(printed("var x = 1 + 2 * 3"), "var x = (1 + (2 * 3))\n");
    }

    #[test]
    fn test_function_body_is_indented() {
        let text = "function twice(n) { if n > 0 return n * 2 else { return 0 } }";
        assert_eq!(
            printed(text),
            "function twice(n) {\n    if (n > 0)\n        return (n * 2)\n    else\n    {\n        return 0\n    }\n}\n"
        );
    }

    #[test]
    fn test_string_literals_are_quoted() {
        assert_eq!(printed("let s = \"a\\nb\""), "let s = \"a\\nb\"\n");
    }
}
