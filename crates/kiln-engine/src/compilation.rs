//! Parsed trees and chained compilations.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use kiln_core::{
    Compilation, Diagnostic, Evaluation, Symbol, SymbolKind, SyntaxTree, Token, Variables,
};

use crate::ast::CompilationUnit;
use crate::binder::{BoundFunction, BoundProgram, FunctionId, GlobalScope, bind};
use crate::evaluator::Evaluator;
use crate::parser::parse;
use crate::printer::{write_function, write_statement};

#[derive(Debug, Clone)]
pub struct ParsedTree {
    unit: CompilationUnit,
    diagnostics: Vec<Diagnostic>,
    last_member_token: Option<Token>,
}

impl ParsedTree {
    pub fn parse(text: &str) -> Self {
        let (unit, diagnostics) = parse(text);
        let last_member_token = unit.last_token.as_ref().map(|token| token.to_token());
        Self {
            unit,
            diagnostics,
            last_member_token,
        }
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }
}

impl SyntaxTree for ParsedTree {
    fn last_member_token(&self) -> Option<&Token> {
        self.last_member_token.as_ref()
    }

    fn write_tree(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.unit.write_tree(out)
    }
}

/// One link of the compilation chain.
///
/// Each link binds its own submission against the scope its predecessor left
/// behind and carries every function body declared so far, so evaluating a
/// link never walks the chain.
#[derive(Debug)]
pub struct KilnCompilation {
    previous: Option<Arc<KilnCompilation>>,
    generation: usize,
    program: BoundProgram,
    functions: HashMap<FunctionId, Arc<BoundFunction>>,
    diagnostics: Vec<Diagnostic>,
}

impl KilnCompilation {
    pub fn empty() -> Self {
        Self {
            previous: None,
            generation: 0,
            program: BoundProgram::default(),
            functions: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn chain(previous: Option<Arc<KilnCompilation>>, tree: ParsedTree) -> Self {
        let (generation, scope, mut functions) = match &previous {
            Some(previous) => (
                previous.generation + 1,
                previous.program.scope.clone(),
                previous.functions.clone(),
            ),
            None => (1, GlobalScope::default(), HashMap::new()),
        };

        let program = bind(&scope, generation, &tree.unit);
        for function in &program.functions {
            functions.insert(function.symbol.id, function.clone());
        }

        let mut diagnostics = tree.diagnostics;
        diagnostics.extend(program.diagnostics.iter().cloned());

        Self {
            previous,
            generation,
            program,
            functions,
            diagnostics,
        }
    }

    pub fn previous(&self) -> Option<&Arc<KilnCompilation>> {
        self.previous.as_ref()
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl Compilation for KilnCompilation {
    fn symbols(&self) -> Vec<Symbol> {
        let scope = &self.program.scope;
        let functions = scope.functions.values().map(|function| Symbol {
            kind: SymbolKind::Function,
            name: function.name.clone(),
            signature: function.signature(),
        });
        let variables = scope.variables.iter().map(|(name, variable)| Symbol {
            kind: SymbolKind::Variable,
            name: name.clone(),
            signature: format!(
                "{} {}",
                if variable.read_only { "let" } else { "var" },
                name
            ),
        });
        functions.chain(variables).collect()
    }

    fn evaluate(&self, variables: &mut Variables) -> Evaluation {
        if !self.diagnostics.is_empty() {
            return Evaluation {
                value: None,
                diagnostics: self.diagnostics.clone(),
            };
        }

        match Evaluator::new(&self.functions, variables)
            .run(&self.program.statements, self.program.locals)
        {
            Ok(value) => Evaluation {
                value,
                diagnostics: Vec::new(),
            },
            Err(diagnostic) => Evaluation {
                value: None,
                diagnostics: vec![diagnostic],
            },
        }
    }

    fn emit_tree(&self, function: Option<&Symbol>, out: &mut dyn io::Write) -> io::Result<()> {
        if let Some(symbol) = function {
            let body = self
                .program
                .scope
                .functions
                .get(&symbol.name)
                .and_then(|function| self.functions.get(&function.id));
            return match body {
                Some(body) => write_function(out, body),
                None => Ok(()),
            };
        }

        for function in &self.program.functions {
            write_function(out, function)?;
        }
        for statement in &self.program.statements {
            write_statement(out, statement, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::Value;

    fn submit(previous: Option<Arc<KilnCompilation>>, text: &str) -> Arc<KilnCompilation> {
        Arc::new(KilnCompilation::chain(previous, ParsedTree::parse(text)))
    }

    fn emitted(compilation: &KilnCompilation, function: Option<&Symbol>) -> String {
        let mut out = Vec::new();
        compilation.emit_tree(function, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_variables_carry_across_submissions() {
        let mut variables = Variables::new();
        let first = submit(None, "var x = 1");
        assert_eq!(first.evaluate(&mut variables).value, None);

        let second = submit(Some(first.clone()), "x + 1");
        assert_eq!(second.generation(), 2);
        assert!(Arc::ptr_eq(second.previous().unwrap(), &first));
        assert_eq!(
            second.evaluate(&mut variables).value,
            Some(Value::Integer(2))
        );
    }

    #[test]
    fn test_functions_carry_across_submissions() {
        let mut variables = Variables::new();
        let first = submit(None, "function square(n) { return n * n }");
        first.evaluate(&mut variables);
        let second = submit(Some(first), "square(7)");
        assert_eq!(
            second.evaluate(&mut variables).value,
            Some(Value::Integer(49))
        );
    }

    #[test]
    fn test_diagnostics_prevent_evaluation() {
        let mut variables = Variables::new();
        let compilation = submit(None, "var x = 1\nundefined_name");
        let evaluation = compilation.evaluate(&mut variables);
        assert!(evaluation.value.is_none());
        assert_eq!(
            evaluation.diagnostics[0].message,
            "Variable 'undefined_name' doesn't exist"
        );
        assert!(variables.is_empty());
    }

    #[test]
    fn test_symbols() {
        let first = submit(None, "function add(a, b) { return a + b }\nlet limit = 3");
        let second = submit(Some(first), "var count = 0");
        let symbols = second.symbols();
        let signatures: Vec<&str> = symbols.iter().map(|s| s.signature.as_str()).collect();
        assert_eq!(
            signatures,
            vec!["function add(a, b)", "var count", "let limit"]
        );
    }

    #[test]
    fn test_emit_tree() {
        let first = submit(None, "function add(a, b) { return a + b }");
        let second = submit(Some(first), "var x = add(1, 2)");
        assert_eq!(emitted(&second, None), "var x = add(1, 2)\n");

        let add = second
            .symbols()
            .into_iter()
            .find(|symbol| symbol.name == "add")
            .unwrap();
        assert_eq!(
            emitted(&second, Some(&add)),
            "function add(a, b) {\n    return (a + b)\n}\n"
        );
    }

    #[test]
    fn test_last_member_token() {
        let tree = ParsedTree::parse("1 +");
        assert!(tree.last_member_token().unwrap().is_missing);
        let tree = ParsedTree::parse("   ");
        assert!(tree.last_member_token().is_none());
    }
}
