//! Formula evaluator
//!
//! Evaluates formula ASTs to numbers against a scope of named values. All
//! arithmetic follows IEEE 754: dividing by zero gives an infinity and invalid
//! operations give `NaN`, neither of which is an error.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use ahash::AHashMap;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Named values visible to an expression
///
/// A fresh scope already binds `pi` (and `π`).
#[derive(Debug, Clone)]
pub struct Scope {
    values: AHashMap<String, f64>,
}

impl Scope {
    pub fn new() -> Self {
        let mut values = AHashMap::new();
        values.insert("pi".to_string(), std::f64::consts::PI);
        values.insert("π".to_string(), std::f64::consts::PI);
        Self { values }
    }

    /// Bind or rebind a name
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, scope: &Scope) -> FormulaResult<f64> {
    match expr {
        FormulaExpr::Number(n) => Ok(*n),

        FormulaExpr::NameRef(name) => scope
            .get(name)
            .ok_or_else(|| FormulaError::UnknownVariable(name.clone())),

        FormulaExpr::CellRef(address) => Err(FormulaError::UntranslatedReference(
            address.to_a1_string(),
        )),

        FormulaExpr::BinaryOp { op, left, right } => {
            let l = evaluate(left, scope)?;
            let r = evaluate(right, scope)?;
            Ok(match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Subtract => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide => l / r,
                BinaryOperator::Power => l.powf(r),
            })
        }

        FormulaExpr::UnaryOp {
            op: UnaryOperator::Negate,
            operand,
        } => Ok(-evaluate(operand, scope)?),

        FormulaExpr::Function { name, args } => evaluate_function(name, args, scope),
    }
}

/// Evaluate a function call
fn evaluate_function(name: &str, args: &[FormulaExpr], scope: &Scope) -> FormulaResult<f64> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    let evaluated_args = args
        .iter()
        .map(|arg| evaluate(arg, scope))
        .collect::<FormulaResult<Vec<f64>>>()?;

    (func.implementation)(&evaluated_args)
}
