//! Formula Abstract Syntax Tree types

use std::fmt;
use timeline_calc_core::CellAddress;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),
    /// Single cell reference (raw formulas only; translation removes them)
    CellRef(CellAddress),
    /// Bare identifier: a scope variable or constant such as `pi`
    NameRef(String),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    /// Function call
    Function { name: String, args: Vec<FormulaExpr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

// Binding strength, loosest first. `^` binds tighter than unary minus:
// `-2^2` is `-(2^2)`.
const PREC_ADDITIVE: u8 = 1;
const PREC_MULTIPLICATIVE: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

impl BinaryOperator {
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
            BinaryOperator::Power => '^',
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => PREC_ADDITIVE,
            BinaryOperator::Multiply | BinaryOperator::Divide => PREC_MULTIPLICATIVE,
            BinaryOperator::Power => PREC_POWER,
        }
    }
}

impl FormulaExpr {
    /// Build a binary operation
    pub fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
            FormulaExpr::UnaryOp { .. } => PREC_UNARY,
            _ => PREC_ATOM,
        }
    }

    /// Render with the fewest parentheses that keep the tree's shape
    ///
    /// Leaves and function calls are rendered by `style`. The output re-parses
    /// to the same tree (given a style that emits parseable leaves).
    pub fn render<S: ExprStyle + ?Sized>(&self, style: &S) -> String {
        match self {
            FormulaExpr::Number(n) => style.number(*n),
            FormulaExpr::CellRef(address) => style.cell(address),
            FormulaExpr::NameRef(name) => style.name(name),
            FormulaExpr::Function { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.render(style)).collect();
                style.function(name, &args)
            }
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => {
                let inner = operand.render(style);
                if operand.precedence() < PREC_UNARY {
                    format!("-({})", inner)
                } else {
                    format!("-{}", inner)
                }
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let p = op.precedence();
                let (left_parens, right_parens) = if *op == BinaryOperator::Power {
                    // Right-associative; a signed exponent is grouped explicitly
                    (left.precedence() <= p, right.precedence() < p)
                } else {
                    (left.precedence() < p, right.precedence() <= p)
                };
                format!(
                    "{} {} {}",
                    wrap(left.render(style), left_parens),
                    op.symbol(),
                    wrap(right.render(style), right_parens)
                )
            }
        }
    }
}

fn wrap(s: String, parens: bool) -> String {
    if parens {
        format!("({})", s)
    } else {
        s
    }
}

/// How the leaves of an expression are written out
pub trait ExprStyle {
    fn number(&self, n: f64) -> String {
        format_number(n)
    }

    fn cell(&self, address: &CellAddress) -> String {
        address.to_a1_string()
    }

    fn name(&self, name: &str) -> String {
        name.to_string()
    }

    fn function(&self, name: &str, args: &[String]) -> String {
        format!("{}({})", name, args.join(", "))
    }
}

/// Leaves written exactly as the parser reads them
pub struct PlainStyle;

impl ExprStyle for PlainStyle {}

/// Shortest text for a number that parses back to the same value
pub fn format_number(n: f64) -> String {
    let abs = n.abs();
    if abs != 0.0 && abs.is_finite() && !(1e-4..1e15).contains(&abs) {
        format!("{:e}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&PlainStyle))
    }
}
