//! Formula translation
//!
//! Row formulas are written against *display* values: `B12` reads row 12 in
//! whatever unit the spreadsheet shows it, and `D12` reads the factor that
//! converts that unit into the base unit. Evaluation works in base units, so
//! translation rewrites every reference:
//!
//! - `B<n>` becomes `v_<id> / <factor>` (the base value scaled back to display)
//! - `D<n>` becomes the literal factor of the row at `B<n>`
//! - any other column becomes `0`, like a blank spreadsheet cell
//!
//! and finally multiplies the whole expression by the owning row's factor so
//! the result lands in that row's base unit. `PI()` becomes the constant `pi`
//! and `CEILING` is renamed to the native `ceiling`.

use crate::ast::{BinaryOperator, FormulaExpr};
use crate::diagnostic::Diagnostic;
use crate::error::FormulaResult;
use crate::parser::parse_formula;
use timeline_calc_core::{CellAddress, ReferenceColumns, RowDefinition, RowRegistry};

/// Name of the scope variable that holds a row's base value
pub fn variable_name(id: &str) -> String {
    format!("v_{id}")
}

/// A translated formula
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// Expression over `v_<id>` variables, evaluating to base units
    pub expr: FormulaExpr,
    /// References that resolved to blank cells
    pub diagnostics: Vec<Diagnostic>,
}

impl Translation {
    /// The expression as evaluable text
    pub fn text(&self) -> String {
        self.expr.to_string()
    }
}

/// Rewrites row formulas into base-unit expressions
pub struct Translator<'a> {
    registry: &'a RowRegistry,
    columns: ReferenceColumns,
}

impl<'a> Translator<'a> {
    pub fn new(registry: &'a RowRegistry) -> Self {
        Self {
            registry,
            columns: ReferenceColumns::default(),
        }
    }

    pub fn with_columns(mut self, columns: ReferenceColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Translate `formula` as the formula of `owner`
    pub fn translate(&self, formula: &str, owner: &RowDefinition) -> FormulaResult<Translation> {
        let parsed = parse_formula(formula)?;
        let mut diagnostics = Vec::new();
        let body = self.rewrite(parsed, &owner.id, &mut diagnostics);
        let expr = FormulaExpr::binary(
            BinaryOperator::Multiply,
            body,
            FormulaExpr::Number(owner.canonical_factor()),
        );
        Ok(Translation { expr, diagnostics })
    }

    fn rewrite(
        &self,
        expr: FormulaExpr,
        owner: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> FormulaExpr {
        match expr {
            FormulaExpr::CellRef(address) => self.resolve(&address, owner, diagnostics),

            FormulaExpr::Function { name, args } if name == "PI" && args.is_empty() => {
                FormulaExpr::NameRef("pi".to_string())
            }

            FormulaExpr::Function { name, args } => {
                let name = if name == "CEILING" {
                    "ceiling".to_string()
                } else {
                    name
                };
                let args = args
                    .into_iter()
                    .map(|a| self.rewrite(a, owner, diagnostics))
                    .collect();
                FormulaExpr::Function { name, args }
            }

            FormulaExpr::BinaryOp { op, left, right } => FormulaExpr::binary(
                op,
                self.rewrite(*left, owner, diagnostics),
                self.rewrite(*right, owner, diagnostics),
            ),

            FormulaExpr::UnaryOp { op, operand } => FormulaExpr::UnaryOp {
                op,
                operand: Box::new(self.rewrite(*operand, owner, diagnostics)),
            },

            other => other,
        }
    }

    fn resolve(
        &self,
        address: &CellAddress,
        owner: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> FormulaExpr {
        let is_value = address.column == self.columns.value;
        let is_factor = address.column == self.columns.factor;

        if !is_value && !is_factor {
            push_once(
                diagnostics,
                Diagnostic::UnmodeledColumn {
                    row: owner.to_string(),
                    address: address.key(),
                },
            );
            return FormulaExpr::Number(0.0);
        }

        let target = self
            .registry
            .row_at(&address.with_column(self.columns.value));

        match target {
            Some(row) if is_value => FormulaExpr::binary(
                BinaryOperator::Divide,
                FormulaExpr::NameRef(variable_name(&row.id)),
                FormulaExpr::Number(row.canonical_factor()),
            ),
            Some(row) => FormulaExpr::Number(row.canonical_factor()),
            None => {
                tracing::debug!(row = owner, address = %address, "reference resolves to a blank cell");
                push_once(
                    diagnostics,
                    Diagnostic::UnresolvedReference {
                        row: owner.to_string(),
                        address: address.key(),
                    },
                );
                // A missing factor cell scales by 1; a missing value cell reads 0
                FormulaExpr::Number(if is_value { 0.0 } else { 1.0 })
            }
        }
    }
}

fn push_once(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    if !diagnostics.contains(&diagnostic) {
        diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{evaluate, Scope};
    use pretty_assertions::assert_eq;

    fn registry() -> RowRegistry {
        RowRegistry::new(vec![
            RowDefinition::input("length", "Length", "B2").with_unit("µm", "m", 1e-6),
            RowDefinition::input("speed", "Speed", "B3").with_unit("mm/s", "m/s", 1e-3),
            RowDefinition::output("time", "Time", "B4", "=B2*D2/(B3*D3)/60").with_unit(
                "minutes", "s", 60.0,
            ),
        ])
        .unwrap()
    }

    fn translate(formula: &str, owner: &str) -> Translation {
        let registry = registry();
        let owner = registry.get(owner).unwrap().clone();
        Translator::new(&registry).translate(formula, &owner).unwrap()
    }

    #[test]
    fn test_value_and_factor_references() {
        let t = translate("=B2*D2", "time");
        assert_eq!(t.text(), "v_length / 1e-6 * 1e-6 * 60");
        assert!(t.diagnostics.is_empty());
    }

    #[test]
    fn test_result_is_in_owner_base_units() {
        // 500 µm at 2 mm/s takes 0.25 s; the formula yields minutes and the
        // owner factor brings it back to seconds
        let registry = registry();
        let owner = registry.get("time").unwrap();
        let t = Translator::new(&registry)
            .translate(owner.formula().unwrap(), owner)
            .unwrap();

        let mut scope = Scope::new();
        scope.set("v_length", 500.0 * 1e-6);
        scope.set("v_speed", 2.0 * 1e-3);
        let base = evaluate(&t.expr, &scope).unwrap();
        assert!((base - 0.25).abs() < 1e-12, "{}", base);
    }

    #[test]
    fn test_pi_and_ceiling_are_normalized() {
        let t = translate("=CEILING(PI()*B2, 1)", "length");
        assert_eq!(t.text(), "ceiling(pi * (v_length / 1e-6), 1) * 1e-6");
    }

    #[test]
    fn test_unresolved_and_unmodeled_references() {
        let t = translate("=B99+D98*C2+B2", "time");
        assert_eq!(t.text(), "(0 + 1 * 0 + v_length / 1e-6) * 60");
        assert_eq!(
            t.diagnostics,
            vec![
                Diagnostic::UnresolvedReference {
                    row: "time".into(),
                    address: "B99".into()
                },
                Diagnostic::UnresolvedReference {
                    row: "time".into(),
                    address: "D98".into()
                },
                Diagnostic::UnmodeledColumn {
                    row: "time".into(),
                    address: "C2".into()
                },
            ]
        );
    }

    #[test]
    fn test_custom_columns() {
        let registry = RowRegistry::new(vec![
            RowDefinition::input("a", "A", "C2").with_unit("ms", "s", 1e-3),
            RowDefinition::output("b", "B", "C3", "=C2*E2"),
        ])
        .unwrap();
        let owner = registry.get("b").unwrap();
        let t = Translator::new(&registry)
            .with_columns(ReferenceColumns {
                value: 'C',
                factor: 'E',
            })
            .translate("=C2*E2", owner)
            .unwrap();
        assert_eq!(t.text(), "v_a / 0.001 * 0.001 * 1");
    }

    #[test]
    fn test_translated_text_evaluates_like_the_tree() {
        let t = translate("=(B2+B3)^-2/D3", "time");
        let mut scope = Scope::new();
        scope.set("v_length", 3e-6);
        scope.set("v_speed", 4e-3);
        let from_tree = evaluate(&t.expr, &scope).unwrap();
        let from_text = evaluate(&parse_formula(&t.text()).unwrap(), &scope).unwrap();
        assert_eq!(from_tree.to_bits(), from_text.to_bits());
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let registry = registry();
        let owner = registry.get("time").unwrap();
        assert!(Translator::new(&registry).translate("=B2:B3", owner).is_err());
    }
}
