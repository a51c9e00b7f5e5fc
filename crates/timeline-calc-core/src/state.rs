//! Evaluation state
//!
//! One entry per row holding the value as the user sees it: the display value,
//! the selected unit label and the factor from that unit to the base unit.
//! Only two operations mutate it: setting an input's display value and
//! switching a row's display unit.

use crate::error::{Error, Result};
use crate::registry::RowRegistry;
use crate::row::RowDefinition;
use crate::units::UnitOption;
use ahash::AHashMap;

/// Convert a display value to base units (`None` means factor 1)
pub fn to_base(value: f64, factor: Option<f64>) -> f64 {
    match factor {
        Some(f) => value * f,
        None => value,
    }
}

/// Convert a base value to display units (`None` means factor 1)
pub fn from_base(value: f64, factor: Option<f64>) -> f64 {
    match factor {
        Some(f) => value / f,
        None => value,
    }
}

/// Display-side state of one row
#[derive(Debug, Clone, PartialEq)]
pub struct ValueState {
    /// Value in the currently selected display unit
    pub display_value: f64,
    /// Selected unit label (may differ from the row's default)
    pub unit_label: Option<String>,
    /// Factor from the selected unit to the base unit
    pub to_base: Option<f64>,
}

impl ValueState {
    /// The value in base units
    pub fn base_value(&self) -> f64 {
        to_base(self.display_value, self.to_base)
    }
}

/// Display-side state of every row, keyed by row id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationState {
    values: AHashMap<String, ValueState>,
}

impl EvaluationState {
    /// Seed the state from the registry's defaults
    ///
    /// Inputs start at their default display value (0 when absent); outputs
    /// start at 0 and are never written afterwards.
    pub fn new(registry: &RowRegistry) -> Self {
        let values = registry
            .iter()
            .map(|row| {
                let display_value = if row.is_input() {
                    row.default_display_value.unwrap_or(0.0)
                } else {
                    0.0
                };
                let state = ValueState {
                    display_value,
                    unit_label: row.display_unit.clone(),
                    to_base: row.factor(),
                };
                (row.id.clone(), state)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, id: &str) -> Option<&ValueState> {
        self.values.get(id)
    }

    /// Base value of a row; rows missing from the state read as 0
    pub fn base_value(&self, id: &str) -> f64 {
        self.values.get(id).map_or(0.0, ValueState::base_value)
    }

    /// Set an input row's display value
    ///
    /// Non-finite values are stored as given and propagate as `NaN` through
    /// dependent formulas.
    pub fn set_display_value(&mut self, registry: &RowRegistry, id: &str, value: f64) -> Result<()> {
        let row = registry
            .get(id)
            .ok_or_else(|| Error::UnknownRow(id.to_string()))?;
        if !row.is_input() {
            return Err(Error::NotAnInput(id.to_string()));
        }
        let entry = self
            .values
            .get_mut(id)
            .ok_or_else(|| Error::UnknownRow(id.to_string()))?;
        entry.display_value = value;
        Ok(())
    }

    /// Switch a row's display unit, keeping the underlying quantity
    ///
    /// The current display value is taken to base units with the previous
    /// factor, then back to display units with the new one.
    pub fn set_unit(&mut self, id: &str, unit: &UnitOption) -> Result<()> {
        let entry = self
            .values
            .get_mut(id)
            .ok_or_else(|| Error::UnknownRow(id.to_string()))?;
        let base = entry.base_value();
        entry.display_value = base / unit.to_base;
        entry.unit_label = Some(unit.label.clone());
        entry.to_base = Some(unit.to_base);
        Ok(())
    }

    /// Factor used to show a row: the selected unit's, else the row's own
    pub fn display_factor(&self, row: &RowDefinition) -> Option<f64> {
        self.values
            .get(&row.id)
            .and_then(|v| v.to_base)
            .or_else(|| row.factor())
    }
}

/// The value to show for a row
///
/// Inputs show their stored display value. Outputs show their computed base
/// value converted into the selected display unit.
pub fn display_value(row: &RowDefinition, state: &EvaluationState, base_value: f64) -> f64 {
    if row.is_input() {
        return state.get(&row.id).map_or(0.0, |v| v.display_value);
    }
    from_base(base_value, state.display_factor(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::unit_options_for_base;
    use proptest::prelude::*;

    fn registry() -> RowRegistry {
        RowRegistry::new(vec![
            RowDefinition::input("dwell", "Dwell time", "B2")
                .with_unit("µs", "s", 1e-6)
                .with_default(3.0),
            RowDefinition::input("count", "Count", "B3"),
            RowDefinition::output("total", "Total", "B4", "=B2*B3").with_unit("ms", "s", 1e-3),
        ])
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = EvaluationState::new(&registry());
        let dwell = state.get("dwell").unwrap();
        assert_eq!(dwell.display_value, 3.0);
        assert_eq!(dwell.unit_label.as_deref(), Some("µs"));
        assert_eq!(dwell.to_base, Some(1e-6));
        assert_eq!(state.get("count").unwrap().display_value, 0.0);
        assert_eq!(state.get("count").unwrap().to_base, None);
        assert_eq!(state.get("total").unwrap().display_value, 0.0);
    }

    #[test]
    fn test_set_display_value() {
        let registry = registry();
        let mut state = EvaluationState::new(&registry);
        state.set_display_value(&registry, "count", 7.0).unwrap();
        assert_eq!(state.base_value("count"), 7.0);

        assert!(matches!(
            state.set_display_value(&registry, "total", 1.0),
            Err(Error::NotAnInput(_))
        ));
        assert!(matches!(
            state.set_display_value(&registry, "nope", 1.0),
            Err(Error::UnknownRow(_))
        ));
    }

    #[test]
    fn test_set_unit_preserves_quantity() {
        let registry = registry();
        let mut state = EvaluationState::new(&registry);
        let before = state.base_value("dwell");

        let options = unit_options_for_base(Some("s"));
        let ms = options.iter().find(|u| u.label == "ms").unwrap();
        state.set_unit("dwell", ms).unwrap();

        let dwell = state.get("dwell").unwrap();
        assert_eq!(dwell.unit_label.as_deref(), Some("ms"));
        assert!((dwell.display_value - 0.003).abs() < 1e-15);
        assert!((state.base_value("dwell") - before).abs() < 1e-18);
    }

    #[test]
    fn test_display_value_for_output_uses_selected_unit() {
        let registry = registry();
        let mut state = EvaluationState::new(&registry);
        let total = registry.get("total").unwrap();
        assert!((display_value(total, &state, 0.5) - 500.0).abs() < 1e-9);

        let options = unit_options_for_base(Some("s"));
        let seconds = options.iter().find(|u| u.label == "seconds").unwrap();
        state.set_unit("total", seconds).unwrap();
        assert_eq!(display_value(total, &state, 0.5), 0.5);

        let dwell = registry.get("dwell").unwrap();
        assert_eq!(display_value(dwell, &state, 123.0), 3.0);
    }

    #[test]
    fn test_nan_input_is_stored() {
        let registry = registry();
        let mut state = EvaluationState::new(&registry);
        state.set_display_value(&registry, "count", f64::NAN).unwrap();
        assert!(state.base_value("count").is_nan());
    }

    fn representative_value() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(0.0),
            -1e12..1e12f64,
            prop::num::f64::NORMAL.prop_filter("moderate", |v| v.abs() < 1e200 && v.abs() > 1e-200),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip(x in representative_value(), f in 1e-12..1e12f64) {
            let back = from_base(to_base(x, Some(f)), Some(f));
            prop_assert!((back - x).abs() <= x.abs() * 1e-12);
        }

        #[test]
        fn prop_unit_switch_preserves_base(
            x in representative_value(),
            old in 0..7usize,
            new in 0..7usize,
        ) {
            let options = unit_options_for_base(Some("s"));
            let registry = RowRegistry::new(vec![
                RowDefinition::input("t", "T", "B2").with_unit("seconds", "s", 1.0),
            ]).unwrap();
            let mut state = EvaluationState::new(&registry);
            state.set_unit("t", &options[old]).unwrap();
            state.set_display_value(&registry, "t", x).unwrap();
            let before = state.base_value("t");

            state.set_unit("t", &options[new]).unwrap();
            let after = state.base_value("t");
            prop_assert!((after - before).abs() <= before.abs() * 1e-12);
        }
    }
}
