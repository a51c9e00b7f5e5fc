//! Display units
//!
//! Each base unit tag maps to a fixed list of selectable display units, ordered
//! from the smallest to the largest magnitude. Area and volume lists are always
//! derived from the length list (factors squared or cubed), and volumetric rates
//! from the volume list, so the families can never drift apart.

use crate::row::RowDefinition;
use crate::state::EvaluationState;

/// One selectable display unit and its scale into the base unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOption {
    pub label: String,
    pub to_base: f64,
}

impl UnitOption {
    fn new(label: impl Into<String>, to_base: f64) -> Self {
        Self {
            label: label.into(),
            to_base,
        }
    }
}

const TIME: &[(&str, f64)] = &[
    ("ns", 1e-9),
    ("µs", 1e-6),
    ("ms", 1e-3),
    ("seconds", 1.0),
    ("minutes", 60.0),
    ("hours", 3600.0),
    ("days", 86400.0),
];

const LENGTH: &[(&str, f64)] = &[
    ("nm", 1e-9),
    ("µm", 1e-6),
    ("mm", 1e-3),
    ("cm", 1e-2),
    ("m", 1.0),
];

const SPEED: &[(&str, f64)] = &[("mm/s", 1e-3), ("µm/s", 1e-6), ("m/s", 1.0)];

const FREQUENCY: &[(&str, f64)] = &[("Hz", 1.0), ("kHz", 1e3), ("MHz", 1e6), ("GHz", 1e9)];

fn table(entries: &[(&str, f64)]) -> Vec<UnitOption> {
    entries
        .iter()
        .map(|&(label, to_base)| UnitOption::new(label, to_base))
        .collect()
}

fn powered(length: Vec<UnitOption>, exponent: u32, superscript: char) -> Vec<UnitOption> {
    length
        .into_iter()
        .map(|u| {
            let f = u.to_base;
            let to_base = if exponent == 2 { f * f } else { f * f * f };
            UnitOption::new(format!("{}{}", u.label, superscript), to_base)
        })
        .collect()
}

/// Selectable display units for a base unit tag
///
/// Unrecognized or absent tags are dimensionless and have no options.
///
/// # Example
/// ```
/// use timeline_calc_core::unit_options_for_base;
///
/// let area = unit_options_for_base(Some("m²"));
/// assert_eq!(area[2].label, "mm²");
/// assert_eq!(area[2].to_base, 1e-3 * 1e-3);
/// assert!(unit_options_for_base(Some("widgets")).is_empty());
/// ```
pub fn unit_options_for_base(base_unit: Option<&str>) -> Vec<UnitOption> {
    let tag: String = base_unit
        .unwrap_or("")
        .chars()
        .filter(|c| *c != ' ')
        .collect();

    match tag.as_str() {
        "s" => table(TIME),
        "m" => table(LENGTH),
        "m²" | "m2" => powered(table(LENGTH), 2, '²'),
        "m³" | "m3" => powered(table(LENGTH), 3, '³'),
        "m/s" => table(SPEED),
        "m³/s" | "m3/s" => unit_options_for_base(Some("m³"))
            .into_iter()
            .map(|u| UnitOption::new(format!("{} / s", u.label), u.to_base))
            .collect(),
        "Hz" => table(FREQUENCY),
        _ => Vec::new(),
    }
}

/// Canonical spelling of a unit label for matching
///
/// Case and whitespace are ignored, and the common spellings of time units are
/// folded together (`s`, `sec`, `secs`, `seconds` all become `second`).
pub fn normalize_unit_label(label: &str) -> String {
    let s: String = label
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    match s.as_str() {
        "s" | "sec" | "secs" => return "second".to_string(),
        "min" | "mins" => return "minute".to_string(),
        _ => {}
    }

    for (plural, singular) in [
        ("seconds", "second"),
        ("minutes", "minute"),
        ("hours", "hour"),
        ("days", "day"),
    ] {
        if let Some(stem) = s.strip_suffix(plural) {
            return format!("{stem}{singular}");
        }
    }
    s
}

/// Relative equality for conversion factors
pub fn factors_equal(a: f64, b: f64) -> bool {
    let scale = 1.0_f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= scale * 1e-12
}

/// The option a row's unit selector should show as selected
///
/// Matches the selected label first, then the selected factor, and finally
/// falls back to the first option. Returns `None` for dimensionless rows.
pub fn selected_unit_option(row: &RowDefinition, state: &EvaluationState) -> Option<UnitOption> {
    let options = unit_options_for_base(row.base_unit.as_deref());
    if options.is_empty() {
        return None;
    }

    let entry = state.get(&row.id);
    let label = entry
        .and_then(|v| v.unit_label.as_deref())
        .or(row.display_unit.as_deref())
        .unwrap_or("");
    let wanted = normalize_unit_label(label);

    if let Some(found) = options
        .iter()
        .find(|u| normalize_unit_label(&u.label) == wanted)
    {
        return Some(found.clone());
    }

    let factor = entry.and_then(|v| v.to_base).or(row.to_base_factor);
    if let Some(factor) = factor {
        if let Some(found) = options.iter().find(|u| factors_equal(u.to_base, factor)) {
            return Some(found.clone());
        }
    }

    options.into_iter().next()
}
