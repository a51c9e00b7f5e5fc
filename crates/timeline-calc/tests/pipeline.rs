//! End-to-end tests: configuration → state → relaxation → display

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Write;
use timeline_calc::prelude::*;
use timeline_calc::{derived_direct_dependencies, derived_input_dependencies};

/// A small lithography-style process: coat, expose and develop a wafer
const PROCESS_CONFIG: &str = r#"{
  "rows": [
    { "id": "overview", "label": "Process estimate", "section": "Overview", "kind": "output",
      "excel": { "cell": "B1", "formula": "" } },
    { "id": "wafer_count", "label": "Wafers", "section": "Inputs", "kind": "input",
      "defaultDisplayValue": 25, "excel": { "cell": "B2" } },
    { "id": "coat_time", "label": "Coat time per wafer", "section": "Coat", "kind": "input",
      "displayUnit": "seconds", "baseUnit": "s", "toBaseFactor": 1,
      "defaultDisplayValue": 90, "excel": { "cell": "B3" } },
    { "id": "field_size", "label": "Field size", "section": "Expose", "kind": "input",
      "displayUnit": "mm²", "baseUnit": "m²", "toBaseFactor": 0.000001,
      "defaultDisplayValue": 625, "excel": { "cell": "B4" } },
    { "id": "wafer_area", "label": "Wafer area", "section": "Expose", "kind": "input",
      "displayUnit": "cm²", "baseUnit": "m²", "toBaseFactor": 0.0001,
      "defaultDisplayValue": 706.86, "excel": { "cell": "B5" } },
    { "id": "shot_time", "label": "Time per field", "section": "Expose", "kind": "input",
      "displayUnit": "ms", "baseUnit": "s", "toBaseFactor": 0.001,
      "defaultDisplayValue": 400, "excel": { "cell": "B6" } },
    { "id": "fields", "label": "Fields per wafer", "section": "Expose", "kind": "output",
      "excel": { "cell": "B7", "formula": "=CEILING(B5*D5/(B4*D4), 1)" } },
    { "id": "expose_time", "label": "Exposure per wafer", "section": "Expose", "kind": "output",
      "displayUnit": "seconds", "baseUnit": "s", "toBaseFactor": 1,
      "excel": { "cell": "B8", "formula": "=B7*B6*D6" } },
    { "id": "total", "label": "Total time", "section": "Summary", "kind": "output",
      "displayUnit": "hours", "baseUnit": "s", "toBaseFactor": 3600,
      "excel": { "cell": "B10", "formula": "=B11*B2/3600" } },
    { "id": "per_wafer", "label": "Time per wafer", "section": "Summary", "kind": "output",
      "displayUnit": "seconds", "baseUnit": "s", "toBaseFactor": 1,
      "excel": { "cell": "B11", "formula": "=B3+B8+C11" } }
  ],
  "directDeps": {
    "fields": ["field_size", "wafer_area"],
    "expose_time": ["fields", "shot_time"],
    "total": ["per_wafer", "wafer_count"],
    "per_wafer": ["coat_time", "expose_time"]
  },
  "inputDeps": {
    "fields": ["field_size", "wafer_area"],
    "expose_time": ["field_size", "shot_time", "wafer_area"],
    "total": ["coat_time", "field_size", "shot_time", "wafer_area", "wafer_count"],
    "per_wafer": ["coat_time", "field_size", "shot_time", "wafer_area"]
  }
}"#;

fn process() -> (Config, RowRegistry) {
    let config = Config::from_json(PROCESS_CONFIG).unwrap();
    let registry = config.registry().unwrap();
    (config, registry)
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= expected.abs() * 1e-9,
        "expected {} but got {}",
        expected,
        actual
    );
}

#[test]
fn test_process_estimate() {
    let (_, registry) = process();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    // 706.86 cm² / 625 mm² = 113.1 → 114 fields, 0.4 s each
    approx(result.base_value("fields").unwrap(), 114.0);
    approx(result.base_value("expose_time").unwrap(), 45.6);
    approx(result.base_value("per_wafer").unwrap(), 135.6);
    approx(result.base_value("total").unwrap(), 135.6 * 25.0);
    assert_eq!(result.base_value("overview"), Some(0.0));
    assert!(result.stats.converged);
    assert_eq!(result.stats.formula_count, 4);

    // C11 is not a modeled column
    assert_eq!(
        result.diagnostics,
        vec![Diagnostic::UnmodeledColumn {
            row: "per_wafer".into(),
            address: "C11".into()
        }]
    );
}

#[test]
fn test_display_values() {
    let (_, registry) = process();
    let mut state = EvaluationState::new(&registry);

    let hours = unit_options_for_base(Some("s"))
        .into_iter()
        .find(|u| u.label == "hours")
        .unwrap();
    let minutes = unit_options_for_base(Some("s"))
        .into_iter()
        .find(|u| u.label == "minutes")
        .unwrap();
    state.set_unit("total", &hours).unwrap();

    let result = compute_all(&registry, &state);
    let total = registry.get("total").unwrap();
    approx(
        display_value(total, &state, result.base_value("total").unwrap()),
        135.6 * 25.0 / 3600.0,
    );

    state.set_unit("total", &minutes).unwrap();
    let shown = display_value(total, &state, result.base_value("total").unwrap());
    approx(shown, 56.5);
    assert_eq!(format_display_number(shown), "56.5");
}

#[test]
fn test_input_changes_flow_through() {
    let (_, registry) = process();
    let mut state = EvaluationState::new(&registry);
    state.set_display_value(&registry, "wafer_count", 1.0).unwrap();
    state.set_display_value(&registry, "shot_time", 0.0).unwrap();

    let result = compute_all(&registry, &state);
    approx(result.base_value("total").unwrap(), 90.0);

    assert!(state.set_display_value(&registry, "total", 5.0).is_err());
    assert!(state.set_display_value(&registry, "missing", 5.0).is_err());
}

#[test]
fn test_unit_switch_does_not_change_results() {
    let (_, registry) = process();
    let mut state = EvaluationState::new(&registry);
    let before = compute_all(&registry, &state);

    for option in unit_options_for_base(Some("m²")) {
        state.set_unit("field_size", &option).unwrap();
        let after = compute_all(&registry, &state);
        approx(
            after.base_value("total").unwrap(),
            before.base_value("total").unwrap(),
        );
    }
}

#[test]
fn test_malformed_input_propagates_nan() {
    let (_, registry) = process();
    let mut state = EvaluationState::new(&registry);
    state
        .set_display_value(&registry, "coat_time", f64::NAN)
        .unwrap();

    let result = compute_all(&registry, &state);
    assert!(result.base_value("per_wafer").unwrap().is_nan());
    assert!(result.base_value("total").unwrap().is_nan());
    approx(result.base_value("expose_time").unwrap(), 45.6);
    assert!(result.stats.converged);
    assert_eq!(format_display_number(result.base_value("total").unwrap()), "—");
}

#[test]
fn test_configured_dependencies_match_formulas() {
    let (config, registry) = process();
    let direct = derived_direct_dependencies(&registry, config.columns);
    let inputs = derived_input_dependencies(&registry, config.columns);

    for (id, deps) in &config.direct_deps {
        assert_eq!(&direct[id], deps, "direct dependencies of {}", id);
    }
    for (id, deps) in &config.input_deps {
        assert_eq!(&inputs[id], deps, "input dependencies of {}", id);
    }
}

#[test]
fn test_readable_formulas() {
    let (_, registry) = process();
    let formula = |id: &str| {
        let row = registry.get(id).unwrap();
        readable_formula(row.formula().unwrap(), &registry)
    };

    assert_eq!(formula("fields"), "ceiling(Wafer area / Field size, 1)");
    assert_eq!(formula("expose_time"), "Fields per wafer * Time per field");
    assert_eq!(formula("total"), "Time per wafer * Wafers / 3600");
}

#[test]
fn test_sections() {
    let (_, registry) = process();
    assert_eq!(
        registry.sections(),
        vec!["Inputs", "Coat", "Expose", "Summary"]
    );
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROCESS_CONFIG.as_bytes()).unwrap();

    let config = Config::from_path(file.path()).unwrap();
    assert_eq!(config.rows.len(), 10);
    assert_eq!(config.direct_dependencies("fields"), ["field_size", "wafer_area"]);
}

#[test]
fn test_forward_references_converge() {
    // Each row reads the one defined after it
    let registry = RowRegistry::new(vec![
        RowDefinition::output("r1", "R1", "B1", "=B2+1"),
        RowDefinition::output("r2", "R2", "B2", "=B3+1"),
        RowDefinition::output("r3", "R3", "B3", "=B4+1"),
        RowDefinition::input("seed", "Seed", "B4").with_default(10.0),
    ])
    .unwrap();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    assert_eq!(result.base_value("r1"), Some(13.0));
    assert_eq!(result.stats.passes, 4);
    assert!(result.stats.converged);
}

#[test]
fn test_blank_reference_reads_zero() {
    let registry = RowRegistry::new(vec![
        RowDefinition::input("a", "A", "B2").with_default(5.0),
        RowDefinition::output("b", "B", "B3", "=B2+B42*3+D42"),
    ])
    .unwrap();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    assert_eq!(result.base_value("b"), Some(6.0));
    assert_eq!(result.diagnostics.len(), 2);
}

#[test]
fn test_power_binds_tighter_than_negation() {
    let registry = RowRegistry::new(vec![
        RowDefinition::input("a", "A", "B2").with_default(3.0),
        RowDefinition::output("b", "B", "B3", "=-B2^2"),
        RowDefinition::output("c", "C", "B4", "=(-B2)^2"),
    ])
    .unwrap();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    assert_eq!(result.base_value("b"), Some(-9.0));
    assert_eq!(result.base_value("c"), Some(9.0));
}

#[test]
fn test_whitespace_formula_fails_to_nan() {
    let registry = RowRegistry::new(vec![
        RowDefinition::input("a", "A", "B2").with_default(3.0),
        RowDefinition::output("b", "B", "B3", "   "),
        RowDefinition::output("c", "C", "B4", "=B2+B3"),
    ])
    .unwrap();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    assert!(result.base_value("b").unwrap().is_nan());
    assert!(result.base_value("c").unwrap().is_nan());
    assert_eq!(result.stats.errors, 1);
}

#[test]
fn test_division_by_zero_is_not_an_error() {
    let registry = RowRegistry::new(vec![
        RowDefinition::input("a", "A", "B2"),
        RowDefinition::output("b", "B", "B3", "=1/B2"),
    ])
    .unwrap();
    let result = compute_all(&registry, &EvaluationState::new(&registry));

    assert_eq!(result.base_value("b"), Some(f64::INFINITY));
    assert_eq!(result.stats.errors, 0);
}

#[test]
fn test_compute_is_deterministic() {
    let (_, registry) = process();
    let state = EvaluationState::new(&registry);
    let first = compute_all(&registry, &state);
    let second = compute_all(&registry, &state);

    for row in registry.iter() {
        assert_eq!(
            first.base_value(&row.id).map(f64::to_bits),
            second.base_value(&row.id).map(f64::to_bits)
        );
    }
    assert_eq!(first.stats, second.stats);
}

fn chain_rows() -> Vec<RowDefinition> {
    vec![
        RowDefinition::input("x", "X", "B2")
            .with_unit("mm", "m", 1e-3)
            .with_default(7.0),
        RowDefinition::input("y", "Y", "B3").with_default(3.0),
        RowDefinition::output("a", "A", "B4", "=B2*D2+B5"),
        RowDefinition::output("b", "B", "B5", "=B3*B6"),
        RowDefinition::output("c", "C", "B6", "=CEILING(B2, 4)/B3"),
        RowDefinition::output("d", "D", "B7", "=(B4+B5)^2-B6"),
    ]
}

proptest! {
    #[test]
    fn prop_output_order_does_not_matter(perm in Just(vec![2usize, 3, 4, 5]).prop_shuffle()) {
        let rows = chain_rows();
        let baseline = RowRegistry::new(rows.clone()).unwrap();
        let expected = compute_all(&baseline, &EvaluationState::new(&baseline));

        let mut reordered: Vec<RowDefinition> = rows[..2].to_vec();
        reordered.extend(perm.iter().map(|&i| rows[i].clone()));
        let registry = RowRegistry::new(reordered).unwrap();
        let actual = compute_all(&registry, &EvaluationState::new(&registry));

        prop_assert!(actual.stats.converged);
        for row in registry.iter() {
            prop_assert_eq!(
                actual.base_value(&row.id).map(f64::to_bits),
                expected.base_value(&row.id).map(f64::to_bits)
            );
        }
    }

    #[test]
    fn prop_compute_is_deterministic(x in -1e6..1e6f64, y in -1e3..1e3f64) {
        let registry = RowRegistry::new(chain_rows()).unwrap();
        let mut state = EvaluationState::new(&registry);
        state.set_display_value(&registry, "x", x).unwrap();
        state.set_display_value(&registry, "y", y).unwrap();

        let first = compute_all(&registry, &state);
        let second = compute_all(&registry, &state);
        for row in registry.iter() {
            prop_assert_eq!(
                first.base_value(&row.id).map(f64::to_bits),
                second.base_value(&row.id).map(f64::to_bits)
            );
        }
    }
}
