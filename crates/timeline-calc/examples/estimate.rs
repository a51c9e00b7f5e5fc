//! Example: Estimate a two-stage process and print it in display units

use timeline_calc::prelude::*;

fn main() -> Result<()> {
    let registry = RowRegistry::new(vec![
        RowDefinition::input("length", "Scan length", "B2")
            .with_section("Scan")
            .with_unit("mm", "m", 1e-3)
            .with_default(120.0),
        RowDefinition::input("speed", "Scan speed", "B3")
            .with_section("Scan")
            .with_unit("mm/s", "m/s", 1e-3)
            .with_default(4.0),
        RowDefinition::input("passes", "Passes", "B4")
            .with_section("Scan")
            .with_default(3.0),
        RowDefinition::output("scan_time", "Scan time", "B5", "=B2*D2/(B3*D3)*B4/60")
            .with_section("Scan")
            .with_unit("minutes", "s", 60.0),
        RowDefinition::output("total", "Total", "B6", "=B5*D5+B7")
            .with_section("Summary")
            .with_unit("seconds", "s", 1.0),
        RowDefinition::input("setup", "Setup", "B7")
            .with_section("Summary")
            .with_unit("seconds", "s", 1.0)
            .with_default(45.0),
    ])?;

    let mut state = EvaluationState::new(&registry);
    if let Some(minutes) = unit_options_for_base(Some("s"))
        .into_iter()
        .find(|u| u.label == "minutes")
    {
        state.set_unit("total", &minutes)?;
    }

    let result = compute_all(&registry, &state);

    for section in registry.sections() {
        println!("[{}]", section);
        for row in registry.rows_in_section(section) {
            let base = result.base_value(&row.id).unwrap_or(f64::NAN);
            let unit = selected_unit_option(row, &state)
                .map(|u| u.label)
                .unwrap_or_default();
            println!(
                "  {:<12} {:>8} {}",
                row.label,
                format_display_number(display_value(row, &state, base)),
                unit
            );
            if let Some(formula) = row.formula() {
                println!("  {:<12} = {}", "", readable_formula(formula, &registry));
            }
        }
    }

    println!("\n{} passes, converged: {}", result.stats.passes, result.stats.converged);
    Ok(())
}
