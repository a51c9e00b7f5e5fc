//! Timeline CLI - evaluate an estimator configuration from the command line

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use timeline_calc::prelude::*;
use timeline_calc::{
    derived_direct_dependencies, derived_input_dependencies, normalize_unit_label,
    readable_formula_with, DependencyGraph, Translator,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timeline")]
#[command(author, version, about = "Multi-stage timeline estimator")]
struct Cli {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every row and print the results
    Compute {
        /// Configuration file (JSON)
        config: PathBuf,

        /// Set an input's display value, e.g. --set wafer_count=50
        #[arg(long = "set", value_name = "ID=VALUE")]
        set: Vec<String>,

        /// Choose a row's display unit, e.g. --unit total=minutes
        #[arg(long = "unit", value_name = "ID=LABEL")]
        unit: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Maximum relaxation passes
        #[arg(long, default_value_t = 10)]
        max_passes: usize,
    },

    /// Show a row's formula in readable and translated form
    Formula {
        /// Configuration file (JSON)
        config: PathBuf,

        /// Row id
        id: String,
    },

    /// Report unresolved references, failing formulas and stale dependency sets
    Check {
        /// Configuration file (JSON)
        config: PathBuf,
    },

    /// List the display units available for a base unit
    Units {
        /// Base unit tag (s, m, m², m³, m/s, m³/s, Hz)
        base: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compute {
            config,
            set,
            unit,
            json,
            max_passes,
        } => compute(&config, &set, &unit, json, max_passes),
        Commands::Formula { config, id } => show_formula(&config, &id),
        Commands::Check { config } => check(&config),
        Commands::Units { base } => list_units(&base),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> Result<(Config, RowRegistry)> {
    let config = Config::from_path(path)
        .with_context(|| format!("Failed to load '{}'", path.display()))?;
    let registry = config
        .registry()
        .with_context(|| format!("Invalid rows in '{}'", path.display()))?;
    Ok((config, registry))
}

/// Split `id=value`
fn parse_assignment(arg: &str) -> Result<(&str, &str)> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected ID=VALUE, got '{}'", arg))?;
    let (id, value) = (id.trim(), value.trim());
    if id.is_empty() {
        bail!("Missing row id in '{}'", arg);
    }
    Ok((id, value))
}

/// Numeric text as typed into an input cell; blank is 0 and anything else
/// that is not a number becomes NaN.
fn parse_display_value(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.parse().unwrap_or_else(|_| {
        tracing::warn!(value = text, "not a number, using NaN");
        f64::NAN
    })
}

fn apply_values(registry: &RowRegistry, state: &mut EvaluationState, sets: &[String]) -> Result<()> {
    for arg in sets {
        let (id, value) = parse_assignment(arg)?;
        state
            .set_display_value(registry, id, parse_display_value(value))
            .with_context(|| format!("Cannot set '{}'", id))?;
    }
    Ok(())
}

fn compute(
    path: &Path,
    sets: &[String],
    units: &[String],
    json: bool,
    max_passes: usize,
) -> Result<()> {
    let (config, registry) = load(path)?;
    let mut state = EvaluationState::new(&registry);

    for arg in units {
        let (id, label) = parse_assignment(arg)?;
        let row = registry
            .get(id)
            .with_context(|| format!("Unknown row '{}'", id))?;
        let wanted = normalize_unit_label(label);
        let option = unit_options_for_base(row.base_unit.as_deref())
            .into_iter()
            .find(|u| normalize_unit_label(&u.label) == wanted)
            .with_context(|| format!("Row '{}' has no unit '{}'", id, label))?;
        state.set_unit(id, &option)?;
    }

    apply_values(&registry, &mut state, sets)?;

    let options = CalculationOptions::default()
        .with_columns(config.columns)
        .with_max_passes(max_passes);
    let result = registry.compute_with_options(&state, &options);

    if json {
        print_json(&registry, &state, &result)?;
    } else {
        print_table(&registry, &state, &result);
    }
    Ok(())
}

fn unit_label(row: &RowDefinition, state: &EvaluationState) -> Option<String> {
    selected_unit_option(row, state)
        .map(|u| u.label)
        .or_else(|| row.display_unit.clone())
}

fn print_table(registry: &RowRegistry, state: &EvaluationState, result: &ComputeResult) {
    let width = registry
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut section = None;
    for row in registry.iter() {
        if section != Some(row.section.as_str()) {
            section = Some(row.section.as_str());
            if !row.section.is_empty() {
                println!();
                println!("[{}]", row.section);
            }
        }

        let base = result.base_value(&row.id).unwrap_or(f64::NAN);
        let shown = format_display_number(display_value(row, state, base));
        let marker = if row.is_input() { ' ' } else { '=' };
        match unit_label(row, state) {
            Some(unit) => println!("{marker} {:<width$}  {shown} {unit}", row.label),
            None => println!("{marker} {:<width$}  {shown}", row.label),
        }
    }

    eprintln!(
        "\n{} formulas, {} passes{}, {} errors",
        result.stats.formula_count,
        result.stats.passes,
        if result.stats.converged {
            ""
        } else {
            " (not converged)"
        },
        result.stats.errors
    );
    for diagnostic in &result.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
}

fn print_json(
    registry: &RowRegistry,
    state: &EvaluationState,
    result: &ComputeResult,
) -> Result<()> {
    let rows: Vec<serde_json::Value> = registry
        .iter()
        .map(|row| {
            let base = result.base_value(&row.id).unwrap_or(f64::NAN);
            serde_json::json!({
                "id": row.id,
                "label": row.label,
                "kind": row.kind,
                "baseValue": base,
                "displayValue": display_value(row, state, base),
                "unit": unit_label(row, state),
            })
        })
        .collect();

    let output = serde_json::json!({
        "rows": rows,
        "stats": {
            "formulaCount": result.stats.formula_count,
            "passes": result.stats.passes,
            "converged": result.stats.converged,
            "rowsEvaluated": result.stats.rows_evaluated,
            "errors": result.stats.errors,
        },
        "diagnostics": result.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to encode JSON")?
    );
    Ok(())
}

fn show_formula(path: &Path, id: &str) -> Result<()> {
    let (config, registry) = load(path)?;
    let row = registry
        .get(id)
        .with_context(|| format!("Unknown row '{}'", id))?;
    let Some(formula) = row.formula() else {
        println!("{} has no formula", row.label);
        return Ok(());
    };

    println!("{}", row.label);
    println!("  source:     {}", formula);
    println!(
        "  readable:   {}",
        readable_formula_with(formula, &registry, config.columns)
    );

    let translated = Translator::new(&registry)
        .with_columns(config.columns)
        .translate(formula, row)
        .with_context(|| format!("Failed to parse the formula of '{}'", id))?;
    println!("  translated: {}", translated.text());
    for diagnostic in &translated.diagnostics {
        println!("  warning:    {}", diagnostic);
    }

    let depends_on = config.direct_dependencies(id);
    if !depends_on.is_empty() {
        println!("  reads:      {}", depends_on.join(", "));
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let (config, registry) = load(path)?;
    let mut problems = 0usize;

    let options = CalculationOptions::default().with_columns(config.columns);
    let result = registry.compute_with_options(&EvaluationState::new(&registry), &options);
    for diagnostic in &result.diagnostics {
        println!("{}", diagnostic);
        problems += 1;
    }

    let derived = [
        (
            "directDeps",
            &config.direct_deps,
            derived_direct_dependencies(&registry, config.columns),
        ),
        (
            "inputDeps",
            &config.input_deps,
            derived_input_dependencies(&registry, config.columns),
        ),
    ];
    for (name, configured, derived) in &derived {
        for (id, deps) in derived {
            let listed = configured.get(id).map(Vec::as_slice).unwrap_or_default();
            if listed != deps.as_slice() {
                println!(
                    "{}: {} lists [{}], formulas read [{}]",
                    id,
                    name,
                    listed.join(", "),
                    deps.join(", ")
                );
                problems += 1;
            }
        }
    }

    let cyclic = DependencyGraph::from_registry(&registry, config.columns).cyclic_rows();
    if !cyclic.is_empty() {
        println!("circular references: {}", cyclic.join(", "));
        problems += 1;
    }

    if problems > 0 {
        bail!("{} problem(s) in '{}'", problems, path.display());
    }
    println!("{} rows OK", registry.len());
    Ok(())
}

fn list_units(base: &str) -> Result<()> {
    let options = unit_options_for_base(Some(base));
    if options.is_empty() {
        bail!("No display units for base unit '{}'", base);
    }
    for option in options {
        println!("{}\t{}", option.label, option.to_base);
    }
    Ok(())
}
