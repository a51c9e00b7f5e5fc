//! Built-in functions
//!
//! Only the two functions the row formulas use are provided. Names are
//! case-insensitive.

use crate::error::FormulaResult;
use ahash::AHashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[f64]) -> FormulaResult<f64>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        // CEILING(x, significance)
        registry.register(FunctionDef {
            name: "CEILING",
            min_args: 2,
            max_args: Some(2),
            implementation: fn_ceiling,
        });

        // PI()
        registry.register(FunctionDef {
            name: "PI",
            min_args: 0,
            max_args: Some(0),
            implementation: fn_pi,
        });

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Round `x` up to the nearest multiple of `significance`
///
/// A zero or non-finite significance, or a non-finite `x`, gives `NaN`.
///
/// # Example
/// ```
/// use timeline_calc_formula::ceiling;
///
/// assert_eq!(ceiling(7.0, 5.0), 10.0);
/// assert_eq!(ceiling(10.0, 5.0), 10.0);
/// assert!(ceiling(3.0, 0.0).is_nan());
/// ```
pub fn ceiling(x: f64, significance: f64) -> f64 {
    if !x.is_finite() || !significance.is_finite() || significance == 0.0 {
        return f64::NAN;
    }
    (x / significance).ceil() * significance
}

fn fn_ceiling(args: &[f64]) -> FormulaResult<f64> {
    Ok(ceiling(args[0], args[1]))
}

fn fn_pi(_args: &[f64]) -> FormulaResult<f64> {
    Ok(std::f64::consts::PI)
}
