//! Human-readable formulas
//!
//! Renders a row formula for display: value references become row labels,
//! conversion-factor references disappear, `PI()` becomes `π` and `CEILING`
//! is lowercased. Formulas the parser understands are simplified on the tree
//! and printed with minimal parentheses; anything else goes through ordered
//! text substitutions instead. Both paths finish with the same cosmetic
//! tidy-up, so feeding the output back in gives the same string.

use crate::ast::{BinaryOperator, ExprStyle, FormulaExpr};
use crate::parser::parse_formula;
use lazy_regex::regex;
use regex::Captures;
use timeline_calc_core::{CellAddress, ReferenceColumns, RowRegistry};

/// Readable form of `raw` using the default reference columns
///
/// # Example
/// ```rust
/// use timeline_calc_core::{RowDefinition, RowRegistry};
/// use timeline_calc_formula::readable_formula;
///
/// let registry = RowRegistry::new(vec![
///     RowDefinition::input("len", "Length", "B2").with_unit("mm", "m", 1e-3),
///     RowDefinition::input("speed", "Speed", "B3").with_unit("mm/s", "m/s", 1e-3),
///     RowDefinition::output("time", "Time", "B4", "=B2*D2/(B3*D3)"),
/// ])
/// .unwrap();
///
/// assert_eq!(readable_formula("=B2*D2/(B3*D3)", &registry), "Length / Speed");
/// ```
pub fn readable_formula(raw: &str, registry: &RowRegistry) -> String {
    readable_formula_with(raw, registry, ReferenceColumns::default())
}

/// Readable form of `raw` with explicit reference columns
pub fn readable_formula_with(
    raw: &str,
    registry: &RowRegistry,
    columns: ReferenceColumns,
) -> String {
    let text = match parse_formula(raw) {
        Ok(expr) if is_plain(&expr) => {
            let style = LabelStyle { registry, columns };
            simplify(expr, columns).render(&style)
        }
        _ => rewrite_text(raw, registry, columns),
    };
    tidy(&text)
}

/// Only numbers, cell references and the two known functions
///
/// Anything else (free identifiers, other functions) is most likely already
/// readable text and is left to the textual path.
fn is_plain(expr: &FormulaExpr) -> bool {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::CellRef(_) => true,
        FormulaExpr::NameRef(_) => false,
        FormulaExpr::BinaryOp { left, right, .. } => is_plain(left) && is_plain(right),
        FormulaExpr::UnaryOp { operand, .. } => is_plain(operand),
        FormulaExpr::Function { name, args } => match name.as_str() {
            "PI" => args.is_empty(),
            "CEILING" => args.len() == 2 && args.iter().all(is_plain),
            _ => false,
        },
    }
}

fn is_factor_ref(expr: &FormulaExpr, columns: ReferenceColumns) -> bool {
    matches!(expr, FormulaExpr::CellRef(a) if a.column == columns.factor)
}

/// Drop `* D<n>` / `/ D<n>`, show other factor cells as 1, collapse `* 1` / `/ 1`
fn simplify(expr: FormulaExpr, columns: ReferenceColumns) -> FormulaExpr {
    match expr {
        FormulaExpr::BinaryOp { op, left, right } => {
            let scaling = matches!(op, BinaryOperator::Multiply | BinaryOperator::Divide);
            let left = simplify(*left, columns);
            if scaling && is_factor_ref(&right, columns) {
                return left;
            }
            let right = simplify(*right, columns);
            if scaling && matches!(right, FormulaExpr::Number(n) if n == 1.0) {
                return left;
            }
            FormulaExpr::binary(op, left, right)
        }
        FormulaExpr::CellRef(address) if address.column == columns.factor => {
            FormulaExpr::Number(1.0)
        }
        FormulaExpr::UnaryOp { op, operand } => FormulaExpr::UnaryOp {
            op,
            operand: Box::new(simplify(*operand, columns)),
        },
        FormulaExpr::Function { name, args } => FormulaExpr::Function {
            name,
            args: args.into_iter().map(|a| simplify(a, columns)).collect(),
        },
        other => other,
    }
}

struct LabelStyle<'a> {
    registry: &'a RowRegistry,
    columns: ReferenceColumns,
}

impl LabelStyle<'_> {
    fn label_for(&self, address: &CellAddress) -> String {
        if address.column != self.columns.value {
            return address.key();
        }
        self.registry
            .row_at(address)
            .map(|row| collapse_whitespace(&row.label))
            .unwrap_or_else(|| address.key())
    }
}

impl ExprStyle for LabelStyle<'_> {
    fn cell(&self, address: &CellAddress) -> String {
        self.label_for(address)
    }

    fn function(&self, name: &str, args: &[String]) -> String {
        match name {
            "PI" if args.is_empty() => "π".to_string(),
            "CEILING" => format!("ceiling({})", args.join(", ")),
            _ => format!("{}({})", name, args.join(", ")),
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Textual path for formulas the parser rejects
fn rewrite_text(raw: &str, registry: &RowRegistry, columns: ReferenceColumns) -> String {
    let trimmed = raw.trim();
    let mut s = trimmed.strip_prefix('=').unwrap_or(trimmed).to_string();

    // Factor cells used as a scale vanish entirely
    s = regex!(r"\s*[*/]\s*\$?([A-Z])\$?(\d{1,3})\b")
        .replace_all(&s, |caps: &Captures| {
            if column_of(caps, 1) == Some(columns.factor) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    s = regex!(r"(^|[^\w$.])\$?([A-Z])\$?(\d{1,3})\b")
        .replace_all(&s, |caps: &Captures| {
            let prefix = &caps[1];
            let column = column_of(caps, 2);
            let replacement = match (column, caps[3].parse::<u16>()) {
                (Some(c), Ok(row)) if c == columns.value => {
                    let address = CellAddress::new(c, row);
                    registry
                        .row_at(&address)
                        .map(|r| collapse_whitespace(&r.label))
                        .unwrap_or_else(|| address.key())
                }
                (Some(c), _) if c == columns.factor => "1".to_string(),
                _ => caps[0][prefix.len()..].to_string(),
            };
            format!("{prefix}{replacement}")
        })
        .into_owned();

    loop {
        let next = regex!(r"\s*[*/]\s*1(\s*(?:[^\w.\s^]|$))").replace_all(&s, "$1");
        if next == s {
            break;
        }
        s = next.into_owned();
    }

    s = regex!(r"(?i)(^|[^\w])PI\(\)").replace_all(&s, "${1}π").into_owned();
    regex!(r"(?i)(^|[^\w])CEILING\(")
        .replace_all(&s, "${1}ceiling(")
        .into_owned()
}

fn column_of(caps: &Captures, group: usize) -> Option<char> {
    caps.get(group).and_then(|m| m.as_str().chars().next())
}

/// Cosmetic passes shared by both paths, repeated until nothing changes
fn tidy(text: &str) -> String {
    let mut s = text.trim().to_string();
    loop {
        let mut next = strip_single_token_parens(&s);
        while has_wrapping_parens(&next) {
            next = next[1..next.len() - 1].trim().to_string();
        }
        let next = normalize_spacing(&next);
        if next == s {
            return s;
        }
        s = next;
    }
}

/// `(Length)` becomes `Length`; call parentheses such as `f(x)` are kept
fn strip_single_token_parens(s: &str) -> String {
    let mut current = s.to_string();
    loop {
        let next = regex!(r"(^|[^\w])\(\s*([\w#.%µ²³ ]+?)\s*\)")
            .replace_all(&current, "${1}${2}")
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn has_wrapping_parens(s: &str) -> bool {
    if !(s.starts_with('(') && s.ends_with(')')) {
        return false;
    }
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i + c.len_utf8() < s.len() {
            return false;
        }
    }
    depth == 0
}

/// One space around binary operators, none after a sign, `, ` between arguments
fn normalize_spacing(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 8);
    let mut skip_space = false;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '+' | '*' | '/' | '^' | '=' => {
                push_operator(&mut out, c);
                skip_space = true;
            }
            '-' if is_exponent_sign(&chars, i) => out.push('-'),
            '-' if is_unary_position(&out) => {
                out.push('-');
                skip_space = true;
            }
            '-' => {
                push_operator(&mut out, c);
                skip_space = true;
            }
            ',' => {
                trim_end(&mut out);
                out.push_str(", ");
                skip_space = true;
            }
            '(' => {
                out.push('(');
                skip_space = true;
            }
            ')' => {
                trim_end(&mut out);
                out.push(')');
            }
            c if c.is_whitespace() => {
                if !skip_space && !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            c => {
                out.push(c);
                skip_space = false;
            }
        }
    }

    out.trim().to_string()
}

fn push_operator(out: &mut String, op: char) {
    trim_end(out);
    if !out.is_empty() {
        out.push(' ');
    }
    out.push(op);
    out.push(' ');
}

fn trim_end(out: &mut String) {
    let len = out.trim_end().len();
    out.truncate(len);
}

fn is_unary_position(out: &str) -> bool {
    match out.trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '+' | '-' | '*' | '/' | '^' | '=' | '(' | ','),
    }
}

// `1e-6`: the sign belongs to the number
fn is_exponent_sign(chars: &[char], i: usize) -> bool {
    i >= 2
        && matches!(chars[i - 1], 'e' | 'E')
        && chars[i - 2].is_ascii_digit()
        && chars.get(i + 1).map_or(false, |c| c.is_ascii_digit())
}
