//! Number formatting for display values

/// Format a display value the way the estimator shows it
///
/// Non-finite values become `—`. Magnitudes of 1000 and above are rounded to
/// whole numbers; smaller values keep at most two decimals. The integer part
/// is grouped with commas.
///
/// ```rust
/// use timeline_calc::format_display_number;
///
/// assert_eq!(format_display_number(1234567.8), "1,234,568");
/// assert_eq!(format_display_number(3.14159), "3.14");
/// assert_eq!(format_display_number(f64::NAN), "—");
/// ```
pub fn format_display_number(n: f64) -> String {
    if !n.is_finite() {
        return "—".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let text = if n.abs() >= 1000.0 || n.fract() == 0.0 {
        format!("{:.0}", n.round())
    } else {
        // Ties round away from zero
        let fixed = format!("{:.2}", (n * 100.0).round() / 100.0);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    };

    group_thousands(&text)
}

fn group_thousands(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(dot) => unsigned.split_at(dot),
        None => (unsigned, ""),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(text.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{sign}{grouped}{frac_part}")
}
