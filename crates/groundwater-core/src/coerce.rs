//! Defensive conversion of raw worksheet cells.
//!
//! Every other component reads cells through these functions and never
//! touches [`Cell`] contents directly. Nothing here fails: malformed
//! content degrades to a default, and [`classify_float`] lets callers
//! tell a blank cell apart from an unparseable one so the latter can be
//! counted as a data-quality signal.
//!
//! # Missing tokens
//!
//! | Raw content | Result of [`to_float`] |
//! |-------------|------------------------|
//! | absent / empty cell | `default` |
//! | `""`, `"-"`, `"NA"`, `"N/A"`, `"NR"`, `"--"` | `default` |
//! | `"1,234.5"` | `1234.5` |
//! | `"n.a."`, `"abc"` | `default` (counted as invalid) |

/// Raw content of one worksheet cell as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One worksheet row, densely indexed by 0-based column.
pub type Row = Vec<Cell>;

/// String tokens that stand for "no value" in the published reports.
pub const MISSING_TOKENS: [&str; 6] = ["", "-", "NA", "N/A", "NR", "--"];

/// Outcome of reading a cell as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Value(f64),
    /// Blank cell or one of [`MISSING_TOKENS`].
    Missing,
    /// Content present but not a number.
    Invalid,
}

/// Classify a cell as a number, a missing marker, or invalid content.
pub fn classify_float(cell: Option<&Cell>) -> Coerced {
    match cell {
        None | Some(Cell::Empty) => Coerced::Missing,
        Some(Cell::Number(n)) if n.is_finite() => Coerced::Value(*n),
        Some(Cell::Number(_)) => Coerced::Invalid,
        Some(Cell::Bool(b)) => Coerced::Value(if *b { 1.0 } else { 0.0 }),
        Some(Cell::Text(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            let cleaned = cleaned.trim();
            if MISSING_TOKENS.contains(&cleaned) {
                return Coerced::Missing;
            }
            match cleaned.parse::<f64>() {
                Ok(v) if v.is_finite() => Coerced::Value(v),
                _ => Coerced::Invalid,
            }
        }
    }
}

/// Read a cell as `f64`, returning `default` for missing or invalid content.
pub fn to_float(cell: Option<&Cell>, default: f64) -> f64 {
    match classify_float(cell) {
        Coerced::Value(v) => v,
        Coerced::Missing | Coerced::Invalid => default,
    }
}

/// Read a cell as trimmed text; absent cells and the literal `none` map to `default`.
pub fn to_string(cell: Option<&Cell>, default: &str) -> String {
    let raw = match cell {
        None | Some(Cell::Empty) => return default.to_string(),
        Some(Cell::Number(n)) => format_number(*n),
        Some(Cell::Bool(b)) => (if *b { "True" } else { "False" }).to_string(),
        Some(Cell::Text(s)) => s.trim().to_string(),
    };
    if raw.eq_ignore_ascii_case("none") {
        default.to_string()
    } else {
        raw
    }
}

/// Like [`to_string`] but returns `None` instead of an empty string.
pub fn to_opt_string(cell: Option<&Cell>) -> Option<String> {
    let s = to_string(cell, "");
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Numeric cells holding names or codes render without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tokens_return_default() {
        for token in MISSING_TOKENS {
            let cell = Cell::from(token);
            assert_eq!(to_float(Some(&cell), 7.5), 7.5, "token {:?}", token);
            assert_eq!(classify_float(Some(&cell)), Coerced::Missing);
        }
        assert_eq!(to_float(None, 3.0), 3.0);
        assert_eq!(to_float(Some(&Cell::Empty), -1.0), -1.0);
    }

    #[test]
    fn strips_thousands_separators_and_whitespace() {
        assert_eq!(to_float(Some(&Cell::from(" 1,234.5 ")), 0.0), 1234.5);
        assert_eq!(to_float(Some(&Cell::from("12,34,567")), 0.0), 1234567.0);
    }

    #[test]
    fn numbers_pass_through() {
        assert_eq!(to_float(Some(&Cell::Number(42.25)), 0.0), 42.25);
        assert_eq!(to_float(Some(&Cell::Bool(true)), 0.0), 1.0);
    }

    #[test]
    fn garbage_is_invalid_not_missing() {
        assert_eq!(classify_float(Some(&Cell::from("abc"))), Coerced::Invalid);
        assert_eq!(classify_float(Some(&Cell::from("n.a."))), Coerced::Invalid);
        assert_eq!(to_float(Some(&Cell::from("abc")), 0.0), 0.0);
        assert_eq!(classify_float(Some(&Cell::Number(f64::NAN))), Coerced::Invalid);
    }

    #[test]
    fn string_trims_and_maps_none() {
        assert_eq!(to_string(Some(&Cell::from("  Pune  ")), ""), "Pune");
        assert_eq!(to_string(Some(&Cell::from("None")), "x"), "x");
        assert_eq!(to_string(Some(&Cell::from("NONE")), ""), "");
        assert_eq!(to_string(None, "dflt"), "dflt");
        assert_eq!(to_opt_string(Some(&Cell::from("   "))), None);
        assert_eq!(to_opt_string(Some(&Cell::from("none"))), None);
    }

    #[test]
    fn numeric_names_render_without_decimals() {
        assert_eq!(to_string(Some(&Cell::Number(12.0)), ""), "12");
        assert_eq!(to_string(Some(&Cell::Number(1.5)), ""), "1.5");
    }
}
