//! Coercion of spreadsheet cells into amounts.

use serde_json::Value;

/// Converts a sheet cell into an amount, or `None` when it is not numeric.
///
/// Text cells accept accounting notation: `"(1,234.50)"` is `-1234.5`.
pub fn normalize_amount(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Parses formatted currency text. Thousands separators and whitespace are
/// stripped; parentheses around the number negate it.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (negative, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value: f64 = digits.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}

/// Sum that treats missing values as zero.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().sum()
}
