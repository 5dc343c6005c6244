// Utility helpers for number parsing, rounding and display formatting.
//
// Source documents are loosely typed, so anything that turns a "number-ish"
// value into an `f64`, or an `f64` into text for humans, lives here.
use num_format::{Locale, ToFormattedString};
use serde_json::Value;
use std::cmp::Ordering;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in hand-maintained exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (this also rejects
///   a quoted `"NaN"`).
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a JSON value as a number, accepting numeric strings.
pub fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

/// Read a JSON value as display text. Numbers are rendered as written
/// (financial years sometimes arrive as `2021` rather than `"2021-22"`).
pub fn value_as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Round to one decimal place from the exact stored value.
///
/// Scaling by ten first would round the scaled copy instead: `42.05` is
/// stored just below the tie, so it must give `42.0`, not `42.1`. Exact
/// binary ties (`x.25`, `x.75`) go away from zero.
pub fn round1(v: f64) -> f64 {
    let quarters = v * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (v * 10.0).round() / 10.0;
    }
    format!("{v:.1}").parse().unwrap_or(v)
}

/// `value / total * 100` with one decimal, as text. A zero total yields
/// `"0.0"` rather than a NaN or infinity.
pub fn percentage_string(value: f64, total: f64) -> String {
    if total > 0.0 {
        format!("{:.1}", round1(value / total * 100.0))
    } else {
        "0.0".to_string()
    }
}

/// Descending comparison for `f64` keys; incomparable values are treated as
/// equal so a stable sort keeps their input order.
pub fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages
    // (e.g., `140 files parsed`).
    n.to_formatted_string(&Locale::en)
}

/// Amount in crores for display: whole crores from 100 up, one decimal from
/// 10, two decimals from 1, and lakhs (1 crore = 100 lakhs) below that.
pub fn format_amount_cr(amount: f64) -> String {
    if amount >= 100.0 {
        format!("₹{:.0} Cr", amount)
    } else if amount >= 10.0 {
        format!("₹{:.1} Cr", amount)
    } else if amount >= 1.0 {
        format!("₹{:.2} Cr", amount)
    } else {
        format!("₹{:.1} L", amount * 100.0)
    }
}

/// `tabled` display hook for crore amounts.
pub fn display_crores(v: &f64) -> String {
    format_number(*v, 2)
}
