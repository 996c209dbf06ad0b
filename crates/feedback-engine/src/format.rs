//! pt-BR presentation helpers for money and percentages.
//!
//! Rounding is half away from zero on the exact binary value of the input, so
//! `12.35_f64` (stored as 12.3499...) renders as `12.3%`.

use rust_decimal::{Decimal, RoundingStrategy};

fn exact_round(value: f64, dp: u32) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format a BRL amount, e.g. `R$ 12.345,67` or `-R$ 500,00`.
pub fn format_currency(value: f64) -> String {
    let Some(rounded) = exact_round(value, 2) else {
        return format!("R$ {value:.2}");
    };
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}R$ {},{frac}", group_thousands(int_part))
}

/// Format a percentage with one decimal, e.g. `12.3%`.
pub fn format_percent(value: f64) -> String {
    match exact_round(value, 1) {
        Some(d) => format!("{d:.1}%"),
        None => format!("{value:.1}%"),
    }
}

/// Like [`format_percent`] but with an explicit `+` for positive values.
pub fn format_signed_percent(value: f64) -> String {
    let s = format_percent(value);
    if value > 0.0 && !s.starts_with('-') {
        format!("+{s}")
    } else {
        s
    }
}

/// Format percentage points with one decimal, e.g. `2.5 p.p.`.
pub fn format_points(value: f64) -> String {
    let pct = format_percent(value);
    format!("{} p.p.", pct.trim_end_matches('%'))
}
