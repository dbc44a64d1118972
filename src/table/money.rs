use std::sync::OnceLock;

use regex::Regex;

pub const CURRENCY_SYMBOL: &str = "R$";

fn group_thousands(units: u128) -> String {
    let digits = units.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let cents = (value * 100.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u128;
    format!(
        "{sign}{CURRENCY_SYMBOL} {},{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

fn money_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(-)?\s*(?:R\$)?\s*(-)?\s*(\d{1,3}(?:\.\d{3})+|\d+)(?:,(\d{1,2}))?\s*$")
            .expect("money pattern is valid")
    })
}

/// Cents for `R$ 1.234,56`, and for bare amounts such as `1234,5` or `-R$ 10`.
pub fn parse_money(text: &str) -> Option<i64> {
    let caps = money_regex().captures(text)?;
    let negative = caps.get(1).is_some() || caps.get(2).is_some();
    let units: i64 = caps[3].replace('.', "").parse().ok()?;
    let cents = match caps.get(4).map(|m| m.as_str()) {
        Some(frac) if frac.len() == 1 => frac.parse::<i64>().ok()? * 10,
        Some(frac) => frac.parse::<i64>().ok()?,
        None => 0,
    };
    let total = units.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}
