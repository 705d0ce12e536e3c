//! BRL money formatting for alert messages.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount as Brazilian reais: `R$ 1.234,56`.
///
/// Thousands are grouped with `.`, cents separated by `,`, negative amounts
/// carry a leading minus sign.
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    let mut abs = rounded.abs();
    abs.rescale(2);
    let text = abs.to_string();
    let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = units.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    if negative {
        format!("-R$ {grouped},{cents}")
    } else {
        format!("R$ {grouped},{cents}")
    }
}

/// Round a percentage to a whole number, half away from zero.
///
/// Matches how alert messages report limit/budget usage ("85%").
pub fn round_percent(pct: Decimal) -> Decimal {
    pct.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}
