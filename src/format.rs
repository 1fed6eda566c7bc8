//! Display helpers for prices, counters, and product URLs.

use crate::types::{Money, ProductId};

const NAME_ID_SEPARATOR: &str = "-i-";

/// Formats `amount` with `.` as the thousands separator: `1234567` → `1.234.567`.
pub fn format_currency(amount: Money) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Compact counter with one decimal and a comma: `1234` → `1,2k`, `2500000` → `2,5m`.
pub fn format_number_to_social_style(value: u64) -> String {
    const UNITS: [(u128, &str); 3] = [(1_000, "k"), (1_000_000, "m"), (1_000_000_000, "b")];

    let value = u128::from(value);
    let Some(mut unit) = UNITS.iter().rposition(|(scale, _)| value >= *scale) else {
        return value.to_string();
    };
    let tenths = |scale: u128| (value * 10 + scale / 2) / scale;
    // Rounding can carry into the next unit: 999_999 is 1m, not 1000k.
    while unit + 1 < UNITS.len() && tenths(UNITS[unit].0) >= 10_000 {
        unit += 1;
    }
    let (scale, suffix) = UNITS[unit];
    let tenths = tenths(scale);
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole},{frac}{suffix}")
    }
}

/// Rounded discount in percent from `price` down to `sale_price`.
pub fn discount_percentage(price: Money, sale_price: Money) -> i64 {
    if price == 0 {
        return 0;
    }
    ((1.0 - sale_price as f64 / price as f64) * 100.0).round() as i64
}

/// URL slug `name-i-id`, with punctuation stripped and spaces dashed.
pub fn generate_name_id(name: &str, id: &ProductId) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !is_special(*c))
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!("{cleaned}{NAME_ID_SEPARATOR}{id}")
}

/// Recovers the product id from a slug built by [`generate_name_id`].
pub fn id_from_name_id(name_id: &str) -> ProductId {
    let id = name_id.rsplit(NAME_ID_SEPARATOR).next().unwrap_or(name_id);
    ProductId::from(id)
}

fn is_special(c: char) -> bool {
    matches!(
        c,
        '!' | '@'
            | '%'
            | '^'
            | '*'
            | '('
            | ')'
            | '+'
            | '='
            | '<'
            | '>'
            | '?'
            | '/'
            | ','
            | '.'
            | ':'
            | ';'
            | '\''
            | '"'
            | '&'
            | '#'
            | '['
            | ']'
            | '~'
            | '$'
            | '_'
            | '`'
            | '-'
            | '{'
            | '}'
            | '|'
            | '\\'
    )
}
