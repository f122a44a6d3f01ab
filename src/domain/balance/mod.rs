//! Balance normalization and display formatting
//!
//! Every function here is total: malformed chain data never raises, it
//! degrades to a documented sentinel (`NaN`, [`ReducedBalance::Undefined`],
//! [`ReducedBalance::Zero`] or an empty string).

mod number;

pub use number::{format_number, parse_float_prefix, parse_number, to_fixed};

use serde::{Serialize, Serializer};
use crate::shared::types::Amount;

/// Default truncation precision for [`reduce_balance`]
pub const DEFAULT_REDUCE_PRECISION: u32 = 6;

/// Default fractional digits for [`human_readable_number`]
pub const DEFAULT_DISPLAY_DECIMALS: usize = 2;

/// Result of [`reduce_balance`].
///
/// `Zero` is only produced for a literal numeric zero; a zero that arrives
/// as text or inside a tag is a regular `Value(0.0)`. `Undefined` marks
/// empty or `NaN` input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReducedBalance {
    Value(f64),
    Zero,
    Undefined,
}

impl ReducedBalance {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReducedBalance::Value(v) => Some(*v),
            ReducedBalance::Zero => Some(0.0),
            ReducedBalance::Undefined => None,
        }
    }
}

impl Serialize for ReducedBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReducedBalance::Value(v) => v.serialize(serializer),
            ReducedBalance::Zero => 0.serialize(serializer),
            ReducedBalance::Undefined => serializer.serialize_unit(),
        }
    }
}

/// Convert any [`Amount`] shape into a float. Unparsable input is `NaN`.
pub fn extract_decimal(amount: &Amount) -> f64 {
    match amount {
        Amount::Int(s) | Amount::Decimal(s) if s.is_empty() => f64::NAN,
        Amount::Int(s) | Amount::Decimal(s) | Amount::Text(s) => parse_number(s),
        Amount::Number(n) => *n,
    }
}

/// Truncate (never round) an amount to `precision` fractional digits.
/// Integral values pass through unchanged.
pub fn reduce_balance(amount: &Amount, precision: u32) -> ReducedBalance {
    let parsed = match amount {
        Amount::Number(n) if *n == 0.0 => return ReducedBalance::Zero,
        Amount::Number(n) if n.is_nan() => return ReducedBalance::Undefined,
        Amount::Text(s) if s.is_empty() => return ReducedBalance::Undefined,
        Amount::Number(n) => *n,
        // An empty tag leaves nothing to unwrap, the object itself is not a number
        Amount::Int(s) | Amount::Decimal(s) if s.is_empty() => f64::NAN,
        Amount::Int(s) | Amount::Decimal(s) | Amount::Text(s) => parse_float_prefix(s),
    };

    if parsed.is_finite() && parsed.fract() == 0.0 {
        return ReducedBalance::Value(parsed);
    }
    let scale = 10f64.powi(precision as i32);
    ReducedBalance::Value((parsed * scale).trunc() / scale)
}

/// Fixed decimals with a comma every three integer digits.
/// Returns an empty string when the amount is not a number.
pub fn human_readable_number(amount: &Amount, decimal_places: usize) -> String {
    let value = extract_decimal(amount);
    if value.is_nan() {
        return String::new();
    }
    let fixed = to_fixed(value, decimal_places);
    if !value.is_finite() || fixed.contains('e') {
        return fixed;
    }
    match fixed.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_thousands(int_part), frac_part),
        None => group_thousands(&fixed),
    }
}

fn group_thousands(int_part: &str) -> String {
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push_str(sign);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Number of fractional digits in the shortest representation of `value`.
/// Integral values (and infinities) have none.
pub fn count_decimals(value: f64) -> usize {
    if value.floor() == value {
        return 0;
    }
    format_number(value)
        .split('.')
        .nth(1)
        .map(str::len)
        .unwrap_or(0)
}

/// Fractional digits needed to write `value` exactly in plain notation.
pub fn float_precision(value: f64) -> usize {
    if !value.is_finite() {
        return 0;
    }
    let repr = format_number(value);
    match repr.split_once('e') {
        Some((mantissa, exp)) => {
            let frac = mantissa.split_once('.').map(|(_, f)| f.len()).unwrap_or(0) as i64;
            let exp: i64 = exp.parse().unwrap_or(0);
            (frac - exp).max(0) as usize
        }
        None => repr.split_once('.').map(|(_, f)| f.len()).unwrap_or(0),
    }
}

/// Positions policy used by [`get_decimal_places`]: at least 2 digits,
/// at most 7, and an integral result collapses to 2.
pub fn get_decimal_positions(text: &str) -> String {
    let value = parse_number(text);
    let count = count_decimals(value);
    if count < 2 {
        to_fixed(value, 2)
    } else if count > 7 {
        let fixed = to_fixed(value, 7);
        if count_decimals(parse_number(&fixed)) == 0 {
            to_fixed(value, 2)
        } else {
            fixed
        }
    } else {
        format_number(value)
    }
}

/// Tiered display precision: up to 7 digits below 100, up to 5 below 1000,
/// grouped with 2 digits from 1000 on.
pub fn get_decimal_places(amount: &Amount) -> String {
    let value = extract_decimal(amount);
    let magnitude = value.abs();
    if magnitude < 100.0 {
        get_decimal_positions(&to_fixed(value, 7))
    } else if magnitude < 1000.0 {
        get_decimal_positions(&to_fixed(value, 5))
    } else {
        human_readable_number(&Amount::Number(value), DEFAULT_DISPLAY_DECIMALS)
    }
}

/// Append `.0` to integral literals so Pact reads them as decimals.
pub fn keep_decimal(text: &str) -> String {
    if text.contains('.') {
        text.to_string()
    } else {
        format!("{}.0", text)
    }
}

pub fn gas_unit(value: f64) -> String {
    to_fixed(value, 12)
}

pub fn pair_unit(amount: &Amount, digits: usize) -> String {
    to_fixed(extract_decimal(amount), digits)
}

/// Limit a user-typed amount to `count` fractional digits.
///
/// Partial input such as `"12."` is returned untouched so the field keeps
/// the trailing dot while the user is typing.
pub fn limit_decimal_places(text: &str, count: usize) -> String {
    let dot = text.find('.');
    if dot.is_none() {
        if text.is_empty() {
            return String::new();
        }
        let value = parse_number(text);
        if !value.is_nan() {
            return format_number(value);
        }
    }
    if let Some(idx) = dot {
        if idx == text.len() - 1 && !parse_number(&text[..idx]).is_nan() {
            return text.to_string();
        }
    }

    let digits_after = match dot {
        Some(idx) => text.len() - idx,
        None => text.len() + 1,
    };
    if digits_after > count && count != 0 {
        to_fixed(parse_float_prefix(text), count)
    } else {
        text.to_string()
    }
}

/// Truncate `value` to at most `max_places` fractional digits and render
/// it as a Pact decimal literal. Integral results get two zero digits.
pub fn clamp_to_precision(value: f64, max_places: u32) -> String {
    let exact_places = float_precision(value);
    let places = exact_places.min(max_places as usize);
    let exact = format!("{:.*}", exact_places, value);

    match exact.split_once('.') {
        Some((int_part, frac_part)) if places > 0 => {
            format!("{}.{}", int_part, &frac_part[..places])
        }
        Some((int_part, _)) => format!("{}.00", int_part),
        None => format!("{}.00", exact),
    }
}
