//! Text <-> f64 conversions with the rounding and notation rules the chain
//! tooling and the wallet expect.

/// Parse a whole string as a number.
///
/// Surrounding whitespace is ignored, an empty string is `0`, `Infinity` and
/// `0x`/`0o`/`0b` literals are accepted. Anything else that is not a plain
/// decimal literal is `NaN`.
pub fn parse_number(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|v| v as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // f64::from_str also takes "inf"/"nan" spellings, reject those first
    let plain = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !plain {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parse the longest numeric prefix of a string, ignoring leading
/// whitespace. `"1.5abc"` is `1.5`, `"abc"` is `NaN`.
pub fn parse_float_prefix(text: &str) -> f64 {
    let t = text.trim_start();
    let bytes = t.as_bytes();
    let len = bytes.len();

    let mut end = 0;
    let negative = matches!(bytes.first(), Some(b'-'));
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if t[end..].starts_with("Infinity") {
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < len && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < len && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < len && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    t[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Shortest round-trip representation. Plain notation for magnitudes in
/// `[1e-6, 1e21)`, exponent notation (`1e-7`, `1.5e+21`) outside it.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{}", value);
    }

    let repr = format!("{:e}", value);
    match repr.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => repr,
    }
}

/// Upper bound on fractional digits accepted by [`to_fixed`]
pub const MAX_FIXED_DIGITS: usize = 100;

/// Fixed-point formatting with `digits` fractional digits, rounding half
/// away from zero on the exact binary value. Magnitudes of `1e21` and above
/// fall back to [`format_number`]. `digits` is capped at [`MAX_FIXED_DIGITS`].
pub fn to_fixed(value: f64, digits: usize) -> String {
    let digits = digits.min(MAX_FIXED_DIGITS);
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.abs() >= 1e21 {
        return format_number(value);
    }

    let negative = value < 0.0;
    // Guard digits keep the first dropped digit exact before we round on it
    let exact = format!("{:.*}", digits + 30, value.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut kept: Vec<u8> = int_part.bytes().chain(frac_part.bytes().take(digits)).collect();
    let round_up = frac_part.as_bytes().get(digits).is_some_and(|d| *d >= b'5');

    if round_up {
        let mut i = kept.len();
        loop {
            if i == 0 {
                kept.insert(0, b'1');
                break;
            }
            i -= 1;
            if kept[i] == b'9' {
                kept[i] = b'0';
            } else {
                kept[i] += 1;
                break;
            }
        }
    }

    let split = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(std::str::from_utf8(&kept[..split]).unwrap_or("0"));
    if digits > 0 {
        out.push('.');
        out.push_str(std::str::from_utf8(&kept[split..]).unwrap_or(""));
    }
    out
}
