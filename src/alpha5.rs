//! Alpha-5 catalog numbers: satellite numbers up to 339999 squeezed into
//! the five TLE columns by replacing the leading digits with a letter
//! (`A` = 10 .. `Z` = 33, skipping `I` and `O`).

use crate::errors::{malformed_tle, Result};

/// Largest number an Alpha-5 field can hold ("Z9999").
pub const MAX_ALPHA5: u32 = 339_999;

/// Encode a satellite number into its five column field.
pub fn to_alpha5(n: u32) -> Result<String> {
    if n < 100_000 {
        return Ok(format!("{n:05}"));
    }
    if n > MAX_ALPHA5 {
        return Err(malformed_tle!(
            "satellite number {n} exceeds {MAX_ALPHA5}, whose Alpha-5 encoding is 'Z9999'"
        ));
    }

    let mut code = (n / 10_000) as u8 + b'A' - 10;
    if code >= b'I' {
        code += 1;
    }
    if code >= b'O' {
        code += 1;
    }

    Ok(format!("{}{:04}", code as char, n % 10_000))
}

/// Decode a five column satellite number field, plain digits or Alpha-5.
pub fn from_alpha5(field: &str) -> Result<u32> {
    let field = field.trim();
    let Some(first) = field.chars().next() else {
        return Err(malformed_tle!("empty satellite number"));
    };

    if !first.is_ascii_alphabetic() {
        return field
            .parse::<u32>()
            .map_err(|e| malformed_tle!("satellite number '{field}': {e}"));
    }

    let c = first.to_ascii_uppercase();
    if c == 'I' || c == 'O' {
        return Err(malformed_tle!("'{c}' is not a valid Alpha-5 leading letter"));
    }
    let mut prefix = (c as u8 - b'A') as u32 + 10;
    if c > 'I' {
        prefix -= 1;
    }
    if c > 'O' {
        prefix -= 1;
    }

    let digits = &field[1..];
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed_tle!("Alpha-5 number '{field}' needs four trailing digits"));
    }
    let suffix: u32 = digits
        .parse()
        .map_err(|e| malformed_tle!("satellite number '{field}': {e}"))?;

    Ok(prefix * 10_000 + suffix)
}
