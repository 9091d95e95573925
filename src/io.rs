//! Two-line element text: fixed-column parsing, re-encoding, checksums and
//! splitting of catalog text into (name, line 1, line 2) triples.

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::alpha5::{from_alpha5, to_alpha5};
use crate::elements::OrbitalElementSet;
use crate::errors::{malformed_tle, Result};
use crate::time::full_year;

pub const TLE_LINE_LENGTH: usize = 69;

const LINE1_FMT: &str =
    "1 NNNNNC NNNNNAAA NNNNN.NNNNNNNN +.NNNNNNNN +NNNNN-N +NNNNN-N N NNNNN";
const LINE2_FMT: &str =
    "2 NNNNN NNN.NNNN NNN.NNNN NNNNNNN NNN.NNNN NNN.NNNN NN.NNNNNNNNNNNNNN";

// column positions that must hold a fixed character, 0-based
const LINE1_LAYOUT: [(usize, u8); 8] = [
    (8, b' '),
    (23, b'.'),
    (32, b' '),
    (34, b'.'),
    (43, b' '),
    (52, b' '),
    (61, b' '),
    (63, b' '),
];
const LINE2_LAYOUT: [(usize, u8); 10] = [
    (7, b' '),
    (11, b'.'),
    (16, b' '),
    (20, b'.'),
    (25, b' '),
    (33, b' '),
    (37, b'.'),
    (42, b' '),
    (46, b'.'),
    (51, b' '),
];

fn layout_hint(line_no: u8, given: &str) -> String {
    format!(
        "expected layout:\n{}\ngot:\n{}",
        if line_no == 1 { LINE1_FMT } else { LINE2_FMT },
        given
    )
}

/// Compute the TLE checksum for the given line (first 68 columns).
///
/// Digits count their value, a minus sign counts as one, everything else zero.
pub fn compute_checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Return a copy of `line` padded to 68 columns with the correct checksum
/// appended, discarding any checksum already present.
pub fn fix_checksum(line: &str) -> String {
    let body: String = line.chars().take(TLE_LINE_LENGTH - 1).collect();
    let body = format!("{body:<68}");
    let checksum = compute_checksum(&body);
    format!("{body}{checksum}")
}

/// Check the digit in column 69 against the tally of the first 68 columns.
pub fn verify_checksum(line: &str) -> Result<()> {
    let given = match line.as_bytes().get(TLE_LINE_LENGTH - 1) {
        Some(b) if b.is_ascii_digit() => (b - b'0') as u32,
        Some(b) => {
            return Err(malformed_tle!(
                "checksum column holds '{}' instead of a digit:\n{line}",
                *b as char
            ))
        }
        None => return Err(malformed_tle!("line has no checksum column:\n{line}")),
    };

    let computed = compute_checksum(line);
    if given != computed {
        return Err(malformed_tle!(
            "TLE line gives its checksum as {given} but in fact tallies to {computed}:\n{line}"
        ));
    }
    Ok(())
}

/// Trim line terminators and trailing blanks, then enforce length, line
/// number, column layout and checksum.
fn prepare_line(raw: &str, line_no: u8) -> Result<&str> {
    let line = raw.trim_end();

    if !line.is_ascii() {
        return Err(malformed_tle!(
            "line {line_no} contains non-ASCII characters:\n{line}"
        ));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(malformed_tle!(
            "line {line_no} has {} columns instead of {TLE_LINE_LENGTH}\n{}",
            line.len(),
            layout_hint(line_no, line)
        ));
    }

    let bytes = line.as_bytes();
    if bytes[0] != b'0' + line_no || bytes[1] != b' ' {
        return Err(malformed_tle!(
            "line {line_no} must start with '{line_no} '\n{}",
            layout_hint(line_no, line)
        ));
    }
    let layout: &[(usize, u8)] = if line_no == 1 {
        &LINE1_LAYOUT
    } else {
        &LINE2_LAYOUT
    };
    if let Some((col, _)) = layout.iter().find(|(col, c)| bytes[*col] != *c) {
        return Err(malformed_tle!(
            "line {line_no} column {} is misplaced\n{}",
            col + 1,
            layout_hint(line_no, line)
        ));
    }

    verify_checksum(line)?;
    Ok(line)
}

fn parse_f64(line: &str, cols: Range<usize>, what: &str) -> Result<f64> {
    let field = line[cols].trim();
    field
        .parse::<f64>()
        .map_err(|e| malformed_tle!("failed to parse {what} from '{field}': {e}"))
}

fn parse_u32_or_zero(line: &str, cols: Range<usize>, what: &str) -> Result<u32> {
    let field = line[cols].trim();
    if field.is_empty() {
        return Ok(0);
    }
    field
        .parse::<u32>()
        .map_err(|e| malformed_tle!("failed to parse {what} from '{field}': {e}"))
}

/// Decode an eight column field with an implied leading decimal point and a
/// signed exponent but no 'E', e.g. `" 38792-4"` = 0.38792e-4.
fn parse_implied_exponent(line: &str, cols: Range<usize>, what: &str) -> Result<f64> {
    let field = &line[cols];
    let bytes = field.as_bytes();

    let sign = match bytes[0] {
        b'-' => -1.0,
        b' ' | b'+' | b'0' => 1.0,
        other => {
            return Err(malformed_tle!(
                "{what} field '{field}' has an invalid sign '{}'",
                other as char
            ))
        }
    };

    let mantissa_digits = field[1..6].replace(' ', "0");
    let mantissa: u32 = mantissa_digits
        .parse()
        .map_err(|e| malformed_tle!("failed to parse {what} mantissa from '{field}': {e}"))?;

    let exp_sign = match bytes[6] {
        b'-' => -1,
        b'+' | b' ' => 1,
        other => {
            return Err(malformed_tle!(
                "{what} field '{field}' has an invalid exponent sign '{}'",
                other as char
            ))
        }
    };
    if !bytes[7].is_ascii_digit() {
        return Err(malformed_tle!("{what} field '{field}' has no exponent digit"));
    }
    let exponent = exp_sign * (bytes[7] - b'0') as i32;

    Ok(sign * (mantissa as f64 / 1.0e5) * 10f64.powi(exponent))
}

/// Parse one element set from its two data lines and optional name line.
pub fn parse_tle(name: Option<&str>, line1: &str, line2: &str) -> Result<OrbitalElementSet> {
    let line1 = prepare_line(line1, 1)?;
    let line2 = prepare_line(line2, 2)?;

    let satellite_number = from_alpha5(&line1[2..7])?;
    let line2_number = from_alpha5(&line2[2..7])?;
    if satellite_number != line2_number {
        return Err(malformed_tle!(
            "object numbers in lines 1 and 2 do not match ({satellite_number} vs {line2_number})"
        ));
    }

    let two_digit_year = line1[18..20]
        .trim()
        .parse::<i32>()
        .map_err(|e| malformed_tle!("failed to parse epoch year from '{}': {e}", &line1[18..20]))?;
    let epoch_day = parse_f64(line1, 20..32, "epoch day")?;
    if !(1.0..367.0).contains(&epoch_day) {
        return Err(malformed_tle!("epoch day {epoch_day} is not a day of year"));
    }

    let ephemeris_type = match line1.as_bytes()[62] {
        b' ' => 0,
        b if b.is_ascii_digit() => b - b'0',
        b => {
            return Err(malformed_tle!(
                "ephemeris type '{}' is not a digit",
                b as char
            ))
        }
    };

    let eccentricity_digits = line2[26..33].replace(' ', "0");
    if !eccentricity_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed_tle!(
            "failed to parse eccentricity from '{}'",
            &line2[26..33]
        ));
    }
    let eccentricity = format!("0.{eccentricity_digits}")
        .parse::<f64>()
        .map_err(|e| malformed_tle!("failed to parse eccentricity: {e}"))?;

    Ok(OrbitalElementSet {
        name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        satellite_number,
        classification: line1.as_bytes()[7] as char,
        international_designator: line1[9..17].trim_end().to_string(),
        epoch_year: full_year(two_digit_year),
        epoch_day,
        mean_motion_dot: parse_f64(line1, 33..43, "first derivative of mean motion")?,
        mean_motion_ddot: parse_implied_exponent(line1, 44..52, "second derivative of mean motion")?,
        bstar: parse_implied_exponent(line1, 53..61, "drag term")?,
        ephemeris_type,
        element_set_number: parse_u32_or_zero(line1, 64..68, "element set number")?,
        inclination: parse_f64(line2, 8..16, "inclination")?,
        right_ascension: parse_f64(line2, 17..25, "right ascension of the ascending node")?,
        eccentricity,
        argument_of_perigee: parse_f64(line2, 34..42, "argument of perigee")?,
        mean_anomaly: parse_f64(line2, 43..51, "mean anomaly")?,
        mean_motion: parse_f64(line2, 52..63, "mean motion")?,
        revolution_number: parse_u32_or_zero(line2, 63..68, "revolution number")?,
    })
}

/// Parse a block of two data lines, optionally preceded by a name line
/// (a leading "0 " on the name line, as in 3LE files, is dropped).
pub fn parse_lines(text: &str) -> Result<OrbitalElementSet> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    match lines.as_slice() {
        [line1, line2] => parse_tle(None, line1, line2),
        [name, line1, line2] => {
            let name = name.trim();
            let name = name.strip_prefix("0 ").unwrap_or(name);
            parse_tle(Some(name), line1, line2)
        }
        other => Err(malformed_tle!("expected 2 or 3 lines, got {}", other.len())),
    }
}

// ---------------------------------------------------------------------
// encoding
// ---------------------------------------------------------------------

/// `|v| < 1` as sign + 8 decimals without the leading zero: `" .00001764"`.
fn format_decimal_fraction(v: f64, what: &str) -> Result<String> {
    let digits = format!("{:.8}", v.abs());
    let Some(fraction) = digits.strip_prefix('0') else {
        return Err(malformed_tle!("{what} {v} does not fit its TLE field"));
    };
    let sign = if v < 0.0 && digits != "0.00000000" { '-' } else { ' ' };
    Ok(format!("{sign}{fraction}"))
}

/// Inverse of `parse_implied_exponent`; zero is written as `" 00000-0"`.
fn format_implied_exponent(v: f64, what: &str) -> Result<String> {
    if !v.is_finite() {
        return Err(malformed_tle!("{what} {v} does not fit its TLE field"));
    }
    if v == 0.0 {
        return Ok(" 00000-0".to_string());
    }
    let sign = if v < 0.0 { '-' } else { ' ' };
    let a = v.abs();

    let mut exponent = a.log10().floor() as i32 + 1;
    let mut mantissa = (a / 10f64.powi(exponent) * 1.0e5).round() as u64;
    if mantissa >= 100_000 {
        mantissa = 10_000;
        exponent += 1;
    } else if mantissa < 10_000 {
        mantissa = (a / 10f64.powi(exponent - 1) * 1.0e5).round() as u64;
        exponent -= 1;
    }
    if exponent.abs() > 9 {
        return Err(malformed_tle!("{what} {v} does not fit its TLE field"));
    }
    let exp_sign = if exponent < 0 { '-' } else { '+' };

    Ok(format!("{sign}{mantissa:05}{exp_sign}{}", exponent.abs()))
}

fn check_fits(v: f64, max: f64, what: &str) -> Result<()> {
    if !(0.0..max).contains(&v) {
        return Err(malformed_tle!("{what} {v} does not fit its TLE field"));
    }
    Ok(())
}

/// Encode an element set back into its two 69 column lines, checksums included.
pub fn format_tle(elements: &OrbitalElementSet) -> Result<(String, String)> {
    let satnum = to_alpha5(elements.satellite_number)?;

    check_fits(elements.epoch_day, 1000.0, "epoch day")?;
    check_fits(elements.inclination, 1000.0, "inclination")?;
    check_fits(elements.right_ascension, 1000.0, "right ascension")?;
    check_fits(elements.argument_of_perigee, 1000.0, "argument of perigee")?;
    check_fits(elements.mean_anomaly, 1000.0, "mean anomaly")?;
    check_fits(elements.mean_motion, 100.0, "mean motion")?;
    check_fits(elements.eccentricity, 1.0, "eccentricity")?;

    let eccentricity = (elements.eccentricity * 1.0e7).round() as u32;
    if eccentricity >= 10_000_000 {
        return Err(malformed_tle!(
            "eccentricity {} does not fit its TLE field",
            elements.eccentricity
        ));
    }

    let line1 = format!(
        "1 {}{} {:<8} {:02}{:012.8} {} {} {} {} {:>4}",
        satnum,
        elements.classification,
        elements.international_designator,
        elements.epoch_year.rem_euclid(100),
        elements.epoch_day,
        format_decimal_fraction(elements.mean_motion_dot, "first derivative of mean motion")?,
        format_implied_exponent(elements.mean_motion_ddot, "second derivative of mean motion")?,
        format_implied_exponent(elements.bstar, "drag term")?,
        elements.ephemeris_type % 10,
        elements.element_set_number % 10_000,
    );
    let line2 = format!(
        "2 {} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:>5}",
        satnum,
        elements.inclination,
        elements.right_ascension,
        eccentricity,
        elements.argument_of_perigee,
        elements.mean_anomaly,
        elements.mean_motion,
        elements.revolution_number % 100_000,
    );

    if line1.len() != TLE_LINE_LENGTH - 1 || line2.len() != TLE_LINE_LENGTH - 1 {
        return Err(malformed_tle!(
            "element set does not fit the fixed TLE columns:\n{line1}\n{line2}"
        ));
    }

    Ok((fix_checksum(&line1), fix_checksum(&line2)))
}

// ---------------------------------------------------------------------
// catalog text
// ---------------------------------------------------------------------

/// One (name, line 1, line 2) group of a catalog listing, unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl CatalogEntry {
    pub fn elements(&self) -> Result<OrbitalElementSet> {
        parse_tle(Some(&self.name), &self.line1, &self.line2)
    }
}

/// Split newline-delimited catalog text into three-line groups.
///
/// Blank lines are ignored. A line count that is not a multiple of three or
/// a group whose data lines do not start with "1 " and "2 " is an error;
/// the individual lines are not parsed here.
pub fn parse_catalog(text: &str) -> Result<Vec<CatalogEntry>> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() % 3 != 0 {
        return Err(malformed_tle!(
            "catalog has {} lines, not a multiple of three",
            lines.len()
        ));
    }

    let entries = lines
        .chunks_exact(3)
        .enumerate()
        .map(|(i, group)| {
            let (name, line1, line2) = (group[0].trim(), group[1].trim_end(), group[2].trim_end());
            if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
                return Err(malformed_tle!(
                    "catalog group {} ('{name}') is not a name/line 1/line 2 triple",
                    i + 1
                ));
            }
            Ok(CatalogEntry {
                name: name.to_string(),
                line1: line1.to_string(),
                line2: line2.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("split catalog into {} entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Sgp4Error;

    const ISS1: &str = "1 25544U 98067A   19343.69339541  .00001764  00000-0  38792-4 0  9991";
    const ISS2: &str = "2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";

    const VANGUARD1: &str = "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD2: &str = "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    fn approx(expected: f64, got: f64, tol: f64) {
        let diff = (expected - got).abs();
        assert!(diff <= tol, "expected {expected}, got {got} (|Δ| = {diff})");
    }

    fn assert_malformed(result: Result<OrbitalElementSet>) {
        match result {
            Err(Sgp4Error::MalformedTle(_)) => {}
            other => panic!("expected MalformedTle, got {other:?}"),
        }
    }

    #[test]
    fn parses_iss_fields() {
        let el = parse_tle(Some("ISS (ZARYA)"), ISS1, ISS2).unwrap();

        assert_eq!(el.name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(el.satellite_number, 25_544);
        assert_eq!(el.classification, 'U');
        assert_eq!(el.international_designator, "98067A");
        assert_eq!(el.epoch_year, 2019);
        approx(343.693_395_41, el.epoch_day, 1e-12);
        approx(0.000_017_64, el.mean_motion_dot, 1e-15);
        assert_eq!(el.mean_motion_ddot, 0.0);
        approx(0.38792e-4, el.bstar, 1e-15);
        assert_eq!(el.ephemeris_type, 0);
        assert_eq!(el.element_set_number, 999);

        approx(51.6439, el.inclination, 1e-12);
        approx(211.2001, el.right_ascension, 1e-12);
        approx(0.000_741_7, el.eccentricity, 1e-15);
        approx(17.6667, el.argument_of_perigee, 1e-12);
        approx(85.6398, el.mean_anomaly, 1e-12);
        approx(15.501_034_72, el.mean_motion, 1e-12);
        assert_eq!(el.revolution_number, 20_248);
    }

    #[test]
    fn twentieth_century_epoch_uses_split_year() {
        let el = parse_tle(None, VANGUARD1, VANGUARD2).unwrap();
        assert_eq!(el.epoch_year, 2000);

        let old1 = fix_checksum("1 00005U 58002B   58179.78495062  .00000023  00000-0  28098-4 0  475");
        let el = parse_tle(None, &old1, VANGUARD2).unwrap();
        assert_eq!(el.epoch_year, 1958);
    }

    #[test]
    fn checksums_of_known_lines() {
        for line in [ISS1, ISS2, VANGUARD1, VANGUARD2] {
            let given = line.chars().last().unwrap().to_digit(10).unwrap();
            assert_eq!(compute_checksum(line), given);
            assert_eq!(fix_checksum(&line[..68]), line);
            verify_checksum(line).unwrap();
        }
    }

    #[test]
    fn corrupted_digit_fails_checksum() {
        let bad = ISS1.replace(".00001764", ".90001764");
        assert!(verify_checksum(&bad).is_err());
        assert_malformed(parse_tle(None, &bad, ISS2));
    }

    #[test]
    fn minus_sign_counts_as_one() {
        let line = fix_checksum("1 25544U 98067A   19343.69339541 -.00001764  00000-0 -38792-4 0  999");
        let plain = fix_checksum("1 25544U 98067A   19343.69339541  .00001764  00000-0  38792-4 0  999");
        let c = |l: &str| l.chars().last().unwrap().to_digit(10).unwrap();
        assert_eq!(c(&line), (c(&plain) + 2) % 10);

        let el = parse_tle(None, &line, ISS2).unwrap();
        approx(-0.000_017_64, el.mean_motion_dot, 1e-15);
        approx(-0.38792e-4, el.bstar, 1e-15);
    }

    #[test]
    fn truncated_and_padded_lines() {
        assert_malformed(parse_tle(None, &ISS1[..60], ISS2));
        assert_malformed(parse_tle(None, ISS1, &ISS2[..68]));

        // trailing blanks and CRLF are tolerated
        let padded = format!("{ISS1}   \r\n");
        assert!(parse_tle(None, &padded, ISS2).is_ok());
    }

    #[test]
    fn structural_errors_are_malformed() {
        // swapped lines
        assert_malformed(parse_tle(None, ISS2, ISS1));
        // mismatched object numbers
        let other2 = fix_checksum(&ISS2.replacen("25544", "25545", 1));
        assert_malformed(parse_tle(None, ISS1, &other2));
        // non-ASCII
        let nbsp = ISS1.replacen(' ', "\u{a0}", 1);
        assert_malformed(parse_tle(None, &nbsp, ISS2));
        // garbage inside a numeric field keeps its layout but not its number
        let garbled = fix_checksum(&ISS2.replacen("51.6439", "51.6x39", 1));
        assert_malformed(parse_tle(None, ISS1, &garbled));
        // garbage inside the drag term
        let garbled = fix_checksum(&ISS1.replacen("38792-4", "38792x4", 1));
        assert_malformed(parse_tle(None, &garbled, ISS2));
    }

    #[test]
    fn alpha5_satellite_numbers_are_decoded() {
        let l1 = fix_checksum(&ISS1.replacen("25544", "A0005", 1));
        let l2 = fix_checksum(&ISS2.replacen("25544", "A0005", 1));
        let el = parse_tle(None, &l1, &l2).unwrap();
        assert_eq!(el.satellite_number, 100_005);

        let (e1, e2) = format_tle(&el).unwrap();
        assert_eq!((e1.as_str(), e2.as_str()), (l1.as_str(), l2.as_str()));
    }

    #[test]
    fn implied_exponent_fields() {
        let f = |s: &str| parse_implied_exponent(s, 0..8, "test").unwrap();
        approx(0.38792e-4, f(" 38792-4"), 1e-18);
        approx(-0.11606e-4, f("-11606-4"), 1e-18);
        approx(0.13844e-3, f(" 13844-3"), 1e-18);
        approx(0.5, f("+50000+0"), 1e-18);
        assert_eq!(f(" 00000-0"), 0.0);
        assert_eq!(f(" 00000+0"), 0.0);

        assert_eq!(format_implied_exponent(0.38792e-4, "t").unwrap(), " 38792-4");
        assert_eq!(format_implied_exponent(-0.11606e-4, "t").unwrap(), "-11606-4");
        assert_eq!(format_implied_exponent(0.0, "t").unwrap(), " 00000-0");
        assert_eq!(format_implied_exponent(1.0e-5, "t").unwrap(), " 10000-4");
        assert_eq!(format_implied_exponent(0.5, "t").unwrap(), " 50000+0");

        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                format_implied_exponent(v, "t"),
                Err(Sgp4Error::MalformedTle(_))
            ));
        }
    }

    #[test]
    fn encoder_reproduces_original_lines() {
        for (l1, l2) in [(ISS1, ISS2), (VANGUARD1, VANGUARD2)] {
            let el = parse_tle(None, l1, l2).unwrap();
            let (e1, e2) = format_tle(&el).unwrap();
            assert_eq!(e1, l1);
            assert_eq!(e2, l2);
        }
    }

    #[test]
    fn encoder_rejects_values_outside_columns() {
        let mut el = parse_tle(None, ISS1, ISS2).unwrap();
        el.eccentricity = 1.2;
        assert!(format_tle(&el).is_err());

        let mut el = parse_tle(None, ISS1, ISS2).unwrap();
        el.mean_motion_dot = 1.5;
        assert!(format_tle(&el).is_err());

        for v in [f64::NAN, f64::INFINITY] {
            let mut el = parse_tle(None, ISS1, ISS2).unwrap();
            el.bstar = v;
            assert!(matches!(format_tle(&el), Err(Sgp4Error::MalformedTle(_))), "bstar {v}");

            let mut el = parse_tle(None, ISS1, ISS2).unwrap();
            el.mean_motion_ddot = -v;
            assert!(matches!(format_tle(&el), Err(Sgp4Error::MalformedTle(_))), "nddot {v}");

            let mut el = parse_tle(None, ISS1, ISS2).unwrap();
            el.mean_motion_dot = v;
            assert!(format_tle(&el).is_err(), "ndot {v}");

            let mut el = parse_tle(None, ISS1, ISS2).unwrap();
            el.inclination = v;
            assert!(format_tle(&el).is_err(), "inclination {v}");
        }
    }

    #[test]
    fn parse_lines_accepts_optional_name() {
        let text = format!("0 ISS (ZARYA)\n{ISS1}\n{ISS2}\n");
        let el = parse_lines(&text).unwrap();
        assert_eq!(el.name.as_deref(), Some("ISS (ZARYA)"));

        let el = parse_lines(&format!("{ISS1}\n{ISS2}")).unwrap();
        assert_eq!(el.name, None);

        assert_malformed(parse_lines(ISS1));
    }

    #[test]
    fn catalog_is_split_into_triples() {
        let text = format!(
            "ISS (ZARYA)             \r\n{ISS1}\r\n{ISS2}\r\n\nVANGUARD 1\n{VANGUARD1}\n{VANGUARD2}\n"
        );
        let entries = parse_catalog(&text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "ISS (ZARYA)");
        assert_eq!(entries[0].line1, ISS1);
        assert_eq!(entries[1].name, "VANGUARD 1");

        let el = entries[1].elements().unwrap();
        assert_eq!(el.satellite_number, 5);
        assert_eq!(el.name.as_deref(), Some("VANGUARD 1"));
    }

    #[test]
    fn catalog_with_missing_line_is_rejected() {
        let text = format!("ISS (ZARYA)\n{ISS1}\n{ISS2}\nVANGUARD 1\n{VANGUARD1}\n");
        assert!(matches!(parse_catalog(&text), Err(Sgp4Error::MalformedTle(_))));

        let shifted = format!("{ISS1}\n{ISS2}\nISS (ZARYA)\n");
        assert!(matches!(parse_catalog(&shifted), Err(Sgp4Error::MalformedTle(_))));
    }
}
