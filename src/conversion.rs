use crate::constants::{Degree, HOUR_TO_DEG};

/// Characters accepted as separators between sexagesimal components, on top of whitespace.
const SEXAGESIMAL_MARKERS: [char; 8] = [':', 'h', 'm', 's', 'd', '°', '\'', '"'];

/// Split a signed sexagesimal string into its sign and its unsigned components.
///
/// Arguments
/// ---------
/// * `value`: a string such as `"12:30:00"`, `"-00 30 14.2"`, `"12h30m05s"` or `"+27 42"`
///
/// Returns
/// -------
/// * `Option<(f64, Vec<f64>)>`: the sign (`1.0` or `-1.0`) and between one and three finite,
///   non-negative components. Minutes and seconds must lie in `[0, 60)`.
///   Returns `None` if the input format is invalid.
fn split_sexagesimal(value: &str) -> Option<(f64, Vec<f64>)> {
    let trimmed = value.trim();
    let (sign, unsigned) = match trimmed.chars().next()? {
        '-' => (-1.0, &trimmed[1..]),
        '+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };

    let cleaned: String = unsigned
        .chars()
        .map(|c| {
            if SEXAGESIMAL_MARKERS.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect();

    let parts = cleaned
        .split_whitespace()
        .map(|p| p.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0))
        .collect::<Option<Vec<f64>>>()?;

    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    if parts.iter().skip(1).any(|v| *v >= 60.0) {
        return None;
    }
    Some((sign, parts))
}

/// Fold sexagesimal components into a single decimal value (hours or degrees).
fn fold_sexagesimal(sign: f64, parts: &[f64]) -> f64 {
    let magnitude = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(v, div)| v / div)
        .sum::<f64>();
    sign * magnitude
}

/// Parse a sexagesimal right ascension string (hours) to degrees
///
/// Arguments
/// ---------
/// * `ra`: a string representing the right ascension, e.g. `HH MM SS.SS`, `HH:MM:SS`,
///   `HHhMMmSSs` or the two-component `HH MM.M` used by NGC 2000
///
/// Returns
/// -------
/// * `Option<Degree>`: the right ascension in degrees, or `None` if the input format is invalid.
pub fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let (sign, parts) = split_sexagesimal(ra)?;
    Some(fold_sexagesimal(sign, &parts) * HOUR_TO_DEG)
}

/// Parse a sexagesimal declination string to degrees
///
/// Arguments
/// ---------
/// * `dec`: a string representing the declination in the format `±DD MM SS.SS` (or any of the
///   separators accepted for right ascension)
///
/// Returns
/// -------
/// * `Option<Degree>`: the declination in degrees, or `None` if the input format is invalid.
pub fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let (sign, parts) = split_sexagesimal(dec)?;
    Some(fold_sexagesimal(sign, &parts))
}

/// Build a sexagesimal value from three separate fields (e.g. three CSV columns).
///
/// The sign is taken from the leading field, so `("-00", "30", "14.2")` keeps its negative sign.
///
/// Arguments
/// ---------
/// * `lead`: hours (right ascension) or degrees (declination), optionally signed
/// * `minutes`, `seconds`: unsigned fields in `[0, 60)`
///
/// Returns
/// -------
/// * `Option<f64>`: the decimal value in the unit of `lead`, or `None` if a field is invalid.
pub fn fold_sexagesimal_fields(lead: &str, minutes: &str, seconds: &str) -> Option<f64> {
    let joined = format!("{} {} {}", lead.trim(), minutes.trim(), seconds.trim());
    let (sign, parts) = split_sexagesimal(&joined)?;
    if parts.len() != 3 {
        return None;
    }
    Some(fold_sexagesimal(sign, &parts))
}

/// Parse a decimal hour-angle string (right ascension in hours) to degrees.
pub fn parse_hours_to_deg(hours: &str) -> Option<Degree> {
    parse_decimal(hours).map(|h| h * HOUR_TO_DEG)
}

/// Parse a finite decimal number, trimming surrounding whitespace.
pub fn parse_decimal(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod conversion_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ra_to_deg() {
        assert_abs_diff_eq!(
            parse_ra_to_deg("22 52 23.37").unwrap(),
            343.097375,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            parse_ra_to_deg("23 58 57.68").unwrap(),
            359.7403333333333,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            parse_ra_to_deg("04:41:04.77").unwrap(),
            70.269875,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            parse_ra_to_deg("06h50m13.370s").unwrap(),
            102.55570833333333,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(parse_ra_to_deg("00 07.3").unwrap(), 1.825, epsilon = 1e-9);
        assert_eq!(parse_ra_to_deg("1 2 3.4.5"), None);
        assert_eq!(parse_ra_to_deg("1 2 3 4"), None);
        assert_eq!(parse_ra_to_deg(""), None);
        assert_eq!(parse_ra_to_deg("12 75 00"), None);
    }

    #[test]
    fn test_dec_to_deg() {
        assert_abs_diff_eq!(
            parse_dec_to_deg("-00 30 14.2").unwrap(),
            -0.5039444444444444,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            parse_dec_to_deg("+13 55 42.7").unwrap(),
            13.928527777777777,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            parse_dec_to_deg("89°15'50.2\"").unwrap(),
            89.26394444444445,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(parse_dec_to_deg("+27 42").unwrap(), 27.7, epsilon = 1e-9);
        assert_eq!(parse_dec_to_deg("89 15 50.2.3"), None);
        assert_eq!(parse_dec_to_deg("north"), None);
    }

    #[test]
    fn test_fold_fields() {
        assert_abs_diff_eq!(
            fold_sexagesimal_fields("-00", "30", "14.2").unwrap(),
            -0.5039444444444444,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            fold_sexagesimal_fields("12", "30", "0").unwrap(),
            12.5,
            epsilon = 1e-12
        );
        assert_eq!(fold_sexagesimal_fields("12", "", "0"), None);
    }

    #[test]
    fn test_hours_to_deg() {
        assert_abs_diff_eq!(parse_hours_to_deg("12.5").unwrap(), 187.5, epsilon = 1e-12);
        assert_abs_diff_eq!(parse_hours_to_deg(" 6 ").unwrap(), 90.0, epsilon = 1e-12);
        assert_eq!(parse_hours_to_deg("NaN"), None);
        assert_eq!(parse_hours_to_deg("abc"), None);
    }
}
