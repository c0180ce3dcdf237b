use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{PlateError, PlateResult};

/// Centimetres per inch.
pub const INCH_TO_CM: f64 = 2.54;

/// Display/input unit. Stored dimensions are always centimetres.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Cm,
    In,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Cm => "cm",
            Unit::In => "in",
        }
    }

    /// Convert a centimetre value into this unit.
    pub fn from_cm(self, cm: f64) -> f64 {
        match self {
            Unit::Cm => cm,
            Unit::In => cm / INCH_TO_CM,
        }
    }

    /// Convert a value expressed in this unit into centimetres.
    pub fn to_cm(self, value: f64) -> f64 {
        match self {
            Unit::Cm => value,
            Unit::In => value * INCH_TO_CM,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cm" => Ok(Unit::Cm),
            "in" | "inch" | "inches" => Ok(Unit::In),
            other => Err(PlateError::validation(format!(
                "unknown unit '{other}' (expected 'cm' or 'in')"
            ))),
        }
    }
}

/// Render a centimetre value in `unit`: inches with two decimals, centimetres without
/// trailing zeros.
pub fn format_value(cm: f64, unit: Unit) -> String {
    match unit {
        Unit::In => format!("{:.2}", unit.from_cm(cm)),
        Unit::Cm => {
            let s = format!("{cm:.2}");
            let s = s.trim_end_matches('0').trim_end_matches('.');
            s.to_string()
        }
    }
}

/// Parse user input expressed in `unit` and return centimetres.
///
/// A comma is accepted as the decimal separator. Bounds are checked in the input unit so the
/// error message speaks the user's unit.
pub fn parse_dimension(text: &str, unit: Unit, min_cm: f64, max_cm: f64) -> PlateResult<f64> {
    let normalized = text.trim().replacen(',', ".", 1);
    if normalized.is_empty() {
        return Err(PlateError::validation("value is empty"));
    }
    if normalized.chars().any(|c| !(c.is_ascii_digit() || c == '.')) {
        return Err(PlateError::validation(format!(
            "'{}' is not a number",
            text.trim()
        )));
    }
    if normalized.matches('.').count() > 1 {
        return Err(PlateError::validation(format!(
            "'{}' has more than one decimal separator",
            text.trim()
        )));
    }

    let num: f64 = normalized
        .parse()
        .map_err(|_| PlateError::validation(format!("'{}' is not a number", text.trim())))?;

    let min = unit.from_cm(min_cm);
    let max = unit.from_cm(max_cm);
    if num < min || num > max {
        return Err(PlateError::validation(format!(
            "Must be between {min:.1} and {max:.1} {unit}."
        )));
    }

    Ok(unit.to_cm(num))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inch_round_trip() {
        let cm = Unit::In.to_cm(10.0);
        assert!((cm - 25.4).abs() < 1e-9);
        assert!((Unit::In.from_cm(cm) - 10.0).abs() < 1e-9);
        assert_eq!(Unit::Cm.to_cm(42.0), 42.0);
    }

    #[test]
    fn format_trims_centimetres_and_fixes_inches() {
        assert_eq!(format_value(100.0, Unit::Cm), "100");
        assert_eq!(format_value(50.8, Unit::Cm), "50.8");
        assert_eq!(format_value(Unit::In.to_cm(2.5), Unit::Cm), "6.35");
        assert_eq!(format_value(100.0, Unit::In), "39.37");
    }

    #[test]
    fn parse_accepts_comma_decimal() {
        let cm = parse_dimension(" 45,5 ", Unit::Cm, 20.0, 300.0).unwrap();
        assert!((cm - 45.5).abs() < 1e-9);
    }

    #[test]
    fn parse_converts_inches_to_cm() {
        let cm = parse_dimension("20", Unit::In, 20.0, 300.0).unwrap();
        assert!((cm - 50.8).abs() < 1e-9);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "   ", "abc", "1.2.3", "-5", "1e3", "12cm", "."] {
            assert!(
                parse_dimension(bad, Unit::Cm, 20.0, 300.0).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_range_message_uses_input_unit() {
        let err = parse_dimension("5", Unit::In, 20.0, 300.0).unwrap_err();
        assert!(
            err.to_string()
                .contains("Must be between 7.9 and 118.1 in."),
            "{err}"
        );

        let err = parse_dimension("301", Unit::Cm, 20.0, 300.0).unwrap_err();
        assert!(err.to_string().contains("Must be between 20.0 and 300.0 cm."));
    }

    #[test]
    fn parse_bounds_are_inclusive() {
        assert_eq!(parse_dimension("20", Unit::Cm, 20.0, 300.0).unwrap(), 20.0);
        assert_eq!(parse_dimension("300", Unit::Cm, 20.0, 300.0).unwrap(), 300.0);
    }

    #[test]
    fn unit_from_str() {
        assert_eq!("CM".parse::<Unit>().unwrap(), Unit::Cm);
        assert_eq!("in".parse::<Unit>().unwrap(), Unit::In);
        assert!("mm".parse::<Unit>().is_err());
    }
}
