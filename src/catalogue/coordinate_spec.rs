//! Declarative description of where and how a source stores its equatorial coordinates.
//!
//! A [`RawCoordinateSpec`] is resolved once, at normalization, into a per-row extraction of a
//! right ascension and a declination string, then into degrees. In TOML it reads as:
//!
//! ```toml
//! [sources.coordinates]
//! ra_format = "sexagesimal"
//! dec_format = "sexagesimal"
//! columns = { layout = "separate", ra = "RAJ2000", dec = "DEJ2000" }
//! ```
//!
//! or, for a three-column sexagesimal right ascension and one combined column respectively,
//! `ra = ["RAh", "RAm", "RAs"]` and `columns = { layout = "combined", column = "Coords" }`.
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{Degree, HOUR_TO_DEG},
    conversion::{
        fold_sexagesimal_fields, parse_dec_to_deg, parse_decimal, parse_hours_to_deg,
        parse_ra_to_deg,
    },
};

/// Representation of one coordinate axis in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleFormat {
    /// Decimal degrees.
    Degrees,
    /// Hours (right ascension) or degrees (declination) with minutes and seconds.
    Sexagesimal,
    /// Decimal hours; only meaningful for right ascension.
    HourAngle,
}

/// Column(s) holding one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisColumns {
    Single(String),
    /// Lead (hours or degrees), minutes and seconds in three columns.
    Fields([String; 3]),
}

impl AxisColumns {
    fn names(&self) -> Vec<&str> {
        match self {
            AxisColumns::Single(c) => vec![c.as_str()],
            AxisColumns::Fields(fields) => fields.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum CoordinateColumns {
    Separate { ra: AxisColumns, dec: AxisColumns },
    /// RA and Dec in one whitespace-separated column, e.g. `"12:30:00 +45:00:00"`.
    Combined { column: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCoordinateSpec {
    pub columns: CoordinateColumns,
    pub ra_format: AngleFormat,
    pub dec_format: AngleFormat,
}

/// The raw text of one row's coordinates, before unit conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawAxis<'a> {
    Text(&'a str),
    Fields([&'a str; 3]),
}

impl RawAxis<'_> {
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            RawAxis::Text(t) => t.trim().is_empty(),
            RawAxis::Fields(f) => f.iter().any(|t| t.trim().is_empty()),
        }
    }
}

impl RawCoordinateSpec {
    /// Separate single RA/Dec columns sharing one format.
    pub fn separate(ra: &str, dec: &str, format: AngleFormat) -> Self {
        RawCoordinateSpec {
            columns: CoordinateColumns::Separate {
                ra: AxisColumns::Single(ra.to_string()),
                dec: AxisColumns::Single(dec.to_string()),
            },
            ra_format: format,
            dec_format: format,
        }
    }

    /// One combined column, both halves sexagesimal.
    pub fn combined(column: &str) -> Self {
        RawCoordinateSpec {
            columns: CoordinateColumns::Combined {
                column: column.to_string(),
            },
            ra_format: AngleFormat::Sexagesimal,
            dec_format: AngleFormat::Sexagesimal,
        }
    }

    /// Reject unit combinations that cannot describe a sky position.
    ///
    /// * a declination is never expressed as an hour angle;
    /// * a three-column axis is necessarily sexagesimal.
    pub fn check_units(&self, catalogue: &str) -> Result<()> {
        let invalid = |axis: &str, reason: &str| AlmanacError::InvalidUnit {
            catalogue: catalogue.to_string(),
            axis: axis.to_string(),
            reason: reason.to_string(),
        };

        if self.dec_format == AngleFormat::HourAngle {
            return Err(invalid("dec", "declination cannot be given as an hour angle"));
        }
        if let CoordinateColumns::Separate { ra, dec } = &self.columns {
            for (axis, columns, format) in [("ra", ra, self.ra_format), ("dec", dec, self.dec_format)]
            {
                if matches!(columns, AxisColumns::Fields(_)) && format != AngleFormat::Sexagesimal {
                    return Err(invalid(
                        axis,
                        "values split over three columns must be sexagesimal",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Every source column this coordinate layout reads, in declaration order.
    pub fn source_columns(&self) -> Vec<&str> {
        match &self.columns {
            CoordinateColumns::Separate { ra, dec } => {
                let mut names = ra.names();
                names.extend(dec.names());
                names
            }
            CoordinateColumns::Combined { column } => vec![column.as_str()],
        }
    }

    /// Convert a right ascension to degrees.
    pub(crate) fn ra_to_deg(&self, raw: &RawAxis) -> Option<Degree> {
        match (raw, self.ra_format) {
            (RawAxis::Fields([h, m, s]), _) => {
                fold_sexagesimal_fields(h, m, s).map(|hours| hours * HOUR_TO_DEG)
            }
            (RawAxis::Text(t), AngleFormat::Degrees) => parse_decimal(t),
            (RawAxis::Text(t), AngleFormat::HourAngle) => parse_hours_to_deg(t),
            (RawAxis::Text(t), AngleFormat::Sexagesimal) => parse_ra_to_deg(t),
        }
    }

    /// Convert a declination to degrees.
    pub(crate) fn dec_to_deg(&self, raw: &RawAxis) -> Option<Degree> {
        match (raw, self.dec_format) {
            (RawAxis::Fields([d, m, s]), _) => fold_sexagesimal_fields(d, m, s),
            (RawAxis::Text(t), AngleFormat::Sexagesimal) => parse_dec_to_deg(t),
            (RawAxis::Text(t), _) => parse_decimal(t),
        }
    }
}
