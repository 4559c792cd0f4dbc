//! # Catalogues of fixed celestial objects
//!
//! This module turns heterogeneous tabular sources (bright-star lists, Messier/NGC exports,
//! user tables) into one convention: **degrees** for both equatorial axes, a finite magnitude
//! inside requested bounds, and the display attributes derived from it.
//!
//! ## Pipeline
//! -----------------
//! 1. [`RawTable`] holds the CSV text untouched.
//! 2. A [`SourceDescriptor`] names the columns to read and carries a [`RawCoordinateSpec`]
//!    describing the coordinate layout.
//! 3. [`normalize`] validates the layout, derives every entry and reports each dropped row
//!    in a [`NormalizationReport`].
//! 4. [`Catalogue::to_table`] writes the result back with the `__`-prefixed derived columns,
//!    so that a saved catalogue reloads through [`normalize`] without re-derivation.
//!
//! ## Display attributes
//! -----------------
//! With `norm_mag = (mag - min) / (max - min)` over the retained rows (0 when all magnitudes are
//! equal), the brightest object gets the largest marker and the most intense colour:
//!
//! * `size = max(0.25, 4·(1 - norm_mag))`
//! * `intensity = max(0.2, 1 - norm_mag)^(1/2.2)`
//!
//! ## See also
//! ------------
//! * [`ObservationEngine`](crate::observation::ObservationEngine) – consumes catalogues.
//! * [`ConstellationSet`](crate::constellations::ConstellationSet) – joins star ids to entries.
use std::{collections::HashMap, fmt, str::FromStr};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{Degree, Magnitude, StarId, HOUR_TO_DEG},
    ephemeris::SolarSystemBody,
    vantage::Target,
};

pub mod coordinate_spec;
pub mod derived;
pub mod normalizer;
pub mod raw_table;
pub mod solar_system;

pub use coordinate_spec::{AngleFormat, AxisColumns, CoordinateColumns, RawCoordinateSpec};
pub use derived::DerivationState;
pub use normalizer::normalize;
pub use raw_table::RawTable;
pub use solar_system::solar_system_catalogue;

const MIN_SIZE: f64 = 0.25;
const MAX_SIZE: f64 = 4.0;
const MIN_INTENSITY: f64 = 0.2;
const INTENSITY_GAMMA: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Planet,
    Star,
    DeepSky,
    Other,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Planet => "planet",
            SourceType::Star => "star",
            SourceType::DeepSky => "deep_sky",
            SourceType::Other => "other",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "planet" => Ok(SourceType::Planet),
            "star" => Ok(SourceType::Star),
            "deep_sky" => Ok(SourceType::DeepSky),
            "other" => Ok(SourceType::Other),
            other => Err(AlmanacError::InvalidRange(format!(
                "unknown source type '{other}'"
            ))),
        }
    }
}

/// Inclusive magnitude bounds applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeBounds {
    pub min: Magnitude,
    pub max: Magnitude,
}

impl MagnitudeBounds {
    /// Return
    /// ----------
    /// * The bounds, or [`AlmanacError::InvalidRange`] if a bound is not finite or `min > max`.
    pub fn new(min: Magnitude, max: Magnitude) -> Result<Self> {
        let bounds = MagnitudeBounds { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(AlmanacError::InvalidRange(format!(
                "magnitude bounds [{}, {}] are not an ordered finite interval",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, magnitude: Magnitude) -> bool {
        (self.min..=self.max).contains(&magnitude)
    }
}

/// Column mapping and type of one raw source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Catalogue name, used in reports and errors.
    pub name: String,
    /// Column holding object names; the 0-based row index is used when absent.
    #[serde(default)]
    pub name_column: Option<String>,
    pub magnitude_column: String,
    pub coordinates: RawCoordinateSpec,
    pub source_type: SourceType,
}

/// One normalized object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub name: String,
    /// Right ascension (J2000, degrees, `[0, 360)`).
    pub ra: Degree,
    /// Declination (J2000, degrees, `[-90, 90]`).
    pub dec: Degree,
    pub magnitude: Magnitude,
    /// Magnitude rescaled to `[0, 1]` over the catalogue, 0 for the brightest.
    pub norm_mag: f64,
    pub size: f64,
    pub intensity: f64,
    pub source_type: SourceType,
}

impl CatalogueEntry {
    pub fn ra_hours(&self) -> f64 {
        self.ra / HOUR_TO_DEG
    }

    /// The body a planet row stands for, from its name.
    pub fn body(&self) -> Option<SolarSystemBody> {
        match self.source_type {
            SourceType::Planet => self.name.parse().ok(),
            _ => None,
        }
    }

    /// What a provider follows for this row: the named body of a planet row, the listed
    /// position otherwise.
    pub fn target(&self) -> Target {
        match self.body() {
            Some(body) => Target::body(body, self.ra, self.dec),
            None => Target::new(self.ra, self.dec),
        }
    }
}

/// `true` for a right ascension in `[0, 360)` and a declination in `[-90, 90]`.
pub(crate) fn in_sky(ra: Degree, dec: Degree) -> bool {
    (0.0..360.0).contains(&ra) && (-90.0..=90.0).contains(&dec)
}

/// Marker size for a normalized magnitude.
pub fn display_size(norm_mag: f64) -> f64 {
    (MAX_SIZE * (1.0 - norm_mag)).max(MIN_SIZE)
}

/// Colour intensity for a normalized magnitude.
pub fn color_intensity(norm_mag: f64) -> f64 {
    (1.0 - norm_mag).max(MIN_INTENSITY).powf(1.0 / INTENSITY_GAMMA)
}

/// Rows dropped by each normalization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizationReport {
    pub raw_rows: usize,
    pub missing_magnitude: usize,
    pub magnitude_out_of_bounds: usize,
    pub invalid_coordinates: usize,
    pub coordinates_out_of_range: usize,
    /// Rows of a previously normalized table whose derived values no longer parse.
    pub unreadable_derived: usize,
    /// `true` when the catalogue was read back from its derived columns.
    pub reloaded: bool,
}

impl NormalizationReport {
    pub fn dropped(&self) -> usize {
        self.missing_magnitude
            + self.magnitude_out_of_bounds
            + self.invalid_coordinates
            + self.coordinates_out_of_range
            + self.unreadable_derived
    }

    pub fn retained(&self) -> usize {
        self.raw_rows - self.dropped()
    }
}

impl fmt::Display for NormalizationReport {
    /// Compact by default; multi-line with the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Normalization summary")?;
            writeln!(f, "---------------------")?;
            writeln!(f, "raw rows              : {}", self.raw_rows)?;
            writeln!(f, "missing magnitude     : {}", self.missing_magnitude)?;
            writeln!(f, "magnitude out of range: {}", self.magnitude_out_of_bounds)?;
            writeln!(f, "invalid coordinates   : {}", self.invalid_coordinates)?;
            writeln!(f, "coordinates out of range: {}", self.coordinates_out_of_range)?;
            if self.reloaded {
                writeln!(f, "unreadable derived    : {}", self.unreadable_derived)?;
            }
            write!(f, "retained              : {}", self.retained())
        } else {
            write!(
                f,
                "raw={}, retained={}, dropped={}{}",
                self.raw_rows,
                self.retained(),
                self.dropped(),
                if self.reloaded { " (reloaded)" } else { "" }
            )
        }
    }
}

/// A normalized, immutable catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    name: String,
    entries: Vec<CatalogueEntry>,
    report: NormalizationReport,
}

impl Catalogue {
    /// Assemble a catalogue from already-normalized entries.
    pub fn new(name: impl Into<String>, entries: Vec<CatalogueEntry>) -> Self {
        let report = NormalizationReport {
            raw_rows: entries.len(),
            ..Default::default()
        };
        Catalogue {
            name: name.into(),
            entries,
            report,
        }
    }

    pub(crate) fn with_report(
        name: impl Into<String>,
        entries: Vec<CatalogueEntry>,
        report: NormalizationReport,
    ) -> Self {
        Catalogue {
            name: name.into(),
            entries,
            report,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }

    pub fn targets(&self) -> Vec<Target> {
        self.entries.iter().map(CatalogueEntry::target).collect()
    }

    /// Map star ids (numeric names, e.g. HR numbers) to row indices.
    ///
    /// Entries whose name is not an integer are skipped.
    pub fn star_index(&self) -> HashMap<StarId, usize, RandomState> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(row, e)| e.name.trim().parse::<StarId>().ok().map(|id| (id, row)))
            .collect()
    }

    /// Serialize the catalogue as a table of derived columns.
    ///
    /// Floats are written with their shortest round-trip representation, so
    /// `normalize(&catalogue.to_table(), ..)` gives back equal entries.
    pub fn to_table(&self) -> RawTable {
        let headers = derived::DERIVED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = self
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.name.clone(),
                    e.ra.to_string(),
                    e.dec.to_string(),
                    e.ra_hours().to_string(),
                    e.magnitude.to_string(),
                    e.norm_mag.to_string(),
                    e.size.to_string(),
                    e.intensity.to_string(),
                    e.source_type.to_string(),
                ]
            })
            .collect();
        RawTable::new(headers, rows)
    }
}

#[cfg(test)]
mod catalogue_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn entry(name: &str, magnitude: f64) -> CatalogueEntry {
        CatalogueEntry {
            name: name.into(),
            ra: 90.0,
            dec: 10.0,
            magnitude,
            norm_mag: 0.0,
            size: 4.0,
            intensity: 1.0,
            source_type: SourceType::Star,
        }
    }

    #[test]
    fn test_display_attributes() {
        assert_abs_diff_eq!(display_size(0.0), 4.0);
        assert_abs_diff_eq!(display_size(0.5), 2.0);
        assert_abs_diff_eq!(display_size(1.0), 0.25);
        assert_abs_diff_eq!(color_intensity(0.0), 1.0);
        assert_abs_diff_eq!(
            color_intensity(1.0),
            0.2_f64.powf(1.0 / 2.2),
            epsilon = 1e-12
        );
        assert!(color_intensity(0.1) > color_intensity(0.6));
    }

    #[test]
    fn test_magnitude_bounds() {
        assert!(MagnitudeBounds::new(-2.0, 6.0).is_ok());
        assert!(MagnitudeBounds::new(3.0, 3.0).is_ok());
        assert!(MagnitudeBounds::new(6.0, -2.0).is_err());
        assert!(MagnitudeBounds::new(f64::NAN, 1.0).is_err());
        let b = MagnitudeBounds::new(-2.0, 6.0).unwrap();
        assert!(b.contains(6.0) && b.contains(-2.0) && !b.contains(6.01));
    }

    #[test]
    fn test_source_type_text() {
        for t in [
            SourceType::Planet,
            SourceType::Star,
            SourceType::DeepSky,
            SourceType::Other,
        ] {
            assert_eq!(t.to_string().parse::<SourceType>().unwrap(), t);
        }
        assert!("asteroid".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_planet_rows_follow_their_body() {
        let mut moon = entry("moon", 1.0);
        moon.source_type = SourceType::Planet;
        assert_eq!(moon.target().body, Some(SolarSystemBody::Moon));
        assert_eq!((moon.target().ra, moon.target().dec), (90.0, 10.0));

        // a star named after a body stays fixed
        assert_eq!(entry("Sun", 1.0).target(), Target::new(90.0, 10.0));
        let mut unknown = entry("Vulcan", 1.0);
        unknown.source_type = SourceType::Planet;
        assert_eq!(unknown.target().body, None);
    }

    #[test]
    fn test_star_index() {
        let catalogue = Catalogue::new(
            "stars",
            vec![entry("424", 2.0), entry("Vega", 0.0), entry(" 7001 ", 0.03)],
        );
        let index = catalogue.star_index();
        assert_eq!(index.len(), 2);
        assert_eq!(index[&424], 0);
        assert_eq!(index[&7001], 2);
    }

    #[test]
    fn test_report_counts() {
        let report = NormalizationReport {
            raw_rows: 10,
            missing_magnitude: 1,
            magnitude_out_of_bounds: 2,
            invalid_coordinates: 1,
            ..Default::default()
        };
        assert_eq!(report.dropped(), 4);
        assert_eq!(report.retained(), 6);
        assert_eq!(report.to_string(), "raw=10, retained=6, dropped=4");
        assert!(format!("{report:#}").contains("retained              : 6"));
    }
}
