//! # Declarative load configuration
//!
//! An [`AlmanacConfig`] lists the catalogue sources of an almanac, the optional constellation
//! line table and the defaults of a load request. It is usually read from TOML:
//!
//! ```toml
//! [defaults]
//! latitude = 54.0
//! longitude = -1.5
//! num_days = 7
//! sample_seconds = 600
//!
//! [[sources]]
//! name = "Bright stars"
//! path = "catalogues/v50.csv"
//! name_column = "HR"
//! magnitude_column = "Vmag"
//! source_type = "star"
//! band = "starfield"
//! starfield = true
//! coordinates = { ra_format = "sexagesimal", dec_format = "sexagesimal", columns = { layout = "separate", ra = "RAJ2000", dec = "DEJ2000" } }
//!
//! [[sources]]
//! name = "Messier"
//! path = "catalogues/messier.csv"
//! delimiter = ";"
//! name_column = "Messier"
//! magnitude_column = "Mag"
//! source_type = "deep_sky"
//! coordinates = { ra_format = "sexagesimal", dec_format = "sexagesimal", columns = { layout = "combined", column = "Coords" } }
//!
//! [constellations]
//! path = "catalogues/constellations.csv"
//!
//! [ephemeris]
//! path = "kernels/de421.bsp"
//! bodies = ["jupiter", "mars", "venus", "sun", "moon"]
//! ```
//!
//! Relative paths are resolved against the directory of the configuration file when it is
//! loaded with [`AlmanacConfig::from_toml_path`].
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{MagnitudeBounds, SourceDescriptor},
    constants::{Degree, Magnitude},
    ephemeris::SolarSystemBody,
};

/// Which magnitude bounds of a load request apply to a catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeBand {
    Starfield,
    #[default]
    DeepSky,
}

fn default_delimiter() -> char {
    ','
}

fn delimiter_byte(delimiter: char, owner: &str) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii())
        .ok_or_else(|| {
            AlmanacError::InvalidRange(format!(
                "[{owner}] delimiter '{delimiter}' is not a single ASCII character"
            ))
        })
}

/// One raw catalogue file and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueSource {
    #[serde(flatten)]
    pub descriptor: SourceDescriptor,
    pub path: Utf8PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub band: MagnitudeBand,
    /// The starfield catalogue carries the constellation figures and is drawn without arcs.
    #[serde(default)]
    pub starfield: bool,
}

impl CatalogueSource {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.delimiter, self.name())
    }
}

/// The constellation line table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationSource {
    pub path: Utf8PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Catalogue whose entry names are the HR numbers referenced by the lines; the starfield
    /// catalogue when absent.
    #[serde(default)]
    pub star_catalogue: Option<String>,
}

impl ConstellationSource {
    pub fn delimiter_byte(&self) -> Result<u8> {
        delimiter_byte(self.delimiter, "constellations")
    }
}

fn default_ephemeris_name() -> String {
    "Solar system".to_string()
}

fn default_bodies() -> Vec<SolarSystemBody> {
    SolarSystemBody::ALL.to_vec()
}

/// A JPL SPK kernel and the bodies to show from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisSource {
    pub path: Utf8PathBuf,
    /// Name of the generated catalogue.
    #[serde(default = "default_ephemeris_name")]
    pub name: String,
    /// Rows of the catalogue, in order; every body by default.
    #[serde(default = "default_bodies")]
    pub bodies: Vec<SolarSystemBody>,
    #[serde(default)]
    pub band: MagnitudeBand,
}

/// Defaults of a load request (the values offered by an interactive load panel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadDefaults {
    pub latitude: Degree,
    pub longitude: Degree,
    pub num_days: u32,
    pub sample_seconds: u32,
    pub starfield_magnitudes: MagnitudeBounds,
    pub deep_sky_magnitudes: MagnitudeBounds,
    /// Worker pool size; the available parallelism when absent.
    pub max_workers: Option<usize>,
}

pub const DEFAULT_LATITUDE: Degree = 54.0;
pub const DEFAULT_LONGITUDE: Degree = 0.0;
pub const DEFAULT_NUM_DAYS: u32 = 7;
pub const DEFAULT_SAMPLE_SECONDS: u32 = 600;
pub const DEFAULT_MAGNITUDES: (Magnitude, Magnitude) = (-2.0, 6.0);

impl Default for LoadDefaults {
    fn default() -> Self {
        let magnitudes = MagnitudeBounds {
            min: DEFAULT_MAGNITUDES.0,
            max: DEFAULT_MAGNITUDES.1,
        };
        LoadDefaults {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            num_days: DEFAULT_NUM_DAYS,
            sample_seconds: DEFAULT_SAMPLE_SECONDS,
            starfield_magnitudes: magnitudes,
            deep_sky_magnitudes: magnitudes,
            max_workers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlmanacConfig {
    #[serde(default)]
    pub sources: Vec<CatalogueSource>,
    #[serde(default)]
    pub constellations: Option<ConstellationSource>,
    /// Sun, Moon and planets, listed before every other catalogue.
    #[serde(default)]
    pub ephemeris: Option<EphemerisSource>,
    #[serde(default)]
    pub defaults: LoadDefaults,
}

impl AlmanacConfig {
    /// Parse a configuration from TOML text; paths are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AlmanacConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file; relative paths are resolved against its directory.
    pub fn from_toml_path(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Prefix every relative source path with `base`.
    pub fn resolve_paths(&mut self, base: &Utf8Path) {
        let resolve = |p: &mut Utf8PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.sources.iter_mut().for_each(|s| resolve(&mut s.path));
        if let Some(c) = self.constellations.as_mut() {
            resolve(&mut c.path);
        }
        if let Some(e) = self.ephemeris.as_mut() {
            resolve(&mut e.path);
        }
    }

    /// Check names and delimiters.
    ///
    /// Return
    /// ----------
    /// * [`AlmanacError::InvalidRange`] on an empty or duplicated catalogue name (the
    ///   ephemeris catalogue included), a non-ASCII delimiter, or invalid default magnitude
    ///   bounds.
    pub fn validate(&self) -> Result<()> {
        if let Some(source) = self.sources.iter().find(|s| s.name().trim().is_empty()) {
            return Err(AlmanacError::InvalidRange(format!(
                "catalogue at {} has an empty name",
                source.path
            )));
        }
        if let Some(e) = self.ephemeris.as_ref().filter(|e| e.name.trim().is_empty()) {
            return Err(AlmanacError::InvalidRange(format!(
                "ephemeris catalogue of {} has an empty name",
                e.path
            )));
        }
        let names = self
            .sources
            .iter()
            .map(|s| s.name())
            .chain(self.ephemeris.as_ref().map(|e| e.name.as_str()));
        if let Some(name) = names.duplicates().next() {
            return Err(AlmanacError::InvalidRange(format!(
                "catalogue name '{name}' is used more than once"
            )));
        }
        for source in &self.sources {
            source.delimiter_byte()?;
        }
        if let Some(c) = &self.constellations {
            c.delimiter_byte()?;
        }
        self.defaults.starfield_magnitudes.validate()?;
        self.defaults.deep_sky_magnitudes.validate()?;
        Ok(())
    }

    /// The starfield catalogue: the first source flagged `starfield`.
    pub fn starfield(&self) -> Option<&CatalogueSource> {
        self.sources.iter().find(|s| s.starfield)
    }
}
