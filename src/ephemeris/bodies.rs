//! Solar-system bodies shown by the almanac and their NAIF integer codes.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::almanac_errors::{AlmanacError, Result};

/// NAIF code of the solar system barycenter.
pub const SOLAR_SYSTEM_BARYCENTER: i32 = 0;
/// NAIF code of the Earth-Moon barycenter.
pub const EARTH_MOON_BARYCENTER: i32 = 3;
/// NAIF code of the Earth.
pub const EARTH: i32 = 399;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarSystemBody {
    Neptune,
    Uranus,
    Saturn,
    Jupiter,
    Mars,
    Venus,
    Mercury,
    Sun,
    Moon,
}

impl SolarSystemBody {
    /// Every body, in catalogue order: outer planets first, the Sun and Moon last.
    pub const ALL: [SolarSystemBody; 9] = [
        SolarSystemBody::Neptune,
        SolarSystemBody::Uranus,
        SolarSystemBody::Saturn,
        SolarSystemBody::Jupiter,
        SolarSystemBody::Mars,
        SolarSystemBody::Venus,
        SolarSystemBody::Mercury,
        SolarSystemBody::Sun,
        SolarSystemBody::Moon,
    ];

    /// NAIF code looked up in the kernel.
    ///
    /// The giant planets are only available as system barycenters in the planetary kernels,
    /// which is close enough at the almanac resolution.
    pub fn naif_id(&self) -> i32 {
        match self {
            SolarSystemBody::Neptune => 8,
            SolarSystemBody::Uranus => 7,
            SolarSystemBody::Saturn => 6,
            SolarSystemBody::Jupiter => 5,
            SolarSystemBody::Mars => 499,
            SolarSystemBody::Venus => 299,
            SolarSystemBody::Mercury => 199,
            SolarSystemBody::Sun => 10,
            SolarSystemBody::Moon => 301,
        }
    }

    /// System barycenter used when the kernel has no segment for the planet itself.
    pub fn barycenter_id(&self) -> Option<i32> {
        match self {
            SolarSystemBody::Mars => Some(4),
            SolarSystemBody::Venus => Some(2),
            SolarSystemBody::Mercury => Some(1),
            _ => None,
        }
    }

    /// Marker size of the body in a catalogue.
    pub fn display_size(&self) -> f64 {
        match self {
            SolarSystemBody::Sun => 60.0,
            SolarSystemBody::Moon => 30.0,
            _ => 10.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SolarSystemBody::Neptune => "Neptune",
            SolarSystemBody::Uranus => "Uranus",
            SolarSystemBody::Saturn => "Saturn",
            SolarSystemBody::Jupiter => "Jupiter",
            SolarSystemBody::Mars => "Mars",
            SolarSystemBody::Venus => "Venus",
            SolarSystemBody::Mercury => "Mercury",
            SolarSystemBody::Sun => "Sun",
            SolarSystemBody::Moon => "Moon",
        }
    }
}

impl fmt::Display for SolarSystemBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SolarSystemBody {
    type Err = AlmanacError;

    /// Case-insensitive; a trailing `barycenter` is accepted (`"Jupiter Barycenter"`).
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower
            .strip_suffix("barycenter")
            .map(str::trim_end)
            .unwrap_or(&lower);
        SolarSystemBody::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                AlmanacError::InvalidRange(format!("'{s}' is not a known solar-system body"))
            })
    }
}
