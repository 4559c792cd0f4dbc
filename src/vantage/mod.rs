//! # Vantage point and position providers
//!
//! A [`Vantage`] fixes the observer on the ground; a [`PositionProvider`] turns equatorial
//! [`Target`]s into horizontal coordinates ([`AltAz`]) at every instant of a time axis.
//!
//! Providers are never shared between workers. Each worker calls [`ProviderSpec::build`] on
//! a plain, serializable [`ProviderSpec`] value and owns the provider it gets back, so a provider
//! may hold caches or non-thread-safe handles freely.
//!
//! ## Conventions
//! -----------------
//! * Targets are J2000 right ascension / declination in degrees. A solar-system body also
//!   names the body, whose position comes from an SPK kernel ([`EphemerisProvider`]).
//! * Altitude lies in `[-90, 90]`; azimuth in `[0, 360)`, measured from north through east
//!   (north = 0°, east = 90°).
//! * Angles are stored as `f32` in [`AltAz`]: the cubes hold millions of samples and the almanac
//!   resolution is far coarser than single precision.
use hifitime::Epoch;
use nalgebra::Vector3;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{Degree, RADEG},
    ephemeris::SolarSystemBody,
};

pub mod ephemeris_provider;
pub mod precession;
pub mod sidereal;

pub use ephemeris_provider::EphemerisProvider;
pub use sidereal::SiderealProvider;

/// A fixed observation point on the Earth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VantageFields")]
pub struct Vantage {
    latitude: Degree,
    longitude: Degree,
}

#[derive(Deserialize)]
struct VantageFields {
    latitude: Degree,
    longitude: Degree,
}

impl TryFrom<VantageFields> for Vantage {
    type Error = AlmanacError;

    fn try_from(fields: VantageFields) -> Result<Self> {
        Vantage::new(fields.latitude, fields.longitude)
    }
}

impl Vantage {
    /// Arguments
    /// -----------------
    /// * `latitude`: geodetic latitude in degrees, `[-90, 90]`.
    /// * `longitude`: longitude in degrees, positive east.
    ///
    /// Return
    /// ----------
    /// * The vantage, or [`AlmanacError::InvalidRange`] for an out-of-range latitude or a
    ///   non-finite longitude.
    pub fn new(latitude: Degree, longitude: Degree) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AlmanacError::InvalidRange(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() {
            return Err(AlmanacError::InvalidRange(format!(
                "longitude {longitude} is not finite"
            )));
        }
        Ok(Vantage {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> Degree {
        self.latitude
    }

    pub fn longitude(&self) -> Degree {
        self.longitude
    }
}

/// An object to follow across the sky.
///
/// `ra`/`dec` is the J2000 position of a fixed object. For a solar-system body it is only the
/// position listed in its catalogue; providers track `body` instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub ra: Degree,
    pub dec: Degree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<SolarSystemBody>,
}

impl Target {
    pub fn new(ra: Degree, dec: Degree) -> Self {
        Target { ra, dec, body: None }
    }

    /// A moving body listed at (`ra`, `dec`) in its catalogue.
    pub fn body(body: SolarSystemBody, ra: Degree, dec: Degree) -> Self {
        Target {
            ra,
            dec,
            body: Some(body),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.ra.is_finite() && self.dec.is_finite()
    }

    /// Unit vector in the J2000 equatorial frame.
    pub fn unit_vector(&self) -> Vector3<f64> {
        let (sin_ra, cos_ra) = (self.ra * RADEG).sin_cos();
        let (sin_dec, cos_dec) = (self.dec * RADEG).sin_cos();
        Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
    }
}

/// Horizontal coordinates of one sample, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AltAz {
    pub alt: f32,
    pub az: f32,
}

impl AltAz {
    pub fn new(alt: f32, az: f32) -> Self {
        AltAz { alt, az }
    }
}

/// Computes horizontal coordinates of targets over a time axis.
pub trait PositionProvider {
    /// Horizontal coordinates of one target at every instant of `times`, in order.
    fn altaz_series(&self, target: &Target, times: &[Epoch]) -> Result<Vec<AltAz>>;

    /// Batched form of [`PositionProvider::altaz_series`]: one series per target, in target order.
    fn positions(&self, targets: &[Target], times: &[Epoch]) -> Result<Vec<Vec<AltAz>>> {
        targets
            .iter()
            .map(|t| self.altaz_series(t, times))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EphemerisModel {
    /// IAU 1982 mean sidereal time with IAU 1976 precession.
    #[default]
    MeanSidereal,
    /// Mean sidereal frame, with solar-system bodies read from a JPL SPK kernel.
    Spk { path: Utf8PathBuf },
}

/// A re-creatable description of a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub vantage: Vantage,
    #[serde(default)]
    pub model: EphemerisModel,
}

impl ProviderSpec {
    pub fn new(vantage: Vantage) -> Self {
        ProviderSpec {
            vantage,
            model: EphemerisModel::default(),
        }
    }

    /// A spec whose providers also follow the bodies of the kernel at `path`.
    pub fn with_kernel(vantage: Vantage, path: impl Into<Utf8PathBuf>) -> Self {
        ProviderSpec {
            vantage,
            model: EphemerisModel::Spk { path: path.into() },
        }
    }

    /// Build a fresh provider owned by the caller.
    ///
    /// An SPK provider reads its kernel on the first body it is asked about, so a spec with
    /// an unreadable kernel still serves fixed targets.
    pub fn build(&self) -> Result<Box<dyn PositionProvider>> {
        match &self.model {
            EphemerisModel::MeanSidereal => Ok(Box::new(SiderealProvider::new(self.vantage))),
            EphemerisModel::Spk { path } => {
                Ok(Box::new(EphemerisProvider::new(self.vantage, path.clone())))
            }
        }
    }
}
