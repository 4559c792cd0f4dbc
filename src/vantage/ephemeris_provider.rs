//! Position provider for solar-system bodies.
//!
//! Fixed targets are delegated to a [`SiderealProvider`]. A body target is located with an
//! [`SpkKernel`] and seen from the vantage point, not from the Earth's center:
//!
//! ```text
//! observer(t) = earth(t) + M(t)ᵀ · site
//! local(t)    = M(t) · (body(t - τ) - observer(t)),   τ = |body(t - τ) - observer(t)| / c
//! ```
//!
//! with `M(t)` the J2000 → horizon matrix of the sidereal provider and `site` the WGS84
//! position of the vantage (sea level) in the horizon frame. The light time `τ` is iterated a
//! fixed number of times. Positions are astrometric: aberration and nutation are ignored,
//! both well under the almanac resolution.
use std::cell::OnceCell;

use camino::Utf8PathBuf;
use hifitime::Epoch;
use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{Degree, RADEG},
    ephemeris::{SolarSystemBody, SpkKernel},
    vantage::{sidereal::horizontal, AltAz, PositionProvider, SiderealProvider, Target, Vantage},
};

/// Speed of light, km/s.
pub const SPEED_OF_LIGHT: f64 = 299_792.458;
/// WGS84 equatorial radius, km.
pub const WGS84_RADIUS: f64 = 6378.137;
/// WGS84 flattening.
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

const LIGHT_TIME_PASSES: usize = 3;

#[derive(Debug)]
pub struct EphemerisProvider {
    sidereal: SiderealProvider,
    /// Geocentric position of the vantage in the horizon frame, km.
    site: Vector3<f64>,
    path: Utf8PathBuf,
    kernel: OnceCell<SpkKernel>,
}

/// Geocentric position of a sea-level site at geodetic `latitude`, in the hour-angle frame
/// (x towards the meridian on the equator, z towards the pole).
fn site_equatorial(latitude: Degree) -> Vector3<f64> {
    let (sin_lat, cos_lat) = (latitude * RADEG).sin_cos();
    let e2 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
    let normal = WGS84_RADIUS / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    Vector3::new(normal * cos_lat, 0.0, normal * (1.0 - e2) * sin_lat)
}

impl EphemerisProvider {
    /// The kernel at `path` is read on first use.
    pub fn new(vantage: Vantage, path: Utf8PathBuf) -> Self {
        let sidereal = SiderealProvider::new(vantage);
        let site = sidereal.horizon() * site_equatorial(vantage.latitude());
        EphemerisProvider {
            sidereal,
            site,
            path,
            kernel: OnceCell::new(),
        }
    }

    pub fn vantage(&self) -> Vantage {
        self.sidereal.vantage()
    }

    /// The decoded kernel, read from disk on the first call.
    pub fn kernel(&self) -> Result<&SpkKernel> {
        if let Some(kernel) = self.kernel.get() {
            return Ok(kernel);
        }
        let kernel = SpkKernel::open(&self.path)?;
        debug!("[{}] kernel loaded for {:?}", self.path, self.vantage());
        Ok(self.kernel.get_or_init(|| kernel))
    }

    /// Vector from the vantage to `body` in the horizon frame `frame`, corrected for light time.
    fn local_vector(
        &self,
        kernel: &SpkKernel,
        id: i32,
        frame: &Matrix3<f64>,
        et: f64,
    ) -> Result<Vector3<f64>> {
        let earth = kernel.earth(et)?;
        let mut light_time = 0.0;
        let mut local = Vector3::zeros();
        for _ in 0..LIGHT_TIME_PASSES {
            let geocentric = kernel.barycentric(id, et - light_time)? - earth;
            local = frame * geocentric - self.site;
            light_time = local.norm() / SPEED_OF_LIGHT;
        }
        Ok(local)
    }

    fn naif_id(kernel: &SpkKernel, body: SolarSystemBody) -> Result<i32> {
        kernel.resolve(body).ok_or_else(|| {
            AlmanacError::Ephemeris(format!(
                "{body} (NAIF {}) is not in the kernel",
                body.naif_id()
            ))
        })
    }

    /// Direction of `body` from the vantage at `epoch`, as a J2000 unit vector.
    ///
    /// Return
    /// ----------
    /// * The direction, or [`AlmanacError::Ephemeris`] when the kernel does not cover the body
    ///   at `epoch`.
    pub fn direction(&self, body: SolarSystemBody, epoch: Epoch) -> Result<Vector3<f64>> {
        let kernel = self.kernel()?;
        let id = Self::naif_id(kernel, body)?;
        let frame = self.sidereal.frame(epoch);
        let local = self.local_vector(kernel, id, &frame, epoch.to_et_seconds())?;
        Ok(frame.transpose() * local.normalize())
    }

    /// J2000 right ascension (`[0, 360)`) and declination of `body` seen from the vantage.
    pub fn radec(&self, body: SolarSystemBody, epoch: Epoch) -> Result<(Degree, Degree)> {
        let v = self.direction(body, epoch)?;
        let ra = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
        // rem_euclid can round up to 360
        let ra = if ra >= 360.0 { 0.0 } else { ra };
        Ok((ra, v.z.clamp(-1.0, 1.0).asin().to_degrees()))
    }

    fn body_series(&self, body: SolarSystemBody, times: &[Epoch]) -> Result<Vec<AltAz>> {
        let kernel = self.kernel()?;
        let id = Self::naif_id(kernel, body)?;
        times
            .iter()
            .map(|&t| {
                let frame = self.sidereal.frame(t);
                let local = self.local_vector(kernel, id, &frame, t.to_et_seconds())?;
                Ok(horizontal(&local))
            })
            .collect()
    }
}

impl PositionProvider for EphemerisProvider {
    fn altaz_series(&self, target: &Target, times: &[Epoch]) -> Result<Vec<AltAz>> {
        match target.body {
            Some(body) => self.body_series(body, times),
            None => self.sidereal.altaz_series(target, times),
        }
    }

    /// Fixed targets share the sidereal frames of the batch.
    fn positions(&self, targets: &[Target], times: &[Epoch]) -> Result<Vec<Vec<AltAz>>> {
        if targets.iter().all(|t| t.body.is_none()) {
            return self.sidereal.positions(targets, times);
        }
        targets
            .iter()
            .map(|t| self.altaz_series(t, times))
            .collect()
    }
}
