//! Mean-sidereal position provider.
//!
//! For each instant the provider folds three rotations into one 3×3 matrix:
//!
//! ```text
//! M(t) = H(φ) · Rz(-LST(t)) · P(t)
//! ```
//!
//! * `P(t)`: precession J2000 → mean equator of date ([`precession_matrix`]);
//! * `Rz(-LST)`: equatorial of date → hour-angle frame, with `LST = GMST + λ`;
//! * `H(φ)`: hour-angle frame → local (north, east, up) frame at latitude `φ`.
//!
//! A target then costs one matrix-vector product per sample:
//! `alt = asin(up)`, `az = atan2(east, north)`.
use hifitime::Epoch;
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{DPI, RADEG},
    time::gmst,
    vantage::{precession::precession_matrix, AltAz, PositionProvider, Target, Vantage},
};

#[derive(Debug, Clone)]
pub struct SiderealProvider {
    vantage: Vantage,
    horizon: Matrix3<f64>,
}

impl SiderealProvider {
    pub fn new(vantage: Vantage) -> Self {
        let (sin_lat, cos_lat) = (vantage.latitude() * RADEG).sin_cos();
        #[rustfmt::skip]
        let horizon = Matrix3::new(
            -sin_lat, 0.0, cos_lat,
            0.0,      1.0, 0.0,
            cos_lat,  0.0, sin_lat,
        );
        SiderealProvider { vantage, horizon }
    }

    pub fn vantage(&self) -> Vantage {
        self.vantage
    }

    /// Hour-angle frame → local (north, east, up) frame.
    pub(crate) fn horizon(&self) -> &Matrix3<f64> {
        &self.horizon
    }

    /// Local mean sidereal time (radians, `[0, 2π)`) at `epoch`.
    pub fn local_sidereal_time(&self, epoch: Epoch) -> f64 {
        (gmst(epoch.to_mjd_utc_days()) + self.vantage.longitude() * RADEG).rem_euclid(DPI)
    }

    /// The J2000 → local horizon matrix at `epoch`.
    pub(crate) fn frame(&self, epoch: Epoch) -> Matrix3<f64> {
        let lst = self.local_sidereal_time(epoch);
        let earth = Rotation3::from_axis_angle(&Vector3::z_axis(), -lst);
        let precession = precession_matrix(epoch.to_mjd_tt_days());
        self.horizon * earth.matrix() * precession.matrix()
    }

    pub(crate) fn frames(&self, times: &[Epoch]) -> Vec<Matrix3<f64>> {
        times.iter().map(|&t| self.frame(t)).collect()
    }
}

fn check_target(target: &Target) -> Result<Vector3<f64>> {
    if let Some(body) = target.body {
        return Err(AlmanacError::InvalidRange(format!(
            "{body} moves against the stars and needs an SPK ephemeris model"
        )));
    }
    if !target.is_finite() {
        return Err(AlmanacError::InvalidRange(format!(
            "target coordinates ({}, {}) are not finite",
            target.ra, target.dec
        )));
    }
    Ok(target.unit_vector())
}

/// Horizontal coordinates of a direction given in the local (north, east, up) frame.
///
/// `local` need not be a unit vector.
pub(crate) fn horizontal(local: &Vector3<f64>) -> AltAz {
    let alt = local.z.atan2(local.x.hypot(local.y)).to_degrees();
    let az = local.y.atan2(local.x).rem_euclid(DPI).to_degrees() as f32;
    // rounding can land exactly on 360
    let az = if az >= 360.0 { 0.0 } else { az };
    AltAz::new(alt as f32, az)
}

fn to_altaz(frames: &[Matrix3<f64>], v: &Vector3<f64>) -> Vec<AltAz> {
    frames.iter().map(|m| horizontal(&(m * v))).collect()
}

impl PositionProvider for SiderealProvider {
    fn altaz_series(&self, target: &Target, times: &[Epoch]) -> Result<Vec<AltAz>> {
        let v = check_target(target)?;
        Ok(to_altaz(&self.frames(times), &v))
    }

    /// Frames are computed once for the whole batch.
    fn positions(&self, targets: &[Target], times: &[Epoch]) -> Result<Vec<Vec<AltAz>>> {
        let frames = self.frames(times);
        targets
            .iter()
            .map(|t| Ok(to_altaz(&frames, &check_target(t)?)))
            .collect()
    }
}
