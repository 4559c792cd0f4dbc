use nalgebra::{Rotation3, Vector3};

use crate::constants::{MJD, RADEG, T2000};

/// Precession matrix from the J2000 mean equator to the mean equator of date (IAU 1976).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT).
///
/// Returns
/// --------
/// * An orthonormal rotation such that `x_date = P · x_J2000` for column vectors.
///
/// Method
/// ------
/// With `T = (tjm - T2000) / 36525` the angles are
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// θ(T) = (0.5567530 - 0.0001185·T - 0.0000116·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// ```
///
/// and `P = Rz(z) · Ry(-θ) · Rz(ζ)` with active rotations, i.e. the frame rotations
/// `R3(-z) · R2(θ) · R3(-ζ)`.
///
/// Remarks
/// -------
/// * Valid within a few centuries of J2000, which covers the supported date window.
/// * Nutation is ignored; its amplitude (under 20") is below the almanac resolution.
pub fn precession_matrix(tjm: MJD) -> Rotation3<f64> {
    let zed = 0.6406161 * RADEG;
    let zd = 0.6406161 * RADEG;
    let thd = 0.5567530 * RADEG;

    let zedd = 0.0000839 * RADEG;
    let zdd = 0.0003041 * RADEG;
    let thdd = -0.0001185 * RADEG;

    let zeddd = 0.0000050 * RADEG;
    let zddd = 0.0000051 * RADEG;
    let thddd = -0.0000116 * RADEG;

    let t = (tjm - T2000) / 36525.0;

    let zeta = ((zeddd * t + zedd) * t + zed) * t;
    let z = ((zddd * t + zdd) * t + zd) * t;
    let theta = ((thddd * t + thdd) * t + thd) * t;

    let r1 = Rotation3::from_axis_angle(&Vector3::z_axis(), zeta);
    let r2 = Rotation3::from_axis_angle(&Vector3::y_axis(), -theta);
    let r3 = Rotation3::from_axis_angle(&Vector3::z_axis(), z);

    r3 * r2 * r1
}
