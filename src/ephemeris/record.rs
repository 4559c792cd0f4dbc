//! Chebyshev position records of SPK types 2 and 3.
//!
//! A record covers `[mid - radius, mid + radius]` and holds `ncoeff` coefficients per axis.
//! Type 2 stores position coefficients only (`rsize = 2 + 3·ncoeff`); type 3 appends the
//! velocity coefficients (`rsize = 2 + 6·ncoeff`), which are skipped here.
use nalgebra::Vector3;
use nom::{multi::count, number::complete::le_f64, IResult};

use super::daf::malformed;
use crate::almanac_errors::{AlmanacError, Result};

/// SPK data type of a Chebyshev position-only segment.
pub const CHEBYSHEV_POSITION: i32 = 2;
/// SPK data type of a Chebyshev position and velocity segment.
pub const CHEBYSHEV_STATE: i32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevRecord {
    /// Midpoint of the interval, TDB seconds past J2000.
    pub mid: f64,
    /// Half length of the interval in seconds.
    pub radius: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

/// Coefficients per axis for a record of `rsize` words.
///
/// Return
/// ----------
/// * [`AlmanacError::Ephemeris`] for a data type other than 2 or 3, or a record size that does
///   not divide into whole axes.
pub fn coefficients_per_axis(data_type: i32, rsize: usize) -> Result<usize> {
    let blocks = match data_type {
        CHEBYSHEV_POSITION => 3,
        CHEBYSHEV_STATE => 6,
        other => {
            return Err(AlmanacError::Ephemeris(format!(
                "SPK data type {other} is not a Chebyshev type (2 or 3)"
            )))
        }
    };
    let body = rsize.saturating_sub(2);
    if body == 0 || body % blocks != 0 {
        return Err(AlmanacError::Ephemeris(format!(
            "record size {rsize} does not fit SPK type {data_type}"
        )));
    }
    Ok(body / blocks)
}

impl ChebyshevRecord {
    fn parse_fields(input: &[u8], ncoeff: usize) -> IResult<&[u8], Self> {
        let (input, mid) = le_f64(input)?;
        let (input, radius) = le_f64(input)?;
        let (input, x) = count(le_f64, ncoeff)(input)?;
        let (input, y) = count(le_f64, ncoeff)(input)?;
        let (input, z) = count(le_f64, ncoeff)(input)?;
        Ok((
            input,
            ChebyshevRecord {
                mid,
                radius,
                x,
                y,
                z,
            },
        ))
    }

    /// Decode one record.
    ///
    /// Arguments
    /// -----------------
    /// * `input`: the record bytes; trailing velocity coefficients are ignored.
    /// * `ncoeff`: coefficients per axis, see [`coefficients_per_axis`].
    pub fn parse(input: &[u8], ncoeff: usize) -> Result<Self> {
        let (_, record) =
            Self::parse_fields(input, ncoeff).map_err(malformed("Chebyshev record"))?;
        if record.radius.is_nan() || record.radius <= 0.0 {
            return Err(AlmanacError::Ephemeris(format!(
                "record at {} has a non-positive radius {}",
                record.mid, record.radius
            )));
        }
        Ok(record)
    }

    /// Position in km at `et` (TDB seconds past J2000).
    ///
    /// The normalized time `(et - mid) / radius` is clamped to `[-1, 1]`, so an instant just
    /// outside the interval evaluates at its nearest end.
    pub fn position(&self, et: f64) -> Vector3<f64> {
        let t = ((et - self.mid) / self.radius).clamp(-1.0, 1.0);

        // T_0 = 1, T_1 = t, T_n = 2t·T_{n-1} - T_{n-2}
        let mut polynomials = vec![0.0; self.x.len()];
        if let Some(first) = polynomials.first_mut() {
            *first = 1.0;
        }
        if polynomials.len() > 1 {
            polynomials[1] = t;
            for n in 2..polynomials.len() {
                polynomials[n] = 2.0 * t * polynomials[n - 1] - polynomials[n - 2];
            }
        }

        let axis = |c: &[f64]| c.iter().zip(&polynomials).map(|(c, p)| c * p).sum();
        Vector3::new(axis(&self.x), axis(&self.y), axis(&self.z))
    }
}

#[cfg(test)]
mod record_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bytes(words: &[f64]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_coefficients_per_axis() {
        assert_eq!(coefficients_per_axis(2, 41).unwrap(), 13);
        assert_eq!(coefficients_per_axis(3, 38).unwrap(), 6);
        assert!(coefficients_per_axis(2, 40).is_err());
        assert!(coefficients_per_axis(21, 41).is_err());
    }

    #[test]
    fn test_chebyshev_sum() {
        // x = 1 + 2t + 3(2t² - 1), y = -t, z = 5
        let words = [100.0, 10.0, 1.0, 2.0, 3.0, 0.0, -1.0, 0.0, 5.0, 0.0, 0.0];
        let record = ChebyshevRecord::parse(&bytes(&words), 3).unwrap();

        let at = |et: f64| record.position(et);
        assert_abs_diff_eq!(at(100.0), Vector3::new(-2.0, 0.0, 5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(at(105.0), Vector3::new(0.5, -0.5, 5.0), epsilon = 1e-12);
        assert_abs_diff_eq!(at(110.0), Vector3::new(6.0, -1.0, 5.0), epsilon = 1e-12);
        // clamped beyond the interval end
        assert_abs_diff_eq!(at(130.0), at(110.0), epsilon = 1e-12);
    }

    #[test]
    fn test_state_record_ignores_velocity() {
        let mut words = vec![0.0, 1.0, 7.0, 8.0, 9.0];
        words.extend([1e9; 3]);
        let record = ChebyshevRecord::parse(&bytes(&words), 1).unwrap();
        assert_eq!(record.position(0.3), Vector3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_truncated_record() {
        let words = [0.0, 1.0, 7.0, 8.0];
        assert!(matches!(
            ChebyshevRecord::parse(&bytes(&words), 1),
            Err(AlmanacError::Ephemeris(_))
        ));
    }
}
