use std::{fmt, str::FromStr};

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::{Radian, DPI, FIRST_SUPPORTED_YEAR, LAST_SUPPORTED_YEAR, MJD, T2000},
};

/// A proleptic Gregorian calendar date, as entered in a load request.
///
/// Parsed from and serialized to the `YYYY-MM-DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        CalendarDate { year, month, day }
    }

    /// The UTC instant at 12:00:00 on this date.
    ///
    /// Return
    /// ----------
    /// * The noon [`Epoch`], or [`AlmanacError::InvalidRange`] if the date does not exist
    ///   (e.g. 2023-02-30).
    pub fn utc_noon(&self) -> Result<Epoch> {
        Epoch::maybe_from_gregorian_utc(self.year, self.month, self.day, 12, 0, 0, 0)
            .map_err(|e| AlmanacError::InvalidRange(format!("{self} is not a valid date: {e}")))
    }

    /// The current UTC date, from the system clock.
    pub fn today() -> Result<Self> {
        let (year, month, day, ..) = Epoch::now()?.to_gregorian_utc();
        Ok(CalendarDate { year, month, day })
    }

    /// Whether the date lies in the window covered by the position provider.
    pub fn is_supported(&self) -> bool {
        (FIRST_SUPPORTED_YEAR..=LAST_SUPPORTED_YEAR).contains(&self.year)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = AlmanacError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AlmanacError::InvalidRange(format!("expected YYYY-MM-DD, got '{s}'"));

        let mut parts = s.trim().splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let day = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(invalid)?;

        Ok(CalendarDate { year, month, day })
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = AlmanacError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CalendarDate> for String {
    fn from(date: CalendarDate) -> Self {
        date.to_string()
    }
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date.
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h, plus the fractional-day
/// correction term due to Earth's rotation rate. UTC is used in place of UT1; the
/// difference (below one second) is far under the resolution of a sky almanac.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (UTC)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> Radian {
    // Polynomial coefficients for GMST at 0h (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let mut gmst0 = ((C3 * t + C2) * t + C1) * t + C0;
    gmst0 *= DPI / 86400.0;

    let h = tjm.fract() * DPI;
    (gmst0 + h * RAP).rem_euclid(DPI)
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_gmst() {
        let tut = 57028.478514610404;
        let res_gmst = gmst(tut);
        approx::assert_abs_diff_eq!(res_gmst, 4.851925725092499, epsilon = 1e-12);

        let res_gmst = gmst(T2000);
        approx::assert_abs_diff_eq!(res_gmst, 4.894961212789145, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_date() {
        let date: CalendarDate = "2025-03-21".parse().unwrap();
        assert_eq!(date, CalendarDate::new(2025, 3, 21));
        assert_eq!(date.to_string(), "2025-03-21");

        assert!("2025-03".parse::<CalendarDate>().is_err());
        assert!("2025/03/21".parse::<CalendarDate>().is_err());
    }

    #[test]
    fn test_utc_noon() {
        let noon = CalendarDate::new(2021, 1, 1).utc_noon().unwrap();
        approx::assert_abs_diff_eq!(noon.to_mjd_utc_days(), 59215.5, epsilon = 1e-9);

        assert!(matches!(
            CalendarDate::new(2023, 2, 30).utc_noon(),
            Err(AlmanacError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_supported_window() {
        assert!(CalendarDate::new(1900, 1, 1).is_supported());
        assert!(CalendarDate::new(2050, 12, 31).is_supported());
        assert!(!CalendarDate::new(1899, 12, 31).is_supported());
        assert!(!CalendarDate::new(2051, 1, 1).is_supported());
    }
}
