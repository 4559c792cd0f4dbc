//! # Constants and type definitions for skyalmanac
//!
//! This module centralizes the **conversion factors**, **validity bounds** and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians, hours ↔ degrees, days ↔ seconds)
//! - Supported date window of the position provider
//! - Core type aliases (angles, magnitudes, star identifiers)

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: u64 = 86_400;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Hours of right ascension → degrees
pub const HOUR_TO_DEG: f64 = 15.0;

// -------------------------------------------------------------------------------------------------
// Validity window
// -------------------------------------------------------------------------------------------------

/// First calendar year accepted as a load start date.
pub const FIRST_SUPPORTED_YEAR: i32 = 1900;

/// Last calendar year accepted as a load start date.
pub const LAST_SUPPORTED_YEAR: i32 = 2050;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Apparent visual magnitude (lower is brighter)
pub type Magnitude = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Harvard Revised (Bright Star catalogue) number used to join constellation lines to stars
pub type StarId = u32;
