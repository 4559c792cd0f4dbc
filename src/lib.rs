//! # skyalmanac
//!
//! Precomputed sky positions for an interactive almanac.
//!
//! Heterogeneous star and deep-sky catalogue files are normalized into uniform
//! [`catalogue::Catalogue`]s, the topocentric altitude/azimuth of every object is computed for
//! every instant of a sampled time range ([`observation::PositionCube`]), and every later view
//! (snapshot, transit arcs, constellation figures) is answered by masking those cubes
//! ([`exploration::explore`]).
//!
//! The entry point is [`almanac::Almanac`], configured by an [`config::AlmanacConfig`].
pub mod almanac;
pub mod almanac_errors;
pub mod catalogue;
pub mod config;
pub mod constants;
pub mod constellations;
pub mod conversion;
pub mod ephemeris;
pub mod exploration;
pub mod observation;
pub mod time;
pub mod time_series;
pub mod vantage;

pub use almanac::{Almanac, LoadRequest, LoadResult};
pub use almanac_errors::{AlmanacError, Result};
pub use config::AlmanacConfig;
pub use exploration::{explore, ExplorationQuery, SkyView};
