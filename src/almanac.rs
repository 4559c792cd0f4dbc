//! # Almanac loading
//!
//! [`Almanac::load`] runs one complete load:
//!
//! 1. validate the [`LoadRequest`] and build the [`TimeSeries`];
//! 2. list the Sun, Moon and planets from the configured SPK kernel, then read and normalize
//!    every configured catalogue (a failing catalogue is skipped and recorded in
//!    [`LoadResult::failures`]);
//! 3. build the constellation lines and resolve their stars against the starfield catalogue;
//! 4. compute one [`PositionCube`] per catalogue on a bounded worker pool.
//!
//! A compute failure or a cancellation aborts the whole load; no partial result is returned.
//!
//! ## Example
//! -----------------
//! ```rust, no_run
//! use camino::Utf8Path;
//! use skyalmanac::{almanac::{Almanac, LoadRequest}, config::AlmanacConfig, time::CalendarDate};
//!
//! let config = AlmanacConfig::from_toml_path(Utf8Path::new("almanac.toml"))?;
//! let request = LoadRequest::from_defaults(&config.defaults, CalendarDate::new(2025, 3, 21));
//! let almanac = Almanac::new(config);
//! let result = almanac.load(&request, || false)?;
//! for loaded in &result.catalogues {
//!     println!("{}: {}", loaded.catalogue.name(), loaded.stats);
//! }
//! # Ok::<(), skyalmanac::almanac_errors::AlmanacError>(())
//! ```
use std::{fmt, time::Duration, time::Instant};

use log::{info, warn};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{
        normalize, solar_system_catalogue, Catalogue, MagnitudeBounds, NormalizationReport,
        RawTable,
    },
    config::{AlmanacConfig, CatalogueSource, EphemerisSource, LoadDefaults, MagnitudeBand},
    constants::{Degree, StarId},
    constellations::ConstellationSet,
    observation::{ObservationEngine, PositionCube},
    time::CalendarDate,
    time_series::TimeSeries,
    vantage::{EphemerisProvider, ProviderSpec, Vantage},
};

/// Parameters of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub latitude: Degree,
    pub longitude: Degree,
    pub start_date: CalendarDate,
    pub num_days: u32,
    pub sample_seconds: u32,
    pub starfield_magnitudes: MagnitudeBounds,
    pub deep_sky_magnitudes: MagnitudeBounds,
    pub max_workers: Option<usize>,
}

impl Default for LoadRequest {
    /// The default panel values starting today (or on 2000-01-01 without a usable clock).
    fn default() -> Self {
        let today = CalendarDate::today().unwrap_or(CalendarDate::new(2000, 1, 1));
        LoadRequest::from_defaults(&LoadDefaults::default(), today)
    }
}

impl LoadRequest {
    pub fn from_defaults(defaults: &LoadDefaults, start_date: CalendarDate) -> Self {
        LoadRequest {
            latitude: defaults.latitude,
            longitude: defaults.longitude,
            start_date,
            num_days: defaults.num_days,
            sample_seconds: defaults.sample_seconds,
            starfield_magnitudes: defaults.starfield_magnitudes,
            deep_sky_magnitudes: defaults.deep_sky_magnitudes,
            max_workers: defaults.max_workers,
        }
    }

    pub fn vantage(&self) -> Result<Vantage> {
        Vantage::new(self.latitude, self.longitude)
    }

    pub fn magnitudes(&self, band: MagnitudeBand) -> MagnitudeBounds {
        match band {
            MagnitudeBand::Starfield => self.starfield_magnitudes,
            MagnitudeBand::DeepSky => self.deep_sky_magnitudes,
        }
    }
}

/// Timings and counts of one loaded catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueStats {
    pub report: NormalizationReport,
    pub normalize_time: Duration,
    pub compute_time: Duration,
    pub chunks: usize,
    /// Cells of the position cube (objects × samples).
    pub positions: usize,
}

impl CatalogueStats {
    /// Computed positions per second, 0 for an instantaneous compute.
    pub fn throughput(&self) -> f64 {
        let secs = self.compute_time.as_secs_f64();
        if secs > 0.0 {
            self.positions as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for CatalogueStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} chunk(s), normalize {:.3}s, compute {:.3}s ({:.0} positions/s)",
            self.report,
            self.chunks,
            self.normalize_time.as_secs_f64(),
            self.compute_time.as_secs_f64(),
            self.throughput()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCatalogue {
    pub catalogue: Catalogue,
    pub cube: PositionCube,
    pub band: MagnitudeBand,
    pub starfield: bool,
    pub stats: CatalogueStats,
}

/// A source that could not be used, and why.
#[derive(Debug)]
pub struct CatalogueFailure {
    pub name: String,
    pub error: AlmanacError,
}

#[derive(Debug)]
pub struct LoadResult {
    pub times: TimeSeries,
    pub provider: ProviderSpec,
    /// Loaded catalogues: the solar system first, then the sources in configuration order.
    pub catalogues: Vec<LoadedCatalogue>,
    /// Constellation lines, when configured and resolvable.
    pub constellations: Option<ConstellationSet>,
    /// Star ids referenced by the lines but absent from the star catalogue.
    pub unresolved_stars: Vec<StarId>,
    pub failures: Vec<CatalogueFailure>,
}

impl LoadResult {
    pub fn catalogue(&self, name: &str) -> Option<&LoadedCatalogue> {
        self.catalogues.iter().find(|c| c.catalogue.name() == name)
    }

    /// The starfield catalogue, if it loaded.
    pub fn starfield(&self) -> Option<&LoadedCatalogue> {
        self.catalogues.iter().find(|c| c.starfield)
    }
}

#[derive(Debug, Clone)]
pub struct Almanac {
    config: AlmanacConfig,
}

struct Normalized {
    catalogue: Catalogue,
    band: MagnitudeBand,
    starfield: bool,
    elapsed: Duration,
}

impl Almanac {
    pub fn new(config: AlmanacConfig) -> Self {
        Almanac { config }
    }

    pub fn config(&self) -> &AlmanacConfig {
        &self.config
    }

    /// Run a complete load.
    ///
    /// Arguments
    /// -----------------
    /// * `request`: vantage, dates, sampling and magnitude bounds.
    /// * `cancel`: polled between catalogues and around every compute chunk.
    ///
    /// Return
    /// ----------
    /// * The [`LoadResult`], or
    ///   * [`AlmanacError::InvalidRange`] for an invalid request,
    ///   * [`AlmanacError::NoCatalogues`] when no catalogue could be normalized,
    ///   * [`AlmanacError::Compute`] / [`AlmanacError::Cancelled`] from the computation.
    pub fn load<C>(&self, request: &LoadRequest, cancel: C) -> Result<LoadResult>
    where
        C: Fn() -> bool + Sync,
    {
        let started = Instant::now();
        let vantage = request.vantage()?;
        let provider = match &self.config.ephemeris {
            Some(ephemeris) => ProviderSpec::with_kernel(vantage, ephemeris.path.clone()),
            None => ProviderSpec::new(vantage),
        };
        request.starfield_magnitudes.validate()?;
        request.deep_sky_magnitudes.validate()?;
        let times = TimeSeries::build(request.start_date, request.num_days, request.sample_seconds)?;
        let engine = ObservationEngine::new(request.max_workers)?;

        let mut failures = Vec::new();
        let mut normalized = Vec::with_capacity(self.config.sources.len() + 1);
        if let Some(ephemeris) = &self.config.ephemeris {
            let t0 = Instant::now();
            match list_bodies(ephemeris, vantage, &times) {
                Ok(catalogue) => normalized.push(Normalized {
                    catalogue,
                    band: ephemeris.band,
                    starfield: false,
                    elapsed: t0.elapsed(),
                }),
                Err(error) => {
                    warn!("[{}] skipped: {error}", ephemeris.name);
                    failures.push(CatalogueFailure {
                        name: ephemeris.name.clone(),
                        error,
                    });
                }
            }
        }
        for source in &self.config.sources {
            if cancel() {
                return Err(AlmanacError::Cancelled(started.elapsed()));
            }
            let t0 = Instant::now();
            match read_catalogue(source, request.magnitudes(source.band)) {
                Ok(catalogue) => normalized.push(Normalized {
                    catalogue,
                    band: source.band,
                    starfield: source.starfield,
                    elapsed: t0.elapsed(),
                }),
                Err(error) => {
                    warn!("[{}] skipped: {error}", source.name());
                    failures.push(CatalogueFailure {
                        name: source.name().to_string(),
                        error,
                    });
                }
            }
        }
        if normalized.is_empty() {
            return Err(AlmanacError::NoCatalogues);
        }

        let (constellations, unresolved_stars) = self.load_constellations(&normalized, &mut failures);

        let mut catalogues = Vec::with_capacity(normalized.len());
        for n in normalized {
            let t0 = Instant::now();
            let cube = engine.compute(&n.catalogue, &times, &provider, &cancel)?;

            let stats = CatalogueStats {
                report: *n.catalogue.report(),
                normalize_time: n.elapsed,
                compute_time: t0.elapsed(),
                chunks: engine.chunk_ranges(n.catalogue.len()).len(),
                positions: cube.positions().len(),
            };
            info!("[{}] {stats}", n.catalogue.name());
            catalogues.push(LoadedCatalogue {
                catalogue: n.catalogue,
                cube,
                band: n.band,
                starfield: n.starfield,
                stats,
            });
        }

        info!(
            "Load finished in {:.3}s: {} catalogue(s), {} failure(s)",
            started.elapsed().as_secs_f64(),
            catalogues.len(),
            failures.len()
        );
        Ok(LoadResult {
            times,
            provider,
            catalogues,
            constellations,
            unresolved_stars,
            failures,
        })
    }

    /// Read the constellation lines and check their stars against the star catalogue.
    ///
    /// Any failure here only drops the constellations.
    fn load_constellations(
        &self,
        normalized: &[Normalized],
        failures: &mut Vec<CatalogueFailure>,
    ) -> (Option<ConstellationSet>, Vec<StarId>) {
        let Some(source) = &self.config.constellations else {
            return (None, Vec::new());
        };

        let set = match source
            .delimiter_byte()
            .and_then(|d| RawTable::from_csv_path(&source.path, d))
            .and_then(|table| ConstellationSet::build(&table))
        {
            Ok(set) => set,
            Err(error) => {
                warn!("constellation lines skipped: {error}");
                failures.push(CatalogueFailure {
                    name: "constellations".to_string(),
                    error,
                });
                return (None, Vec::new());
            }
        };

        let star_catalogue = match &source.star_catalogue {
            Some(name) => normalized.iter().find(|n| n.catalogue.name() == name),
            None => normalized.iter().find(|n| n.starfield),
        };
        let Some(stars) = star_catalogue else {
            warn!("constellation lines dropped: their star catalogue is not loaded");
            return (None, Vec::new());
        };

        let unresolved = set.unresolved_against(&stars.catalogue);
        if !unresolved.is_empty() {
            warn!(
                "{} constellation star(s) missing from '{}': {:?}",
                unresolved.len(),
                stars.catalogue.name(),
                unresolved
            );
        }
        (Some(set), unresolved)
    }
}

/// The bodies of `source` listed where they stand at the start of the time axis.
pub fn list_bodies(
    source: &EphemerisSource,
    vantage: Vantage,
    times: &TimeSeries,
) -> Result<Catalogue> {
    let provider = EphemerisProvider::new(vantage, source.path.clone());
    solar_system_catalogue(&source.name, &provider, &source.bodies, times.epochs())
}

/// Read one source file and normalize it.
pub fn read_catalogue(source: &CatalogueSource, bounds: MagnitudeBounds) -> Result<Catalogue> {
    let table = RawTable::from_csv_path(&source.path, source.delimiter_byte()?)?;
    normalize(&table, &source.descriptor, bounds)
}
