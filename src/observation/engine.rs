//! Chunked parallel computation of position cubes.
//!
//! Catalogue rows are split into contiguous chunks, each chunk is evaluated on a worker of a
//! bounded [`rayon`] pool, and the results are gathered with an ordered collect. Cube rows
//! therefore follow the catalogue order for any worker count.
//!
//! Every chunk builds its own provider from a [`ProviderSpec`]: no provider is shared between
//! workers, so providers do not need to be `Sync`.
//!
//! ### Cancellation
//! The `cancel` predicate is polled before a chunk starts and after it completes. A positive
//! answer aborts the computation with [`AlmanacError::Cancelled`]; partial results are dropped.
//!
//! ### Progress UI (feature: `progress`)
//! With the `progress` feature a progress bar (via `indicatif`) counts completed chunks.
use std::{ops::Range, time::Instant};

use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::Catalogue,
    observation::PositionCube,
    time_series::TimeSeries,
    vantage::{AltAz, PositionProvider, ProviderSpec, Target},
};

/// Target number of chunks per worker, to smooth load imbalance.
pub const CHUNKS_PER_WORKER: usize = 4;

/// Chunks never hold fewer rows than this (except the last one); provider set-up is not free.
pub const MIN_CHUNK_ROWS: usize = 275;

/// Builds one provider per chunk.
pub type ProviderFactory<'a> = dyn Fn() -> Result<Box<dyn PositionProvider>> + Sync + 'a;

pub struct ObservationEngine {
    max_workers: usize,
    min_chunk_rows: usize,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for ObservationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationEngine")
            .field("max_workers", &self.max_workers)
            .field("min_chunk_rows", &self.min_chunk_rows)
            .finish()
    }
}

struct ChunkPlan<'a> {
    catalogue: &'a str,
    targets: &'a [Target],
    times: &'a TimeSeries,
    started: Instant,
}

impl ObservationEngine {
    /// Create an engine with its own worker pool.
    ///
    /// Arguments
    /// -----------------
    /// * `max_workers`: pool size; `None` uses the available parallelism of the machine.
    ///
    /// Return
    /// ----------
    /// * The engine, or [`AlmanacError::InvalidRange`] for zero workers, or a pool build error.
    pub fn new(max_workers: Option<usize>) -> Result<Self> {
        let max_workers = match max_workers {
            Some(0) => {
                return Err(AlmanacError::InvalidRange(
                    "worker count must be positive".into(),
                ))
            }
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("skyalmanac-worker-{i}"))
            .build()?;

        Ok(ObservationEngine {
            max_workers,
            min_chunk_rows: MIN_CHUNK_ROWS,
            pool,
        })
    }

    /// Override the minimum chunk size (at least one row).
    pub fn with_min_chunk_rows(mut self, rows: usize) -> Self {
        self.min_chunk_rows = rows.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Contiguous row ranges covering `0..rows`, in order.
    ///
    /// About [`CHUNKS_PER_WORKER`] chunks per worker, each holding at least the minimum chunk
    /// size except possibly the last.
    pub fn chunk_ranges(&self, rows: usize) -> Vec<Range<usize>> {
        if rows == 0 {
            return Vec::new();
        }
        let target_chunks = CHUNKS_PER_WORKER * self.max_workers;
        let size = rows.div_ceil(target_chunks).max(self.min_chunk_rows);
        (0..rows)
            .step_by(size)
            .map(|start| start..(start + size).min(rows))
            .collect()
    }

    /// Compute the position cube of a catalogue.
    ///
    /// Arguments
    /// -----------------
    /// * `catalogue`: the normalized catalogue; cube rows follow its order.
    /// * `times`: the shared time axis.
    /// * `spec`: description of the provider each chunk builds for itself.
    /// * `cancel`: polled before and after each chunk.
    ///
    /// Return
    /// ----------
    /// * The cube, [`AlmanacError::Cancelled`], or [`AlmanacError::Compute`] naming the first
    ///   failing chunk.
    ///
    /// See also
    /// ------------
    /// * [`ObservationEngine::compute_with`] – same computation with a custom provider factory.
    pub fn compute<C>(
        &self,
        catalogue: &Catalogue,
        times: &TimeSeries,
        spec: &ProviderSpec,
        cancel: C,
    ) -> Result<PositionCube>
    where
        C: Fn() -> bool + Sync,
    {
        let factory = || spec.build();
        self.compute_with(catalogue, times, &factory, cancel)
    }

    /// [`ObservationEngine::compute`] with an explicit provider factory, called once per chunk.
    pub fn compute_with<C>(
        &self,
        catalogue: &Catalogue,
        times: &TimeSeries,
        factory: &ProviderFactory,
        cancel: C,
    ) -> Result<PositionCube>
    where
        C: Fn() -> bool + Sync,
    {
        let targets = catalogue.targets();
        let plan = ChunkPlan {
            catalogue: catalogue.name(),
            targets: &targets,
            times,
            started: Instant::now(),
        };
        let chunks = self.chunk_ranges(targets.len());
        debug!(
            "[{}] {} rows x {} samples in {} chunk(s) on {} worker(s)",
            plan.catalogue,
            targets.len(),
            times.len(),
            chunks.len(),
            self.max_workers
        );

        #[cfg(feature = "progress")]
        let pb = {
            let pb = ProgressBar::new(chunks.len().max(1) as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} chunks ({percent:>3}%) | ETA {eta_precise} | {msg}",
            ) {
                pb.set_style(style);
            }
            pb.set_message(plan.catalogue.to_string());
            pb
        };

        let run = |(index, rows): (usize, &Range<usize>)| -> Result<Vec<Vec<AltAz>>> {
            if cancel() {
                return Err(AlmanacError::Cancelled(plan.started.elapsed()));
            }
            let series = plan.run_chunk(index, rows.clone(), factory)?;
            #[cfg(feature = "progress")]
            pb.inc(1);
            if cancel() {
                return Err(AlmanacError::Cancelled(plan.started.elapsed()));
            }
            Ok(series)
        };

        let results = if chunks.len() <= 1 {
            chunks.iter().enumerate().map(run).collect::<Result<Vec<_>>>()
        } else {
            self.pool
                .install(|| chunks.par_iter().enumerate().map(run).collect::<Result<Vec<_>>>())
        };

        #[cfg(feature = "progress")]
        pb.finish_and_clear();

        let results = results?;
        let elapsed = plan.started.elapsed();

        let n_times = times.len();
        let flat = results
            .into_iter()
            .flatten()
            .flatten()
            .collect::<Vec<AltAz>>();
        let positions = Array2::from_shape_vec((targets.len(), n_times), flat)
            .map_err(|e| AlmanacError::InvalidRange(format!("cube assembly failed: {e}")))?;

        info!(
            "[{}] computed {} positions in {:.3}s",
            plan.catalogue,
            targets.len() * n_times,
            elapsed.as_secs_f64()
        );
        PositionCube::from_parts(catalogue.name(), catalogue.entries().to_vec(), positions)
    }
}

impl ChunkPlan<'_> {
    fn run_chunk(
        &self,
        index: usize,
        rows: Range<usize>,
        factory: &ProviderFactory,
    ) -> Result<Vec<Vec<AltAz>>> {
        let fail = |reason: String| AlmanacError::Compute {
            catalogue: self.catalogue.to_string(),
            chunk: index,
            rows: rows.clone(),
            elapsed: self.started.elapsed(),
            reason,
        };

        let provider = factory().map_err(|e| fail(e.to_string()))?;
        let series = provider
            .positions(&self.targets[rows.clone()], self.times.epochs())
            .map_err(|e| fail(e.to_string()))?;

        if series.len() != rows.len() || series.iter().any(|s| s.len() != self.times.len()) {
            return Err(fail(format!(
                "provider returned {} series for {} targets over {} samples",
                series.len(),
                rows.len(),
                self.times.len()
            )));
        }
        Ok(series)
    }
}

#[cfg(test)]
mod engine_test {
    use super::*;
    use crate::{
        catalogue::{CatalogueEntry, SourceType},
        time::CalendarDate,
        vantage::Vantage,
    };
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn catalogue(n: usize) -> Catalogue {
        let entries = (0..n)
            .map(|i| CatalogueEntry {
                name: i.to_string(),
                ra: (i as f64 * 7.3) % 360.0,
                dec: (i as f64 * 3.1) % 180.0 - 90.0,
                magnitude: 1.0,
                norm_mag: 0.0,
                size: 4.0,
                intensity: 1.0,
                source_type: SourceType::Star,
            })
            .collect();
        Catalogue::new("synthetic", entries)
    }

    fn series() -> TimeSeries {
        TimeSeries::build(CalendarDate::new(2024, 6, 1), 1, 3600).unwrap()
    }

    fn spec() -> ProviderSpec {
        ProviderSpec::new(Vantage::new(54.0, 0.0).unwrap())
    }

    #[test]
    fn test_chunk_ranges() {
        let engine = ObservationEngine::new(Some(2)).unwrap();
        assert!(engine.chunk_ranges(0).is_empty());
        assert_eq!(engine.chunk_ranges(100), vec![0..100]);
        assert_eq!(engine.chunk_ranges(600), vec![0..275, 275..550, 550..600]);

        let ranges = engine.chunk_ranges(10_000);
        assert_eq!(ranges.len(), 8);
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(10_000));
        assert!(ranges.windows(2).all(|w| w[0].end == w[1].start));

        let small = ObservationEngine::new(Some(2)).unwrap().with_min_chunk_rows(1);
        assert_eq!(small.chunk_ranges(16).len(), 8);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            ObservationEngine::new(Some(0)),
            Err(AlmanacError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_empty_catalogue() {
        let engine = ObservationEngine::new(Some(2)).unwrap();
        let cube = engine
            .compute(&catalogue(0), &series(), &spec(), || false)
            .unwrap();
        assert_eq!(cube.positions().dim(), (0, 24));
    }

    #[test]
    fn test_cancel_before_start() {
        let engine = ObservationEngine::new(Some(2)).unwrap().with_min_chunk_rows(10);
        let res = engine.compute(&catalogue(100), &series(), &spec(), || true);
        assert!(matches!(res, Err(AlmanacError::Cancelled(_))));
    }

    #[test]
    fn test_cancel_after_first_chunk() {
        let engine = ObservationEngine::new(Some(1)).unwrap().with_min_chunk_rows(10);
        let polls = AtomicUsize::new(0);
        let res = engine.compute(&catalogue(100), &series(), &spec(), || {
            polls.fetch_add(1, Ordering::SeqCst) >= 1
        });
        assert!(matches!(res, Err(AlmanacError::Cancelled(_))));
    }

    #[test]
    fn test_inline_single_chunk_polls_cancel() {
        let engine = ObservationEngine::new(Some(4)).unwrap();
        let polls = AtomicUsize::new(0);
        let cube = engine
            .compute(&catalogue(20), &series(), &spec(), || {
                polls.fetch_add(1, Ordering::SeqCst);
                false
            })
            .unwrap();
        assert_eq!(cube.n_objects(), 20);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failing_factory_reports_chunk() {
        let engine = ObservationEngine::new(Some(2)).unwrap().with_min_chunk_rows(50);
        let factory = || -> Result<Box<dyn PositionProvider>> {
            Err(AlmanacError::InvalidRange("no ephemeris".into()))
        };
        let err = engine
            .compute_with(&catalogue(40), &series(), &factory, || false)
            .unwrap_err();
        assert_eq!(
            err,
            AlmanacError::Compute {
                catalogue: "synthetic".into(),
                chunk: 0,
                rows: 0..40,
                elapsed: Duration::ZERO,
                reason: String::new(),
            }
        );
    }
}
