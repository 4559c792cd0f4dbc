//! # JPL planetary ephemerides
//!
//! Reader for binary SPK kernels (`de421.bsp`, `de440s.bsp`, ...) restricted to what the
//! almanac needs: barycentric positions of the Sun, the Moon and the planets from Chebyshev
//! segments (SPK types 2 and 3) in the J2000 frame.
//!
//! The whole file is decoded once by [`SpkKernel::open`]; later queries only evaluate
//! polynomials. A kernel is plain data and is not shared: every provider that needs one opens
//! its own.
//!
//! ## Conventions
//! -----------------
//! * Instants are TDB seconds past J2000 (`Epoch::to_et_seconds`).
//! * Positions are in km, J2000 equatorial axes.
//!
//! ## See also
//! ------------
//! * [`EphemerisProvider`](crate::vantage::ephemeris_provider::EphemerisProvider) – topocentric
//!   horizontal coordinates of the bodies.
use std::{collections::HashMap, fmt};

use ahash::RandomState;
use camino::Utf8Path;
use log::debug;
use nalgebra::Vector3;

use crate::almanac_errors::{AlmanacError, Result};

pub mod bodies;
pub mod daf;
pub mod record;

pub use bodies::SolarSystemBody;

use bodies::{EARTH, SOLAR_SYSTEM_BARYCENTER};
use daf::{word_offset, DafHeader, Directory, Summary};
use record::{coefficients_per_axis, ChebyshevRecord};

/// NAIF code of the J2000 frame.
const J2000_FRAME: i32 = 1;

/// Longest chain of centers followed towards the barycenter (Moon → EMB → SSB is 2).
const MAX_CENTER_DEPTH: usize = 8;

/// One decoded segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub summary: Summary,
    pub directory: Directory,
    pub records: Vec<ChebyshevRecord>,
}

impl Segment {
    fn read(data: &[u8], summary: Summary) -> Result<Self> {
        let directory = Directory::parse(data, summary.final_addr)?;
        let ncoeff = coefficients_per_axis(summary.data_type, directory.rsize)?;
        let record_bytes = directory.rsize * 8;
        let start = word_offset(summary.initial_addr);

        let records = (0..directory.n_records)
            .map(|i| {
                let offset = start + i * record_bytes;
                let bytes = data.get(offset..offset + record_bytes).ok_or_else(|| {
                    AlmanacError::Ephemeris(format!(
                        "record {i} of segment {} is past the end of the file",
                        summary.target
                    ))
                })?;
                ChebyshevRecord::parse(bytes, ncoeff)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Segment {
            summary,
            directory,
            records,
        })
    }

    /// Position of the target relative to its center, `None` outside the covered interval.
    pub fn position(&self, et: f64) -> Option<Vector3<f64>> {
        if !self.summary.covers(et) {
            return None;
        }
        let index = ((et - self.directory.init) / self.directory.intlen).floor();
        // the end of the coverage falls on the boundary past the last record
        let index = (index.max(0.0) as usize).min(self.records.len().checked_sub(1)?);
        Some(self.records[index].position(et))
    }
}

/// A decoded SPK kernel.
#[derive(Debug, Clone)]
pub struct SpkKernel {
    header: DafHeader,
    /// Segments per target, in file order.
    segments: HashMap<i32, Vec<Segment>, RandomState>,
}

impl SpkKernel {
    /// Read and decode a kernel file.
    ///
    /// Return
    /// ----------
    /// * The kernel, or [`AlmanacError::IoError`] / [`AlmanacError::Ephemeris`].
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let kernel = Self::from_bytes(&data)?;
        debug!("[{path}] {kernel}");
        Ok(kernel)
    }

    /// Decode a kernel held in memory.
    ///
    /// Segments in a frame other than J2000 are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = DafHeader::parse(data)?;
        let mut segments: HashMap<i32, Vec<Segment>, RandomState> = HashMap::default();
        for summary in daf::read_summaries(data, &header)? {
            if summary.frame != J2000_FRAME {
                debug!(
                    "segment {} -> {} in frame {} skipped",
                    summary.target, summary.center, summary.frame
                );
                continue;
            }
            let segment = Segment::read(data, summary)?;
            segments.entry(summary.target).or_default().push(segment);
        }
        Ok(SpkKernel { header, segments })
    }

    pub fn internal_name(&self) -> &str {
        &self.header.internal_name
    }

    pub fn has_target(&self, id: i32) -> bool {
        self.segments.contains_key(&id)
    }

    /// The NAIF code that serves `body` in this kernel, if any.
    pub fn resolve(&self, body: SolarSystemBody) -> Option<i32> {
        std::iter::once(body.naif_id())
            .chain(body.barycenter_id())
            .find(|&id| self.has_target(id))
    }

    /// The segment of `target` covering `et`; later segments take precedence.
    fn segment(&self, target: i32, et: f64) -> Result<&Segment> {
        let segments = self.segments.get(&target).ok_or_else(|| {
            AlmanacError::Ephemeris(format!("no segment for NAIF body {target}"))
        })?;
        segments
            .iter()
            .rev()
            .find(|s| s.summary.covers(et))
            .ok_or_else(|| {
                AlmanacError::Ephemeris(format!(
                    "NAIF body {target} is not covered at {et} s past J2000"
                ))
            })
    }

    /// Position of `target` relative to the solar system barycenter, in km.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: NAIF code.
    /// * `et`: TDB seconds past J2000.
    ///
    /// Return
    /// ----------
    /// * The position, or [`AlmanacError::Ephemeris`] when a body of the center chain has no
    ///   segment covering `et`.
    pub fn barycentric(&self, target: i32, et: f64) -> Result<Vector3<f64>> {
        let mut position = Vector3::zeros();
        let mut body = target;
        for _ in 0..MAX_CENTER_DEPTH {
            if body == SOLAR_SYSTEM_BARYCENTER {
                return Ok(position);
            }
            let segment = self.segment(body, et)?;
            // covers() was checked by segment()
            if let Some(p) = segment.position(et) {
                position += p;
            }
            body = segment.summary.center;
        }
        Err(AlmanacError::Ephemeris(format!(
            "center chain of NAIF body {target} does not reach the barycenter"
        )))
    }

    /// Barycentric position of the Earth's center.
    pub fn earth(&self, et: f64) -> Result<Vector3<f64>> {
        self.barycentric(EARTH, et)
    }
}

impl fmt::Display for SpkKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets = self.segments.keys().copied().collect::<Vec<_>>();
        targets.sort_unstable();
        write!(
            f,
            "SPK kernel '{}': {} segment(s), targets {:?}",
            self.header.internal_name,
            self.segments.values().map(Vec::len).sum::<usize>(),
            targets
        )
    }
}
