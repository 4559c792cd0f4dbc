//! # Observation cubes
//!
//! A [`PositionCube`] holds the horizontal coordinates of every object of one catalogue at every
//! instant of a [`TimeSeries`](crate::time_series::TimeSeries):
//!
//! ```text
//!             t0      t1      t2     ...
//! object 0  (alt,az) (alt,az) (alt,az)
//! object 1  (alt,az) (alt,az) (alt,az)
//! ...
//! ```
//!
//! Rows follow the catalogue order, columns follow the series order. The per-object display
//! attributes (name, magnitudes, size, intensity, source type) travel with the cube so that a
//! selection can be rendered without going back to the catalogue.
//!
//! Cubes are produced by the [`ObservationEngine`] and are immutable afterwards; every
//! exploration is a read-only mask (see [`masks`]).
use ndarray::{Array1, Array2};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{CatalogueEntry, MagnitudeBounds},
    time_series::TimeWindow,
    vantage::AltAz,
};

pub mod engine;
pub mod masks;

pub use engine::{ObservationEngine, CHUNKS_PER_WORKER, MIN_CHUNK_ROWS};
pub use masks::{AltAzBounds, CubeWindow, Selection};

#[derive(Debug, Clone, PartialEq)]
pub struct PositionCube {
    catalogue: String,
    objects: Vec<CatalogueEntry>,
    positions: Array2<AltAz>,
}

impl PositionCube {
    /// Assemble a cube from its parts.
    ///
    /// Return
    /// ----------
    /// * The cube, or [`AlmanacError::InvalidRange`] if the number of rows of `positions`
    ///   differs from the number of objects.
    pub fn from_parts(
        catalogue: impl Into<String>,
        objects: Vec<CatalogueEntry>,
        positions: Array2<AltAz>,
    ) -> Result<Self> {
        if positions.nrows() != objects.len() {
            return Err(AlmanacError::InvalidRange(format!(
                "{} position rows for {} objects",
                positions.nrows(),
                objects.len()
            )));
        }
        Ok(PositionCube {
            catalogue: catalogue.into(),
            objects,
            positions,
        })
    }

    pub fn catalogue(&self) -> &str {
        &self.catalogue
    }

    pub fn objects(&self) -> &[CatalogueEntry] {
        &self.objects
    }

    pub fn positions(&self) -> &Array2<AltAz> {
        &self.positions
    }

    pub fn n_objects(&self) -> usize {
        self.positions.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.positions.ncols()
    }

    /// Restrict the cube to a contiguous window of its time axis (a slice, no copy).
    pub fn time_window(&self, window: &TimeWindow) -> CubeWindow<'_> {
        CubeWindow::new(self, window.clone())
    }

    /// Element-wise alt/az mask over the whole cube.
    pub fn altaz_mask(&self, bounds: &AltAzBounds) -> Array2<bool> {
        bounds.mask(self.positions.view())
    }

    /// Objects whose raw magnitude lies inside `bounds`.
    pub fn magnitude_mask(&self, bounds: &MagnitudeBounds) -> Array1<bool> {
        masks::magnitude_mask(&self.objects, bounds)
    }
}
