//! Pure masking over position cubes.
//!
//! Every operation here reads a cube and returns a new mask or view; nothing mutates the cube.
//!
//! * time: [`PositionCube::time_window`] slices the time axis to a [`CubeWindow`];
//! * sky region: [`AltAzBounds`] → `(object × time)` boolean mask;
//! * brightness: [`MagnitudeBounds`] → per-object boolean mask;
//! * [`Selection::combine`] broadcasts the per-object mask over time and ANDs it in.
//!
//! The three filters commute. Slicing time first keeps every later mask small, which is why
//! [`CubeWindow`] carries the alt/az and magnitude operations itself.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{CatalogueEntry, MagnitudeBounds},
    constants::Degree,
    observation::PositionCube,
    time_series::TimeWindow,
    vantage::AltAz,
};

/// A rectangular region of the local sky.
///
/// Azimuth bounds wrap: with `az_min > az_max` the region crosses north
/// (`az >= az_min || az <= az_max`), and equal bounds select the whole horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltAzBounds {
    pub alt_min: Degree,
    pub alt_max: Degree,
    pub az_min: Degree,
    pub az_max: Degree,
}

impl Default for AltAzBounds {
    /// Everything above the horizon.
    fn default() -> Self {
        AltAzBounds {
            alt_min: 0.0,
            alt_max: 90.0,
            az_min: 0.0,
            az_max: 360.0,
        }
    }
}

impl AltAzBounds {
    /// Return
    /// ----------
    /// * The bounds, or [`AlmanacError::InvalidRange`] if an altitude lies outside `[-90, 90]`,
    ///   `alt_min > alt_max`, or an azimuth lies outside `[0, 360]`.
    pub fn new(alt_min: Degree, alt_max: Degree, az_min: Degree, az_max: Degree) -> Result<Self> {
        let alt_ok = |a: Degree| (-90.0..=90.0).contains(&a);
        let az_ok = |a: Degree| (0.0..=360.0).contains(&a);
        if !(alt_ok(alt_min) && alt_ok(alt_max)) || alt_min > alt_max {
            return Err(AlmanacError::InvalidRange(format!(
                "altitude bounds [{alt_min}, {alt_max}] are invalid"
            )));
        }
        if !(az_ok(az_min) && az_ok(az_max)) {
            return Err(AlmanacError::InvalidRange(format!(
                "azimuth bounds [{az_min}, {az_max}] must lie in [0, 360]"
            )));
        }
        Ok(AltAzBounds {
            alt_min,
            alt_max,
            az_min,
            az_max,
        })
    }

    pub fn wraps_north(&self) -> bool {
        self.az_min > self.az_max
    }

    pub fn contains(&self, position: &AltAz) -> bool {
        let alt = position.alt as f64;
        let az = position.az as f64;
        if !(self.alt_min..=self.alt_max).contains(&alt) {
            return false;
        }
        if self.az_min == self.az_max {
            true
        } else if self.wraps_north() {
            az >= self.az_min || az <= self.az_max
        } else {
            (self.az_min..=self.az_max).contains(&az)
        }
    }

    /// Element-wise mask over an `(object × time)` block.
    pub fn mask(&self, positions: ArrayView2<AltAz>) -> Array2<bool> {
        positions.map(|p| self.contains(p))
    }
}

/// Per-object magnitude mask.
pub(crate) fn magnitude_mask(objects: &[CatalogueEntry], bounds: &MagnitudeBounds) -> Array1<bool> {
    objects.iter().map(|e| bounds.contains(e.magnitude)).collect()
}

/// A cube restricted to a contiguous time window; a view, no copy.
#[derive(Debug, Clone)]
pub struct CubeWindow<'a> {
    cube: &'a PositionCube,
    window: TimeWindow,
    positions: ArrayView2<'a, AltAz>,
}

impl<'a> CubeWindow<'a> {
    pub(crate) fn new(cube: &'a PositionCube, window: TimeWindow) -> Self {
        let positions = window.slice_columns(cube.positions());
        CubeWindow {
            cube,
            window,
            positions,
        }
    }

    pub fn cube(&self) -> &'a PositionCube {
        self.cube
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn positions(&self) -> ArrayView2<'a, AltAz> {
        self.positions.clone()
    }

    pub fn altaz_mask(&self, bounds: &AltAzBounds) -> Array2<bool> {
        bounds.mask(self.positions.view())
    }

    pub fn magnitude_mask(&self, bounds: &MagnitudeBounds) -> Array1<bool> {
        self.cube.magnitude_mask(bounds)
    }

    /// Samples of the window inside `altaz` for objects inside `magnitudes`.
    pub fn select(&self, altaz: &AltAzBounds, magnitudes: &MagnitudeBounds) -> Selection {
        Selection::combine(self.altaz_mask(altaz).view(), self.magnitude_mask(magnitudes).view())
    }
}

/// An `(object × time)` boolean selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    mask: Array2<bool>,
}

impl Selection {
    /// AND an alt/az mask with a per-object magnitude mask broadcast over time.
    ///
    /// `magnitude.len()` must equal the number of rows of `altaz`.
    pub fn combine(altaz: ArrayView2<bool>, magnitude: ArrayView1<bool>) -> Self {
        let mut mask = altaz.to_owned();
        Zip::from(mask.rows_mut())
            .and(&magnitude)
            .for_each(|mut row, &keep| {
                if !keep {
                    row.fill(false);
                }
            });
        Selection { mask }
    }

    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    pub fn into_mask(self) -> Array2<bool> {
        self.mask
    }

    /// Number of selected samples.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    /// Objects selected at least once, in row order.
    pub fn object_rows(&self) -> Vec<usize> {
        self.mask
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().any(|&m| m))
            .map(|(i, _)| i)
            .collect()
    }

    /// `(object row, time column)` of every selected sample, row-major.
    pub fn indices(&self) -> Vec<(usize, usize)> {
        self.mask
            .indexed_iter()
            .filter(|(_, &m)| m)
            .map(|(ix, _)| ix)
            .collect()
    }
}
