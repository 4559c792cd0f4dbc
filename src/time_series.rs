//! # Uniform UTC time axis and contiguous time windows
//!
//! A [`TimeSeries`] is the time axis shared by every [`PositionCube`](crate::observation::PositionCube)
//! of one load: instants anchored at **12:00 UTC** on the start date and stepped by a fixed
//! number of seconds.
//!
//! Each point is computed as `anchor + k·step` from the integer sample index, so long series
//! never accumulate rounding drift.
//!
//! Time masks are always contiguous (a day, or a sub-day window). They are expressed by the
//! [`TimeWindow`] type, an index range, so downstream code can slice cubes instead of scanning
//! a boolean predicate. [`TimeWindow::to_mask`] still yields the positional boolean form when a
//! caller needs it.
//!
//! ## Day boundaries
//! -----------------
//! Day `d` holds the samples whose instant lies in `[anchor + d days, anchor + (d+1) days)`.
//! With a step that does not divide 86 400 s the days hold slightly different sample counts, but
//! the day windows still partition the series exactly.
use std::ops::Range;

use hifitime::{Duration, Epoch};
use log::info;
use ndarray::{s, Array2, ArrayView2};

use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::SECONDS_PER_DAY,
    time::CalendarDate,
};

/// A contiguous (possibly empty) range of sample indices inside a [`TimeSeries`].
///
/// Windows are only produced by [`TimeSeries`] methods, which clamp them to the series
/// length, so a window is always valid for the series that built it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    range: Range<usize>,
    series_len: usize,
}

impl TimeWindow {
    fn new(start: usize, end: usize, series_len: usize) -> Self {
        let end = end.min(series_len);
        let start = start.min(end);
        TimeWindow {
            range: start..end,
            series_len,
        }
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range.contains(&index)
    }

    /// Positional boolean mask over the whole series (`true` inside the window).
    pub fn to_mask(&self) -> Vec<bool> {
        (0..self.series_len).map(|i| self.contains(i)).collect()
    }

    /// Length of the series the window was built for.
    pub fn series_len(&self) -> usize {
        self.series_len
    }

    /// Narrow an `(object × time)` array computed over the full series to this window.
    ///
    /// Panics
    /// -------
    /// * When `array` does not have one column per sample of the window's series.
    pub fn slice_columns<'a, T>(&self, array: &'a Array2<T>) -> ArrayView2<'a, T> {
        assert_eq!(
            array.ncols(),
            self.series_len,
            "time window of a {}-sample series applied to an array of {} columns",
            self.series_len,
            array.ncols()
        );
        array.slice(s![.., self.range.clone()])
    }

    /// Narrow a mask computed on a full cube to this window.
    pub fn slice_mask<'a>(&self, mask: &'a Array2<bool>) -> ArrayView2<'a, bool> {
        self.slice_columns(mask)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    start_date: CalendarDate,
    anchor: Epoch,
    num_days: u32,
    step_seconds: u32,
    epochs: Vec<Epoch>,
}

impl TimeSeries {
    /// Build the time axis of a load.
    ///
    /// Arguments
    /// -----------------
    /// * `start_date`: first day; the series starts at 12:00 UTC on this date.
    /// * `num_days`: number of days covered (must be positive).
    /// * `sample_seconds`: step between consecutive samples (must be positive).
    ///
    /// Return
    /// ----------
    /// * A series of `ceil(num_days·86400 / sample_seconds)` instants, or
    ///   [`AlmanacError::InvalidRange`] if the date is outside the supported window or does not
    ///   exist, or if a count is zero.
    pub fn build(start_date: CalendarDate, num_days: u32, sample_seconds: u32) -> Result<Self> {
        if !start_date.is_supported() {
            return Err(AlmanacError::InvalidRange(format!(
                "start date {start_date} is outside the supported ephemeris window"
            )));
        }
        if num_days == 0 {
            return Err(AlmanacError::InvalidRange(
                "number of days must be positive".into(),
            ));
        }
        if sample_seconds == 0 {
            return Err(AlmanacError::InvalidRange(
                "sample interval must be positive".into(),
            ));
        }

        let anchor = start_date.utc_noon()?;
        let total_seconds = num_days as u64 * SECONDS_PER_DAY;
        let len = total_seconds.div_ceil(sample_seconds as u64) as usize;

        let epochs = (0..len)
            .map(|k| anchor + Duration::from_seconds((k as u64 * sample_seconds as u64) as f64))
            .collect::<Vec<Epoch>>();

        info!(
            "Observation window: {} .. {} with {} samples at rate {}s for {}d",
            anchor,
            anchor + Duration::from_seconds(total_seconds as f64),
            len,
            sample_seconds,
            num_days
        );

        Ok(TimeSeries {
            start_date,
            anchor,
            num_days,
            step_seconds: sample_seconds,
            epochs,
        })
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn start_date(&self) -> CalendarDate {
        self.start_date
    }

    pub fn anchor(&self) -> Epoch {
        self.anchor
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    pub fn step_seconds(&self) -> u32 {
        self.step_seconds
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn epoch(&self, index: usize) -> Option<Epoch> {
        self.epochs.get(index).copied()
    }

    /// Whole samples in one day (the number of steps of an intra-day time dial).
    pub fn samples_per_day(&self) -> usize {
        (SECONDS_PER_DAY / self.step_seconds as u64) as usize
    }

    /// First sample index at or after `day` whole days past the anchor.
    fn day_start_index(&self, day: u32) -> usize {
        let seconds = day as u64 * SECONDS_PER_DAY;
        (seconds.div_ceil(self.step_seconds as u64) as usize).min(self.len())
    }

    /// The contiguous block of samples belonging to `day` (0-based).
    ///
    /// Return
    /// ----------
    /// * The day window, or [`AlmanacError::InvalidRange`] if `day >= num_days`.
    pub fn day_window(&self, day: u32) -> Result<TimeWindow> {
        self.check_day(day)?;
        Ok(TimeWindow::new(
            self.day_start_index(day),
            self.day_start_index(day + 1),
            self.len(),
        ))
    }

    /// Boolean form of [`TimeSeries::day_window`].
    pub fn day_mask(&self, day: u32) -> Result<Vec<bool>> {
        Ok(self.day_window(day)?.to_mask())
    }

    /// A contiguous sub-block of a day: `span` samples starting `start_offset` samples after the
    /// start of `day`, clamped at the end of the series.
    ///
    /// A `span` of one gives a single-instant snapshot; wider spans are used for transit arcs.
    pub fn sample_window(&self, day: u32, start_offset: usize, span: usize) -> Result<TimeWindow> {
        self.check_day(day)?;
        let start = self.day_start_index(day).saturating_add(start_offset);
        Ok(TimeWindow::new(
            start,
            start.saturating_add(span),
            self.len(),
        ))
    }

    /// Boolean form of [`TimeSeries::sample_window`].
    pub fn window_mask(&self, day: u32, start_offset: usize, span: usize) -> Result<Vec<bool>> {
        Ok(self.sample_window(day, start_offset, span)?.to_mask())
    }

    /// The window covering the whole series.
    pub fn full_window(&self) -> TimeWindow {
        TimeWindow::new(0, self.len(), self.len())
    }

    fn check_day(&self, day: u32) -> Result<()> {
        if day >= self.num_days {
            return Err(AlmanacError::InvalidRange(format!(
                "day index {day} outside a {}-day series",
                self.num_days
            )));
        }
        Ok(())
    }
}
