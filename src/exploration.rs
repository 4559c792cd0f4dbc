//! # Exploring a loaded almanac
//!
//! Every view is answered from the cubes of a [`LoadResult`] by masking only; nothing is
//! recomputed. One [`ExplorationQuery`] gives:
//!
//! * the **snapshot**: for every visible catalogue, the objects inside the alt/az and magnitude
//!   bounds at one instant (`day`, `offset` samples into the day);
//! * the **transit arcs**: for non-starfield catalogues, the path of each selected object over
//!   the next `spread` samples (no arcs when `spread` is zero);
//! * the **constellation figures**: lines and labels through the starfield stars inside the
//!   alt/az bounds at the snapshot instant. Star magnitudes do not hide constellation lines.
use std::collections::HashMap;

use ahash::RandomState;
use hifitime::Epoch;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::{
    almanac::{LoadResult, LoadedCatalogue},
    almanac_errors::{AlmanacError, Result},
    catalogue::{MagnitudeBounds, SourceType},
    config::{MagnitudeBand, DEFAULT_MAGNITUDES},
    constants::{Magnitude, StarId},
    constellations::{Label, Polyline},
    observation::{AltAzBounds, Selection},
    time_series::TimeWindow,
    vantage::AltAz,
};

/// Default arc length, in samples.
pub const DEFAULT_SPREAD: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationQuery {
    /// Day index from the start of the load.
    pub day: u32,
    /// Samples into the day.
    pub offset: usize,
    /// Arc length in samples; zero disables arcs.
    pub spread: usize,
    pub altaz: AltAzBounds,
    pub starfield_magnitudes: MagnitudeBounds,
    pub deep_sky_magnitudes: MagnitudeBounds,
    /// Names of the catalogues not to show.
    pub hidden_catalogues: Vec<String>,
    pub show_constellations: bool,
}

impl Default for ExplorationQuery {
    fn default() -> Self {
        let magnitudes = MagnitudeBounds {
            min: DEFAULT_MAGNITUDES.0,
            max: DEFAULT_MAGNITUDES.1,
        };
        ExplorationQuery {
            day: 0,
            offset: 0,
            spread: DEFAULT_SPREAD,
            altaz: AltAzBounds::default(),
            starfield_magnitudes: magnitudes,
            deep_sky_magnitudes: magnitudes,
            hidden_catalogues: Vec::new(),
            show_constellations: true,
        }
    }
}

impl ExplorationQuery {
    pub fn is_visible(&self, catalogue: &str) -> bool {
        !self.hidden_catalogues.iter().any(|h| h == catalogue)
    }

    pub fn magnitudes(&self, band: MagnitudeBand) -> MagnitudeBounds {
        match band {
            MagnitudeBand::Starfield => self.starfield_magnitudes,
            MagnitudeBand::DeepSky => self.deep_sky_magnitudes,
        }
    }
}

/// One object at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyPoint {
    pub name: String,
    pub position: AltAz,
    pub magnitude: Magnitude,
    pub size: f64,
    pub intensity: f64,
    pub source_type: SourceType,
}

/// The path of one object over the spread window.
///
/// `segments` are the maximal runs of consecutive selected samples holding at least two
/// points; `label` is the first selected sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitArc {
    pub name: String,
    pub label: AltAz,
    pub segments: Vec<Vec<AltAz>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogueView {
    pub catalogue: String,
    pub starfield: bool,
    pub points: Vec<SkyPoint>,
    pub arcs: Vec<TransitArc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkyView {
    pub instant: Epoch,
    pub catalogues: Vec<CatalogueView>,
    pub constellation_lines: Vec<Polyline<AltAz>>,
    pub constellation_labels: Vec<Label<AltAz>>,
}

/// Answer an exploration query from a loaded almanac.
///
/// Return
/// ----------
/// * The [`SkyView`], or [`AlmanacError::InvalidRange`] if the day is outside the load or the
///   offset falls outside the day.
pub fn explore(result: &LoadResult, query: &ExplorationQuery) -> Result<SkyView> {
    let times = &result.times;
    let day = times.day_window(query.day)?;
    if query.offset >= day.len() {
        return Err(AlmanacError::InvalidRange(format!(
            "offset {} outside day {} ({} samples)",
            query.offset,
            query.day,
            day.len()
        )));
    }
    let snapshot = times.sample_window(query.day, query.offset, 1)?;
    let spread = times.sample_window(query.day, query.offset, query.spread)?;
    let instant = times
        .epoch(snapshot.start())
        .ok_or_else(|| AlmanacError::InvalidRange("empty snapshot".into()))?;

    let catalogues = result
        .catalogues
        .iter()
        .filter(|c| query.is_visible(c.catalogue.name()))
        .map(|c| catalogue_view(c, query, &snapshot, &spread))
        .collect();

    let (constellation_lines, constellation_labels) = match (
        query.show_constellations,
        &result.constellations,
        result.starfield(),
    ) {
        (true, Some(set), Some(stars)) => {
            let positions = star_positions(stars, &query.altaz, &snapshot);
            set.get_visible_segments_and_labels(&positions)
        }
        _ => (Vec::new(), Vec::new()),
    };

    Ok(SkyView {
        instant,
        catalogues,
        constellation_lines,
        constellation_labels,
    })
}

fn catalogue_view(
    loaded: &LoadedCatalogue,
    query: &ExplorationQuery,
    snapshot: &TimeWindow,
    spread: &TimeWindow,
) -> CatalogueView {
    let cube = &loaded.cube;
    let magnitudes = query.magnitudes(loaded.band);

    let view = cube.time_window(snapshot);
    let selection = view.select(&query.altaz, &magnitudes);
    let positions = view.positions();
    let points = selection
        .indices()
        .into_iter()
        .map(|(row, col)| {
            let object = &cube.objects()[row];
            SkyPoint {
                name: object.name.clone(),
                position: positions[[row, col]],
                magnitude: object.magnitude,
                size: object.size,
                intensity: object.intensity,
                source_type: object.source_type,
            }
        })
        .collect();

    let arcs = if loaded.starfield || spread.is_empty() {
        Vec::new()
    } else {
        let view = cube.time_window(spread);
        transit_arcs(
            &view.select(&query.altaz, &magnitudes),
            &view.positions(),
            |row| cube.objects()[row].name.clone(),
        )
    };

    CatalogueView {
        catalogue: loaded.catalogue.name().to_string(),
        starfield: loaded.starfield,
        points,
        arcs,
    }
}

fn transit_arcs(
    selection: &Selection,
    positions: &ArrayView2<AltAz>,
    name: impl Fn(usize) -> String,
) -> Vec<TransitArc> {
    let mask = selection.mask();
    selection
        .object_rows()
        .into_iter()
        .filter_map(|row| {
            let mut segments = Vec::new();
            let mut run: Vec<AltAz> = Vec::new();
            let mut label = None;
            for (col, &selected) in mask.row(row).iter().enumerate() {
                if selected {
                    let p = positions[[row, col]];
                    label.get_or_insert(p);
                    run.push(p);
                } else if !run.is_empty() {
                    let done = std::mem::take(&mut run);
                    if done.len() >= 2 {
                        segments.push(done);
                    }
                }
            }
            if run.len() >= 2 {
                segments.push(run);
            }
            label.map(|label| TransitArc {
                name: name(row),
                label,
                segments,
            })
        })
        .collect()
}

/// Alt/az of the starfield stars inside `bounds` at the snapshot, keyed by HR number.
fn star_positions(
    stars: &LoadedCatalogue,
    bounds: &AltAzBounds,
    snapshot: &TimeWindow,
) -> HashMap<StarId, AltAz, RandomState> {
    let view = stars.cube.time_window(snapshot);
    let mask = view.altaz_mask(bounds);
    let positions = view.positions();
    stars
        .catalogue
        .star_index()
        .into_iter()
        .filter(|&(_, row)| mask[[row, 0]])
        .map(|(id, row)| (id, positions[[row, 0]]))
        .collect()
}

#[cfg(test)]
mod exploration_test {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_arcs_split_on_gaps() {
        let positions = array![
            [
                AltAz::new(10.0, 100.0),
                AltAz::new(11.0, 101.0),
                AltAz::new(12.0, 102.0),
                AltAz::new(13.0, 103.0),
                AltAz::new(14.0, 104.0),
            ],
            [
                AltAz::new(20.0, 200.0),
                AltAz::new(21.0, 201.0),
                AltAz::new(22.0, 202.0),
                AltAz::new(23.0, 203.0),
                AltAz::new(24.0, 204.0),
            ],
        ];
        let altaz = array![
            [true, true, false, true, true],
            [false, false, false, true, false]
        ];
        let selection = Selection::combine(altaz.view(), array![true, true].view());
        let arcs = transit_arcs(&selection, &positions.view(), |row| format!("obj{row}"));

        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].name, "obj0");
        assert_eq!(arcs[0].label, AltAz::new(10.0, 100.0));
        assert_eq!(arcs[0].segments.len(), 2);
        assert_eq!(arcs[0].segments[1], vec![AltAz::new(13.0, 103.0), AltAz::new(14.0, 104.0)]);

        // a lone sample gives a label but no drawable segment
        assert_eq!(arcs[1].label, AltAz::new(23.0, 203.0));
        assert!(arcs[1].segments.is_empty());
    }

    #[test]
    fn test_query_defaults() {
        let query = ExplorationQuery::default();
        assert_eq!(query.spread, DEFAULT_SPREAD);
        assert!(query.show_constellations);
        assert!(query.is_visible("Messier"));

        let query: ExplorationQuery =
            toml::from_str("day = 2\nhidden_catalogues = [\"Messier\"]").unwrap();
        assert_eq!(query.day, 2);
        assert!(!query.is_visible("Messier"));
        assert_eq!(query.altaz, AltAzBounds::default());
    }
}
