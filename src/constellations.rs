//! # Constellation figures
//!
//! Constellation lines come as a wide table: one row per polyline, a constellation code column
//! (`abr`) and ordered star slots (`s01`, `s02`, ...) holding Harvard Revised (HR) numbers.
//!
//! ```text
//! abr , s01 , s02 , s03 , s04
//! Ori , 1948, 1903, 1852,
//!     , 2061, 1948, 2004
//! Cas , 21  , 168 , 264 , 403
//! ```
//!
//! Rows without a code continue the constellation above them. The sequence index of a line is
//! its position among the rows of its constellation.
//!
//! At exploration time the star ids are resolved against star positions; a line is drawn
//! through every maximal run of at least two consecutive resolvable stars, so a missing star
//! splits a line instead of joining its neighbours.
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;

use ahash::RandomState;
use itertools::Itertools;
use log::debug;

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{Catalogue, RawTable},
    constants::StarId,
};

pub const CODE_COLUMN: &str = "abr";
const SLOT_PREFIX: char = 's';
const SOURCE_NAME: &str = "constellations";

/// One polyline of star ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstellationSegment {
    pub code: String,
    pub sequence: usize,
    pub stars: Vec<StarId>,
}

/// A drawable line through resolved star positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline<P> {
    pub code: String,
    pub sequence: usize,
    pub points: Vec<P>,
}

/// Where to write a constellation code.
#[derive(Debug, Clone, PartialEq)]
pub struct Label<P> {
    pub code: String,
    pub position: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstellationSet {
    segments: Vec<ConstellationSegment>,
}

/// Slot columns (`s<N>`) ordered by their numeric suffix.
fn slot_columns(table: &RawTable) -> Vec<usize> {
    table
        .headers()
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            let suffix = h.trim().strip_prefix(SLOT_PREFIX)?;
            if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            suffix.parse::<u32>().ok().map(|n| (n, i))
        })
        .sorted_by_key(|&(n, _)| n)
        .map(|(_, i)| i)
        .collect()
}

/// A star slot holds a plain non-negative integer; anything else is an empty slot.
fn parse_star(cell: &str) -> Option<StarId> {
    let cell = cell.trim();
    if cell.is_empty() || !cell.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cell.parse().ok()
}

impl ConstellationSet {
    /// Build the constellation lines from the wide table.
    ///
    /// Return
    /// ----------
    /// * The set of segments in table order, or [`AlmanacError::Schema`] if the code column
    ///   or every slot column is missing, or if the first row carries no code.
    pub fn build(table: &RawTable) -> Result<Self> {
        let schema = |column: &str| AlmanacError::Schema {
            catalogue: SOURCE_NAME.to_string(),
            column: column.to_string(),
        };
        let code_col = table
            .column_index(CODE_COLUMN)
            .ok_or_else(|| schema(CODE_COLUMN))?;
        let slots = slot_columns(table);
        if slots.is_empty() {
            return Err(schema("s01"));
        }

        let mut current: Option<String> = None;
        let mut sequences: HashMap<String, usize, RandomState> = HashMap::default();
        let mut segments = Vec::with_capacity(table.len());

        for row in 0..table.len() {
            let code = table.cell(row, code_col).trim();
            if !code.is_empty() {
                current = Some(code.to_string());
            }
            let code = current
                .clone()
                .ok_or_else(|| schema(&format!("{CODE_COLUMN} (row {row} has no code to continue)")))?;

            let counter = sequences.entry(code.clone()).or_insert(0);
            let sequence = *counter;
            *counter += 1;

            let stars = slots
                .iter()
                .filter_map(|&c| parse_star(table.cell(row, c)))
                .collect::<Vec<StarId>>();
            segments.push(ConstellationSegment {
                code,
                sequence,
                stars,
            });
        }

        debug!(
            "constellation lines: {} segment(s) over {} constellation(s)",
            segments.len(),
            sequences.len()
        );
        Ok(ConstellationSet { segments })
    }

    pub fn segments(&self) -> &[ConstellationSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Constellation codes in first-appearance order.
    pub fn codes(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.code.as_str()).unique().collect()
    }

    /// Every referenced star id, sorted.
    pub fn star_ids(&self) -> Vec<StarId> {
        self.segments
            .iter()
            .flat_map(|s| s.stars.iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    /// Referenced star ids absent from `ids`, sorted.
    pub fn unresolved_against_ids<I>(&self, ids: I) -> Vec<StarId>
    where
        I: IntoIterator<Item = StarId>,
    {
        let known = ids.into_iter().collect::<HashSet<StarId, RandomState>>();
        self.star_ids()
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect()
    }

    /// Referenced star ids whose HR number is not the name of any catalogue entry.
    pub fn unresolved_against(&self, catalogue: &Catalogue) -> Vec<StarId> {
        self.unresolved_against_ids(catalogue.star_index().into_keys())
    }

    /// Lines and labels for the stars that can be placed.
    ///
    /// Arguments
    /// -----------------
    /// * `star_positions`: position of every placeable star (e.g. its alt/az at a snapshot,
    ///   after masking). Stars missing from the map split the lines they belong to.
    ///
    /// Return
    /// ----------
    /// * The polylines (maximal runs of ≥ 2 placeable consecutive stars, in segment order) and
    ///   one label per constellation at its first placeable star in sequence order.
    pub fn get_visible_segments_and_labels<P, S>(
        &self,
        star_positions: &HashMap<StarId, P, S>,
    ) -> (Vec<Polyline<P>>, Vec<Label<P>>)
    where
        P: Copy,
        S: BuildHasher,
    {
        let mut polylines = Vec::new();
        let mut labels: Vec<Label<P>> = Vec::new();
        let mut labelled: HashSet<&str, RandomState> = HashSet::default();

        for segment in &self.segments {
            if labelled.contains(segment.code.as_str()) {
                continue;
            }
            if let Some(p) = segment.stars.iter().find_map(|id| star_positions.get(id)) {
                labelled.insert(segment.code.as_str());
                labels.push(Label {
                    code: segment.code.clone(),
                    position: *p,
                });
            }
        }
        let rank = self
            .codes()
            .into_iter()
            .enumerate()
            .map(|(i, code)| (code, i))
            .collect::<HashMap<&str, usize, RandomState>>();
        labels.sort_by_key(|l| rank.get(l.code.as_str()).copied());

        for segment in &self.segments {
            let mut run: Vec<P> = Vec::new();
            for id in &segment.stars {
                match star_positions.get(id) {
                    Some(p) => run.push(*p),
                    None => flush(&mut polylines, segment, &mut run),
                }
            }
            flush(&mut polylines, segment, &mut run);
        }

        (polylines, labels)
    }
}

fn flush<P>(out: &mut Vec<Polyline<P>>, segment: &ConstellationSegment, run: &mut Vec<P>) {
    if run.len() >= 2 {
        out.push(Polyline {
            code: segment.code.clone(),
            sequence: segment.sequence,
            points: std::mem::take(run),
        });
    } else {
        run.clear();
    }
}

#[cfg(test)]
mod constellations_test {
    use super::*;

    fn table() -> RawTable {
        RawTable::from_rows(
            &["abr", "s02", "s01", "s03", "s10", "note"],
            &[
                &["Ori", "1903", "1948", "1852", "", "belt"],
                &["", "1948", "2061", "2004", "", ""],
                &["Cas", "168", "21", "264", "403", ""],
                &["", "x", "", "", "", ""],
            ],
        )
    }

    #[test]
    fn test_build_forward_fills_and_orders_slots() {
        let set = ConstellationSet::build(&table()).unwrap();
        let segments = set.segments();
        assert_eq!(segments.len(), 4);
        assert_eq!(
            segments[0],
            ConstellationSegment {
                code: "Ori".into(),
                sequence: 0,
                stars: vec![1948, 1903, 1852],
            }
        );
        assert_eq!(segments[1].code, "Ori");
        assert_eq!(segments[1].sequence, 1);
        assert_eq!(segments[1].stars, vec![2061, 1948, 2004]);
        assert_eq!(segments[2].stars, vec![21, 168, 264, 403]);
        assert_eq!((segments[3].code.as_str(), segments[3].sequence), ("Cas", 1));
        assert!(segments[3].stars.is_empty());
        assert_eq!(set.codes(), vec!["Ori", "Cas"]);
    }

    #[test]
    fn test_schema_errors() {
        let no_code = RawTable::from_rows(&["name", "s01"], &[]);
        assert!(matches!(
            ConstellationSet::build(&no_code),
            Err(AlmanacError::Schema { .. })
        ));

        let no_slots = RawTable::from_rows(&["abr", "stars"], &[]);
        assert!(matches!(
            ConstellationSet::build(&no_slots),
            Err(AlmanacError::Schema { .. })
        ));

        let orphan = RawTable::from_rows(&["abr", "s01"], &[&["", "1"], &["Ori", "2"]]);
        assert!(matches!(
            ConstellationSet::build(&orphan),
            Err(AlmanacError::Schema { .. })
        ));
    }

    #[test]
    fn test_missing_middle_star_splits_line() {
        let table = RawTable::from_rows(
            &["abr", "s01", "s02", "s03", "s04", "s05"],
            &[&["Tst", "1", "2", "3", "4", "5"]],
        );
        let set = ConstellationSet::build(&table).unwrap();
        let positions: HashMap<StarId, (f32, f32)> = [1, 2, 4, 5]
            .into_iter()
            .map(|id| (id, (id as f32, 0.0)))
            .collect();

        let (lines, labels) = set.get_visible_segments_and_labels(&positions);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].points, vec![(1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(lines[1].points, vec![(4.0, 0.0), (5.0, 0.0)]);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].position, (1.0, 0.0));
    }

    #[test]
    fn test_isolated_star_gets_label_not_line() {
        let set = ConstellationSet::build(&table()).unwrap();
        let positions: HashMap<StarId, u32> = [(1903, 1), (264, 2)].into_iter().collect();

        let (lines, labels) = set.get_visible_segments_and_labels(&positions);
        assert!(lines.is_empty());
        assert_eq!(
            labels,
            vec![
                Label {
                    code: "Ori".into(),
                    position: 1
                },
                Label {
                    code: "Cas".into(),
                    position: 2
                },
            ]
        );
    }

    #[test]
    fn test_labels_follow_first_appearance_of_code() {
        let table = RawTable::from_rows(
            &["abr", "s01", "s02"],
            &[&["Ori", "1", "2"], &["Cas", "3", "4"], &["Ori", "5", "6"]],
        );
        let set = ConstellationSet::build(&table).unwrap();
        let positions: HashMap<StarId, u32, RandomState> =
            [(3, 30), (5, 50)].into_iter().collect();

        let (lines, labels) = set.get_visible_segments_and_labels(&positions);
        assert!(lines.is_empty());
        let placed = labels
            .iter()
            .map(|l| (l.code.as_str(), l.position))
            .collect::<Vec<_>>();
        assert_eq!(placed, vec![("Ori", 50), ("Cas", 30)]);
    }

    #[test]
    fn test_unresolved_ids() {
        let set = ConstellationSet::build(&table()).unwrap();
        assert_eq!(
            set.unresolved_against_ids([1948, 1903, 1852, 2061, 21, 168, 264]),
            vec![403, 2004]
        );
    }
}
