//! Derived columns written by [`Catalogue::to_table`](crate::catalogue::Catalogue::to_table).
//!
//! A table that already carries **all** derived columns is a previously normalized catalogue and
//! is reloaded as-is. A table carrying only some of them is ambiguous (a hand-edited export, a
//! truncated write) and is refused rather than guessed at.
use crate::{
    catalogue::{in_sky, CatalogueEntry, RawTable, SourceType},
    conversion::parse_decimal,
};

pub const NAME: &str = "__name";
pub const RA_DEG: &str = "__ra_deg";
pub const DEC_DEG: &str = "__dec_deg";
pub const RA_HOURS: &str = "__ra_hours";
pub const MAGNITUDE: &str = "__magnitude";
pub const NORM_MAG: &str = "__norm_mag";
pub const SIZE: &str = "__size";
pub const BRIGHTNESS: &str = "__brightness";
pub const TARGET_TYPE: &str = "__target_type";

/// Every derived column, in the order they are written.
pub const DERIVED_COLUMNS: [&str; 9] = [
    NAME,
    RA_DEG,
    DEC_DEG,
    RA_HOURS,
    MAGNITUDE,
    NORM_MAG,
    SIZE,
    BRIGHTNESS,
    TARGET_TYPE,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationState {
    /// Every derived column is present.
    Complete,
    /// No derived column is present.
    Absent,
    /// Some derived columns are present; holds the ones found.
    Partial(Vec<String>),
}

impl DerivationState {
    pub fn detect(table: &RawTable) -> Self {
        let present = DERIVED_COLUMNS
            .iter()
            .filter(|c| table.has_column(c))
            .map(|c| c.to_string())
            .collect::<Vec<String>>();

        match present.len() {
            0 => DerivationState::Absent,
            n if n == DERIVED_COLUMNS.len() => DerivationState::Complete,
            _ => DerivationState::Partial(present),
        }
    }
}

/// Read entries back from a table holding every derived column.
///
/// A row whose derived values no longer parse, or break the entry invariants (position outside
/// the sky, `norm_mag` outside `[0, 1]`), is dropped, not repaired.
///
/// Return
/// ----------
/// * The entries in table order and the number of dropped rows.
pub(crate) fn read_entries(table: &RawTable) -> (Vec<CatalogueEntry>, usize) {
    let col = |name: &str| table.column_index(name).unwrap_or(usize::MAX);
    let (name, ra, dec, mag, norm, size, brightness, kind) = (
        col(NAME),
        col(RA_DEG),
        col(DEC_DEG),
        col(MAGNITUDE),
        col(NORM_MAG),
        col(SIZE),
        col(BRIGHTNESS),
        col(TARGET_TYPE),
    );

    let mut entries = Vec::with_capacity(table.len());
    let mut dropped = 0;
    for row in 0..table.len() {
        let num = |c: usize| parse_decimal(table.cell(row, c));
        let entry = (|| {
            Some(CatalogueEntry {
                name: table.cell(row, name).to_string(),
                ra: num(ra)?,
                dec: num(dec)?,
                magnitude: num(mag)?,
                norm_mag: num(norm)?,
                size: num(size)?,
                intensity: num(brightness)?,
                source_type: table.cell(row, kind).parse::<SourceType>().ok()?,
            })
        })();

        match entry {
            Some(e) if in_sky(e.ra, e.dec) && (0.0..=1.0).contains(&e.norm_mag) => {
                entries.push(e)
            }
            _ => dropped += 1,
        }
    }
    (entries, dropped)
}
