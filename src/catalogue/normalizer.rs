use log::{debug, info};

use crate::{
    almanac_errors::{AlmanacError, Result},
    catalogue::{
        color_intensity,
        coordinate_spec::{AxisColumns, CoordinateColumns, RawAxis},
        derived::{self, DerivationState},
        display_size, in_sky, Catalogue, CatalogueEntry, MagnitudeBounds, NormalizationReport, RawTable,
        SourceDescriptor,
    },
    constants::Magnitude,
    conversion::parse_decimal,
};

/// Column indices resolved once against the raw table header.
enum CoordinateIndices {
    Separate { ra: AxisIndices, dec: AxisIndices },
    Combined { column: usize, name: String },
}

enum AxisIndices {
    Single(usize),
    Fields([usize; 3]),
}

/// A row that passed the magnitude filter, before coordinate conversion.
struct Candidate {
    row: usize,
    name: String,
    magnitude: Magnitude,
}

/// Normalize a raw table into a [`Catalogue`].
///
/// Steps, in order:
/// 1. unit check of the coordinate spec (an hour-angle declination is always refused);
/// 2. derived-column detection: a complete set is read back as-is, a partial set is refused;
/// 3. presence of every source column the descriptor names;
/// 4. names (name column, or the 0-based row index);
/// 5. magnitude filter (missing, non-numeric and out-of-bounds rows are dropped);
/// 6. coordinate extraction and conversion to degrees;
/// 7. residual cleansing of unparseable or out-of-range coordinates;
/// 8. display attributes, computed over the rows that survived every filter.
///
/// The raw table is never modified.
///
/// Arguments
/// -----------------
/// * `table`: the raw source.
/// * `source`: column mapping, coordinate layout and source type.
/// * `bounds`: inclusive magnitude bounds.
///
/// Return
/// ----------
/// * The catalogue with its [`NormalizationReport`], or one of
///   [`AlmanacError::InvalidUnit`], [`AlmanacError::AmbiguousState`], [`AlmanacError::Schema`],
///   [`AlmanacError::Split`], [`AlmanacError::InvalidRange`] (bad bounds).
///
/// See also
/// ------------
/// * [`Catalogue::to_table`] – writes the derived columns read back in step 2.
pub fn normalize(
    table: &RawTable,
    source: &SourceDescriptor,
    bounds: MagnitudeBounds,
) -> Result<Catalogue> {
    let catalogue = source.name.as_str();
    source.coordinates.check_units(catalogue)?;
    bounds.validate()?;

    match DerivationState::detect(table) {
        DerivationState::Complete => return Ok(reload(table, catalogue)),
        DerivationState::Partial(present) => {
            return Err(AlmanacError::AmbiguousState {
                catalogue: catalogue.to_string(),
                present,
            })
        }
        DerivationState::Absent => {}
    }

    let column = |name: &str| {
        table.column_index(name).ok_or_else(|| AlmanacError::Schema {
            catalogue: catalogue.to_string(),
            column: name.to_string(),
        })
    };
    let name_col = source.name_column.as_deref().map(column).transpose()?;
    let mag_col = column(&source.magnitude_column)?;
    let coordinates = match &source.coordinates.columns {
        CoordinateColumns::Separate { ra, dec } => {
            let axis = |columns: &AxisColumns| -> Result<AxisIndices> {
                Ok(match columns {
                    AxisColumns::Single(c) => AxisIndices::Single(column(c)?),
                    AxisColumns::Fields([a, b, c]) => {
                        AxisIndices::Fields([column(a)?, column(b)?, column(c)?])
                    }
                })
            };
            CoordinateIndices::Separate {
                ra: axis(ra)?,
                dec: axis(dec)?,
            }
        }
        CoordinateColumns::Combined { column: name } => CoordinateIndices::Combined {
            column: column(name)?,
            name: name.clone(),
        },
    };

    let mut report = NormalizationReport {
        raw_rows: table.len(),
        ..Default::default()
    };

    let mut candidates = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let Some(magnitude) = parse_decimal(table.cell(row, mag_col)) else {
            report.missing_magnitude += 1;
            continue;
        };
        if !bounds.contains(magnitude) {
            report.magnitude_out_of_bounds += 1;
            continue;
        }
        let name = match name_col {
            Some(c) => table.cell(row, c).trim().to_string(),
            None => row.to_string(),
        };
        candidates.push(Candidate {
            row,
            name,
            magnitude,
        });
    }
    debug!(
        "[{catalogue}] magnitude filter: {} missing, {} outside [{}, {}]",
        report.missing_magnitude, report.magnitude_out_of_bounds, bounds.min, bounds.max
    );

    let mut located = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let (ra_raw, dec_raw) = match &coordinates {
            CoordinateIndices::Separate { ra, dec } => (
                axis_text(table, candidate.row, ra),
                axis_text(table, candidate.row, dec),
            ),
            CoordinateIndices::Combined { column, name } => {
                let cell = table.cell(candidate.row, *column);
                if cell.trim().is_empty() {
                    report.invalid_coordinates += 1;
                    continue;
                }
                let fields = cell.split_whitespace().collect::<Vec<&str>>();
                if fields.len() != 2 {
                    return Err(AlmanacError::Split {
                        catalogue: catalogue.to_string(),
                        column: name.clone(),
                        row: candidate.row,
                        found: fields.len(),
                    });
                }
                (RawAxis::Text(fields[0]), RawAxis::Text(fields[1]))
            }
        };

        if ra_raw.is_blank() || dec_raw.is_blank() {
            report.invalid_coordinates += 1;
            continue;
        }
        let spec = &source.coordinates;
        let (Some(ra), Some(dec)) = (spec.ra_to_deg(&ra_raw), spec.dec_to_deg(&dec_raw)) else {
            report.invalid_coordinates += 1;
            continue;
        };
        if !in_sky(ra, dec) {
            report.coordinates_out_of_range += 1;
            continue;
        }
        located.push((candidate, ra, dec));
    }
    debug!(
        "[{catalogue}] coordinate cleansing: {} unparseable, {} out of range",
        report.invalid_coordinates, report.coordinates_out_of_range
    );

    let (min_mag, max_mag) = located
        .iter()
        .map(|(c, _, _)| c.magnitude)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
            (lo.min(m), hi.max(m))
        });
    let range = max_mag - min_mag;

    let entries = located
        .into_iter()
        .map(|(candidate, ra, dec)| {
            let norm_mag = if range > 0.0 {
                (candidate.magnitude - min_mag) / range
            } else {
                0.0
            };
            CatalogueEntry {
                name: candidate.name,
                ra,
                dec,
                magnitude: candidate.magnitude,
                norm_mag,
                size: display_size(norm_mag),
                intensity: color_intensity(norm_mag),
                source_type: source.source_type,
            }
        })
        .collect::<Vec<CatalogueEntry>>();

    info!("[{catalogue}] normalized: {report}");
    Ok(Catalogue::with_report(catalogue, entries, report))
}

fn reload(table: &RawTable, catalogue: &str) -> Catalogue {
    let (entries, unreadable) = derived::read_entries(table);
    let report = NormalizationReport {
        raw_rows: table.len(),
        unreadable_derived: unreadable,
        reloaded: true,
        ..Default::default()
    };
    info!("[{catalogue}] reloaded from derived columns: {report}");
    Catalogue::with_report(catalogue, entries, report)
}

fn axis_text<'a>(table: &'a RawTable, row: usize, axis: &AxisIndices) -> RawAxis<'a> {
    match axis {
        AxisIndices::Single(c) => RawAxis::Text(table.cell(row, *c)),
        AxisIndices::Fields([a, b, c]) => RawAxis::Fields([
            table.cell(row, *a),
            table.cell(row, *b),
            table.cell(row, *c),
        ]),
    }
}
