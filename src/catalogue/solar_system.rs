//! Catalogue of the Sun, the Moon and the planets.
//!
//! The rows are built from an ephemeris rather than read from a file. Their listed position
//! is where the body stands at one instant (the start of the load); the position cubes follow
//! the bodies themselves ([`CatalogueEntry::target`]).
use hifitime::Epoch;
use log::warn;

use super::{color_intensity, Catalogue, CatalogueEntry, NormalizationReport, SourceType};
use crate::{
    almanac_errors::{AlmanacError, Result},
    constants::Magnitude,
    ephemeris::SolarSystemBody,
    vantage::EphemerisProvider,
};

/// Placeholder magnitude of every body; it keeps the bodies inside the default bounds.
pub const BODY_MAGNITUDE: Magnitude = 1.0;

/// Build the catalogue of `bodies` as seen from the provider's vantage.
///
/// Arguments
/// -----------------
/// * `name`: catalogue name.
/// * `provider`: locates the bodies; its kernel is read here if it was not yet.
/// * `bodies`: rows in order; bodies the kernel does not hold, or does not cover at both ends
///   of `epochs`, are skipped and counted as invalid coordinates.
/// * `epochs`: the time axis; positions are listed at its first instant.
///
/// Return
/// ----------
/// * The catalogue, or the kernel's read error.
pub fn solar_system_catalogue(
    name: &str,
    provider: &EphemerisProvider,
    bodies: &[SolarSystemBody],
    epochs: &[Epoch],
) -> Result<Catalogue> {
    provider.kernel()?;
    let (Some(&first), Some(&last)) = (epochs.first(), epochs.last()) else {
        return Err(AlmanacError::InvalidRange(format!(
            "[{name}] bodies need at least one instant"
        )));
    };
    let mut report = NormalizationReport {
        raw_rows: bodies.len(),
        ..Default::default()
    };
    let mut entries = Vec::with_capacity(bodies.len());

    for &body in bodies {
        let listed = provider
            .direction(body, last)
            .and_then(|_| provider.radec(body, first));
        let (ra, dec) = match listed {
            Ok(radec) => radec,
            Err(error) => {
                warn!("[{name}] {body} skipped: {error}");
                report.invalid_coordinates += 1;
                continue;
            }
        };
        // equal magnitudes normalize to 0
        entries.push(CatalogueEntry {
            name: body.name().to_string(),
            ra,
            dec,
            magnitude: BODY_MAGNITUDE,
            norm_mag: 0.0,
            size: body.display_size(),
            intensity: color_intensity(0.0),
            source_type: SourceType::Planet,
        });
    }
    Ok(Catalogue::with_report(name, entries, report))
}
