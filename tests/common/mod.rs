#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use camino::{Utf8Path, Utf8PathBuf};
use skyalmanac::{
    catalogue::{CatalogueEntry, MagnitudeBounds, SourceType},
    config::AlmanacConfig,
    vantage::AltAz,
};

pub mod spk;

pub const DATA_DIR: &str = "tests/data";

pub const FIXTURE_CONFIG: &str = r#"
    [defaults]
    latitude = 54.0
    longitude = -1.5
    num_days = 2
    sample_seconds = 3600
    max_workers = 2

    [[sources]]
    name = "Bright stars"
    path = "bright_stars.csv"
    name_column = "HR"
    magnitude_column = "Vmag"
    source_type = "star"
    band = "starfield"
    starfield = true
    coordinates = { ra_format = "sexagesimal", dec_format = "sexagesimal", columns = { layout = "separate", ra = "RAJ2000", dec = "DEJ2000" } }

    [[sources]]
    name = "Messier"
    path = "messier.csv"
    delimiter = ";"
    name_column = "Messier"
    magnitude_column = "Mag"
    source_type = "deep_sky"
    coordinates = { ra_format = "sexagesimal", dec_format = "sexagesimal", columns = { layout = "combined", column = "Coords" } }

    [[sources]]
    name = "Broken"
    path = "broken_catalogue.csv"
    name_column = "Name"
    magnitude_column = "Vmag"
    source_type = "deep_sky"
    coordinates = { ra_format = "degrees", dec_format = "degrees", columns = { layout = "separate", ra = "RA", dec = "Dec" } }

    [constellations]
    path = "constellation_lines.csv"
"#;

pub fn data_path(file: &str) -> Utf8PathBuf {
    Utf8Path::new(DATA_DIR).join(file)
}

/// The fixture configuration with its paths pointing into `tests/data`.
pub fn fixture_config() -> AlmanacConfig {
    let mut config = AlmanacConfig::from_toml_str(FIXTURE_CONFIG).unwrap();
    config.resolve_paths(Utf8Path::new(DATA_DIR));
    config
}

pub fn default_bounds() -> MagnitudeBounds {
    MagnitudeBounds::new(-2.0, 6.0).unwrap()
}

pub fn entry(name: &str, ra: f64, dec: f64, magnitude: f64) -> CatalogueEntry {
    CatalogueEntry {
        name: name.to_string(),
        ra,
        dec,
        magnitude,
        norm_mag: 0.0,
        size: 1.0,
        intensity: 1.0,
        source_type: SourceType::Star,
    }
}

pub fn assert_altaz_close(actual: &AltAz, expected: &AltAz, epsilon: f32) {
    assert_abs_diff_eq!(actual.alt, expected.alt, epsilon = epsilon);
    assert_abs_diff_eq!(actual.az, expected.az, epsilon = epsilon);
}
