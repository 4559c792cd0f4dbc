use approx::assert_abs_diff_eq;
use camino::Utf8PathBuf;
use skyalmanac::{
    almanac::{list_bodies, Almanac, LoadRequest},
    almanac_errors::AlmanacError,
    catalogue::{Catalogue, SourceType},
    config::{AlmanacConfig, EphemerisSource, MagnitudeBand},
    ephemeris::{SolarSystemBody, SpkKernel},
    observation::ObservationEngine,
    time::CalendarDate,
    time_series::TimeSeries,
    vantage::{ProviderSpec, Target, Vantage},
};

mod common;
use common::{
    entry, fixture_config,
    spk::{kernel_bytes, write_kernel, LinearSegment},
    FIXTURE_CONFIG,
};

const AU: f64 = 1.495_978_707e8;
const MOON_DISTANCE: f64 = 384_400.0;

const EMB: [f64; 3] = [1.2e8, -8.0e7, 3.0e7];
const EARTH_FROM_EMB: [f64; 3] = [-3000.0, 2000.0, 1000.0];
const SUN_RADEC: (f64, f64) = (300.0, -20.0);
const MOON_RADEC: (f64, f64) = (40.0, 15.0);
const JUPITER_START: [f64; 3] = [5.0e8, 4.0e8, 1.0e8];
const JUPITER_VELOCITY: [f64; 3] = [10.0, -5.0, 2.0];

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn towards((ra, dec): (f64, f64), distance: f64) -> [f64; 3] {
    let u = Target::new(ra, dec).unit_vector() * distance;
    [u.x, u.y, u.z]
}

/// Earth, Sun and Moon at rest, Jupiter drifting; no other planet.
fn segments() -> Vec<LinearSegment> {
    let earth = add(EMB, EARTH_FROM_EMB);
    vec![
        LinearSegment::fixed(3, 0, EMB),
        LinearSegment::fixed(399, 3, EARTH_FROM_EMB),
        LinearSegment::fixed(10, 0, add(earth, towards(SUN_RADEC, AU))),
        LinearSegment::fixed(
            301,
            3,
            add(EARTH_FROM_EMB, towards(MOON_RADEC, MOON_DISTANCE)),
        ),
        LinearSegment {
            target: 5,
            center: 0,
            position: JUPITER_START,
            velocity: JUPITER_VELOCITY,
        },
    ]
}

fn kernel_file(dir: &tempfile::TempDir) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("test.bsp")).unwrap();
    write_kernel(&path, &segments());
    path
}

fn vantage() -> Vantage {
    Vantage::new(54.0, -1.5).unwrap()
}

fn series() -> TimeSeries {
    TimeSeries::build(CalendarDate::new(2025, 1, 15), 2, 3600).unwrap()
}

fn source(path: Utf8PathBuf) -> EphemerisSource {
    EphemerisSource {
        path,
        name: "Solar system".into(),
        bodies: SolarSystemBody::ALL.to_vec(),
        band: MagnitudeBand::DeepSky,
    }
}

#[test]
fn test_kernel_positions() {
    let kernel = SpkKernel::from_bytes(&kernel_bytes(&segments())).unwrap();
    assert_eq!(kernel.internal_name(), "SKYALMANAC TEST KERNEL");
    assert_eq!(kernel.resolve(SolarSystemBody::Sun), Some(10));
    assert_eq!(kernel.resolve(SolarSystemBody::Jupiter), Some(5));
    assert_eq!(kernel.resolve(SolarSystemBody::Venus), None);

    let earth = kernel.earth(0.0).unwrap();
    assert_abs_diff_eq!(earth.x, EMB[0] + EARTH_FROM_EMB[0], epsilon = 1e-6);
    assert_abs_diff_eq!(earth.z, EMB[2] + EARTH_FROM_EMB[2], epsilon = 1e-6);

    // the Moon hangs off the Earth-Moon barycenter
    let moon = kernel.barycentric(301, 7.9e8).unwrap() - earth;
    assert_abs_diff_eq!(moon.norm(), MOON_DISTANCE, epsilon = 1e-6);

    // one instant per record, and the end of the coverage
    for et in [-5.0e8, 1.2e9, 2.0e9] {
        let jupiter = kernel.barycentric(5, et).unwrap();
        for axis in 0..3 {
            let expected = JUPITER_START[axis] + JUPITER_VELOCITY[axis] * et;
            assert_abs_diff_eq!(jupiter[axis], expected, epsilon = 1e-3);
        }
    }

    assert!(matches!(
        kernel.barycentric(10, 2.5e9),
        Err(AlmanacError::Ephemeris(_))
    ));
    assert!(matches!(
        kernel.barycentric(299, 0.0),
        Err(AlmanacError::Ephemeris(_))
    ));
}

#[test]
fn test_truncated_kernel_rejected() {
    let mut bytes = kernel_bytes(&segments());
    bytes.truncate(bytes.len() - 100);
    assert!(matches!(
        SpkKernel::from_bytes(&bytes),
        Err(AlmanacError::Ephemeris(_))
    ));
}

#[test]
fn test_body_catalogue() {
    let dir = tempfile::tempdir().unwrap();
    let catalogue = list_bodies(&source(kernel_file(&dir)), vantage(), &series()).unwrap();

    let rows = catalogue
        .entries()
        .iter()
        .map(|e| (e.name.as_str(), e.size))
        .collect::<Vec<_>>();
    assert_eq!(rows, vec![("Jupiter", 10.0), ("Sun", 60.0), ("Moon", 30.0)]);
    assert_eq!(catalogue.report().raw_rows, 9);
    assert_eq!(catalogue.report().invalid_coordinates, 6);
    for e in catalogue.entries() {
        assert_eq!(e.source_type, SourceType::Planet);
        assert_eq!(e.magnitude, 1.0);
        assert_eq!(e.norm_mag, 0.0);
        assert!(e.target().body.is_some());
    }

    // at a solar distance the vantage offset stays within a few arcseconds
    let sun = &catalogue.entries()[1];
    assert_abs_diff_eq!(sun.ra, SUN_RADEC.0, epsilon = 0.01);
    assert_abs_diff_eq!(sun.dec, SUN_RADEC.1, epsilon = 0.01);
}

#[test]
fn test_sun_and_moon_rows_in_computed_cube() {
    let dir = tempfile::tempdir().unwrap();
    let path = kernel_file(&dir);
    let times = series();
    let bodies = list_bodies(&source(path.clone()), vantage(), &times).unwrap();

    let engine = ObservationEngine::new(Some(2)).unwrap();
    let cube = engine
        .compute(&bodies, &times, &ProviderSpec::with_kernel(vantage(), path), || false)
        .unwrap();
    assert_eq!(cube.positions().dim(), (3, 48));

    // the same directions held fixed, seen from the Earth's center
    let fixed = Catalogue::new(
        "fixed",
        vec![
            entry("sun", SUN_RADEC.0, SUN_RADEC.1, 1.0),
            entry("moon", MOON_RADEC.0, MOON_RADEC.1, 1.0),
            entry("moon listed", bodies.entries()[2].ra, bodies.entries()[2].dec, 1.0),
        ],
    );
    let reference = engine
        .compute(&fixed, &times, &ProviderSpec::new(vantage()), || false)
        .unwrap();

    let sun = cube.positions().row(1);
    for (p, q) in sun.iter().zip(reference.positions().row(0)) {
        assert_abs_diff_eq!(p.alt, q.alt, epsilon = 0.01);
        let daz = (p.az - q.az + 180.0).rem_euclid(360.0) - 180.0;
        assert!(daz.abs() < 0.02 || q.alt.abs() > 85.0, "az {} vs {}", p.az, q.az);
    }

    // the Moon sits lower by its horizontal parallax, sin(p) = (ρ/d)·cos(alt)
    let rho = 6364.0;
    let moon = cube.positions().row(2);
    for (p, q) in moon.iter().zip(reference.positions().row(1)) {
        let parallax = (rho / MOON_DISTANCE * (p.alt as f64).to_radians().cos())
            .asin()
            .to_degrees();
        assert_abs_diff_eq!((q.alt - p.alt) as f64, parallax, epsilon = 0.02);
    }

    // listed where it stands at the first sample
    let first = cube.positions()[[2, 0]];
    let listed = reference.positions()[[2, 0]];
    assert_abs_diff_eq!(first.alt, listed.alt, epsilon = 1e-3);
    assert_abs_diff_eq!(first.az, listed.az, epsilon = 1e-3);
}

#[test]
fn test_load_lists_bodies_first() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config();
    config.ephemeris = Some(EphemerisSource {
        bodies: vec![SolarSystemBody::Sun, SolarSystemBody::Moon, SolarSystemBody::Venus],
        ..source(kernel_file(&dir))
    });
    let request = LoadRequest::from_defaults(&config.defaults, CalendarDate::new(2025, 1, 15));
    let result = Almanac::new(config).load(&request, || false).unwrap();

    let names = result
        .catalogues
        .iter()
        .map(|c| c.catalogue.name())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["Solar system", "Bright stars", "Messier"]);

    let bodies = &result.catalogues[0];
    assert!(!bodies.starfield);
    assert_eq!(bodies.cube.positions().dim(), (2, 48));
    assert_eq!(bodies.stats.report.invalid_coordinates, 1);
    assert!(result.starfield().is_some());
}

#[test]
fn test_unreadable_kernel_is_a_failure() {
    let text = format!("{FIXTURE_CONFIG}\n[ephemeris]\npath = \"missing.bsp\"\n");
    let mut config = AlmanacConfig::from_toml_str(&text).unwrap();
    config.resolve_paths(camino::Utf8Path::new(common::DATA_DIR));
    let request = LoadRequest::from_defaults(&config.defaults, CalendarDate::new(2025, 1, 15));
    let result = Almanac::new(config).load(&request, || false).unwrap();

    assert!(result.catalogue("Solar system").is_none());
    assert!(result
        .failures
        .iter()
        .any(|f| f.name == "Solar system" && matches!(f.error, AlmanacError::IoError(_))));
    assert!(result.catalogue("Bright stars").is_some());
}
