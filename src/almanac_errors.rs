use std::{ops::Range, time::Duration};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("[{catalogue}] missing expected column: {column}")]
    Schema { catalogue: String, column: String },

    #[error(
        "[{catalogue}] partial presence of derived columns {present:?}, the source needs cleaning"
    )]
    AmbiguousState {
        catalogue: String,
        present: Vec<String>,
    },

    #[error("[{catalogue}] invalid unit for {axis}: {reason}")]
    InvalidUnit {
        catalogue: String,
        axis: String,
        reason: String,
    },

    #[error(
        "[{catalogue}] combined coordinate column '{column}' at row {row} split into {found} fields, expected 2"
    )]
    Split {
        catalogue: String,
        column: String,
        row: usize,
        found: usize,
    },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error(
        "[{catalogue}] chunk {chunk} (rows {}..{}) failed after {elapsed:?}: {reason}",
        rows.start,
        rows.end
    )]
    Compute {
        catalogue: String,
        chunk: usize,
        rows: Range<usize>,
        elapsed: Duration,
        reason: String,
    },

    #[error("Ephemeris error: {0}")]
    Ephemeris(String),

    #[error("Computation cancelled after {0:?}")]
    Cancelled(Duration),

    #[error("Every configured catalogue failed normalization")]
    NoCatalogues,

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("Time conversion error: {0}")]
    TimeError(#[from] hifitime::HifitimeError),

    #[error("Thread pool creation failed: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, AlmanacError>;

impl PartialEq for AlmanacError {
    fn eq(&self, other: &Self) -> bool {
        use AlmanacError::*;
        match (self, other) {
            (
                Schema {
                    catalogue: c1,
                    column: a,
                },
                Schema {
                    catalogue: c2,
                    column: b,
                },
            ) => c1 == c2 && a == b,
            (
                AmbiguousState {
                    catalogue: c1,
                    present: a,
                },
                AmbiguousState {
                    catalogue: c2,
                    present: b,
                },
            ) => c1 == c2 && a == b,
            (
                InvalidUnit {
                    catalogue: c1,
                    axis: a1,
                    ..
                },
                InvalidUnit {
                    catalogue: c2,
                    axis: a2,
                    ..
                },
            ) => c1 == c2 && a1 == a2,
            (
                Split {
                    catalogue: c1,
                    row: r1,
                    found: f1,
                    ..
                },
                Split {
                    catalogue: c2,
                    row: r2,
                    found: f2,
                    ..
                },
            ) => c1 == c2 && r1 == r2 && f1 == f2,
            (InvalidRange(a), InvalidRange(b)) => a == b,
            (Ephemeris(a), Ephemeris(b)) => a == b,

            // elapsed time and cause text are not stable, compare the failure point only
            (
                Compute {
                    catalogue: c1,
                    chunk: k1,
                    rows: r1,
                    ..
                },
                Compute {
                    catalogue: c2,
                    chunk: k2,
                    rows: r2,
                    ..
                },
            ) => c1 == c2 && k1 == k2 && r1 == r2,
            (Cancelled(_), Cancelled(_)) => true,
            (NoCatalogues, NoCatalogues) => true,

            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ConfigError(a), ConfigError(b)) => a.to_string() == b.to_string(),
            (TimeError(_), TimeError(_)) => true,
            (ThreadPoolError(_), ThreadPoolError(_)) => true,

            _ => false,
        }
    }
}
