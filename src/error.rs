use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Import – fatal to the whole import operation
// ---------------------------------------------------------------------------

/// Why a series key could not be read from a file name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesKeyError {
    #[error("'{0}' contains no digit or minus sign")]
    NoNumber(String),
    #[error("'{name}': '{text}' is not a number")]
    Unparsable { name: String, text: String },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no scan files ({extensions}) found in {path}")]
    NoEligibleFiles { path: PathBuf, extensions: String },

    #[error("series key: {0}")]
    SeriesKey(#[from] SeriesKeyError),

    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("{0}: file contains no data rows")]
    Empty(PathBuf),

    #[error("{path}, line {line}: x decreases ({previous} -> {current}); scans must be sorted by x")]
    NonMonotonic {
        path: PathBuf,
        line: u64,
        previous: f64,
        current: f64,
    },

    #[error("{path}: baseline estimation failed: {message}")]
    Baseline { path: PathBuf, message: String },

    #[error("all scans are flat after baseline removal (global maximum {0}); cannot normalize")]
    FlatIntensity(f64),
}

// ---------------------------------------------------------------------------
// Fit – local to one (scan, region) pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("region holds {found} points, at least {required} needed")]
    TooFewPoints { found: usize, required: usize },
    #[error("intensity is constant over the region")]
    ZeroVariance,
    #[error("no positive signal in the region")]
    NoPeak,
    #[error("normal equations are singular")]
    Singular,
    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("fit produced a non-finite or zero-width Gaussian")]
    NonFinite,
    #[error("fitted width {sigma} is far wider than the region span {span}; no peak resolved")]
    Unresolved { sigma: f64, span: f64 },
}

// ---------------------------------------------------------------------------
// Export – fatal to the export operation only
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: no fit results have been computed")]
    NothingToExport,

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing results: {0}")]
    Csv(#[from] csv::Error),
}
