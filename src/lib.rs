//! Gaussian peak trends across a series of spectral scans.
//!
//! A directory of two-column scans (one file per temperature or condition)
//! is imported, baseline corrected and normalized; a Gaussian is then fitted
//! inside two x regions of every active scan, and width, area, R² and the
//! peak ratio are tracked against the series key parsed from each file name.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use analysis::aggregate::{aggregate, fit_region};
pub use analysis::gaussian::{fit_gaussian, Gaussian};
pub use config::{AnalysisConfig, BaselineConfig, FitConfig};
pub use data::export::{export_results, write_results, EXPORT_HEADER};
pub use data::loader::{extract_series_key, import_directory};
pub use data::model::{
    FitResult, Metric, Region, RegionKind, Scan, ScanFailure, ScanSet, SeriesEntry, SeriesResult,
};
pub use data::selection::ActiveSelection;
pub use error::{ExportError, FitError, ImportError, SeriesKeyError};
pub use state::AppState;
