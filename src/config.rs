use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Analysis configuration
// ---------------------------------------------------------------------------

/// Tunables for import, baseline removal and peak fitting.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "baseline": { "degree": 2 }, "fit": { "min_points": 5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// File extensions (without the dot) picked up by a directory import.
    pub extensions: Vec<String>,
    pub baseline: BaselineConfig,
    pub fit: FitConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["csv".into(), "txt".into(), "xy".into()],
            baseline: BaselineConfig::default(),
            fit: FitConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Whether a file extension is one of the accepted scan extensions.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Iterative polynomial baseline estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Polynomial degree of the baseline.
    pub degree: usize,
    pub max_iterations: usize,
    /// Relative coefficient change below which the iteration stops.
    pub tolerance: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            degree: 3,
            max_iterations: 100,
            tolerance: 1e-3,
        }
    }
}

/// Levenberg–Marquardt Gaussian refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Minimum number of points a region must hold to be fitted.
    pub min_points: usize,
    pub max_iterations: usize,
    /// Relative change in squared residual or in parameters that counts as converged.
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_points: 3,
            max_iterations: 400,
            tolerance: 1.5e-8,
        }
    }
}
