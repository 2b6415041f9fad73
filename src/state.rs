use std::path::Path;

use log::warn;

use crate::analysis::aggregate::aggregate;
use crate::config::AnalysisConfig;
use crate::data::export::export_results;
use crate::data::loader::import_directory;
use crate::data::model::{Region, ScanSet, SeriesResult};
use crate::data::selection::ActiveSelection;
use crate::error::{ExportError, ImportError};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full analysis session, independent of any presentation layer.
///
/// A front end edits regions and the selection through the methods below;
/// each edit recomputes the fits so `last_result` is always current.
pub struct AppState {
    pub config: AnalysisConfig,

    /// Imported scans (None until a directory is imported).
    pub scans: Option<ScanSet>,

    /// Scans taking part in the fits.
    pub selection: ActiveSelection,

    pub primary: Region,
    pub secondary: Region,

    /// Keep fitted curves in the results for an overlay.
    pub show_fits: bool,

    /// Output of the most recent recompute.
    pub last_result: Option<SeriesResult>,

    /// Status / error message for the user.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            scans: None,
            selection: ActiveSelection::none(),
            primary: Region::new(0.0, 0.0),
            secondary: Region::new(0.0, 0.0),
            show_fits: false,
            last_result: None,
            status_message: None,
        }
    }

    /// Replace the session with the scans of `dir`: everything active,
    /// default regions, fresh fits. On failure the previous session is kept.
    pub fn import_directory(&mut self, dir: &Path) -> Result<&SeriesResult, ImportError> {
        let scans = match import_directory(dir, &self.config) {
            Ok(scans) => scans,
            Err(e) => {
                warn!("import of {} failed: {e}", dir.display());
                self.status_message = Some(format!("Import failed: {e}"));
                return Err(e);
            }
        };

        if let Some(extent) = scans.x_extent() {
            (self.primary, self.secondary) = Region::default_pair(extent);
        }
        self.selection = ActiveSelection::all(scans.len());
        self.scans = Some(scans);
        self.status_message = None;
        Ok(self.recompute())
    }

    /// Fit every active scan in both regions.
    pub fn recompute(&mut self) -> &SeriesResult {
        let empty = ScanSet::default();
        let scans = self.scans.as_ref().unwrap_or(&empty);
        let result = aggregate(
            scans,
            &self.selection,
            self.primary,
            self.secondary,
            &self.config.fit,
            self.show_fits,
        );
        self.status_message = (!result.failures.is_empty())
            .then(|| format!("{} scan(s) skipped: fit failed", result.failures.len()));
        self.last_result.insert(result)
    }

    pub fn set_regions(&mut self, primary: Region, secondary: Region) -> &SeriesResult {
        self.primary = primary;
        self.secondary = secondary;
        self.recompute()
    }

    pub fn set_show_fits(&mut self, show: bool) -> &SeriesResult {
        self.show_fits = show;
        self.recompute()
    }

    /// Toggle a single scan in the selection.
    pub fn toggle_scan(&mut self, index: usize) -> &SeriesResult {
        self.selection.toggle(index);
        self.recompute()
    }

    pub fn set_selection(&mut self, selection: ActiveSelection) -> &SeriesResult {
        self.selection = selection;
        self.recompute()
    }

    pub fn select_all(&mut self) -> &SeriesResult {
        let n = self.scans.as_ref().map_or(0, ScanSet::len);
        self.set_selection(ActiveSelection::all(n))
    }

    pub fn select_none(&mut self) -> &SeriesResult {
        self.set_selection(ActiveSelection::none())
    }

    /// Write the most recent results table.
    pub fn export(&mut self, path: &Path) -> Result<(), ExportError> {
        let result = self.last_result.as_ref().ok_or(ExportError::NothingToExport)?;
        export_results(path, result).inspect_err(|e| {
            self.status_message = Some(format!("Export failed: {e}"));
        })
    }
}
