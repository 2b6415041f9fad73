use anyhow::{bail, Context, Result};

use peak_trends::{ActiveSelection, AnalysisConfig, AppState, SeriesResult};

use crate::Cli;

// ---------------------------------------------------------------------------
// Headless driver
// ---------------------------------------------------------------------------

pub struct PeakTrendsApp {
    pub state: AppState,
}

impl PeakTrendsApp {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => AnalysisConfig::from_path(path)?,
            None => AnalysisConfig::default(),
        };
        Ok(Self {
            state: AppState::new(config),
        })
    }

    /// Import, apply the command-line regions and selection, report, export.
    pub fn run(&mut self, cli: &Cli) -> Result<()> {
        let state = &mut self.state;
        state
            .import_directory(&cli.dir)
            .with_context(|| format!("Failed to import {}", cli.dir.display()))?;

        if cli.primary.is_some() || cli.secondary.is_some() {
            let primary = cli.primary.unwrap_or(state.primary);
            let secondary = cli.secondary.unwrap_or(state.secondary);
            state.set_regions(primary, secondary);
        }

        if !cli.only.is_empty() {
            let Some(scans) = state.scans.as_ref() else {
                bail!("no scans loaded");
            };
            let selection = ActiveSelection::from_keys(scans, &cli.only);
            if selection.is_empty() {
                bail!("none of the series keys {:?} was imported", cli.only);
            }
            state.set_selection(selection);
        }

        if cli.show_fits {
            state.set_show_fits(true);
        }

        if let Some(result) = &state.last_result {
            print_summary(result, cli.show_fits);
        }
        if let Some(message) = &state.status_message {
            println!("{message}");
        }

        if let Some(out) = &cli.out {
            state
                .export(out)
                .with_context(|| format!("Failed to export to {}", out.display()))?;
            println!("wrote {}", out.display());
        }
        Ok(())
    }
}

fn print_summary(result: &SeriesResult, show_fits: bool) {
    println!(
        "primary {}  secondary {}",
        result.primary_region, result.secondary_region
    );
    println!(
        "{:>10}  {:>10} {:>10} {:>8}  {:>10} {:>10} {:>8}  {:>8}",
        "key", "sigma1", "area1", "R²1", "sigma2", "area2", "R²2", "ratio"
    );
    for e in &result.entries {
        print!(
            "{:>10}  {:>10.4} {:>10.4} {:>8.4}  {:>10.4} {:>10.4} {:>8.4}  {:>8.4}",
            e.series_key,
            e.primary.sigma,
            e.primary.area,
            e.primary.r_squared,
            e.secondary.sigma,
            e.secondary.area,
            e.secondary.r_squared,
            e.ratio
        );
        if show_fits {
            let samples = |c: &Option<Vec<[f64; 2]>>| c.as_ref().map_or(0, Vec::len);
            print!(
                "  curves {}/{}",
                samples(&e.primary.curve),
                samples(&e.secondary.curve)
            );
        }
        println!();
    }
    for f in &result.failures {
        println!(
            "{:>10}  skipped: {} ({} region): {}",
            f.series_key, f.name, f.region, f.error
        );
    }
}
