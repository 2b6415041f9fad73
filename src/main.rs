mod app;

use std::path::PathBuf;

use clap::Parser;
use peak_trends::Region;

use app::PeakTrendsApp;

#[derive(Parser)]
#[command(name = "peak-trends")]
#[command(about = "Fit Gaussian peaks in two x regions across a series of scans")]
#[command(version)]
pub struct Cli {
    /// Directory holding one scan file per series key.
    dir: PathBuf,

    /// Primary fitting region as LO,HI (default: 25-45 % of the x extent).
    #[arg(long, value_parser = parse_region, allow_hyphen_values = true)]
    primary: Option<Region>,

    /// Secondary fitting region as LO,HI (default: 55-75 % of the x extent).
    #[arg(long, value_parser = parse_region, allow_hyphen_values = true)]
    secondary: Option<Region>,

    /// Only fit the scans with this series key (repeatable).
    #[arg(long = "only", value_name = "KEY", allow_hyphen_values = true)]
    only: Vec<f64>,

    /// Write the results table to this file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// JSON analysis configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep the fitted curves and print their sample count.
    #[arg(long)]
    show_fits: bool,
}

fn parse_region(s: &str) -> Result<Region, String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LO,HI, got '{s}'"))?;
    let parse = |t: &str| {
        t.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("'{t}' is not a finite number"))
    };
    Ok(Region::new(parse(lo)?, parse(hi)?))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = PeakTrendsApp::new(&cli)?;
    app.run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_argument_parses_both_bounds() {
        assert_eq!(parse_region("10,20.5"), Ok(Region::new(10.0, 20.5)));
        assert_eq!(parse_region(" -5 , 5 "), Ok(Region::new(-5.0, 5.0)));
        assert!(parse_region("10").is_err());
        assert!(parse_region("a,2").is_err());
        assert!(parse_region("1,inf").is_err());
    }

    #[test]
    fn cli_accepts_repeated_keys() {
        let cli = Cli::try_parse_from([
            "peak-trends",
            "scans",
            "--primary",
            "20,40",
            "--only",
            "10",
            "--only",
            "-5",
            "--show-fits",
        ])
        .unwrap();
        assert_eq!(cli.primary, Some(Region::new(20.0, 40.0)));
        assert!(cli.secondary.is_none());
        assert_eq!(cli.only, [10.0, -5.0]);
        assert!(cli.show_fits);
    }
}
