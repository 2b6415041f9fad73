use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::model::{Region, SeriesEntry, SeriesResult};
use crate::error::ExportError;

/// Column names of the export table, in order.
pub const EXPORT_HEADER: [&str; 14] = [
    "Temperatures",
    "xMin1",
    "xMax1",
    "StdDev1",
    "FWHM1",
    "Area1",
    "Rsqr1",
    "xMin2",
    "xMax2",
    "StdDev2",
    "FWHM2",
    "Area2",
    "Rsqr2",
    "Ratios",
];

// ---------------------------------------------------------------------------
// Row layout
// ---------------------------------------------------------------------------

/// One exported line. Field order is the column order of [`EXPORT_HEADER`].
#[derive(Debug, Serialize)]
struct ExportRow {
    series_key: f64,
    lower1: f64,
    upper1: f64,
    sigma1: f64,
    fwhm1: f64,
    area1: f64,
    r_squared1: f64,
    lower2: f64,
    upper2: f64,
    sigma2: f64,
    fwhm2: f64,
    area2: f64,
    r_squared2: f64,
    ratio: f64,
}

/// Region bounds are written the way they are displayed: 4 decimals.
fn bound(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}

impl ExportRow {
    fn new(entry: &SeriesEntry, primary: Region, secondary: Region) -> Self {
        Self {
            series_key: entry.series_key,
            lower1: bound(primary.lower),
            upper1: bound(primary.upper),
            sigma1: entry.primary.sigma,
            fwhm1: entry.primary.fwhm,
            area1: entry.primary.area,
            r_squared1: entry.primary.r_squared,
            lower2: bound(secondary.lower),
            upper2: bound(secondary.upper),
            sigma2: entry.secondary.sigma,
            fwhm2: entry.secondary.fwhm,
            area2: entry.secondary.area,
            r_squared2: entry.secondary.r_squared,
            ratio: entry.ratio,
        }
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write the header and one row per fitted scan.
pub fn write_results<W: Write>(writer: W, result: &SeriesResult) -> Result<(), ExportError> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    out.write_record(EXPORT_HEADER)?;
    for entry in &result.entries {
        out.serialize(ExportRow::new(
            entry,
            result.primary_region,
            result.secondary_region,
        ))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the results table to `path`, replacing any existing file.
pub fn export_results(path: &Path, result: &SeriesResult) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_results(file, result)?;
    log::info!(
        "exported {} rows to {}",
        result.entries.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::gaussian::Gaussian;
    use crate::data::model::FitResult;

    fn fit(sigma: f64) -> FitResult {
        let g = Gaussian::new(1.0, 0.0, sigma);
        FitResult {
            gaussian: g,
            sigma: sigma.abs(),
            fwhm: g.fwhm(),
            area: g.area(),
            r_squared: 0.995,
            peak_height: 1.0,
            points: 40,
            iterations: 5,
            curve: None,
        }
    }

    fn result(keys: &[f64]) -> SeriesResult {
        SeriesResult {
            primary_region: Region::new(10.123456, 20.0),
            secondary_region: Region::new(30.0, 40.5),
            entries: keys
                .iter()
                .enumerate()
                .map(|(i, &k)| SeriesEntry {
                    scan_index: i,
                    name: format!("run{k}.csv"),
                    series_key: k,
                    primary: fit(1.5),
                    secondary: fit(-2.0),
                    ratio: 0.75,
                })
                .collect(),
            failures: Vec::new(),
        }
    }

    fn render(result: &SeriesResult) -> String {
        let mut buf = Vec::new();
        write_results(&mut buf, result).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn two_entries_give_three_lines_of_fourteen_fields() {
        let text = render(&result(&[0.0, 25.0]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.split(',').count(), 14, "{line}");
        }
        assert_eq!(lines[0], EXPORT_HEADER.join(","));
    }

    #[test]
    fn rows_repeat_bounds_and_use_absolute_sigma() {
        let text = render(&result(&[-5.0, 25.0]));
        let rows: Vec<Vec<&str>> = text.lines().skip(1).map(|l| l.split(',').collect()).collect();
        for row in &rows {
            assert_eq!(row[1].parse::<f64>().unwrap(), 10.1235);
            assert_eq!(row[2].parse::<f64>().unwrap(), 20.0);
            assert_eq!(row[7].parse::<f64>().unwrap(), 30.0);
            assert_eq!(row[8].parse::<f64>().unwrap(), 40.5);
            assert_eq!(row[9].parse::<f64>().unwrap(), 2.0);
            assert_eq!(row[13].parse::<f64>().unwrap(), 0.75);
        }
        assert_eq!(rows[0][0].parse::<f64>().unwrap(), -5.0);
        assert_eq!(rows[1][0].parse::<f64>().unwrap(), 25.0);
    }

    #[test]
    fn empty_result_still_writes_header() {
        let text = render(&result(&[]));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn unwritable_destination_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(matches!(
            export_results(&path, &result(&[1.0])),
            Err(ExportError::Io { .. })
        ));
    }
}
