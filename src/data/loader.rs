use std::path::{Path, PathBuf};

use log::{debug, info};

use super::model::{Scan, ScanSet};
use crate::analysis::baseline::remove_baseline;
use crate::analysis::normalize::normalize_series;
use crate::config::AnalysisConfig;
use crate::error::{ImportError, SeriesKeyError};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Import every scan file of a directory.
///
/// Files are picked by extension, ordered by the series key in their name,
/// parsed, baseline corrected and finally normalized across the whole set.
/// Any failing file aborts the import.
pub fn import_directory(dir: &Path, cfg: &AnalysisConfig) -> Result<ScanSet, ImportError> {
    let files = list_scan_files(dir, cfg)?;

    let mut scans = Vec::with_capacity(files.len());
    for (path, name) in files {
        let series_key = extract_series_key(&name)?;
        let (x, raw) = load_scan_file(&path)?;
        let y = remove_baseline(&raw, &cfg.baseline).map_err(|message| ImportError::Baseline {
            path: path.clone(),
            message,
        })?;
        debug!("{name}: {} points, series key {series_key}", x.len());
        scans.push(Scan {
            name,
            path,
            series_key,
            x,
            y,
        });
    }

    let mut set = ScanSet::new(scans);
    let scale = normalize_series(&mut set)?;
    info!(
        "imported {} scans from {} (normalized by {scale:.6})",
        set.len(),
        dir.display()
    );
    Ok(set)
}

/// Eligible files of `dir` as `(path, file name)`, sorted by file name.
fn list_scan_files(
    dir: &Path,
    cfg: &AnalysisConfig,
) -> Result<Vec<(PathBuf, String)>, ImportError> {
    let read_err = |source| ImportError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| cfg.accepts_extension(e));
        let name = path.file_name().and_then(|n| n.to_str()).map(str::to_owned);
        match name {
            Some(name) if accepted => files.push((path, name)),
            _ => debug!("skipping {}", path.display()),
        }
    }

    if files.is_empty() {
        return Err(ImportError::NoEligibleFiles {
            path: dir.to_path_buf(),
            extensions: cfg.extensions.join(", "),
        });
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

// ---------------------------------------------------------------------------
// Series key
// ---------------------------------------------------------------------------

/// Parse the series key out of a file name.
///
/// The number starts at the first digit or minus sign and runs up to the
/// extension: `scan42.3.csv` → 42.3, `data-17.txt` → -17.
pub fn extract_series_key(file_name: &str) -> Result<f64, SeriesKeyError> {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    let start = stem
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(|| SeriesKeyError::NoNumber(file_name.to_string()))?;
    let text = &stem[start..];
    match text.parse::<f64>() {
        Ok(key) if key.is_finite() => Ok(key),
        _ => Err(SeriesKeyError::Unparsable {
            name: file_name.to_string(),
            text: text.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Scan file parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Comma,
    Whitespace,
}

/// Read one two-column scan file into `(x, y)`.
pub fn load_scan_file(path: &Path) -> Result<(Vec<f64>, Vec<f64>), ImportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scan(&text, path)
}

/// Parse scan text. The first non-empty line decides between comma and
/// whitespace separated columns; every later line must agree.
pub fn parse_scan(text: &str, path: &Path) -> Result<(Vec<f64>, Vec<f64>), ImportError> {
    let first = text.lines().find(|l| !l.trim().is_empty());
    let Some(first) = first else {
        return Err(ImportError::Empty(path.to_path_buf()));
    };
    let delimiter = if first.contains(',') {
        Delimiter::Comma
    } else {
        Delimiter::Whitespace
    };

    let mut points = Points::new(path);
    match delimiter {
        Delimiter::Comma => parse_comma_rows(text, &mut points)?,
        Delimiter::Whitespace => parse_whitespace_rows(text, &mut points)?,
    }
    points.finish()
}

fn parse_comma_rows(text: &str, points: &mut Points<'_>) -> Result<(), ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    for result in reader.records() {
        let record = result.map_err(|source| ImportError::Csv {
            path: points.path.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(0, |p| p.line());
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() < 2 {
            return Err(points.error(line, "expected at least two comma-separated columns"));
        }
        points.push(line, &record[0], &record[1])?;
    }
    Ok(())
}

fn parse_whitespace_rows(text: &str, points: &mut Points<'_>) -> Result<(), ImportError> {
    for (i, raw) in text.lines().enumerate() {
        let line = i as u64 + 1;
        if raw.trim().is_empty() {
            continue;
        }
        if raw.contains(',') {
            return Err(points.error(line, "comma found in a whitespace-separated file"));
        }
        let mut tokens = raw.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(x), Some(y)) => points.push(line, x, y)?,
            _ => return Err(points.error(line, "expected at least two columns")),
        }
    }
    Ok(())
}

/// Accumulates parsed points and checks that x never decreases.
struct Points<'a> {
    path: &'a Path,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl<'a> Points<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            x: Vec::new(),
            y: Vec::new(),
        }
    }

    fn error(&self, line: u64, message: impl Into<String>) -> ImportError {
        ImportError::Parse {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn number(&self, line: u64, token: &str) -> Result<f64, ImportError> {
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(self.error(line, format!("'{token}' is not a number"))),
        }
    }

    fn push(&mut self, line: u64, x: &str, y: &str) -> Result<(), ImportError> {
        let x = self.number(line, x)?;
        let y = self.number(line, y)?;
        if let Some(&previous) = self.x.last() {
            if x < previous {
                return Err(ImportError::NonMonotonic {
                    path: self.path.to_path_buf(),
                    line,
                    previous,
                    current: x,
                });
            }
        }
        self.x.push(x);
        self.y.push(y);
        Ok(())
    }

    fn finish(self) -> Result<(Vec<f64>, Vec<f64>), ImportError> {
        if self.x.is_empty() {
            return Err(ImportError::Empty(self.path.to_path_buf()));
        }
        Ok((self.x, self.y))
    }
}
