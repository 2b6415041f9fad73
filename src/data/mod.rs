//! Data layer: scan model, import, selection and export.
//!
//! Architecture:
//! ```text
//!   dir/*.csv|*.txt|*.xy
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  file name → series key, rows → (x, y),
//!   └──────────┘  baseline + normalize → ScanSet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  model    │  Scan, ScanSet, Region, SeriesResult
//!   └──────────┘
//!        │                 ┌───────────┐
//!        ├────────────────▶│ selection  │  active scan indices
//!        ▼                 └───────────┘
//!   ┌──────────┐
//!   │  export   │  SeriesResult → 14-column text table
//!   └──────────┘
//! ```

pub mod export;
pub mod loader;
pub mod model;
pub mod selection;
