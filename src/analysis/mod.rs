//! Numeric pipeline: baseline removal and normalization at import time,
//! Gaussian fitting and series aggregation on every recompute.

pub mod aggregate;
pub mod baseline;
pub mod gaussian;
pub mod normalize;
