use std::collections::BTreeSet;

use super::model::ScanSet;

// ---------------------------------------------------------------------------
// Active selection: which scans take part in a recompute
// ---------------------------------------------------------------------------

/// Set of active `ScanSet` indices.
///
/// Iteration is in ascending index order, which is ascending series-key
/// order because the `ScanSet` is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    indices: BTreeSet<usize>,
}

impl ActiveSelection {
    /// Every scan of a set of `len` scans is active.
    pub fn all(len: usize) -> Self {
        Self {
            indices: (0..len).collect(),
        }
    }

    /// Nothing active.
    pub fn none() -> Self {
        Self::default()
    }

    /// Activate exactly the scans whose series key is listed.
    pub fn from_keys(scans: &ScanSet, keys: &[f64]) -> Self {
        scans
            .iter()
            .enumerate()
            .filter(|(_, s)| keys.iter().any(|k| *k == s.series_key))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Flip one scan; returns whether it is active afterwards.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    pub fn set(&mut self, index: usize, active: bool) {
        if active {
            self.indices.insert(index);
        } else {
            self.indices.remove(&index);
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl FromIterator<usize> for ActiveSelection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}
