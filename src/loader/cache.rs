//! Memoized full-dataset loads.
//!
//! Every interactive change re-runs the whole pipeline, so the full-dataset
//! load is the one thing worth keeping around. The cache is keyed by source
//! path, read-only after insertion, and lives until process exit. There is
//! no invalidation: source files are treated as immutable snapshots.

use crate::error::Result;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-lifetime cache of loaded source tables.
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, DataFrame>>,
}

static GLOBAL: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The shared process-wide cache.
    pub fn global() -> &'static DatasetCache {
        &GLOBAL
    }

    /// Return the cached table for `path`, loading it on first use.
    ///
    /// `DataFrame` clones are shallow (columns are shared), so handing out
    /// clones keeps the cached entry immutable.
    pub fn get_or_load<F>(&self, path: &Path, loader: F) -> Result<DataFrame>
    where
        F: FnOnce(&Path) -> Result<DataFrame>,
    {
        if let Some(df) = self.entries.lock().get(path) {
            debug!("Cache hit for {}", path.display());
            return Ok(df.clone());
        }

        let df = loader(path)?;
        debug!(
            "Cached {} ({} rows x {} columns)",
            path.display(),
            df.height(),
            df.width()
        );
        self.entries.lock().insert(path.to_path_buf(), df.clone());
        Ok(df)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use polars::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loader_runs_once_per_path() {
        let cache = DatasetCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let df = cache
                .get_or_load(Path::new("sessions.csv"), |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(df!["uur" => [14i64, 9]].unwrap())
                })
                .unwrap();
            assert_eq!(df.height(), 2);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = DatasetCache::new();

        let result = cache.get_or_load(Path::new("missing.csv"), |p| {
            Err(DashboardError::SourceNotFound(p.to_path_buf()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
