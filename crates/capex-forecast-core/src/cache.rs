//! Load-once cache of built forecast models.
//!
//! Entries are keyed by the identity of the source file (canonical path,
//! size, modification time), so an edited file misses the cache on its own.
//! Invalidation is explicit; nothing is evicted behind the caller's back.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ForecastModel;
use crate::register::AssetLine;
use crate::CapexResult;

/// Identity of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceKey {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl SourceKey {
    /// Read the identity of a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CapexResult<Self> {
        let path = fs::canonicalize(path.as_ref())?;
        let meta = fs::metadata(&path)?;
        Ok(Self {
            path,
            len: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Key for an in-memory source identified only by a label.
    pub fn in_memory(label: impl Into<PathBuf>) -> Self {
        Self {
            path: label.into(),
            len: 0,
            modified: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModelCache {
    entries: RwLock<HashMap<SourceKey, Arc<ForecastModel>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<ForecastModel>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the cached model for `key`, or run `load`, build the model and
    /// cache it. Older entries for the same path are replaced.
    pub fn get_or_build<F>(&self, key: SourceKey, load: F) -> CapexResult<Arc<ForecastModel>>
    where
        F: FnOnce() -> CapexResult<Vec<AssetLine>>,
    {
        if let Some(model) = self.get(&key) {
            tracing::debug!(path = %key.path.display(), "model cache hit");
            return Ok(model);
        }

        tracing::debug!(path = %key.path.display(), "model cache miss");
        let lines = load()?;
        let model = Arc::new(ForecastModel::build(&lines));

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|k, _| k.path != key.path);
        Ok(Arc::clone(entries.entry(key).or_insert(model)))
    }

    /// Drop every entry loaded from `path`. Returns how many were removed.
    /// The file may already be gone; any spelling of its path still matches.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> usize {
        let targets = candidate_paths(path.as_ref());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|k, _| !targets.contains(&k.path));
        before - entries.len()
    }

    /// Drop the entry stored under exactly `key`.
    pub fn remove(&self, key: &SourceKey) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The path as given, plus its canonical form. For a deleted file the
/// canonical form is rebuilt from its still-existing parent directory.
fn candidate_paths(path: &Path) -> Vec<PathBuf> {
    let mut paths = vec![path.to_path_buf()];
    if let Ok(canonical) = fs::canonicalize(path) {
        paths.push(canonical);
    } else if let Some(name) = path.file_name() {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Ok(dir) = fs::canonicalize(parent) {
            paths.push(dir.join(name));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    use rust_decimal_macros::dec;

    fn lines() -> CapexResult<Vec<AssetLine>> {
        Ok(vec![AssetLine {
            project_code: "P1".into(),
            program_name: "Metrology".into(),
            asset_id: "M-1".into(),
            asset_name: String::new(),
            asset_type: "Tool".into(),
            process_area: String::new(),
            fab_location: String::new(),
            scenario: "Base".into(),
            quantity: dec!(1),
            unit_cost_usd: dec!(100),
            order_quarter: Some("2025Q1".into()),
            need_quarter: None,
            ramp_start_quarter: Some("2025Q2".into()),
            depreciation_years: Some(dec!(2)),
        }])
    }

    #[test]
    fn test_second_lookup_hits_cache() {
        let cache = ModelCache::new();
        let loads = Cell::new(0);
        let key = SourceKey::in_memory("register-a");

        let first = cache
            .get_or_build(key.clone(), || {
                loads.set(loads.get() + 1);
                lines()
            })
            .unwrap();
        let second = cache
            .get_or_build(key, || {
                loads.set(loads.get() + 1);
                lines()
            })
            .unwrap();

        assert_eq!(loads.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_error_is_not_cached() {
        let cache = ModelCache::new();
        let key = SourceKey::in_memory("broken");
        let result = cache.get_or_build(key, || Err(crate::CapexError::Io("missing".into())));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_modified_file_replaces_entry_and_invalidate_removes_it() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        file.flush().unwrap();

        let cache = ModelCache::new();
        let key_a = SourceKey::from_path(file.path()).unwrap();
        cache.get_or_build(key_a.clone(), lines).unwrap();

        writeln!(file, "second, longer line").unwrap();
        file.flush().unwrap();
        let key_b = SourceKey::from_path(file.path()).unwrap();
        assert_ne!(key_a, key_b);

        cache.get_or_build(key_b, lines).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key_a).is_none());

        assert_eq!(cache.invalidate(file.path()), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_after_source_deleted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let file = dir.path().join("register.csv");
        fs::write(&file, "rows").unwrap();

        let cache = ModelCache::new();
        cache
            .get_or_build(SourceKey::from_path(&file).unwrap(), lines)
            .unwrap();
        fs::remove_file(&file).unwrap();

        // Non-canonical spelling of the deleted file
        let indirect = dir.path().join("sub").join("..").join("register.csv");
        assert_eq!(cache.invalidate(&indirect), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_exact_key() {
        let cache = ModelCache::new();
        let key = SourceKey::in_memory("a");
        cache.get_or_build(key.clone(), lines).unwrap();
        assert!(cache.remove(&key));
        assert!(!cache.remove(&key));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ModelCache::new();
        cache.get_or_build(SourceKey::in_memory("a"), lines).unwrap();
        cache.get_or_build(SourceKey::in_memory("b"), lines).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
