//! File-backed registry of bundle entries.

use crate::error::{MacpackError, Result};
use crate::manifest::BundleManifest;
use crate::persistence::{atomic_read_json, atomic_write_json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A registered bundle.
///
/// `id` addresses the entry within a session; uniqueness is by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Absolute, normalized path to the bundle archive.
    pub path: PathBuf,
}

impl RegistryEntry {
    /// Create an entry with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            path: path.into(),
        }
    }

    /// Create an entry for a launched bundle from its manifest.
    pub fn from_manifest(manifest: &BundleManifest, path: impl Into<PathBuf>) -> Self {
        Self::new(
            manifest.name.clone(),
            manifest.description.clone(),
            path,
        )
    }
}

/// In-memory view of the registry file, in insertion order.
#[derive(Debug, Clone)]
pub struct Registry {
    store_path: PathBuf,
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// An empty registry that will persist to `store_path`.
    pub fn empty(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            entries: Vec::new(),
        }
    }

    /// Load the registry, reporting unreadable or corrupt files.
    ///
    /// A missing file is an empty registry, not an error. Other failures come
    /// back as [`MacpackError::RegistryPersistence`] so callers can warn the
    /// user before falling back to an empty registry.
    pub fn try_load(store_path: impl Into<PathBuf>) -> Result<Self> {
        let store_path = store_path.into();
        let entries: Vec<RegistryEntry> = atomic_read_json(&store_path)
            .map_err(|e| MacpackError::RegistryPersistence {
                path: store_path.clone(),
                message: format!("Failed to load registry: {}", e),
            })?
            .unwrap_or_default();

        debug!(
            "Loaded {} registry entries from {}",
            entries.len(),
            store_path.display()
        );

        let mut registry = Self::empty(store_path);
        for entry in entries {
            // A hand-edited file may repeat names; the first occurrence wins.
            if registry.find_by_name(&entry.name).is_some() {
                warn!("Dropping duplicate registry entry {} ({})", entry.name, entry.id);
                continue;
            }
            registry.entries.push(entry);
        }
        Ok(registry)
    }

    /// Load the registry, recovering silently to an empty one on failure.
    pub fn load(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        Self::try_load(store_path.clone()).unwrap_or_else(|e| {
            warn!("{}; starting with an empty registry", e);
            Self::empty(store_path)
        })
    }

    /// Overwrite the registry file with the current entries.
    pub fn save(&self) -> Result<()> {
        atomic_write_json(&self.store_path, &self.entries).map_err(|e| {
            MacpackError::RegistryPersistence {
                path: self.store_path.clone(),
                message: format!("Failed to save registry: {}", e),
            }
        })?;
        debug!(
            "Saved {} registry entries to {}",
            self.entries.len(),
            self.store_path.display()
        );
        Ok(())
    }

    /// Insert `entry` unless an entry with the same name exists.
    ///
    /// Returns whether an insertion occurred.
    pub fn upsert(&mut self, entry: RegistryEntry) -> bool {
        if self.find_by_name(&entry.name).is_some() {
            debug!("Registry already has an entry named {}", entry.name);
            return false;
        }
        info!("Registered {} at {}", entry.name, entry.path.display());
        self.entries.push(entry);
        true
    }

    /// Remove the entry with `id`. Unknown ids are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.take(id) {
            Some((_, entry)) => {
                info!("Removed registry entry {} ({})", entry.name, id);
                true
            }
            None => false,
        }
    }

    /// Remove the entry with `id`, returning it with its position.
    pub fn take(&mut self, id: &str) -> Option<(usize, RegistryEntry)> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some((index, self.entries.remove(index)))
    }

    /// Put back an entry removed by [`Registry::take`].
    ///
    /// Only for undoing a removal; name uniqueness is not rechecked.
    pub(crate) fn restore(&mut self, index: usize, entry: RegistryEntry) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Replace all entries with an earlier [`Registry::entries`] snapshot.
    pub(crate) fn reset(&mut self, entries: Vec<RegistryEntry>) {
        self.entries = entries;
    }

    /// Remove every entry for which `keep` returns false, returning them.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<RegistryEntry>
    where
        F: FnMut(&RegistryEntry) -> bool,
    {
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| keep(entry));
        self.entries = kept;
        dropped
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Exact, case-sensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, path: &str) -> RegistryEntry {
        RegistryEntry::new(name, format!("{} description", name), path)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::try_load(temp_dir.path().join("apps.txt")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_reported_then_recovered() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apps.txt");
        std::fs::write(&path, "{{{ not json").unwrap();

        let err = Registry::try_load(&path).unwrap_err();
        assert!(matches!(err, MacpackError::RegistryPersistence { .. }));
        assert!(err.is_recoverable());

        let registry = Registry::load(&path);
        assert!(registry.is_empty());
        assert_eq!(registry.store_path(), path.as_path());
    }

    #[test]
    fn test_upsert_dedups_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::empty(temp_dir.path().join("apps.txt"));

        assert!(registry.upsert(entry("Foo", "/a/foo.mpb")));
        assert!(!registry.upsert(entry("Foo", "/b/foo.mpb")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].path, PathBuf::from("/a/foo.mpb"));
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::empty(temp_dir.path().join("apps.txt"));

        assert!(registry.upsert(entry("Foo", "/a/foo.mpb")));
        assert!(registry.upsert(entry("foo", "/a/foo2.mpb")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apps.txt");
        let mut registry = Registry::empty(&path);
        for name in ["Zeta", "Alpha", "Mid"] {
            registry.upsert(entry(name, "/x.mpb"));
        }
        registry.save().unwrap();

        let loaded = Registry::try_load(&path).unwrap();
        let names: Vec<_> = loaded.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::empty(temp_dir.path().join("apps.txt"));
        let foo = entry("Foo", "/a/foo.mpb");
        let id = foo.id.clone();
        registry.upsert(foo);
        registry.upsert(entry("Bar", "/a/bar.mpb"));

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(!registry.remove("no-such-id"));

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&id).is_none());
        assert!(registry.find_by_name("Bar").is_some());
    }

    #[test]
    fn test_save_load_round_trip_stabilizes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apps.txt");
        let mut registry = Registry::empty(&path);
        registry.upsert(entry("Foo", "/a/foo.mpb"));
        registry.upsert(entry("Bar", "/a/bar.mpb"));
        registry.save().unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        Registry::try_load(&path).unwrap().save().unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        Registry::try_load(&path).unwrap().save().unwrap();
        let third = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_persisted_format_is_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apps.txt");
        let mut registry = Registry::empty(&path);
        let foo = RegistryEntry {
            id: "6f1d2c3e-0000-4000-8000-000000000001".to_string(),
            name: "Foo".to_string(),
            description: "No description provided.".to_string(),
            path: PathBuf::from("/bundles/foo.mpb"),
        };
        registry.upsert(foo.clone());
        registry.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([{
                "id": "6f1d2c3e-0000-4000-8000-000000000001",
                "name": "Foo",
                "description": "No description provided.",
                "path": "/bundles/foo.mpb"
            }])
        );

        let loaded = Registry::try_load(&path).unwrap();
        assert_eq!(loaded.entries(), &[foo]);
    }

    #[test]
    fn test_duplicate_names_in_file_keep_first() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apps.txt");
        std::fs::write(
            &path,
            r#"[
                {"id": "1", "name": "Foo", "description": "d", "path": "/a/foo.mpb"},
                {"id": "2", "name": "Foo", "description": "d", "path": "/b/foo.mpb"}
            ]"#,
        )
        .unwrap();

        let registry = Registry::try_load(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].id, "1");
    }

    #[test]
    fn test_retain_returns_dropped_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::empty(temp_dir.path().join("apps.txt"));
        registry.upsert(entry("Keep", "/keep.mpb"));
        registry.upsert(entry("Drop", "/drop.mpb"));

        let dropped = registry.retain(|e| e.name == "Keep");

        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].name, "Drop");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_take_and_restore_keep_position() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::empty(temp_dir.path().join("apps.txt"));
        for name in ["A", "B", "C"] {
            registry.upsert(entry(name, "/x.mpb"));
        }
        let id = registry.find_by_name("B").unwrap().id.clone();

        let (index, taken) = registry.take(&id).unwrap();
        assert_eq!(index, 1);
        assert!(registry.take(&id).is_none());

        registry.restore(index, taken);
        let names: Vec<_> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = entry("A", "/a.mpb");
        let b = entry("B", "/b.mpb");
        assert_ne!(a.id, b.id);
    }
}
