//! Caller-owned cache of opened logs, keyed by canonical path.
//!
//! Plotting and inspection code tends to reopen the same file repeatedly.
//! A [`LogCache`] keeps each opened log until the owner invalidates it,
//! for example after another tool rewrote the file.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::format::{FormatRegistry, LogFormat};

#[derive(Default)]
pub struct LogCache {
    entries: HashMap<PathBuf, Box<dyn LogFormat>>,
}

impl LogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached log for `path`, opening it through `registry` on a miss.
    pub fn get_or_open(
        &mut self,
        path: &Path,
        registry: &FormatRegistry,
    ) -> Result<&mut Box<dyn LogFormat>> {
        let key = cache_key(path);
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                tracing::debug!(path = %entry.key().display(), "Log cache hit");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                tracing::debug!(path = %entry.key().display(), "Log cache miss");
                let log = registry.open(entry.key())?;
                Ok(entry.insert(log))
            }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&cache_key(path))
    }

    /// Forget `path`. Returns whether an entry was removed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(&cache_key(path)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical path of `path`. A path that does not exist itself (such as the
/// base name of a multi-file log) is keyed by its canonical parent directory.
fn cache_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    parent
        .canonicalize()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::error::ModelError;
    use crate::log_file::LogFile;

    fn sniff_any(path: &Path) -> Option<Result<Box<dyn LogFormat>>> {
        let log = LogFile::new(path).with_channel(Channel::new("DEPTH", "m"));
        Some(Ok(Box::new(log)))
    }

    #[test]
    fn test_same_instance_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"x").unwrap();

        let mut registry = FormatRegistry::new();
        registry.register("any", sniff_any);
        let mut cache = LogCache::new();

        cache
            .get_or_open(&path, &registry)
            .unwrap()
            .log_mut()
            .set_constant("MARK", "1");

        // A different spelling of the same path hits the same entry.
        let dotted = dir.path().join(".").join("a.log");
        let again = cache.get_or_open(&dotted, &registry).unwrap();
        assert_eq!(again.log().constant("MARK").unwrap().value, "1");
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&path));
        assert!(!cache.contains(&path));
        let fresh = cache.get_or_open(&path, &registry).unwrap();
        assert!(fresh.log().constant("MARK").is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FormatRegistry::new();
        let mut cache = LogCache::new();
        assert!(matches!(
            cache.get_or_open(&dir.path().join("nope"), &registry),
            Err(ModelError::NotFound { .. })
        ));
        assert!(cache.is_empty());
        cache.clear();
    }
}
