//! Rooted local filesystem backend.

use crate::backend::{ReadSeek, StorageBackend, StoreError, StoreResult};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Storage backend rooted at a local directory.
///
/// Logical paths (`/dir/file`) resolve under the root; traversal out of the
/// root is rejected. Storage-policy and cache state are bookkeeping maps -
/// the local filesystem has no tiers, but the engine contract is exercised
/// the same way a cluster backend would be.
pub struct LocalBackend {
    root: PathBuf,
    ready: AtomicBool,
    policies: RwLock<HashMap<String, String>>,
    cached: RwLock<HashSet<String>>,
}

impl LocalBackend {
    /// Create a backend rooted at `root`, creating the directory if needed.
    ///
    /// The backend starts ready; use [`LocalBackend::set_ready`] to model a
    /// cluster still in its startup phase.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            ready: AtomicBool::new(true),
            policies: RwLock::new(HashMap::new()),
            cached: RwLock::new(HashSet::new()),
        })
    }

    /// Flip the readiness signal the safe-mode controller watches
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Root directory of this backend
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> StoreResult<PathBuf> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
            });
        }
        let rel = Path::new(trimmed);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(StoreError::InvalidPath {
                        path: path.to_string(),
                    });
                }
            }
        }
        Ok(self.root.join(rel))
    }

    fn resolve_existing(&self, path: &str) -> StoreResult<PathBuf> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(full)
    }
}

impl StorageBackend for LocalBackend {
    fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }

    fn len(&self, path: &str) -> StoreResult<u64> {
        let full = self.resolve_existing(path)?;
        Ok(fs::metadata(full)?.len())
    }

    fn open(&self, path: &str) -> StoreResult<Box<dyn ReadSeek>> {
        let full = self.resolve_existing(path)?;
        Ok(Box::new(File::open(full)?))
    }

    fn create(&self, path: &str) -> StoreResult<Box<dyn Write + Send>> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(File::create(full)?))
    }

    fn rename(&self, from: &str, to: &str) -> StoreResult<()> {
        let src = self.resolve_existing(from)?;
        let dst = self.resolve(to)?;
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        // Same filesystem under one root, so this is the atomic replace the
        // temp-file-then-rename discipline relies on.
        fs::rename(src, dst)?;
        tracing::debug!(from, to, "renamed");
        Ok(())
    }

    fn delete(&self, path: &str) -> StoreResult<()> {
        let full = self.resolve_existing(path)?;
        fs::remove_file(full)?;
        self.policies.write().unwrap().remove(path);
        self.cached.write().unwrap().remove(path);
        Ok(())
    }

    fn set_storage_policy(&self, path: &str, policy: &str) -> StoreResult<()> {
        self.resolve_existing(path)?;
        self.policies
            .write()
            .unwrap()
            .insert(path.to_string(), policy.to_string());
        tracing::debug!(path, policy, "storage policy set");
        Ok(())
    }

    fn storage_policy(&self, path: &str) -> StoreResult<Option<String>> {
        Ok(self.policies.read().unwrap().get(path).cloned())
    }

    fn cache(&self, path: &str) -> StoreResult<()> {
        self.resolve_existing(path)?;
        self.cached.write().unwrap().insert(path.to_string());
        Ok(())
    }

    fn uncache(&self, path: &str) -> StoreResult<()> {
        self.cached.write().unwrap().remove(path);
        Ok(())
    }

    fn is_cached(&self, path: &str) -> StoreResult<bool> {
        Ok(self.cached.read().unwrap().contains(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let be = LocalBackend::new(dir.path().join("fs")).unwrap();
        (dir, be)
    }

    fn write_file(be: &LocalBackend, path: &str, data: &[u8]) {
        let mut w = be.create(path).unwrap();
        w.write_all(data).unwrap();
    }

    #[test]
    fn test_create_and_read_back() {
        let (_dir, be) = backend();
        write_file(&be, "/a/b.txt", b"hello");

        assert!(be.exists("/a/b.txt").unwrap());
        assert_eq!(be.len("/a/b.txt").unwrap(), 5);

        let mut buf = Vec::new();
        be.open("/a/b.txt").unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_open_missing_is_not_found() {
        let (_dir, be) = backend();
        let err = be.open("/missing").err().unwrap();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_rename_replaces_destination() {
        let (_dir, be) = backend();
        write_file(&be, "/old", b"new content");
        write_file(&be, "/target", b"stale");

        be.rename("/old", "/target").unwrap();

        assert!(!be.exists("/old").unwrap());
        let mut buf = Vec::new();
        be.open("/target").unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"new content");
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, be) = backend();
        assert!(matches!(
            be.exists("/../outside"),
            Err(StoreError::InvalidPath { .. })
        ));
        assert!(matches!(
            be.exists("/"),
            Err(StoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_storage_policy_bookkeeping() {
        let (_dir, be) = backend();
        write_file(&be, "/f", b"x");

        assert_eq!(be.storage_policy("/f").unwrap(), None);
        be.set_storage_policy("/f", "COLD").unwrap();
        assert_eq!(be.storage_policy("/f").unwrap().as_deref(), Some("COLD"));

        be.delete("/f").unwrap();
        assert_eq!(be.storage_policy("/f").unwrap(), None);
    }

    #[test]
    fn test_policy_requires_existing_file() {
        let (_dir, be) = backend();
        assert!(matches!(
            be.set_storage_policy("/nope", "COLD"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_cache_pin_unpin() {
        let (_dir, be) = backend();
        write_file(&be, "/f", b"x");

        assert!(!be.is_cached("/f").unwrap());
        be.cache("/f").unwrap();
        assert!(be.is_cached("/f").unwrap());
        be.uncache("/f").unwrap();
        assert!(!be.is_cached("/f").unwrap());
    }

    #[test]
    fn test_readiness_toggle() {
        let (_dir, be) = backend();
        assert!(be.ready());
        be.set_ready(false);
        assert!(!be.ready());
    }
}
