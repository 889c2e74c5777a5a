//! Write-once file store shared by every task of a run.
//!
//! Tasks never hand each other paths directly: they write their outputs into the
//! store and pass the returned [`FileId`]. A handle is assigned exactly once and the
//! file behind it is never rewritten, so concurrent readers need no coordination
//! beyond the lookup table lock.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tempfile::TempDir;
use tracing::{debug, info};

use crate::core::error::SplitError;
use crate::utils::location::Location;

/// Handle to a file in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct StoredFile {
    path: PathBuf,
    name: String,
    size: u64,
}

pub struct FileStore {
    root: TempDir,
    next_id: AtomicU64,
    files: RwLock<HashMap<FileId, StoredFile>>,
}

impl FileStore {
    /// Create a store in the system temporary directory
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn new() -> std::io::Result<Self> {
        Self::with_root(tempfile::Builder::new().prefix("chrom-split-").tempdir()?)
    }

    /// Create a store under `dir`
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn new_in(dir: &Path) -> std::io::Result<Self> {
        let dir = absolute(dir)?;
        std::fs::create_dir_all(&dir)?;
        Self::with_root(
            tempfile::Builder::new()
                .prefix("chrom-split-")
                .tempdir_in(dir)?,
        )
    }

    fn with_root(root: TempDir) -> std::io::Result<Self> {
        std::fs::create_dir_all(root.path().join("files"))?;
        debug!("File store at {}", root.path().display());
        Ok(Self {
            root,
            next_id: AtomicU64::new(0),
            files: RwLock::new(HashMap::new()),
        })
    }

    /// A fresh scratch directory for one task; removed when dropped
    ///
    /// # Errors
    ///
    /// Returns an IO error if the directory cannot be created.
    pub fn scratch_dir(&self, prefix: &str) -> std::io::Result<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(self.root.path())
    }

    fn allocate(&self) -> FileId {
        FileId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, id: FileId, path: PathBuf, name: String) -> Result<FileId, SplitError> {
        let size = std::fs::metadata(&path)?.len();
        let mut files = self
            .files
            .write()
            .map_err(|_| SplitError::consistency("file store lock poisoned"))?;
        files.insert(id, StoredFile { path, name, size });
        Ok(id)
    }

    /// Register an existing local file without copying it. The caller must not
    /// modify it for the rest of the run. A relative path is stored resolved
    /// against the current directory.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Io` if the file does not exist.
    pub fn register(&self, path: &Path) -> Result<FileId, SplitError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.insert(self.allocate(), absolute(path)?, name)
    }

    /// Bring an input into the store: local files are registered in place, remote
    /// files are downloaded.
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Io` if a local file is missing, or
    /// `SplitError::Remote` if a download fails.
    pub fn import(&self, location: &Location) -> Result<FileId, SplitError> {
        match location {
            Location::Local(path) => self.register(path),
            Location::Remote(url) => {
                let name = location.file_name().unwrap_or_else(|| "download".to_string());
                info!("Downloading {url}");
                let mut response = reqwest::blocking::get(url)?.error_for_status()?;
                let scratch = self.scratch_dir("import-")?;
                let path = scratch.path().join(&name);
                let mut file = File::create(&path)?;
                response.copy_to(&mut file)?;
                drop(file);
                self.write_file(&path, &name)
            }
        }
    }

    /// Move a task output into the store under a new handle
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Io` if the file cannot be moved.
    pub fn write_file(&self, path: &Path, name: &str) -> Result<FileId, SplitError> {
        let id = self.allocate();
        let dest = self
            .root
            .path()
            .join("files")
            .join(format!("{}-{}", id.0, base_name(name)));
        // rename fails across filesystems; fall back to a copy
        if std::fs::rename(path, &dest).is_err() {
            std::fs::copy(path, &dest)?;
        }
        self.insert(id, dest, name.to_string())
    }

    fn get(&self, id: FileId) -> Result<StoredFile, SplitError> {
        let files = self
            .files
            .read()
            .map_err(|_| SplitError::consistency("file store lock poisoned"))?;
        files
            .get(&id)
            .cloned()
            .ok_or_else(|| SplitError::consistency(format!("unknown {id}")))
    }

    /// Read-only path of a stored file
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the handle is unknown.
    pub fn path(&self, id: FileId) -> Result<PathBuf, SplitError> {
        Ok(self.get(id)?.path)
    }

    /// Name the file was stored under
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the handle is unknown.
    pub fn name(&self, id: FileId) -> Result<String, SplitError> {
        Ok(self.get(id)?.name)
    }

    /// Size in bytes, captured when the file was stored
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the handle is unknown.
    pub fn size(&self, id: FileId) -> Result<u64, SplitError> {
        Ok(self.get(id)?.size)
    }

    /// Copy a stored file to `dest`
    ///
    /// # Errors
    ///
    /// Returns `SplitError::Consistency` if the handle is unknown or
    /// `SplitError::Io` if the copy fails.
    pub fn read_file(&self, id: FileId, dest: &Path) -> Result<(), SplitError> {
        std::fs::copy(self.path(id)?, dest)?;
        Ok(())
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Keep stored file names to their final component
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_register_in_place() {
        let store = FileStore::new().unwrap();
        let mut temp = tempfile::NamedTempFile::with_suffix(".fa.gz").unwrap();
        temp.write_all(b"ACGT").unwrap();
        temp.flush().unwrap();

        let id = store.register(temp.path()).unwrap();
        assert_eq!(store.path(id).unwrap(), temp.path());
        assert_eq!(store.size(id).unwrap(), 4);
        assert!(store.name(id).unwrap().ends_with(".fa.gz"));
    }

    #[test]
    fn test_register_relative_path_is_absolute() {
        let store = FileStore::new().unwrap();
        let id = store.register(Path::new("Cargo.toml")).unwrap();
        let path = store.path(id).unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, std::env::current_dir().unwrap().join("Cargo.toml"));
        assert_eq!(store.size(id).unwrap(), std::fs::metadata("Cargo.toml").unwrap().len());
    }

    #[test]
    fn test_write_file_moves_into_store() {
        let store = FileStore::new().unwrap();
        let scratch = store.scratch_dir("task-").unwrap();
        let path = scratch.path().join("out.paf");
        std::fs::write(&path, "line\n").unwrap();

        let id = store.write_file(&path, "out.paf").unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read_to_string(store.path(id).unwrap()).unwrap(), "line\n");

        let copy = scratch.path().join("copy.paf");
        store.read_file(id, &copy).unwrap();
        assert_eq!(std::fs::read_to_string(copy).unwrap(), "line\n");
    }

    #[test]
    fn test_handles_are_unique() {
        let store = FileStore::new().unwrap();
        let scratch = store.scratch_dir("task-").unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            let path = scratch.path().join("same-name.txt");
            std::fs::write(&path, format!("{i}")).unwrap();
            ids.push(store.write_file(&path, "same-name.txt").unwrap());
        }
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(std::fs::read_to_string(store.path(*id).unwrap()).unwrap(), format!("{i}"));
        }
    }

    #[test]
    fn test_unknown_handle() {
        let store = FileStore::new().unwrap();
        assert!(matches!(
            store.path(FileId(42)),
            Err(SplitError::Consistency(_))
        ));
    }
}
