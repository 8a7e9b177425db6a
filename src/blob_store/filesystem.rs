//! # Filesystem Backend
//!
//! One file per key directly under a root directory. Writes are staged in
//! `root/.hoarder-staging` and published with a rename, so readers see
//! either the previous complete blob or the new complete blob.
//!
//! Only regular files are blobs. Symlinks, directories, and other special
//! files under the root are reported as `NotFound` by every operation and
//! are never opened.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use super::backend::{copy_stream, BlobBackend, BlobReader};
use super::errors::{BlobError, BlobResult};
use super::info::BlobInfo;
use super::key::BlobKey;
use crate::observability::{log_event_with_fields, Event};

/// Directory under the root holding in-flight writes
pub const STAGING_DIR: &str = ".hoarder-staging";

/// Staged files younger than this are assumed to belong to a live writer
pub const DEFAULT_STAGING_GRACE: Duration = Duration::from_secs(60 * 60);

/// Filesystem driver options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsOptions {
    /// fsync staged data and the root directory around each publish
    pub fsync: bool,
    /// Minimum age of a staged file before opening the backend removes it
    pub staging_grace: Duration,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            fsync: true,
            staging_grace: DEFAULT_STAGING_GRACE,
        }
    }
}

/// Local filesystem blob backend
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
    staging: PathBuf,
    options: FsOptions,
}

impl FilesystemBackend {
    /// Open a backend rooted at `root` with default options
    pub fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        Self::open_with(root, FsOptions::default())
    }

    /// Open a backend rooted at `root`.
    ///
    /// Creates the root and staging directories and removes staged files
    /// left behind by writes that never published. Staged files younger
    /// than `options.staging_grace` are left alone, since another process
    /// sharing the root may still be writing them.
    pub fn open_with(root: impl Into<PathBuf>, options: FsOptions) -> BlobResult<Self> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);

        fs::create_dir_all(&staging).map_err(|e| {
            BlobError::medium(format_args!("creating storage root {}", root.display()), e)
        })?;

        let backend = Self {
            root,
            staging,
            options,
        };

        let swept = backend.sweep_staging()?;
        if swept > 0 {
            log_event_with_fields(
                Event::StagingSwept,
                &[
                    ("count", swept.to_string().as_str()),
                    ("root", backend.root.display().to_string().as_str()),
                ],
            );
        }

        Ok(backend)
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its file, applying the filesystem naming rules
    fn blob_path(&self, raw: &str) -> BlobResult<(BlobKey, PathBuf)> {
        let key = BlobKey::parse(raw)?;

        if raw.contains('/') || raw.contains('\\') {
            return Err(BlobError::invalid_key(raw, "key contains a path separator"));
        }

        if raw == "." || raw == ".." {
            return Err(BlobError::invalid_key(raw, "key is a relative path segment"));
        }

        if raw == STAGING_DIR {
            return Err(BlobError::invalid_key(raw, "key is reserved"));
        }

        let path = self.root.join(key.as_str());
        Ok((key, path))
    }

    fn sweep_staging(&self) -> BlobResult<usize> {
        let entries = fs::read_dir(&self.staging).map_err(|e| {
            BlobError::medium(format_args!("reading {}", self.staging.display()), e)
        })?;

        let now = SystemTime::now();
        let mut swept = 0;
        for entry in entries.flatten() {
            let abandoned = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .map(|modified| is_abandoned(now, modified, self.options.staging_grace))
                .unwrap_or(false);

            if abandoned && fs::remove_file(entry.path()).is_ok() {
                swept += 1;
            }
        }

        Ok(swept)
    }

    /// Metadata of the blob at `path` without following symlinks.
    ///
    /// Anything but a regular file is `NotFound`.
    fn blob_metadata(key: &BlobKey, path: &Path) -> BlobResult<fs::Metadata> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| BlobError::from_io(key.as_str(), e))?;

        if !metadata.file_type().is_file() {
            return Err(BlobError::NotFound(key.as_str().to_string()));
        }

        Ok(metadata)
    }

    fn sync_root(&self) -> BlobResult<()> {
        if !self.options.fsync {
            return Ok(());
        }
        fsync_dir(&self.root)
    }
}

impl BlobBackend for FilesystemBackend {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn write(&self, key: &str, source: &mut dyn Read) -> BlobResult<u64> {
        let (key, target) = self.blob_path(key)?;

        let mut staged = StagedFile::create(&self.staging)?;
        let written = copy_stream(key.as_str(), source, staged.file())?;

        if self.options.fsync {
            staged.file().sync_all().map_err(|e| {
                BlobError::medium(format_args!("fsync staged blob {:?}", key.as_str()), e)
            })?;
        }

        staged.publish(&target)?;
        self.sync_root()?;

        Ok(written)
    }

    fn read(&self, key: &str) -> BlobResult<BlobReader> {
        let (key, path) = self.blob_path(key)?;

        // Checked before opening so a FIFO or symlink is never opened.
        let expected = Self::blob_metadata(&key, &path)?;

        let file = File::open(&path).map_err(|e| BlobError::from_io(key.as_str(), e))?;
        let metadata = file
            .metadata()
            .map_err(|e| BlobError::from_io(key.as_str(), e))?;

        if !metadata.is_file() || !same_file(&expected, &metadata) {
            return Err(BlobError::NotFound(key.into_string()));
        }

        Ok(BlobReader::new(key.into_string(), metadata.len(), file))
    }

    fn stat(&self, key: &str) -> BlobResult<BlobInfo> {
        let (key, path) = self.blob_path(key)?;

        let metadata = Self::blob_metadata(&key, &path)?;

        let modified = metadata
            .modified()
            .map_err(|e| BlobError::from_io(key.as_str(), e))?;

        Ok(BlobInfo::from_system_time(key.into_string(), metadata.len(), modified))
    }

    fn remove(&self, key: &str) -> BlobResult<()> {
        let (key, path) = self.blob_path(key)?;

        Self::blob_metadata(&key, &path)?;

        fs::remove_file(&path).map_err(|e| BlobError::from_io(key.as_str(), e))?;
        self.sync_root()
    }

    fn list(&self) -> BlobResult<Vec<BlobInfo>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            BlobError::medium(format_args!("listing {}", self.root.display()), e)
        })?;

        let mut results = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| {
                BlobError::medium(format_args!("listing {}", self.root.display()), e)
            })?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };

            if self.blob_path(&name).is_err() {
                continue;
            }

            // Entries removed since read_dir are skipped, not reported.
            let metadata = match fs::symlink_metadata(entry.path()) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(BlobError::from_io(&name, e)),
            };

            if !metadata.file_type().is_file() {
                continue;
            }

            let modified = metadata
                .modified()
                .map_err(|e| BlobError::from_io(&name, e))?;
            results.push(BlobInfo::from_system_time(name, metadata.len(), modified));
        }

        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }
}

/// A staged file that is deleted on drop unless published
struct StagedFile {
    path: PathBuf,
    file: File,
    published: bool,
}

impl StagedFile {
    fn create(staging: &Path) -> BlobResult<Self> {
        let path = staging.join(format!("{}.tmp", Uuid::new_v4()));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| BlobError::medium(format_args!("creating {}", path.display()), e))?;

        Ok(Self {
            path,
            file,
            published: false,
        })
    }

    fn file(&mut self) -> &mut File {
        &mut self.file
    }

    /// Atomically move the staged file over `target`
    fn publish(mut self, target: &Path) -> BlobResult<()> {
        self.file
            .flush()
            .map_err(|e| BlobError::medium(format_args!("flushing {}", self.path.display()), e))?;

        fs::rename(&self.path, target).map_err(|e| {
            BlobError::medium(format_args!("publishing {}", target.display()), e)
        })?;

        self.published = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.published {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn is_abandoned(now: SystemTime, modified: SystemTime, grace: Duration) -> bool {
    // A timestamp in the future means a clock skew; treat it as live.
    now.duration_since(modified)
        .map(|age| age >= grace)
        .unwrap_or(false)
}

/// Whether the handle we opened is the entry we inspected
#[cfg(unix)]
fn same_file(expected: &fs::Metadata, opened: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    expected.dev() == opened.dev() && expected.ino() == opened.ino()
}

#[cfg(not(unix))]
fn same_file(_expected: &fs::Metadata, _opened: &fs::Metadata) -> bool {
    true
}

/// fsync a directory so a rename inside it is durable
#[cfg(unix)]
fn fsync_dir(path: &Path) -> BlobResult<()> {
    let dir = File::open(path)
        .map_err(|e| BlobError::medium(format_args!("opening {}", path.display()), e))?;

    dir.sync_all()
        .map_err(|e| BlobError::medium(format_args!("fsync directory {}", path.display()), e))
}

#[cfg(not(unix))]
fn fsync_dir(_path: &Path) -> BlobResult<()> {
    Ok(())
}
