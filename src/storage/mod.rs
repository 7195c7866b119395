//! Model storage module
//!
//! The storage directory is the only state the server has: listing, serving
//! and deleting all read the directory directly, there is no index.

mod error;
pub mod naming;

pub use error::{StorageError, StorageResult};

use crate::config::StorageConfig;
use crate::logger;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File contents plus what the HTTP layer needs for cache validation
#[derive(Debug)]
pub struct StoredModel {
    pub name: String,
    pub data: Vec<u8>,
    pub modified: Option<SystemTime>,
}

/// Filesystem-backed model store
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
    max_upload_size: u64,
    allowed_extensions: Vec<String>,
}

impl ModelStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.dir),
            max_upload_size: config.max_upload_size,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Whether a name carries one of the accepted model extensions
    pub fn is_model_file(&self, name: &str) -> bool {
        naming::has_allowed_extension(name, &self.allowed_extensions)
    }

    /// Create the storage directory if it does not exist yet
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(StorageError::Prepare)
    }

    /// Names of all model files currently in the storage directory
    ///
    /// Order follows directory enumeration and is not sorted.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        self.ensure_dir().await?;

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(StorageError::ReadDir)?;
        let mut models = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(StorageError::ReadDir)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.is_model_file(&name) {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => continue,
                Ok(_) => {}
                Err(e) => return Err(StorageError::ReadDir(e)),
            }
            models.push(name);
        }

        Ok(models)
    }

    /// Start writing an upload under a fresh timestamped name
    ///
    /// The extension is checked before anything touches the disk.
    pub async fn begin_upload(&self, original_name: &str) -> StorageResult<PendingUpload> {
        if !self.is_model_file(original_name) {
            return Err(StorageError::InvalidExtension(original_name.to_string()));
        }

        self.ensure_dir().await?;

        let filename =
            naming::timestamped_name(original_name, chrono::Utc::now().timestamp_millis());
        let final_path = self.root.join(&filename);
        let temp_path = self.root.join(format!(".{filename}.part"));
        let file = fs::File::create(&temp_path)
            .await
            .map_err(StorageError::Write)?;

        Ok(PendingUpload {
            file,
            temp: TempFile::new(temp_path),
            final_path,
            filename,
            written: 0,
            limit: self.max_upload_size,
        })
    }

    /// Read a stored file addressed by a raw URL path segment
    pub async fn read(&self, raw_name: &str) -> StorageResult<StoredModel> {
        let (name, path) = self.resolve(raw_name)?;

        let canonical = match fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(name)),
            Err(e) => return Err(StorageError::Read(e)),
        };
        let root = fs::canonicalize(&self.root).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(name.clone())
            } else {
                StorageError::Read(e)
            }
        })?;
        if !canonical.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {raw_name} -> {}",
                canonical.display()
            ));
            return Err(StorageError::InvalidName(name));
        }

        let metadata = fs::metadata(&canonical).await.map_err(StorageError::Read)?;
        if !metadata.is_file() {
            return Err(StorageError::NotFound(name));
        }

        let data = match fs::read(&canonical).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(name)),
            Err(e) => return Err(StorageError::Read(e)),
        };

        Ok(StoredModel {
            name,
            data,
            modified: metadata.modified().ok(),
        })
    }

    /// Delete a stored file addressed by a raw URL path segment
    pub async fn delete(&self, raw_name: &str) -> StorageResult<()> {
        let (name, path) = self.resolve(raw_name)?;

        match fs::symlink_metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(name)),
            Err(e) => return Err(StorageError::Delete(e)),
        }

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Lost a race with another delete
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name)),
            Err(e) => Err(StorageError::Delete(e)),
        }
    }

    /// Decode and validate a path segment, then join it onto the root
    fn resolve(&self, raw_name: &str) -> StorageResult<(String, PathBuf)> {
        let name = naming::decode_path_segment(raw_name)?;
        let path = self.root.join(&name);
        Ok((name, path))
    }
}

/// An upload being streamed to a hidden temporary file
///
/// Nothing becomes visible under the final name until [`PendingUpload::commit`].
///
/// Dropping it before then (a cancelled request, a connection timeout)
/// removes the temporary file.
#[derive(Debug)]
pub struct PendingUpload {
    // Declared before `temp` so the handle is closed before the file is removed
    file: fs::File,
    temp: TempFile,
    final_path: PathBuf,
    filename: String,
    written: u64,
    limit: u64,
}

impl PendingUpload {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Append a chunk, failing once the running total passes the limit
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        let len = u64::try_from(chunk.len()).unwrap_or(u64::MAX);
        let total = self.written.saturating_add(len);
        if total > self.limit {
            return Err(StorageError::TooLarge { limit: self.limit });
        }

        self.file
            .write_all(chunk)
            .await
            .map_err(StorageError::Write)?;
        self.written = total;
        Ok(())
    }

    /// Flush and move the file to its final name, returning that name
    pub async fn commit(mut self) -> StorageResult<String> {
        if let Err(e) = self.file.flush().await {
            self.abort().await;
            return Err(StorageError::Write(e));
        }

        match fs::rename(&self.temp.path, &self.final_path).await {
            Ok(()) => {
                self.temp.disarm();
                Ok(self.filename)
            }
            Err(e) => {
                self.abort().await;
                Err(StorageError::Write(e))
            }
        }
    }

    /// Discard the partial upload
    pub async fn abort(self) {
        let Self { file, mut temp, .. } = self;
        drop(file);

        let result = fs::remove_file(&temp.path).await;
        log_removal(&temp.path, result);
        temp.disarm();
    }
}

/// Temporary upload file, removed on drop unless disarmed
#[derive(Debug)]
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    const fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            log_removal(&self.path, std::fs::remove_file(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => logger::log_error(&format!(
            "Failed to remove partial upload '{}': {e}",
            path.display()
        )),
    }
}
