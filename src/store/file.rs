use crate::{
    error::{AppResult, ErrorReason},
    types::{NodeIdentity, Slot},
};
use std::{
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult, Write},
    path::{Path, PathBuf},
};
use tempfile::Builder as TempFileBuilder;

const PROBE_CONTENT: &[u8] = b"cert-cacher probe\n";
const UPLOAD_PREFIX: &str = ".upload-";

/// Directory backend keeping `<identity>.cert` and `<identity>.key` files.
///
/// Every write goes to a temporary file in the same directory which is
/// closed and then renamed over the final name, so a reader sees either the
/// previous content or the new one in full.
#[derive(Clone, Debug)]
pub struct FileBackend {
    directory: PathBuf,
}

impl FileBackend {
    pub fn new<P>(directory: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, identity: &NodeIdentity, slot: Slot) -> PathBuf {
        self.directory.join(format!("{identity}.{slot}"))
    }

    pub async fn init(&self) -> AppResult<()> {
        let directory = self.directory.clone();
        let removed = tokio::task::spawn_blocking(move || {
            probe_directory(&directory)?;
            remove_stale_uploads(&directory)
        })
        .await
        .map_err(IoError::from)??;
        if removed > 0 {
            info!(
                "Removed {} unfinished uploads from {}",
                removed,
                self.directory.display()
            );
        }
        debug!("Storage directory {} is usable", self.directory.display());
        Ok(())
    }

    pub async fn get(&self, identity: &NodeIdentity, slot: Slot) -> Option<String> {
        let path = self.path_for(identity, slot);
        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => Some(blob),
            Err(e) if e.kind() == IoErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    pub async fn upsert(&self, identity: &NodeIdentity, blob: String, slot: Slot) -> AppResult<()> {
        let directory = self.directory.clone();
        let path = self.path_for(identity, slot);

        let result = tokio::task::spawn_blocking(move || {
            write_atomically(&directory, &path, blob.as_bytes())
        })
        .await
        .map_err(IoError::from)
        .and_then(|result| result);

        result.map_err(|source| {
            error!("Failed to persist the {} for {}: {}", slot, identity, source);
            ErrorReason::Persistence {
                slot,
                identity: identity.clone(),
                source,
            }
            .into()
        })
    }
}

fn probe_directory(directory: &Path) -> IoResult<()> {
    std::fs::create_dir_all(directory)?;

    let mut probe = TempFileBuilder::new()
        .prefix(".probe-")
        .tempfile_in(directory)?;
    probe.write_all(PROBE_CONTENT)?;
    probe.flush()?;

    let read_back = std::fs::read(probe.path())?;
    if read_back != PROBE_CONTENT {
        return Err(IoError::new(
            IoErrorKind::InvalidData,
            format!("probe file in {} read back different content", directory.display()),
        ));
    }

    Ok(())
}

/// Deletes temporary files left behind by writes that never reached the
/// rename, returning how many were removed.
fn remove_stale_uploads(directory: &Path) -> IoResult<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let is_upload = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(UPLOAD_PREFIX));
        if !is_upload || !entry.file_type()?.is_file() {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove {}: {}", entry.path().display(), e),
        }
    }
    Ok(removed)
}

fn write_atomically(directory: &Path, target: &Path, content: &[u8]) -> IoResult<()> {
    let mut temp = TempFileBuilder::new()
        .prefix(UPLOAD_PREFIX)
        .tempfile_in(directory)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    // Closes the handle; the file is removed if the rename fails.
    let temp_path = temp.into_temp_path();
    temp_path.persist(target).map_err(|e| e.error)
}
