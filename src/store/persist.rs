//! Reading and writing the device configuration file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tokio::fs;

use crate::store::model::PersistedConfig;

/// Error type for configuration file access.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("active mode '{0}' is not valid")]
    InvalidMode(String),
}

/// Modification time of the file, or `None` if it does not exist.
pub async fn modified_time(path: &Path) -> Result<Option<SystemTime>, StoreError> {
    match fs::metadata(path).await {
        Ok(meta) => meta.modified().map(Some).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read and parse the configuration file.
pub async fn read_config(path: &Path) -> Result<PersistedConfig, StoreError> {
    let content = fs::read(path).await.map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the configuration file and return its new modification time.
///
/// Content goes to a sibling temp file that is then renamed over the target,
/// so readers see either the old file or the complete new one. The returned
/// time is taken from the temp file before the rename, so it always belongs
/// to this write.
pub async fn write_config(path: &Path, config: &PersistedConfig) -> Result<SystemTime, StoreError> {
    let mut content = serde_json::to_vec_pretty(config)?;
    content.push(b'\n');

    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp = temp_path(path);
    let staged = async {
        fs::write(&tmp, &content).await?;
        fs::metadata(&tmp).await?.modified()
    };
    let modified = match staged.await {
        Ok(modified) => modified,
        Err(source) => {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(source));
        }
    };
    // The rename keeps the temp file's mtime, and the target may be
    // rewritten by someone else as soon as it exists.
    if let Err(source) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(write_err(source));
    }

    Ok(modified)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
