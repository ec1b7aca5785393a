use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Outcome of loading a persisted value.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Found(T),
    Missing,
    Corrupted(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
}

/// Load/save seam for config and cache persistence.
pub trait Store<T> {
    fn load(&self) -> Result<Loaded<T>, StoreError>;
    fn save(&self, value: &T) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Store<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Loaded<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Loaded::Missing);
        }

        let payload = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        match serde_json::from_str::<T>(&payload) {
            Ok(value) => Ok(Loaded::Found(value)),
            Err(error) => Ok(Loaded::Corrupted(error.to_string())),
        }
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|error| StoreError::Encode {
            path: self.path.clone(),
            message: error.to_string(),
        })?;

        write_atomic(&self.path, &payload).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "store path must have a parent directory",
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
