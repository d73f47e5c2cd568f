use std::{
    fs,
    path::{Path, PathBuf},
};

use fxhash::FxHashMap;
use serde::Deserialize;

use crate::error::StorageError;

use super::{DEFAULT_SEGMENT_SIZE, DataAccess, DataAccessKind};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: DataAccessKind,
    pub segment_size: usize,
    /// Per data access overrides, e.g. `{ "landmarks_car": "mmap" }`
    pub kinds: FxHashMap<String, DataAccessKind>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: DataAccessKind::RamStore,
            segment_size: DEFAULT_SEGMENT_SIZE,
            kinds: FxHashMap::default(),
        }
    }
}

/// Location of a graph on disk and the factory of its data accesses
#[derive(Clone)]
pub struct GraphDirectory {
    location: Option<PathBuf>,
    config: StorageConfig,
}

impl GraphDirectory {
    /// Directory that keeps everything in memory
    pub fn in_memory() -> Self {
        Self::in_memory_with_segment_size(DEFAULT_SEGMENT_SIZE)
    }

    pub fn in_memory_with_segment_size(segment_size: usize) -> Self {
        Self {
            location: None,
            config: StorageConfig {
                kind: DataAccessKind::Ram,
                segment_size,
                kinds: FxHashMap::default(),
            },
        }
    }

    pub fn new<P: AsRef<Path>>(location: P, config: StorageConfig) -> Self {
        Self {
            location: Some(location.as_ref().to_path_buf()),
            config,
        }
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn default_kind(&self) -> DataAccessKind {
        self.config.kind
    }

    pub fn file_path(&self, name: &str) -> Option<PathBuf> {
        self.location.as_ref().map(|location| location.join(name))
    }

    pub fn create(&self, name: &str) -> Result<DataAccess, StorageError> {
        let kind = self
            .config
            .kinds
            .get(name)
            .copied()
            .unwrap_or(self.config.kind);
        self.create_with_kind(name, kind)
    }

    pub fn create_with_kind(
        &self,
        name: &str,
        kind: DataAccessKind,
    ) -> Result<DataAccess, StorageError> {
        if let Some(location) = &self.location {
            fs::create_dir_all(location)?;
        }

        DataAccess::new(name, self.file_path(name), kind, self.config.segment_size)
    }

    /// Writes a small side file next to the data accesses
    pub(crate) fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        match self.file_path(name) {
            Some(path) => {
                if let Some(location) = &self.location {
                    fs::create_dir_all(location)?;
                }
                fs::write(path, bytes)?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn read_file(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.file_path(name) {
            Some(path) if path.exists() => Ok(Some(fs::read(path)?)),
            _ => Ok(None),
        }
    }
}
