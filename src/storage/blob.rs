// LibraDesk - Library Management Core
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Keyed JSON blob persistence
//!
//! The durable state of the application is a small set of independently keyed
//! JSON blobs in one directory, one file per key (`<key>.json`). Every write
//! replaces the entire blob; there is no partial or incremental persistence
//! and no schema versioning.
//!
//! Writes go through a temp file in the same directory followed by a rename,
//! so a crash mid-write leaves the previous blob intact.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory-backed store of whole-replace JSON blobs
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Open a blob store rooted at `dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the blob files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and deserialize the blob for `key`
    ///
    /// Returns `Ok(None)` if the blob has never been written.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.blob_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "no blob on disk");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&bytes)?;
        debug!(key, bytes = bytes.len(), "loaded blob");
        Ok(Some(value))
    }

    /// Serialize `value` and replace the blob for `key`
    ///
    /// Atomic replace: write to a temp file in the same directory, then rename
    /// over the target.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.blob_path(key);
        let temp_path = self.dir.join(format!(".{key}.json.tmp"));

        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&temp_path, &bytes)?;
        fs::rename(&temp_path, &path)?;

        debug!(key, bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}
