//! File-backed service binding handles.

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single materialized credential.
///
/// The entry only remembers where the credential lives. Every read goes back
/// to the file, so changes made on disk after resolution are observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Entry {
    path: PathBuf,
}

impl Entry {
    /// Wrap the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the credential as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or is not valid UTF-8.
    pub fn read_string(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .map_err(|e| Error::io_with_context("read", &self.path, e))
    }

    /// Read the raw credential bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| Error::io_with_context("read", &self.path, e))
    }
}

/// A resolved service binding: a directory holding one file per credential.
///
/// The directory is not owned by this value. Dropping a `Binding` leaves the
/// files in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Display name of the binding.
    pub name: String,
    /// Service type, taken from the binding's label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider, if the platform declared one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Binding directory (`<working_dir>/<binding_guid>`).
    pub path: PathBuf,
    /// Credential key -> file-backed entry.
    pub entries: BTreeMap<String, Entry>,
}

impl Binding {
    /// Look up an entry by credential key.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }
}
