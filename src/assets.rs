//! Asset Set
//!
//! Raw bytes per role, filled in by the caller before a run. A role whose file
//! could not be found is recorded as absent.

use std::collections::BTreeMap;

use crate::config::AssetRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: String,
    pub bytes: Option<Vec<u8>>,
}

impl AssetEntry {
    pub fn exists(&self) -> bool {
        self.bytes.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    entries: BTreeMap<AssetRole, AssetEntry>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, role: AssetRole, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(role, path, Some(bytes));
        self
    }

    pub fn with_missing(mut self, role: AssetRole, path: impl Into<String>) -> Self {
        self.insert(role, path, None);
        self
    }

    pub fn insert(&mut self, role: AssetRole, path: impl Into<String>, bytes: Option<Vec<u8>>) {
        self.entries.insert(
            role,
            AssetEntry {
                path: path.into(),
                bytes,
            },
        );
    }

    pub fn get(&self, role: AssetRole) -> Option<&AssetEntry> {
        self.entries.get(&role)
    }

    /// Path recorded for `role`, or its default file name when never inserted.
    pub fn path_for(&self, role: AssetRole) -> String {
        self.get(role)
            .map(|entry| entry.path.clone())
            .unwrap_or_else(|| role.default_file_name().to_string())
    }

    pub fn bytes(&self, role: AssetRole) -> Option<&[u8]> {
        self.get(role).and_then(|entry| entry.bytes.as_deref())
    }
}
