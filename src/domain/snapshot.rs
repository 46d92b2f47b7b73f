//! Offline bundle of backend records, used by the CLI and by fixtures.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CategoryRecord, TransactionRecord, VendorRecord, VendorRule};
use crate::errors::EngineError;
use crate::utils::persistence::{load_snapshot_from_file, save_snapshot_to_file};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordSnapshot {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub vendors: Vec<VendorRecord>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub rules: Vec<VendorRule>,
}

impl RecordSnapshot {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        load_snapshot_from_file(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        save_snapshot_to_file(self, path)
    }
}
