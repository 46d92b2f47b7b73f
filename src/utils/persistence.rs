use std::{fs, path::Path};

use crate::{domain::RecordSnapshot, errors::EngineError};

/// Writes a record snapshot to disk atomically by staging to a temporary file.
pub fn save_snapshot_to_file(snapshot: &RecordSnapshot, path: &Path) -> Result<(), EngineError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(&tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Loads a record snapshot from disk.
pub fn load_snapshot_from_file(path: &Path) -> Result<RecordSnapshot, EngineError> {
    let data = fs::read_to_string(path)
        .map_err(|err| EngineError::Config(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&data)
        .map_err(|err| EngineError::Config(format!("{}: {}", path.display(), err)))
}
