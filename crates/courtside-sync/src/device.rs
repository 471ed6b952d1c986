//! Per-installation device identity.

use courtside_core::DeviceId;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::{Result, SyncError};

/// File the device id is stored in, inside the data directory.
pub const DEVICE_ID_FILE: &str = "device_id";

/// Reads the device id stored in `data_dir`, generating and persisting one
/// on first use.
///
/// # Errors
///
/// I/O failures, or [`SyncError::Malformed`] if the stored id is not a UUID.
pub fn load_or_create_device_id(data_dir: &Path) -> Result<DeviceId> {
    let path = data_dir.join(DEVICE_ID_FILE);
    if path.exists() {
        let stored = fs::read_to_string(&path)?;
        return stored
            .trim()
            .parse()
            .map_err(|e: courtside_core::Error| SyncError::Malformed(e.to_string()));
    }

    fs::create_dir_all(data_dir)?;
    let id = DeviceId::generate();
    fs::write(&path, id.to_string())?;
    info!(device_id = %id, ?path, "Device id created");
    Ok(id)
}
