//! CLI command implementations.

use anyhow::{Context, Result};
use courtside_sync::{load_or_create_device_id, FileQueueStore, OfflineQueue, SyncConfig};
use std::path::Path;

/// Show the device id, creating it on first use.
pub fn device(config: &SyncConfig) -> Result<()> {
    let device = load_or_create_device_id(&config.data_dir).with_context(|| {
        format!("reading device id from {}", config.data_dir.display())
    })?;
    println!("{device}");
    Ok(())
}

/// Show the persisted offline queue of this device.
pub fn queue_status(config: &SyncConfig) -> Result<()> {
    let device = load_or_create_device_id(&config.data_dir)
        .context("reading device id")?;
    let store = FileQueueStore::new(&config.data_dir, &config.namespace, &device);
    let path = store.path().to_path_buf();
    let queue = OfflineQueue::open(Box::new(store), config.retry_ceiling)
        .with_context(|| format!("opening queue {}", path.display()))?;

    print!("{}", render_queue(&queue, &path));
    Ok(())
}

fn render_queue(queue: &OfflineQueue, path: &Path) -> String {
    let mut out = String::new();
    out.push_str("Offline Queue\n");
    out.push_str("=============\n");
    out.push_str(&format!("File:    {}\n", path.display()));
    out.push_str(&format!("Pending: {}\n", queue.pending()));
    out.push_str(&format!("Failed:  {}\n", queue.failed()));
    out.push_str(&format!("Ceiling: {} attempts\n", queue.ceiling()));

    let entries = queue.entries();
    if !entries.is_empty() {
        out.push('\n');
        for (i, entry) in entries.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. {entry}  match {} at {}\n",
                i + 1,
                entry.match_id(),
                entry.action.recorded_at
            ));
        }
    }
    out
}
