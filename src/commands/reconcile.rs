//! Reconcile blob storage against image records.
//!
//! A failed blob delete leaves content behind after its record is gone.
//! This command lists those blobs and optionally removes them.

use anyhow::Result;
use std::path::Path;
use tracing::warn;

use crate::access::find_orphaned_blobs;

/// List orphaned blobs, deleting them when `delete` is set.
pub async fn execute(config_path: Option<&Path>, delete: bool) -> Result<()> {
    let config = super::load_config(config_path)?;
    let (records, blobs) = super::open_stores(&config)?;

    let orphans = find_orphaned_blobs(&records, &blobs).await?;
    if orphans.is_empty() {
        println!("No orphaned blobs found.");
        return Ok(());
    }

    let mut removed = 0usize;
    for key in &orphans {
        if !delete {
            println!("{key}");
            continue;
        }
        match blobs.delete(key).await {
            Ok(_) => {
                println!("removed {key}");
                removed += 1;
            },
            Err(e) => warn!(key = %key, error = %e, "Failed to remove orphaned blob"),
        }
    }

    if delete {
        println!("\nRemoved {removed} of {} orphaned blobs.", orphans.len());
    } else {
        println!("\n{} orphaned blobs. Re-run with --delete to remove them.", orphans.len());
    }
    Ok(())
}
