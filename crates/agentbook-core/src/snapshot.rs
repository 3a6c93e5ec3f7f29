//! Snapshot IO: one flat JSON file holding the latest full record list.

use anyhow::Context;
use std::path::Path;

use crate::record::Record;

/// Overwrites the snapshot with the full record list. No merge with any
/// previous snapshot; each run replaces the file wholesale.
pub async fn write(path: &Path, records: &[Record]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing snapshot {}", path.display()))
}

/// Reads the latest snapshot. A missing file is the "no data yet" state and
/// reads as an empty record set, not an error.
pub async fn load(path: &Path) -> anyhow::Result<Vec<Record>> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("reading snapshot {}", path.display())),
    };
    serde_json::from_str(&json).with_context(|| format!("parsing snapshot {}", path.display()))
}
