//! Free-form context snapshot persisted as one JSON object under the data
//! directory.

use anyhow::{Context, Result, ensure};
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE: &str = "context_snapshot.json";

pub fn snapshot_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SNAPSHOT_FILE)
}

/// Store `data` stamped with `_timestamp` (Unix seconds) and `_branch`.
///
/// Replaces any previous snapshot.
pub fn save_snapshot(data_dir: &Path, data: Value, branch: Option<&str>) -> Result<PathBuf> {
    let mut object: Map<String, Value> = match data {
        Value::Object(map) => map,
        other => {
            ensure!(other.is_null(), "snapshot must be a JSON object");
            Map::new()
        }
    };
    let now = Utc::now();
    let seconds = now.timestamp() as f64 + f64::from(now.timestamp_subsec_millis()) / 1000.0;
    object.insert("_timestamp".into(), Value::from(seconds));
    object.insert("_branch".into(), Value::from(branch.unwrap_or_default()));

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    let path = snapshot_path(data_dir);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(object))?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

/// The stored snapshot, or `None` when none was saved.
pub fn load_snapshot(data_dir: &Path) -> Result<Option<Value>> {
    let path = snapshot_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(value))
}
