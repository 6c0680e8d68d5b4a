use std::path::Path;

use crate::error::Result;
use crate::model::RawTask;

/// Save the raw task list to a JSON project file.
pub fn save_project(tasks: &[RawTask], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(tasks)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a raw task list from a JSON project file.
pub fn load_project(path: &Path) -> Result<Vec<RawTask>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
