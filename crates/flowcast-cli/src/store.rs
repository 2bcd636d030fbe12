//! Local JSON-file persistence for the CLI's single-process-at-a-time
//! store, without pulling a database into the core.

use std::path::PathBuf;

use flowcast_core::StoreSnapshot;

/// Returns `~/.config/flowcast[-dev]/`, based on `FLOWCAST_ENV`.
///
/// Set `FLOWCAST_ENV=dev` to use a separate development data directory.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWCAST_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("flowcast-dev")
    } else {
        base_dir.join("flowcast")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn store_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("store.json"))
}

/// Load the saved snapshot, or an empty one if this is the first run.
pub fn load_snapshot() -> Result<StoreSnapshot, Box<dyn std::error::Error>> {
    let path = store_path()?;
    if !path.exists() {
        return Ok(StoreSnapshot::default());
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Persist the snapshot back to disk, overwriting any previous state.
pub fn save_snapshot(snapshot: &StoreSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    let path = store_path()?;
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}
