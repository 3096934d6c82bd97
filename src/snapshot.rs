use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppResult;

pub fn write_places<T: Serialize>(path: &Path, places: &[T]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = serde_json::to_string_pretty(places)?;
    fs::write(path, serialized)?;
    debug!(path = %path.display(), count = places.len(), "wrote snapshot");
    Ok(())
}

pub fn read_places<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
