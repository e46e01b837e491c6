//! Run checkpointing
//!
//! Serializes the whole [`Simulation`] (parameters, grid, iteration counter,
//! status) to JSON so an interrupted bake can resume exactly where it
//! stopped. The explicit scheme is deterministic, so a resumed run produces
//! the same trajectory the uninterrupted one would have.

use crate::simulation::Simulation;
use std::fs;
use std::path::Path;

/// Errors that can occur with checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    /// Failed to load file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Failed to serialize state
    SerializeFailed(String),
    /// Failed to save file
    SaveFailed(String),
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            CheckpointError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            CheckpointError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            CheckpointError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
        }
    }
}

impl std::error::Error for CheckpointError {}

/// Save the simulation state to `path` as JSON.
///
/// # Errors
/// Returns error if the state cannot be serialized or the file written.
pub fn save<P: AsRef<Path>>(sim: &Simulation, path: P) -> Result<(), CheckpointError> {
    let contents = serde_json::to_string_pretty(sim)
        .map_err(|e| CheckpointError::SerializeFailed(e.to_string()))?;

    fs::write(path, contents).map_err(|e| CheckpointError::SaveFailed(e.to_string()))?;

    Ok(())
}

/// Load a previously saved simulation state.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Simulation, CheckpointError> {
    let contents =
        fs::read_to_string(path).map_err(|e| CheckpointError::LoadFailed(e.to_string()))?;

    let sim: Simulation =
        serde_json::from_str(&contents).map_err(|e| CheckpointError::ParseFailed(e.to_string()))?;

    Ok(sim)
}
