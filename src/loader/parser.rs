use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Reads the file at `file_path` and parses it as JSON into `T`.
///
/// Read failures become `Error::IoError`, malformed JSON `Error::DeserializationError`.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path.as_ref())?;
    parse_json_str(&data)
}

pub fn parse_json_str<T: DeserializeOwned>(data: &str) -> Result<T> {
    Ok(serde_json::from_str(data)?)
}
