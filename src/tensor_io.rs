//! JSON files holding image or mask tensors.
//!
//! Tensors use ndarray's serde layout:
//!
//! ```json
//! {"v": 1, "dim": [1, 2, 2, 1], "data": [0.0, 1.0, 2.0, 3.0]}
//! ```
//!
//! with `data` in row-major order.

use ndarray::ArrayD;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::RandShearError;

/// Reads a tensor from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid tensor.
pub fn read_tensor_json(path: &Path) -> Result<ArrayD<f32>, RandShearError> {
    let file = File::open(path).map_err(RandShearError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| RandShearError::TensorParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a tensor to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_tensor_json(path: &Path, tensor: &ArrayD<f32>) -> Result<(), RandShearError> {
    let file = File::create(path).map_err(RandShearError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, tensor).map_err(|source| RandShearError::TensorWrite {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(RandShearError::Io)?;

    Ok(())
}

/// Reads a tensor from a JSON string.
pub fn from_json_str(json: &str) -> Result<ArrayD<f32>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Writes a tensor to a JSON string.
pub fn to_json_string(tensor: &ArrayD<f32>) -> Result<String, serde_json::Error> {
    serde_json::to_string(tensor)
}
