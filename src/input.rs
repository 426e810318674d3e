use std::fs;
use std::path::Path;

use crate::error::ConvertError;

/// Upper bound on accepted input files.
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Reads an input file as UTF-8 text. Extension, size and encoding
/// failures are reported separately from parse failures downstream.
pub fn read_input_file(path: &Path) -> Result<String, ConvertError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConvertError::UnsupportedExtension { extension });
    }

    let size = fs::metadata(path)?.len();
    if size > MAX_FILE_SIZE {
        return Err(ConvertError::FileTooLarge {
            size,
            limit: MAX_FILE_SIZE,
        });
    }

    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|error| ConvertError::InvalidUtf8(error.to_string()))
}
