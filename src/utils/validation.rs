// src/utils/validation.rs
use crate::utils::error::ValidationError;

/// True when the text after the last `.` of `filename`, lowercased, is one of `allowed`.
pub fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| *a == ext)
        }
        None => false,
    }
}

/// Checks an upload's filename before any of its content is read.
///
/// `None` means the request carried no file part at all.
pub fn validate_upload<'a>(
    filename: Option<&'a str>,
    allowed: &[String],
) -> Result<&'a str, ValidationError> {
    let filename = filename.ok_or(ValidationError::MissingFile)?;

    if filename.is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if !has_allowed_extension(filename, allowed) {
        return Err(ValidationError::DisallowedExtension(filename.to_string()));
    }

    Ok(filename)
}
