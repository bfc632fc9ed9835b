//! Validation gate: upload type, output box, file type, declared size.
//!
//! Runs before anything is written. The type checks are pure string and
//! code checks; the size check needs the declared size, which is only
//! trusted once the stream has decoded.

use crate::types::UploadType;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Type of Upload not allowed")]
    UnsupportedUploadType(i32),
    #[error("Type of file not allowed")]
    UnsupportedFileType(String),
    #[error("File is too small")]
    FileTooSmall { size: u64, min: u64 },
    #[error("File is too big")]
    FileTooBig { size: u64, max: u64 },
    #[error("Size of output box not allowed")]
    BoxTooLarge { width: u32, height: u32, max: u32 },
}

/// Format tags (sniffed image formats or media extensions) that may be stored.
static ACCEPTED_FILE_TYPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(jpg|gif|p?jpeg|(x-)?png|mp3|mp4)$").expect("allow-list pattern is valid")
});

/// Resolve an upload type code, rejecting unknown categories.
pub fn check_upload_type(code: i32) -> Result<UploadType, ValidationError> {
    UploadType::from_code(code).ok_or(ValidationError::UnsupportedUploadType(code))
}

/// Check a detected format tag against the allow-list.
pub fn check_file_type(tag: &str) -> Result<(), ValidationError> {
    if ACCEPTED_FILE_TYPES.is_match(tag) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFileType(tag.to_string()))
    }
}

/// Check `min <= size <= max`.
pub fn check_size(size: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if size < min {
        return Err(ValidationError::FileTooSmall { size, min });
    }
    if size > max {
        return Err(ValidationError::FileTooBig { size, max });
    }
    Ok(())
}

/// Check a requested output box against the full-size cap.
pub fn check_output_box(output_box: Option<(u32, u32)>, max: u32) -> Result<(), ValidationError> {
    match output_box {
        Some((width, height)) if width > max || height > max => {
            Err(ValidationError::BoxTooLarge { width, height, max })
        }
        _ => Ok(()),
    }
}
