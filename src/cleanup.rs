//! Retiring artifacts superseded by a new upload.
//!
//! Runs only after every artifact of the new upload has been written, so a
//! valid artifact exists at every point in time. Deletion is best effort:
//! failures are logged and reported back, never turned into an upload
//! failure. The replaced file may already be gone, and that is not an error
//! of the current upload.

use crate::naming::{StaticRoot, is_placeholder, small_path};
use std::io;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
#[error("failed to remove {path}: {source}")]
pub struct CleanupError {
    pub path: String,
    #[source]
    pub source: io::Error,
}

/// What happened to the prior artifact.
#[derive(Debug, Default)]
pub enum Retirement {
    /// Nothing to retire, or the prior artifact is a shared placeholder or
    /// lies outside the upload tree.
    #[default]
    Skipped,
    Attempted {
        removed: Vec<String>,
        failed: Vec<CleanupError>,
    },
}

impl Retirement {
    pub fn removed(&self) -> &[String] {
        match self {
            Retirement::Skipped => &[],
            Retirement::Attempted { removed, .. } => removed,
        }
    }
}

/// Remove the artifact at public URL `last_source`, and its `_small`
/// sibling when `remove_small` is set.
///
/// Sources under `placeholder_dir` are left alone, and so is anything that
/// does not resolve inside `{static}/upload/`.
pub fn retire(
    root: &StaticRoot,
    last_source: Option<&str>,
    placeholder_dir: &str,
    remove_small: bool,
) -> Retirement {
    let Some(url) = last_source.filter(|s| !s.is_empty()) else {
        return Retirement::Skipped;
    };
    if is_placeholder(url, placeholder_dir) {
        debug!(url, "prior artifact is a placeholder, keeping it");
        return Retirement::Skipped;
    }

    let Some(primary) = root.upload_path(url) else {
        warn!(url, "prior artifact is outside the upload tree, keeping it");
        return Retirement::Skipped;
    };
    let mut targets = vec![primary];
    if remove_small {
        targets.extend(root.upload_path(&small_path(url)));
    }

    let mut removed = Vec::new();
    let mut failed = Vec::new();
    for path in targets {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path, "retired prior artifact");
                removed.push(path);
            }
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                debug!(path, "prior artifact already gone");
                failed.push(CleanupError { path, source });
            }
            Err(source) => {
                warn!(path, error = %source, "failed to retire prior artifact");
                failed.push(CleanupError { path, source });
            }
        }
    }
    Retirement::Attempted { removed, failed }
}
