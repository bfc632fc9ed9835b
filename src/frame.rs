//! Still-frame extraction for video and audio uploads.
//!
//! The [`FrameExtractor`] trait is the seam to the external decoder so the
//! upload policy can be exercised without one installed. The production
//! implementation is [`FfmpegExtractor`], which runs
//!
//! ```text
//! ffmpeg -i {media} -y -f image2 -t 0.001 {screenshot}
//! ```
//!
//! The call blocks until the tool exits; no timeout is enforced here.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} {status}: {stderr}")]
    Exited {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Extracts a single still image from a media file.
pub trait FrameExtractor: Sync {
    fn extract(&self, media: &Path, screenshot: &Path) -> Result<(), FrameError>;
}

/// Runs an ffmpeg-compatible command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: String,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FRAME_TOOL)
    }
}

/// Arguments passed to the tool, in order.
pub fn frame_args<'a>(media: &'a Path, screenshot: &'a Path) -> [&'a OsStr; 8] {
    [
        OsStr::new("-i"),
        media.as_os_str(),
        OsStr::new("-y"),
        OsStr::new("-f"),
        OsStr::new("image2"),
        OsStr::new("-t"),
        OsStr::new("0.001"),
        screenshot.as_os_str(),
    ]
}

impl FrameExtractor for FfmpegExtractor {
    fn extract(&self, media: &Path, screenshot: &Path) -> Result<(), FrameError> {
        debug!(program = %self.program, media = %media.display(), "extracting frame");
        let output = Command::new(&self.program)
            .args(frame_args(media, screenshot))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| FrameError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(FrameError::Exited {
            program: self.program.clone(),
            status: output.status,
            stderr: stderr.lines().last().unwrap_or_default().trim().to_string(),
        })
    }
}
