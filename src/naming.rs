//! Artifact naming: where derived files go and how they are addressed.
//!
//! Every stored artifact lives at
//!
//! ```text
//! {static}/upload/{category}/{YYYYMMDD}/{unix_nanos}.{ext}
//! {static}/upload/{category}/{YYYYMMDD}/{unix_nanos}_small.{ext}   (small variant)
//! {static}/upload/{category}/{YYYYMMDD}/{unix_nanos}.jpg           (video/audio still)
//! ```
//!
//! The date segment uses the host's local calendar day. Paths are kept as
//! `/`-separated strings because the same strings, minus the public root,
//! are handed to clients as URLs.
//!
//! ## Public URLs
//!
//! The static directory's parent is the web root. With the default
//! `../static`, the file `../static/upload/bigpic/20240102/1.jpeg` is served
//! as `/static/upload/bigpic/20240102/1.jpeg`, and a URL maps back to a
//! local path by prefixing `..` again.

use crate::types::UploadType;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("clock outside the nanosecond timestamp range: {0}")]
pub struct ClockOutOfRange(pub DateTime<Local>);

/// The configured static directory and the web root derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoot {
    dir: String,
    /// Byte length of the web root prefix within `dir`.
    root_len: usize,
}

impl StaticRoot {
    /// Parse a static directory setting.
    ///
    /// The setting may also be a space-separated list of `prefix:dir`
    /// mappings, in which case the first mapping's directory is used:
    /// - `"../static"` → `../static`
    /// - `"static:../static assets:../assets"` → `../static`
    /// - `"public"` → `./public`
    pub fn parse(setting: &str) -> Self {
        let dir = mapped_dir(setting).trim_end_matches('/');
        let dir = if dir.contains('/') {
            dir.to_string()
        } else {
            format!("./{dir}")
        };
        let root_len = dir.rfind('/').unwrap_or(0);
        Self { dir, root_len }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    fn web_root(&self) -> &str {
        &self.dir[..self.root_len]
    }

    /// Public URL for a path under this root.
    pub fn public_url(&self, path: &str) -> String {
        path.strip_prefix(self.web_root())
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(path)
            .to_string()
    }

    /// Local path for a public URL.
    pub fn local_path(&self, url: &str) -> String {
        format!("{}/{}", self.web_root(), url.trim_start_matches('/'))
    }

    /// Local path for a public URL, only if it lies inside `{dir}/upload/`.
    ///
    /// URLs with `.` or `..` segments are refused outright.
    pub fn upload_path(&self, url: &str) -> Option<String> {
        if url.split('/').any(|segment| segment == "." || segment == "..") {
            return None;
        }
        let path = self.local_path(url);
        path.starts_with(&format!("{}/upload/", self.dir))
            .then_some(path)
    }
}

fn mapped_dir(setting: &str) -> &str {
    let first = setting.split(' ').next().unwrap_or(setting);
    let mut parts = first.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(dir), None) => dir,
        _ => setting,
    }
}

/// Paths allocated for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Dated category directory holding every artifact of this upload.
    pub dir: String,
    pub primary: String,
    /// Still-frame path, only for video and audio uploads.
    pub screenshot: Option<String>,
}

impl ArtifactPaths {
    /// Allocate paths for an upload received at `now`.
    ///
    /// The nanosecond timestamp keeps names unique per extension.
    pub fn plan(
        root: &StaticRoot,
        upload_type: UploadType,
        extension: &str,
        now: DateTime<Local>,
    ) -> Result<Self, ClockOutOfRange> {
        let stamp = now.timestamp_nanos_opt().ok_or(ClockOutOfRange(now))?;
        let dir = format!(
            "{}/upload/{}/{}",
            root.dir(),
            upload_type.directory(),
            now.format("%Y%m%d")
        );
        let screenshot = upload_type
            .is_media()
            .then(|| format!("{dir}/{stamp}.jpg"));
        Ok(Self {
            primary: format!("{dir}/{stamp}.{extension}"),
            dir,
            screenshot,
        })
    }

    /// Create the dated directory (and parents) if missing.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Create the primary file empty, failing with `AlreadyExists` if
    /// another upload holds the name.
    pub fn claim(&self) -> io::Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.primary)
            .map(drop)
    }

    pub fn small(&self) -> String {
        small_path(&self.primary)
    }
}

/// Insert `_small` before the extension of `path`.
///
/// The extension is taken from the last dot of the final path segment, and
/// only its first occurrence in the whole path is rewritten. Applying this
/// to an already-small path yields `_small_small`; callers derive small
/// paths from primary paths only.
///
/// - `"a/b/123.jpg"` → `"a/b/123_small.jpg"`
/// - `"a/b/123_small.jpg"` → `"a/b/123_small_small.jpg"`
pub fn small_path(path: &str) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let ext = filename.rsplit('.').next().unwrap_or(filename);
    let dotted = format!(".{ext}");
    path.replacen(&dotted, &format!("_small{dotted}"), 1)
}

/// True when `url` points into the reserved placeholder directory.
pub fn is_placeholder(url: &str, placeholder_dir: &str) -> bool {
    url.contains(placeholder_dir)
}

/// Extension of an uploaded filename, used as the file type of media uploads.
pub fn media_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase)
}
