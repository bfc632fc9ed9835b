//! Upload policy: one inbound file in, stored artifacts and a result out.
//!
//! ## Flow
//!
//! ```text
//! bytes ─▶ upload type check ─▶ sniff + decode ─▶ file type + size check
//!       ─▶ allocate paths ─▶ per-type derivation ─▶ retire prior artifact
//!       ─▶ ArtifactResult
//! ```
//!
//! ## Per-type derivation
//!
//! | Type | Artifacts | Prior cleanup | `url` |
//! |---|---|---|---|
//! | Image | primary (full cap), small (small cap, from a fresh decode of the primary) | primary + small | small |
//! | Avatar | primary only, exact box or full cap | primary only | primary |
//! | Photo | primary (full cap), small (box clip when in an album, small cap otherwise) | primary + small | primary |
//! | Video / Audio | bytes as uploaded, one extracted still | none | primary, plus `screen_shot_url` |
//!
//! ## Failure model
//!
//! Nothing is written until validation and decoding succeed. After that,
//! the first write, encode, or extraction error stops the remaining steps
//! and becomes the result message. Artifacts already written by the same
//! request stay on disk; there is no rollback. The prior artifact is only
//! retired once every new artifact exists, and retirement itself never
//! fails an upload.
//!
//! ## Naming
//!
//! The primary name is claimed with an exclusive create before anything is
//! encoded. Uploads that read the same clock move to the next nanosecond
//! instead of overwriting each other. A failure after the claim can leave
//! the empty claimed file behind, like any other partial artifact.

use crate::cleanup::{self, Retirement};
use crate::config::{IngestConfig, UploadConfig, UploadOptions};
use crate::frame::{FfmpegExtractor, FrameError, FrameExtractor};
use crate::imaging::{CodecError, Quality, Raster, decode, operations};
use crate::naming::{ArtifactPaths, ClockOutOfRange, StaticRoot, media_extension};
use crate::types::{ArtifactResult, UploadType};
use crate::validate::{self, ValidationError};
use chrono::{DateTime, Local, TimeDelta};
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Names tried per upload before giving up on a busy timestamp.
const MAX_NAME_ATTEMPTS: u32 = 64;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    FrameExtraction(#[from] FrameError),
    #[error(transparent)]
    Clock(#[from] ClockOutOfRange),
}

/// One inbound file as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename. Only media uploads read their extension from it.
    pub name: String,
    pub data: Vec<u8>,
    /// Size reported by the transport, if it reports one.
    pub declared_size: Option<u64>,
}

impl UploadRequest {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            declared_size: None,
        }
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Declared size, falling back to the received byte count.
    pub fn size(&self) -> u64 {
        self.declared_size.unwrap_or(self.data.len() as u64)
    }
}

/// Pixel content of a validated upload.
#[derive(Debug)]
pub enum Source {
    Image(Raster),
    /// Video or audio, stored byte for byte.
    Media,
}

/// A validated upload, ready for derivation.
#[derive(Debug)]
pub struct DecodedAsset<'a> {
    pub config: &'a UploadConfig,
    pub upload_type: UploadType,
    /// Detected format tag for images, filename extension for media.
    pub file_type: String,
    pub size: u64,
    pub source: Source,
}

impl<'a> DecodedAsset<'a> {
    /// Run the validation gate and decode the upload.
    ///
    /// The upload type is checked before the stream is touched; size is
    /// checked only after a successful decode.
    pub fn prepare(config: &'a UploadConfig, request: &UploadRequest) -> Result<Self, UploadError> {
        let upload_type = validate::check_upload_type(config.upload_type)?;
        validate::check_output_box(config.output_box, config.max_dimension)?;
        let size = request.size();

        let (file_type, source) = if upload_type.is_media() {
            let ext = media_extension(&request.name).unwrap_or_default();
            validate::check_file_type(&ext)?;
            (ext, Source::Media)
        } else {
            let decoded = decode(&request.data)?;
            validate::check_file_type(&decoded.tag)?;
            let raster = Raster::from_decoded(decoded.image, &decoded.tag)?;
            (decoded.tag, Source::Image(raster))
        };
        validate::check_size(size, config.min_size, config.max_size)?;

        Ok(Self {
            config,
            upload_type,
            file_type,
            size,
            source,
        })
    }
}

/// Runs the upload policy against a static root.
///
/// Holds no per-request state; one `Ingestor` serves any number of
/// concurrent uploads.
pub struct Ingestor<E: FrameExtractor = FfmpegExtractor> {
    config: IngestConfig,
    frames: E,
}

impl Ingestor<FfmpegExtractor> {
    pub fn new(config: IngestConfig) -> Self {
        let frames = FfmpegExtractor::new(config.frame_tool.clone());
        Self { config, frames }
    }
}

impl<E: FrameExtractor> Ingestor<E> {
    pub fn with_extractor(config: IngestConfig, frames: E) -> Self {
        Self { config, frames }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one upload. Failures are folded into the returned result.
    pub fn ingest(&self, request: &UploadRequest, options: UploadOptions) -> ArtifactResult {
        match self.try_ingest(request, options) {
            Ok(result) => result,
            Err(e) => {
                warn!(name = %request.name, error = %e, "upload failed");
                ArtifactResult::failed(&request.name, e.to_string())
            }
        }
    }

    pub fn try_ingest(
        &self,
        request: &UploadRequest,
        options: UploadOptions,
    ) -> Result<ArtifactResult, UploadError> {
        self.try_ingest_at(request, options, Local::now())
    }

    /// Ingest with an explicit clock reading, which names the artifacts.
    pub fn try_ingest_at(
        &self,
        request: &UploadRequest,
        options: UploadOptions,
        now: DateTime<Local>,
    ) -> Result<ArtifactResult, UploadError> {
        let config = UploadConfig::resolve(&self.config, options);
        let span = info_span!("ingest", name = %request.name, upload_type = config.upload_type);
        let _guard = span.enter();

        let asset = DecodedAsset::prepare(&config, request)?;
        let root = StaticRoot::parse(&config.static_dir);
        let paths = allocate(&root, asset.upload_type, &asset.file_type, now)?;
        debug!(primary = %paths.primary, size = asset.size, "allocated artifact paths");

        let quality = Quality::new(config.quality);
        let result = match (asset.upload_type, &asset.source) {
            (UploadType::Video | UploadType::Audio, _) | (_, Source::Media) => {
                let (url, screenshot) = self.store_media(request, &paths, &root)?;
                ArtifactResult::succeeded(&request.name, url, Some(screenshot))
            }
            (UploadType::Image, Source::Image(raster)) => {
                let url = store_image(raster, &config, &paths, &root, quality)?;
                ArtifactResult::succeeded(&request.name, url, None)
            }
            (UploadType::Avatar, Source::Image(raster)) => {
                let url = store_avatar(raster, &config, &paths, &root, quality)?;
                ArtifactResult::succeeded(&request.name, url, None)
            }
            (UploadType::Photo, Source::Image(raster)) => {
                let url = store_photo(raster, &config, &paths, &root, quality)?;
                ArtifactResult::succeeded(&request.name, url, None)
            }
        };
        info!(url = %result.url, "upload stored");
        Ok(result)
    }

    /// Run only the validation gate and decode, writing nothing.
    pub fn inspect(
        &self,
        request: &UploadRequest,
        options: UploadOptions,
    ) -> Result<Inspection, UploadError> {
        let config = UploadConfig::resolve(&self.config, options);
        let asset = DecodedAsset::prepare(&config, request)?;
        Ok(Inspection {
            upload_type: asset.upload_type,
            file_type: asset.file_type,
            size: asset.size,
            dimensions: match &asset.source {
                Source::Image(raster) => Some(raster.dimensions()),
                Source::Media => None,
            },
        })
    }

    /// Returns the public URLs of the stored media and its still.
    fn store_media(
        &self,
        request: &UploadRequest,
        paths: &ArtifactPaths,
        root: &StaticRoot,
    ) -> Result<(String, String), UploadError> {
        write_artifact(&paths.primary, &request.data)?;
        let screenshot = paths.screenshot.as_deref().unwrap_or_default();
        self.frames
            .extract(Path::new(&paths.primary), Path::new(screenshot))?;
        Ok((root.public_url(&paths.primary), root.public_url(screenshot)))
    }
}

/// What an upload would be stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub upload_type: UploadType,
    pub file_type: String,
    pub size: u64,
    /// Source dimensions; `None` for media.
    pub dimensions: Option<(u32, u32)>,
}

fn store_image(
    raster: &Raster,
    config: &UploadConfig,
    paths: &ArtifactPaths,
    root: &StaticRoot,
    quality: Quality,
) -> Result<String, UploadError> {
    let primary = operations::scale(raster, config.max_dimension);
    write_raster(&paths.primary, &primary, quality)?;

    let small_path = paths.small();
    let reloaded = Raster::open(Path::new(&paths.primary), raster.kind())?;
    let small = operations::scale(&reloaded, config.small_max_dimension);
    write_raster(&small_path, &small, quality)?;

    retire_prior(root, config, true);
    Ok(root.public_url(&small_path))
}

fn store_avatar(
    raster: &Raster,
    config: &UploadConfig,
    paths: &ArtifactPaths,
    root: &StaticRoot,
    quality: Quality,
) -> Result<String, UploadError> {
    let primary = match config.output_box {
        Some((width, height)) => operations::resize_exact(raster, width, height),
        None => operations::scale(raster, config.max_dimension),
    };
    write_raster(&paths.primary, &primary, quality)?;

    retire_prior(root, config, false);
    Ok(root.public_url(&paths.primary))
}

fn store_photo(
    raster: &Raster,
    config: &UploadConfig,
    paths: &ArtifactPaths,
    root: &StaticRoot,
    quality: Quality,
) -> Result<String, UploadError> {
    let primary = operations::scale(raster, config.max_dimension);
    write_raster(&paths.primary, &primary, quality)?;

    let small = match (config.album_id, config.output_box) {
        (Some(_), Some((width, height))) => operations::clip(&primary, width, height),
        _ => operations::scale(&primary, config.small_max_dimension),
    };
    write_raster(&paths.small(), &small, quality)?;

    retire_prior(root, config, true);
    Ok(root.public_url(&paths.primary))
}

/// Allocate paths and claim the primary name, moving to the next
/// nanosecond while another upload holds it.
fn allocate(
    root: &StaticRoot,
    upload_type: UploadType,
    extension: &str,
    now: DateTime<Local>,
) -> Result<ArtifactPaths, UploadError> {
    let mut stamp = now;
    let mut attempt = 0;
    loop {
        let paths = ArtifactPaths::plan(root, upload_type, extension, stamp)?;
        paths.ensure_dir().map_err(|source| UploadError::Write {
            path: paths.dir.clone(),
            source,
        })?;
        match paths.claim() {
            Ok(()) => return Ok(paths),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                debug!(primary = %paths.primary, "artifact name taken, retrying");
                attempt += 1;
                stamp = stamp
                    .checked_add_signed(TimeDelta::nanoseconds(1))
                    .ok_or(ClockOutOfRange(stamp))?;
            }
            Err(source) => {
                return Err(UploadError::Write {
                    path: paths.primary,
                    source,
                });
            }
        }
    }
}

fn retire_prior(root: &StaticRoot, config: &UploadConfig, remove_small: bool) {
    let retirement = cleanup::retire(
        root,
        config.last_source.as_deref(),
        &config.placeholder_dir,
        remove_small,
    );
    if let Retirement::Attempted { removed, failed } = &retirement {
        debug!(
            removed = removed.len(),
            failed = failed.len(),
            "prior artifact retirement finished"
        );
    }
}

fn write_raster(path: &str, raster: &Raster, quality: Quality) -> Result<(), UploadError> {
    let bytes = raster.encode(quality)?;
    debug!(path, dimensions = ?raster.dimensions(), kind = raster.kind().tag(), "writing artifact");
    write_artifact(path, &bytes)
}

fn write_artifact(path: &str, bytes: &[u8]) -> Result<(), UploadError> {
    std::fs::write(path, bytes).map_err(|source| UploadError::Write {
        path: path.to_string(),
        source,
    })
}
