//! # Media Ingest
//!
//! Turns one uploaded file into the stored artifacts a site serves: a
//! size-capped original, a `_small` thumbnail or box-clipped crop, or, for
//! video and audio, the file itself plus one extracted still.
//!
//! # Pipeline
//!
//! ```text
//! bytes ─▶ validate ─▶ decode ─▶ name paths ─▶ derive + write ─▶ retire prior ─▶ ArtifactResult
//! ```
//!
//! Each upload declares an [`UploadType`](types::UploadType) that selects the
//! derivation steps and the category directory:
//!
//! ```text
//! {static}/upload/bigpic/20240102/1704193200000000000.jpeg
//! {static}/upload/bigpic/20240102/1704193200000000000_small.jpeg
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `media-ingest.toml` loading and validation; per-request overrides |
//! | [`types`] | Upload types and the outbound `ArtifactResult` record |
//! | [`validate`] | Upload type, output box, file type and size checks |
//! | [`naming`] | Artifact paths, `_small` derivation, public URLs |
//! | [`imaging`] | Geometry, decode/encode, scale and clip |
//! | [`frame`] | Still extraction through an external tool |
//! | [`cleanup`] | Best-effort removal of superseded artifacts |
//! | [`upload`] | The per-type upload policy (`Ingestor`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Write Before Delete
//!
//! A replaced artifact is removed only after every artifact of the new
//! upload has been written. A failed upload leaves the old artifact in
//! place; a crash between the two steps leaves both. At least one valid
//! artifact exists at every point.
//!
//! ## Explicit Configuration
//!
//! There is no process-wide default config. An [`upload::Ingestor`] is built
//! from an explicit [`config::IngestConfig`], and each request's overrides
//! resolve into an immutable [`config::UploadConfig`] that lives for that
//! request only.
//!
//! ## Format-Preserving Rasters
//!
//! Uploads are stored in the format they arrived in. A decoded upload is a
//! [`imaging::Raster`], a tagged union over the pixel buffer each format
//! needs, so crop and encode can never mix representations.

pub mod cleanup;
pub mod config;
pub mod frame;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod types;
pub mod upload;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
