//! CLI output formatting for `ingest` and `check`.
//!
//! # Output Format
//!
//! ## Ingest
//!
//! ```text
//! wide.jpg → /static/upload/bigpic/20240102/1704193200000000000_small.jpeg
//! clip.mp4 → /static/upload/media/mp4/20240102/1704193200000000000.mp4
//!     Still: /static/upload/media/mp4/20240102/1704193200000000000.jpg
//! notes.bmp ✗ Type of file not allowed
//!
//! Stored 2 uploads, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! wide.jpg: image, jpeg 2000x1000, 183204 bytes
//! clip.mp4: video, mp4, 1048576 bytes
//! notes.bmp ✗ Type of file not allowed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::types::{ArtifactResult, UploadType};
use crate::upload::Inspection;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn failure_line(name: &str, message: &str) -> String {
    format!("{name} ✗ {message}")
}

fn type_label(upload_type: UploadType) -> &'static str {
    match upload_type {
        UploadType::Image => "image",
        UploadType::Avatar => "avatar",
        UploadType::Photo => "photo",
        UploadType::Video => "video",
        UploadType::Audio => "audio",
    }
}

// ============================================================================
// Ingest
// ============================================================================

/// Lines for one upload result.
pub fn format_result(result: &ArtifactResult) -> Vec<String> {
    if !result.success {
        return vec![failure_line(&result.name, &result.message)];
    }
    let mut lines = vec![format!("{} → {}", result.name, result.url)];
    if !result.screen_shot_url.is_empty() {
        lines.push(format!("{}Still: {}", indent(1), result.screen_shot_url));
    }
    lines
}

/// Lines for a batch of results, followed by a summary line.
pub fn format_results(results: &[ArtifactResult]) -> Vec<String> {
    let mut lines: Vec<String> = results.iter().flat_map(format_result).collect();
    let stored = results.iter().filter(|r| r.success).count();
    let failed = results.len() - stored;

    lines.push(String::new());
    let noun = if stored == 1 { "upload" } else { "uploads" };
    if failed == 0 {
        lines.push(format!("Stored {stored} {noun}"));
    } else {
        lines.push(format!("Stored {stored} {noun}, {failed} failed"));
    }
    lines
}

pub fn print_results(results: &[ArtifactResult]) {
    for line in format_results(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// One line describing what an upload would be stored as.
pub fn format_inspection(name: &str, inspection: &Inspection) -> String {
    let label = type_label(inspection.upload_type);
    match inspection.dimensions {
        Some((w, h)) => format!(
            "{name}: {label}, {} {w}x{h}, {} bytes",
            inspection.file_type, inspection.size
        ),
        None => format!(
            "{name}: {label}, {}, {} bytes",
            inspection.file_type, inspection.size
        ),
    }
}

/// Lines for `check`: one per input, in input order.
pub fn format_check<E: std::fmt::Display>(
    entries: &[(String, Result<Inspection, E>)],
) -> Vec<String> {
    entries
        .iter()
        .map(|(name, outcome)| match outcome {
            Ok(inspection) => format_inspection(name, inspection),
            Err(e) => failure_line(name, &e.to_string()),
        })
        .collect()
}

pub fn print_check<E: std::fmt::Display>(entries: &[(String, Result<Inspection, E>)]) {
    for line in format_check(entries) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_line_shows_url() {
        let result = ArtifactResult::succeeded("a.jpg", "/static/upload/bigpic/1_small.jpeg".into(), None);
        assert_eq!(
            format_result(&result),
            vec!["a.jpg → /static/upload/bigpic/1_small.jpeg"]
        );
    }

    #[test]
    fn media_result_shows_still() {
        let result = ArtifactResult::succeeded(
            "clip.mp4",
            "/static/upload/media/mp4/1.mp4".into(),
            Some("/static/upload/media/mp4/1.jpg".into()),
        );
        let lines = format_result(&result);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    Still: /static/upload/media/mp4/1.jpg");
    }

    #[test]
    fn failure_line_shows_message() {
        let result = ArtifactResult::failed("a.bmp", "Type of file not allowed");
        assert_eq!(format_result(&result), vec!["a.bmp ✗ Type of file not allowed"]);
    }

    #[test]
    fn batch_summary_counts_failures() {
        let results = vec![
            ArtifactResult::succeeded("a.jpg", "/a".into(), None),
            ArtifactResult::failed("b.bmp", "Type of file not allowed"),
        ];
        let lines = format_results(&results);
        assert_eq!(lines.last().unwrap(), "Stored 1 upload, 1 failed");
    }

    #[test]
    fn batch_summary_without_failures() {
        let results = vec![
            ArtifactResult::succeeded("a.jpg", "/a".into(), None),
            ArtifactResult::succeeded("b.jpg", "/b".into(), None),
        ];
        assert_eq!(format_results(&results).last().unwrap(), "Stored 2 uploads");
    }

    #[test]
    fn check_lines_for_image_media_and_error() {
        let entries: Vec<(String, Result<Inspection, String>)> = vec![
            (
                "wide.jpg".into(),
                Ok(Inspection {
                    upload_type: UploadType::Image,
                    file_type: "jpeg".into(),
                    size: 1234,
                    dimensions: Some((2000, 1000)),
                }),
            ),
            (
                "clip.mp4".into(),
                Ok(Inspection {
                    upload_type: UploadType::Video,
                    file_type: "mp4".into(),
                    size: 99,
                    dimensions: None,
                }),
            ),
            ("x.bmp".into(), Err("Type of file not allowed".into())),
        ];
        assert_eq!(
            format_check(&entries),
            vec![
                "wide.jpg: image, jpeg 2000x1000, 1234 bytes",
                "clip.mp4: video, mp4, 99 bytes",
                "x.bmp ✗ Type of file not allowed",
            ]
        );
    }
}
