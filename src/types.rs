//! Shared types used across the pipeline and by callers.
//!
//! [`ArtifactResult`] is the record handed back to the HTTP layer and is
//! serialized as JSON; its field names are part of the client contract.

use serde::{Serialize, Serializer};

/// Declared purpose of an upload. Selects which derivation steps run and
/// the category directory the artifacts land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadType {
    /// Article image: full-size plus a `_small` variant.
    Image,
    /// Avatar or cover: a single artifact at an explicit size.
    Avatar,
    /// Photo: full-size plus a `_small` variant, clipped to a box for albums.
    Photo,
    /// Video clip: stored as is, with one extracted still.
    Video,
    /// Audio clip: stored as is, with one extracted still (cover art).
    Audio,
}

impl UploadType {
    pub const ALL: [UploadType; 5] = [
        UploadType::Image,
        UploadType::Avatar,
        UploadType::Photo,
        UploadType::Video,
        UploadType::Audio,
    ];

    /// Map the numeric code callers send (1-5).
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Image),
            2 => Some(Self::Avatar),
            3 => Some(Self::Photo),
            4 => Some(Self::Video),
            5 => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Image => 1,
            Self::Avatar => 2,
            Self::Photo => 3,
            Self::Video => 4,
            Self::Audio => 5,
        }
    }

    /// Category directory under `{static}/upload/`.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Image => "bigpic",
            Self::Avatar => "smallpic",
            Self::Photo => "bigsmallpic",
            Self::Video => "media/mp4",
            Self::Audio => "media/mp3",
        }
    }

    /// Video and audio are stored untouched and never decoded as images.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/// Outcome of one upload.
///
/// `url` and `screen_shot_url` are public paths relative to the web root
/// (e.g. `/static/upload/bigpic/20240102/1704153600000000000.jpeg`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactResult {
    /// Original filename as received.
    pub name: String,
    pub url: String,
    pub screen_shot_url: String,
    /// Opaque correlation id owned by the composing service.
    pub dialog_id: String,
    #[serde(serialize_with = "as_flag")]
    pub success: bool,
    pub message: String,
}

pub const SUCCESS_MESSAGE: &str = "Upload succeeded";

impl ArtifactResult {
    pub fn succeeded(name: &str, url: String, screen_shot_url: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            url,
            screen_shot_url: screen_shot_url.unwrap_or_default(),
            dialog_id: String::new(),
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failed(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Clients read `success` as `1`/`0`.
fn as_flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for ty in UploadType::ALL {
            assert_eq!(UploadType::from_code(ty.code()), Some(ty));
        }
    }

    #[test]
    fn unknown_codes_rejected() {
        assert_eq!(UploadType::from_code(0), None);
        assert_eq!(UploadType::from_code(6), None);
        assert_eq!(UploadType::from_code(-1), None);
    }

    #[test]
    fn directories_match_categories() {
        assert_eq!(UploadType::Image.directory(), "bigpic");
        assert_eq!(UploadType::Avatar.directory(), "smallpic");
        assert_eq!(UploadType::Photo.directory(), "bigsmallpic");
        assert_eq!(UploadType::Video.directory(), "media/mp4");
        assert_eq!(UploadType::Audio.directory(), "media/mp3");
    }

    #[test]
    fn only_video_and_audio_are_media() {
        let media: Vec<_> = UploadType::ALL.into_iter().filter(|t| t.is_media()).collect();
        assert_eq!(media, vec![UploadType::Video, UploadType::Audio]);
    }

    #[test]
    fn result_serializes_success_as_flag() {
        let ok = ArtifactResult::succeeded("a.jpg", "/static/x.jpeg".into(), None);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], 1);
        assert_eq!(json["url"], "/static/x.jpeg");
        assert_eq!(json["screen_shot_url"], "");
        assert_eq!(json["dialog_id"], "");
        assert_eq!(json["message"], SUCCESS_MESSAGE);

        let failed = ArtifactResult::failed("a.jpg", "File is too big");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["success"], 0);
        assert_eq!(json["name"], "a.jpg");
        assert_eq!(json["message"], "File is too big");
    }
}
