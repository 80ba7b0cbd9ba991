//! Generated artifacts and their storage keys.

use crate::config::KeyFormats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of artifact the service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Code,
    Image,
    Summary,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Code => "code",
            ArtifactKind::Image => "image",
            ArtifactKind::Summary => "summary",
        }
    }

    /// Key prefix (top-level "directory") inside the bucket.
    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Code => "code-output",
            ArtifactKind::Image => "images-output",
            ArtifactKind::Summary => "summary-output",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Code => "py",
            ArtifactKind::Image => "png",
            ArtifactKind::Summary => "txt",
        }
    }

    /// Content type sent with the object. `None` leaves the store's default.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Image => Some("image/png"),
            ArtifactKind::Code | ArtifactKind::Summary => None,
        }
    }

    /// Message returned to the caller once the pipeline has run.
    pub fn completion_message(&self) -> &'static str {
        match self {
            ArtifactKind::Code => "Code generation completed",
            ArtifactKind::Image => "Image saved to s3",
            ArtifactKind::Summary => "Summary generation finished",
        }
    }

    fn key_format<'a>(&self, formats: &'a KeyFormats) -> &'a str {
        match self {
            ArtifactKind::Code => &formats.code,
            ArtifactKind::Image => &formats.image,
            ArtifactKind::Summary => &formats.summary,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `<prefix>/<timestamp>.<ext>` for an artifact written at `now`.
pub fn storage_key(kind: ArtifactKind, now: DateTime<Utc>, formats: &KeyFormats) -> String {
    format!(
        "{}/{}.{}",
        kind.prefix(),
        now.format(kind.key_format(formats)),
        kind.extension()
    )
}

/// A generated artifact ready to be written to the object store.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub key: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, key: String, data: Vec<u8>) -> Self {
        Self { kind, key, data }
    }

    pub fn content_type(&self) -> Option<&'static str> {
        self.kind.content_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_key_layout_per_kind() {
        let formats = KeyFormats::default();
        let now = at(2024, 3, 9, 14, 5, 7);

        assert_eq!(
            storage_key(ArtifactKind::Code, now, &formats),
            "code-output/140507.py"
        );
        assert_eq!(
            storage_key(ArtifactKind::Image, now, &formats),
            "images-output/20240309_140507.png"
        );
        assert_eq!(
            storage_key(ArtifactKind::Summary, now, &formats),
            "summary-output/20240309_140507.txt"
        );
    }

    #[test]
    fn test_dated_keys_differ_across_day_boundary() {
        let formats = KeyFormats::default();
        let today = at(2024, 3, 9, 23, 59, 59);
        let same_time_tomorrow = at(2024, 3, 10, 23, 59, 59);
        let next_second = at(2024, 3, 10, 0, 0, 0);

        for kind in [ArtifactKind::Image, ArtifactKind::Summary] {
            let key = storage_key(kind, today, &formats);
            assert_ne!(key, storage_key(kind, same_time_tomorrow, &formats));
            assert_ne!(key, storage_key(kind, next_second, &formats));
        }
    }

    #[test]
    fn test_code_keys_collide_across_days() {
        // Known limitation of the time-of-day-only code format.
        let formats = KeyFormats::default();
        let today = at(2024, 3, 9, 8, 30, 0);
        let tomorrow = at(2024, 3, 10, 8, 30, 0);

        assert_eq!(
            storage_key(ArtifactKind::Code, today, &formats),
            storage_key(ArtifactKind::Code, tomorrow, &formats)
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ArtifactKind::Image.content_type(), Some("image/png"));
        assert_eq!(ArtifactKind::Code.content_type(), None);
        assert_eq!(ArtifactKind::Summary.content_type(), None);
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        let kind: ArtifactKind = serde_json::from_str("\"summary\"").unwrap();
        assert_eq!(kind, ArtifactKind::Summary);
        assert!(serde_json::from_str::<ArtifactKind>("\"video\"").is_err());
    }
}
