use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feed entry, in the shape list UIs consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub thumb_url: String,
    pub regular_url: String,
    pub full_url: String,
    pub is_liked: bool,
    pub like_count: u64,
}

impl Photo {
    /// Copy of this photo with only the like flag flipped.
    pub fn toggled_like(&self) -> Self {
        Self {
            is_liked: !self.is_liked,
            ..self.clone()
        }
    }
}

/// Parses a server timestamp (RFC 3339). Absent or malformed input is
/// "no date", never an error: a photo without a usable timestamp still
/// renders, just without a date line.
pub fn parse_created_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Long-form date for feed cells, e.g. "August 25, 2026". Empty when the
/// photo carries no date.
pub fn format_created_at(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_photo() -> Photo {
        Photo {
            id: "p1".to_string(),
            width: 1080,
            height: 720,
            created_at: parse_created_at(Some("2024-05-01T10:00:00Z")),
            description: Some("a pier at dawn".to_string()),
            thumb_url: "https://img.example/p1/thumb".to_string(),
            regular_url: "https://img.example/p1/regular".to_string(),
            full_url: "https://img.example/p1/full".to_string(),
            is_liked: false,
            like_count: 7,
        }
    }

    /// Test: toggling flips the flag and leaves every other field alone.
    #[test]
    fn test_toggled_like_preserves_fields() {
        let photo = sample_photo();
        let toggled = photo.toggled_like();

        assert!(toggled.is_liked);
        assert_eq!(toggled.id, photo.id);
        assert_eq!(toggled.width, photo.width);
        assert_eq!(toggled.height, photo.height);
        assert_eq!(toggled.created_at, photo.created_at);
        assert_eq!(toggled.description, photo.description);
        assert_eq!(toggled.thumb_url, photo.thumb_url);
        assert_eq!(toggled.regular_url, photo.regular_url);
        assert_eq!(toggled.full_url, photo.full_url);
        assert_eq!(toggled.like_count, photo.like_count);

        // Toggling twice is the identity.
        assert_eq!(toggled.toggled_like(), photo);
    }

    /// Test: valid RFC 3339 parses, garbage and absence become None.
    #[test]
    fn test_parse_created_at() {
        let parsed = parse_created_at(Some("2016-05-03T11:00:28-04:00")).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2016, 5, 3, 15, 0, 28).unwrap());

        assert_eq!(parse_created_at(Some("yesterday-ish")), None);
        assert_eq!(parse_created_at(None), None);
    }

    /// Test: long-form date rendering, empty for missing dates.
    #[test]
    fn test_format_created_at() {
        let date = Utc.with_ymd_and_hms(2016, 5, 3, 15, 0, 28).unwrap();
        assert_eq!(format_created_at(Some(&date)), "May 3, 2016");
        assert_eq!(format_created_at(None), "");
    }
}
