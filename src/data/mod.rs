//! Core data models for the TinyTunes API server
//!
//! This module contains the canonical video record served to the page and
//! the channel identifier handling shared by the cache and the YouTube
//! client.

pub mod youtube;

pub use youtube::{FetchError, YouTubeClient};

use serde::{Deserialize, Serialize};

/// A single video as served to the page and stored in cache snapshots
///
/// Counts are kept as numeric strings because that is how the YouTube Data
/// API reports them and the page renders them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// YouTube video identifier
    pub id: String,
    /// Video title
    pub title: String,
    /// Video description
    pub description: String,
    /// URL of the high-resolution thumbnail
    pub thumbnail: String,
    /// View count as a numeric string, "0" when unknown
    pub view_count: String,
    /// Like count as a numeric string, "0" when unknown
    pub like_count: String,
}

/// A validated, trimmed channel identifier
///
/// The trimmed value is what gets sent upstream (YouTube channel ids are
/// case-sensitive); the derived cache key additionally case-folds and
/// sanitizes so the same logical channel always maps to the same cache
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelId(String);

impl ChannelId {
    /// Parses a raw request parameter into a ChannelId
    ///
    /// Returns `None` if the value is empty after trimming, which the
    /// request handler treats the same as an absent parameter.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The trimmed identifier, suitable as the upstream API parameter
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the cache key for this channel
    ///
    /// Lowercased, with anything outside `[a-z0-9_-]` replaced by `_` so
    /// the key is always a safe file stem.
    pub fn cache_key(&self) -> String {
        self.0
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_serializes_with_camel_case_fields() {
        let video = Video {
            id: "abc123".to_string(),
            title: "Wheels on the Bus".to_string(),
            description: "Sing along!".to_string(),
            thumbnail: "https://i.ytimg.com/vi/abc123/hqdefault.jpg".to_string(),
            view_count: "1234".to_string(),
            like_count: "56".to_string(),
        };

        let json = serde_json::to_value(&video).expect("Failed to serialize Video");

        assert_eq!(json["id"], "abc123");
        assert_eq!(json["viewCount"], "1234");
        assert_eq!(json["likeCount"], "56");
        assert!(json.get("view_count").is_none(), "Wire format is camelCase");
    }

    #[test]
    fn test_video_serialization_roundtrip() {
        let video = Video {
            id: "xyz".to_string(),
            title: "Twinkle Twinkle".to_string(),
            description: String::new(),
            thumbnail: "https://example.com/t.jpg".to_string(),
            view_count: "0".to_string(),
            like_count: "0".to_string(),
        };

        let json = serde_json::to_string(&video).expect("Failed to serialize Video");
        let deserialized: Video =
            serde_json::from_str(&json).expect("Failed to deserialize Video");

        assert_eq!(deserialized, video);
    }

    #[test]
    fn test_channel_id_trims_whitespace() {
        let id = ChannelId::new("  UCabc123  ").expect("Should accept padded id");
        assert_eq!(id.as_str(), "UCabc123");
    }

    #[test]
    fn test_channel_id_rejects_empty_and_whitespace() {
        assert!(ChannelId::new("").is_none());
        assert!(ChannelId::new("   ").is_none());
        assert!(ChannelId::new("\t\n").is_none());
    }

    #[test]
    fn test_cache_key_is_lowercased_and_sanitized() {
        let id = ChannelId::new("UC-AbC_123").expect("valid id");
        assert_eq!(id.cache_key(), "uc-abc_123");

        let odd = ChannelId::new("weird/../key").expect("valid id");
        assert_eq!(odd.cache_key(), "weird____key");
    }

    #[test]
    fn test_same_logical_channel_maps_to_same_cache_key() {
        let a = ChannelId::new("UCkidMusic").expect("valid id");
        let b = ChannelId::new("  uckidmusic ").expect("valid id");
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
