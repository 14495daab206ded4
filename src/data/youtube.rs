//! YouTube Data API client and aggregation pipeline
//!
//! Fetches a channel's videos by paginating the `search` endpoint, then
//! batches the `videos` statistics endpoint and merges the two by video id
//! into the canonical [`Video`] record. Responses are validated strictly:
//! a payload that does not match the expected shape fails the whole fetch
//! rather than producing partial results. Falling back to cached data is
//! the request handler's job, not this module's.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use super::Video;

/// Base URL for the YouTube Data API v3
const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Items requested per search page (the API's documented maximum)
const PAGE_SIZE: usize = 50;

/// Cumulative cap on search results across all pages
const MAX_RESULTS: usize = 500;

/// Maximum number of video ids per statistics request
const STATS_CHUNK_SIZE: usize = 50;

/// Hard bound on search page requests per fetch
///
/// The result cap counts distinct items, so an upstream that repeats the
/// same ids with a fresh continuation token on every page would otherwise
/// keep the loop going forever.
const MAX_SEARCH_PAGES: usize = MAX_RESULTS / PAGE_SIZE;

/// Per-request timeout; the host imposes no default of its own
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when fetching channel videos
#[derive(Debug, Error)]
pub enum FetchError {
    /// No API key was configured
    #[error("YouTube API key is missing")]
    MissingApiKey,

    /// HTTP request failed (transport error or timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("YouTube API returned status {status}")]
    UpstreamStatus {
        /// The HTTP status code returned upstream
        status: StatusCode,
        /// Response body, kept for operator logs
        body: String,
    },

    /// Response did not match the expected shape
    #[error("Invalid YouTube API response: {0}")]
    InvalidResponse(String),
}

// Response shapes for the `search` endpoint. Required fields are enforced
// by the types; a missing videoId or thumbnail fails deserialization.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    description: String,
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Thumbnail,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

// Response shapes for the `videos?part=statistics` endpoint.

#[derive(Debug, Deserialize)]
struct StatsResponse {
    items: Vec<StatsItem>,
}

#[derive(Debug, Deserialize)]
struct StatsItem {
    id: String,
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: String,
    /// Absent when the uploader has hidden likes
    like_count: Option<String>,
}

/// Client for the YouTube Data API
///
/// The API key is injected at construction rather than read from ambient
/// process state, so tests can supply fakes. The base URL is overridable
/// for the same reason.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    /// Creates a client for the real YouTube Data API
    ///
    /// An empty key is accepted here; the first fetch attempt will fail
    /// with [`FetchError::MissingApiKey`].
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL (for testing against a stub server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches all videos for a channel, newest first
    ///
    /// Paginates the search endpoint until the continuation token runs out
    /// or 500 results have accumulated, then resolves view/like counts in
    /// batches of 50. The relative order returned by the search pagination
    /// is preserved; items whose statistics are missing (deleted or made
    /// private between the two calls) get `"0"` counts rather than being
    /// dropped, so the output length always equals the number of distinct
    /// search results.
    ///
    /// # Errors
    /// * [`FetchError::MissingApiKey`] - no key configured; returned before
    ///   any request is made
    /// * [`FetchError::Http`] / [`FetchError::UpstreamStatus`] - transport
    ///   failure or non-success status from either endpoint
    /// * [`FetchError::InvalidResponse`] - payload failed schema validation
    pub async fn fetch_channel_videos(&self, channel_id: &str) -> Result<Vec<Video>, FetchError> {
        if self.api_key.is_empty() {
            return Err(FetchError::MissingApiKey);
        }

        let items = self.fetch_all_search_pages(channel_id).await?;
        let ids: Vec<&str> = items.iter().map(|item| item.id.video_id.as_str()).collect();
        let stats = self.fetch_statistics(&ids).await?;

        Ok(merge_videos(items, &stats))
    }

    /// Paginates the search endpoint, deduplicating by video id
    async fn fetch_all_search_pages(
        &self,
        channel_id: &str,
    ) -> Result<Vec<SearchItem>, FetchError> {
        let mut items: Vec<SearchItem> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_SEARCH_PAGES {
            let page = self.fetch_search_page(channel_id, page_token.as_deref()).await?;
            debug!(page_items = page.items.len(), "fetched search page");

            for item in page.items {
                if seen.insert(item.id.video_id.clone()) {
                    items.push(item);
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() || items.len() >= MAX_RESULTS {
                break;
            }
        }

        items.truncate(MAX_RESULTS);
        Ok(items)
    }

    /// Fetches a single search page
    async fn fetch_search_page(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<SearchResponse, FetchError> {
        let page_size = PAGE_SIZE.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("channelId", channel_id),
            ("maxResults", page_size.as_str()),
            ("order", "date"),
            ("type", "video"),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let url = format!("{}/search", self.base_url);
        let body = self.request(&url, &params).await?;

        serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("search response: {}", e)))
    }

    /// Resolves statistics for the given ids in chunks of 50
    ///
    /// Chunks are fetched sequentially; if any chunk fails the whole fetch
    /// fails, so callers never see a partially resolved statistics map.
    async fn fetch_statistics(
        &self,
        ids: &[&str],
    ) -> Result<HashMap<String, VideoStatistics>, FetchError> {
        let mut stats = HashMap::with_capacity(ids.len());
        let url = format!("{}/videos", self.base_url);

        for chunk in ids.chunks(STATS_CHUNK_SIZE) {
            let joined = chunk.join(",");
            let params = [
                ("part", "statistics"),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ];

            let body = self.request(&url, &params).await?;
            let response: StatsResponse = serde_json::from_str(&body)
                .map_err(|e| FetchError::InvalidResponse(format!("statistics response: {}", e)))?;

            for item in response.items {
                stats.insert(item.id, item.statistics);
            }
        }

        Ok(stats)
    }

    /// Issues a GET request and returns the body text on success
    async fn request(&self, url: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %truncate(&body, 256), url, "upstream request failed");
            return Err(FetchError::UpstreamStatus { status, body });
        }

        Ok(response.text().await?)
    }
}

/// Merges search items with their statistics into canonical video records
///
/// Preserves the order of `items`. Ids missing from `stats` default to
/// zero counts so the output length always equals `items.len()`.
fn merge_videos(items: Vec<SearchItem>, stats: &HashMap<String, VideoStatistics>) -> Vec<Video> {
    items
        .into_iter()
        .map(|item| {
            let id = item.id.video_id;
            let (view_count, like_count) = match stats.get(&id) {
                Some(s) => (
                    s.view_count.clone(),
                    s.like_count.clone().unwrap_or_else(|| "0".to_string()),
                ),
                None => ("0".to_string(), "0".to_string()),
            };
            Video {
                id,
                title: item.snippet.title,
                description: item.snippet.description,
                thumbnail: item.snippet.thumbnails.high.url,
                view_count,
                like_count,
            }
        })
        .collect()
}

/// Truncates a string for log output
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_item(id: &str, title: &str) -> SearchItem {
        SearchItem {
            id: SearchItemId {
                video_id: id.to_string(),
            },
            snippet: SearchSnippet {
                title: title.to_string(),
                description: format!("{} description", title),
                thumbnails: Thumbnails {
                    high: Thumbnail {
                        url: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
                    },
                },
            },
        }
    }

    fn statistics(views: &str, likes: Option<&str>) -> VideoStatistics {
        VideoStatistics {
            view_count: views.to_string(),
            like_count: likes.map(str::to_string),
        }
    }

    #[test]
    fn test_merge_keeps_every_item_when_stats_are_partial() {
        let items = vec![
            search_item("a", "First"),
            search_item("b", "Second"),
            search_item("c", "Third"),
        ];
        let mut stats = HashMap::new();
        stats.insert("b".to_string(), statistics("42", Some("7")));

        let videos = merge_videos(items, &stats);

        assert_eq!(videos.len(), 3, "Unmatched items must not be dropped");
        assert_eq!(videos[0].view_count, "0");
        assert_eq!(videos[0].like_count, "0");
        assert_eq!(videos[1].view_count, "42");
        assert_eq!(videos[1].like_count, "7");
        assert_eq!(videos[2].view_count, "0");
    }

    #[test]
    fn test_merge_preserves_search_order() {
        let items = vec![
            search_item("newest", "Newest"),
            search_item("middle", "Middle"),
            search_item("oldest", "Oldest"),
        ];
        let stats = HashMap::new();

        let videos = merge_videos(items, &stats);

        let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn test_merge_defaults_hidden_like_count_to_zero() {
        let items = vec![search_item("a", "Hidden likes")];
        let mut stats = HashMap::new();
        stats.insert("a".to_string(), statistics("100", None));

        let videos = merge_videos(items, &stats);

        assert_eq!(videos[0].view_count, "100");
        assert_eq!(videos[0].like_count, "0");
    }

    #[test]
    fn test_search_response_parses_expected_shape() {
        let json = r#"{
            "items": [
                {
                    "id": { "kind": "youtube#video", "videoId": "abc" },
                    "snippet": {
                        "title": "A Song",
                        "description": "Words",
                        "thumbnails": {
                            "default": { "url": "https://example.com/d.jpg" },
                            "high": { "url": "https://example.com/h.jpg" }
                        }
                    }
                }
            ],
            "nextPageToken": "CAUQAA"
        }"#;

        let response: SearchResponse = serde_json::from_str(json).expect("Should parse");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].id.video_id, "abc");
        assert_eq!(
            response.items[0].snippet.thumbnails.high.url,
            "https://example.com/h.jpg"
        );
        assert_eq!(response.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn test_search_response_without_video_id_is_rejected() {
        // A channel or playlist result carries no videoId; the shape check
        // must fail rather than fabricate a record.
        let json = r#"{
            "items": [
                {
                    "id": { "kind": "youtube#channel", "channelId": "UCabc" },
                    "snippet": {
                        "title": "Channel",
                        "description": "",
                        "thumbnails": { "high": { "url": "https://example.com/h.jpg" } }
                    }
                }
            ]
        }"#;

        assert!(serde_json::from_str::<SearchResponse>(json).is_err());
    }

    #[test]
    fn test_stats_response_parses_with_and_without_likes() {
        let json = r#"{
            "items": [
                { "id": "a", "statistics": { "viewCount": "10", "likeCount": "2" } },
                { "id": "b", "statistics": { "viewCount": "5" } }
            ]
        }"#;

        let response: StatsResponse = serde_json::from_str(json).expect("Should parse");
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[1].statistics.like_count, None);
    }

    #[test]
    fn test_stats_response_without_view_count_is_rejected() {
        let json = r#"{ "items": [ { "id": "a", "statistics": { "likeCount": "2" } } ] }"#;
        assert!(serde_json::from_str::<StatsResponse>(json).is_err());
    }

    #[tokio::test]
    async fn test_fetch_fails_fast_without_api_key() {
        let client = YouTubeClient::new("");
        let err = client.fetch_channel_videos("UCabc").await;
        assert!(matches!(err, Err(FetchError::MissingApiKey)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("héllo", 2), "hé");
    }
}
