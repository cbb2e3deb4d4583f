//! YouTube Data API v3 response types.

use super::VideoMetadata;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
pub(super) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VideoItem {
    pub id: String,
    pub snippet: Snippet,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContentDetails {
    pub duration: Option<String>,
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        let thumbnails = item.snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url);

        let duration_seconds = item
            .content_details
            .and_then(|d| d.duration)
            .and_then(|d| parse_iso8601_duration(&d));

        Self {
            id: item.id,
            title: item.snippet.title,
            channel: item.snippet.channel_title,
            published_at: item.snippet.published_at,
            description: item.snippet.description,
            thumbnail_url,
            duration_seconds,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CommentThreadListResponse {
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CommentThread {
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommentThreadSnippet {
    pub top_level_comment: Comment,
}

#[derive(Debug, Deserialize)]
pub(super) struct Comment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommentSnippet {
    pub text_original: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiError {
    #[serde(default)]
    pub message: String,
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("duration regex is valid")
    })
}

/// Parse an ISO 8601 duration such as `PT1H2M3S` into seconds.
///
/// Returns `None` for malformed input and for durations that do not fit in a `u32`.
pub fn parse_iso8601_duration(value: &str) -> Option<u32> {
    let caps = duration_regex().captures(value.trim())?;

    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }

    [(1, 86_400u32), (2, 3600), (3, 60), (4, 1)]
        .into_iter()
        .try_fold(0u32, |total, (i, unit)| {
            let count = match caps.get(i) {
                Some(m) => m.as_str().parse::<u32>().ok()?,
                None => 0,
            };
            total.checked_add(count.checked_mul(unit)?)
        })
}
