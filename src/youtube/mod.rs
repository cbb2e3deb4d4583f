//! YouTube transcript tool.
//!
//! Fetches a video's caption text, duration and metadata. Metadata and comments
//! come from the YouTube Data API; captions come from the timed-text track
//! advertised on the video's watch page.

mod api;
mod captions;
mod tool;

pub use api::parse_iso8601_duration;
pub use captions::{parse_timed_text, select_track, CaptionTrack, TranscriptSegment};
pub use tool::TranscriptTool;

use crate::agent::schema::{require_text, IoSchema};
use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Input for the transcript tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptToolInput {
    /// URL of the YouTube video to fetch the transcript for.
    pub video_url: String,
    /// Language code for the transcript (e.g. 'en' for English).
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl TranscriptToolInput {
    pub fn new(video_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
            language: language.into(),
        }
    }
}

/// Metadata about a YouTube video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadata {
    /// The YouTube video id.
    pub id: String,
    /// Title of the video.
    pub title: String,
    /// Name of the channel that published the video.
    pub channel: String,
    /// Publication date and time (RFC 3339).
    pub published_at: String,
    /// Description of the video.
    pub description: String,
    /// Thumbnail URL, if available.
    pub thumbnail_url: Option<String>,
    /// Duration reported by the Data API, in seconds.
    pub duration_seconds: Option<u32>,
}

/// Output of the transcript tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptToolOutput {
    /// Transcript of the video.
    pub transcript: String,
    /// Duration of the video in seconds.
    pub duration: f64,
    /// Top-level comments on the video.
    pub comments: Vec<String>,
    /// Metadata about the video.
    pub metadata: VideoMetadata,
}

impl TranscriptToolOutput {
    /// Build the output from parsed caption segments.
    pub fn from_segments(
        segments: &[TranscriptSegment],
        comments: Vec<String>,
        metadata: VideoMetadata,
    ) -> Self {
        let transcript = segments
            .iter()
            .map(|s| s.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let duration = segments.last().map(|s| s.start + s.duration).unwrap_or(0.0);

        Self {
            transcript,
            duration,
            comments,
            metadata,
        }
    }
}

impl IoSchema for TranscriptToolInput {
    fn validate(&self) -> std::result::Result<(), String> {
        require_text("video_url", &self.video_url)?;
        require_text("language", &self.language)
    }
}

impl IoSchema for TranscriptToolOutput {}

/// A source of video transcripts.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript, duration and metadata for a video.
    async fn fetch(&self, input: &TranscriptToolInput) -> Result<TranscriptToolOutput>;
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
                (?:[^a-zA-Z0-9_-]|$)
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("video id regex is valid")
    })
}

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = video_id_regex().captures(input.trim())?;

    // Try group 1 (URL format) then group 2 (bare ID)
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Format a duration in seconds as a human-readable string.
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
