//! HTTP-backed transcript tool.

use super::api::{ApiErrorResponse, CommentThreadListResponse, VideoListResponse};
use super::captions::{extract_caption_tracks, parse_timed_text, select_track};
use super::{extract_video_id, TranscriptSource, TranscriptToolInput, TranscriptToolOutput, VideoMetadata};
use crate::agent::Tool;
use crate::config::{Settings, YOUTUBE_API_KEY_ENV};
use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!("skriv/", env!("CARGO_PKG_VERSION"));

const TOOL_NAME: &str = "youtube_transcript";
const TOOL_DESCRIPTION: &str =
    "Fetches the transcript, duration, top comments and metadata of a YouTube video.";

/// Fetches transcripts, metadata and comments for YouTube videos.
pub struct TranscriptTool {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    watch_base: String,
    max_comments: u32,
}

impl TranscriptTool {
    /// Create a tool talking to the public YouTube endpoints.
    pub fn new(api_key: &str) -> Result<Self> {
        let defaults = crate::config::YoutubeSettings::default();
        Self::with_endpoints(
            api_key,
            &defaults.api_base,
            &defaults.watch_base,
            Duration::from_secs(defaults.timeout_seconds),
        )
    }

    /// Create a tool with explicit endpoints and request timeout.
    pub fn with_endpoints(
        api_key: &str,
        api_base: &str,
        watch_base: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(SkrivError::Config(format!(
                "{} is empty. Set it with: export {}='...'",
                YOUTUBE_API_KEY_ENV, YOUTUBE_API_KEY_ENV
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            watch_base: watch_base.trim_end_matches('/').to_string(),
            max_comments: 0,
        })
    }

    /// Create a tool from settings, resolving the API key from config or environment.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.youtube_api_key().ok_or_else(|| {
            SkrivError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                YOUTUBE_API_KEY_ENV, YOUTUBE_API_KEY_ENV
            ))
        })?;

        Ok(Self::with_endpoints(
            &api_key,
            &settings.youtube.api_base,
            &settings.youtube.watch_base,
            Duration::from_secs(settings.youtube.timeout_seconds),
        )?
        .with_max_comments(settings.youtube.max_comments))
    }

    /// Fetch up to `max` top-level comments alongside the transcript (0 disables).
    pub fn with_max_comments(mut self, max: u32) -> Self {
        self.max_comments = max;
        self
    }

    /// Run the tool: fetch metadata, transcript and comments for the video.
    #[instrument(skip(self), fields(video_url = %input.video_url, language = %input.language))]
    pub async fn run(&self, input: &TranscriptToolInput) -> Result<TranscriptToolOutput> {
        let video_id = extract_video_id(&input.video_url).ok_or_else(|| {
            SkrivError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input.video_url))
        })?;

        let metadata = self.fetch_metadata(&video_id).await?;
        info!("Fetched metadata for \"{}\"", metadata.title);

        let segments = {
            let html = self.fetch_watch_page(&video_id).await?;
            let tracks = extract_caption_tracks(&html)?;
            debug!("Found {} caption track(s)", tracks.len());

            let track = select_track(&tracks, &input.language)?;
            let xml = self.get_text(&track.base_url).await?;
            parse_timed_text(&xml)
        };

        if segments.is_empty() {
            return Err(SkrivError::TranscriptUnavailable(format!(
                "caption track for {} is empty",
                video_id
            )));
        }
        info!("Parsed {} transcript segments", segments.len());

        let comments = if self.max_comments > 0 {
            match self.fetch_comments(&video_id).await {
                Ok(comments) => comments,
                Err(e) => {
                    warn!("Could not fetch comments: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(TranscriptToolOutput::from_segments(&segments, comments, metadata))
    }

    async fn fetch_metadata(&self, video_id: &str) -> Result<VideoMetadata> {
        let url = self.api_url(
            "videos",
            &[("part", "snippet,contentDetails"), ("id", video_id)],
        )?;

        let body = self.get_api(url).await?;
        let response: VideoListResponse = serde_json::from_str(&body)?;

        response
            .items
            .into_iter()
            .next()
            .map(VideoMetadata::from)
            .ok_or_else(|| SkrivError::VideoNotFound(video_id.to_string()))
    }

    async fn fetch_comments(&self, video_id: &str) -> Result<Vec<String>> {
        let max = self.max_comments.min(100).to_string();
        let url = self.api_url(
            "commentThreads",
            &[
                ("part", "snippet"),
                ("videoId", video_id),
                ("maxResults", max.as_str()),
                ("order", "relevance"),
                ("textFormat", "plainText"),
            ],
        )?;

        let body = self.get_api(url).await?;
        let response: CommentThreadListResponse = serde_json::from_str(&body)?;

        Ok(response
            .items
            .into_iter()
            .map(|t| t.snippet.top_level_comment.snippet.text_original)
            .collect())
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/watch?v={}", self.watch_base, video_id);
        self.client
            .get(&url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .map_err(SkrivError::from)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    fn api_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.api_base, endpoint))
            .map_err(|e| SkrivError::Config(format!("Invalid YouTube API base URL: {}", e)))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter())
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    /// GET a Data API URL, turning error payloads into `YouTubeApi` errors.
    async fn get_api(&self, url: Url) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        Err(SkrivError::YouTubeApi(format!("{}: {}", status, message)))
    }
}

#[async_trait]
impl Tool for TranscriptTool {
    type Input = TranscriptToolInput;
    type Output = TranscriptToolOutput;

    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    async fn run(&self, input: &TranscriptToolInput) -> Result<TranscriptToolOutput> {
        TranscriptTool::run(self, input).await
    }
}

#[async_trait]
impl TranscriptSource for TranscriptTool {
    async fn fetch(&self, input: &TranscriptToolInput) -> Result<TranscriptToolOutput> {
        self.run(input).await
    }
}
