//! Knowledge extraction from video transcripts.

use crate::agent::schema::{forbid_blank_items, require_text};
use crate::agent::{Agent, AgentConfig, ChatBackend, ContextProvider, IoSchema};
use crate::youtube::{format_duration, TranscriptToolOutput, VideoMetadata};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Agent that extracts structured knowledge from a transcript.
pub type KnowledgeAgent = Agent<KnowledgeExtractionInput, KnowledgeExtractionOutput>;

/// Title under which the transcript is shown to the extraction agent.
pub const TRANSCRIPT_CONTEXT_TITLE: &str = "Video Transcript";

/// This schema defines the input for the knowledge extraction agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeExtractionInput {
    /// The URL of the YouTube video to analyze.
    pub video_url: String,
}

impl IoSchema for KnowledgeExtractionInput {
    fn validate(&self) -> Result<(), String> {
        require_text("video_url", &self.video_url)
    }
}

/// This schema defines the knowledge extracted from a video transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KnowledgeExtractionOutput {
    /// A short summary of the content, including who is presenting and the content being discussed.
    pub summary: String,
    /// The best insights and ideas of the content.
    pub insights: Vec<String>,
    /// The most surprising, insightful, and/or interesting quotes of the content.
    pub quotes: Vec<String>,
    /// The most practical and useful personal habits mentioned.
    #[serde(default)]
    pub habits: Option<Vec<String>>,
    /// The most surprising, insightful, and/or interesting valid facts about the greater world mentioned in the content.
    pub facts: Vec<String>,
    /// The most surprising, insightful, and/or interesting recommendations from the content.
    pub recommendations: Vec<String>,
    /// All mentions of writing, art, tools, projects, and other sources of inspiration mentioned in the content.
    pub references: Vec<String>,
    /// The most potent takeaways and recommendations condensed into a single 20-word sentence.
    pub one_sentence_takeaway: String,
}

impl IoSchema for KnowledgeExtractionOutput {
    fn validate(&self) -> Result<(), String> {
        require_text("summary", &self.summary)?;
        require_text("one_sentence_takeaway", &self.one_sentence_takeaway)?;
        forbid_blank_items("insights", &self.insights)?;
        forbid_blank_items("quotes", &self.quotes)?;
        if let Some(habits) = &self.habits {
            forbid_blank_items("habits", habits)?;
        }
        forbid_blank_items("facts", &self.facts)?;
        forbid_blank_items("recommendations", &self.recommendations)?;
        forbid_blank_items("references", &self.references)?;
        Ok(())
    }
}

/// Supplies the fetched transcript to the extraction agent's system prompt.
#[derive(Debug, Clone)]
pub struct TranscriptProvider {
    transcript: String,
    duration: f64,
    metadata: VideoMetadata,
}

impl TranscriptProvider {
    pub fn new(transcript: String, duration: f64, metadata: VideoMetadata) -> Self {
        Self {
            transcript,
            duration,
            metadata,
        }
    }
}

impl From<&TranscriptToolOutput> for TranscriptProvider {
    fn from(output: &TranscriptToolOutput) -> Self {
        Self::new(
            output.transcript.clone(),
            output.duration,
            output.metadata.clone(),
        )
    }
}

impl ContextProvider for TranscriptProvider {
    fn title(&self) -> &str {
        TRANSCRIPT_CONTEXT_TITLE
    }

    fn info(&self) -> String {
        let mut info = String::new();
        info.push_str(&format!("VIDEO TITLE: {}\n", self.metadata.title));
        if !self.metadata.channel.is_empty() {
            info.push_str(&format!("CHANNEL: {}\n", self.metadata.channel));
        }
        if !self.metadata.published_at.is_empty() {
            info.push_str(&format!("PUBLISHED AT: {}\n", self.metadata.published_at));
        }
        info.push_str(&format!(
            "DURATION: {} ({:.0} seconds)\n",
            format_duration(self.duration),
            self.duration
        ));
        if !self.metadata.description.is_empty() {
            info.push_str(&format!("DESCRIPTION:\n{}\n", self.metadata.description));
        }
        info.push_str(&format!("\nTRANSCRIPT:\n\n{}", self.transcript));
        info
    }
}

/// Create the knowledge extraction agent.
pub fn knowledge_agent(backend: Arc<dyn ChatBackend>, config: AgentConfig) -> KnowledgeAgent {
    Agent::new("knowledge-extraction", backend, config)
}
