//! Pipeline orchestrator for Skriv.
//!
//! Runs the three stages strictly in sequence: fetch the transcript, extract
//! knowledge from it, then draft a blog post from that knowledge.

use crate::agent::{AgentConfig, ChatBackend, OpenAiBackend};
use crate::blog::{blog_writer_agent, BlogPost, BlogWriterAgent};
use crate::config::{Prompts, Settings};
use crate::error::{Result, SkrivError};
use crate::knowledge::{
    knowledge_agent, KnowledgeAgent, KnowledgeExtractionInput, KnowledgeExtractionOutput,
    TranscriptProvider,
};
use crate::youtube::{
    extract_video_id, watch_url, TranscriptSource, TranscriptTool, TranscriptToolInput,
    TranscriptToolOutput,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcript,
    Extraction,
    Writing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Transcript => write!(f, "transcript"),
            Stage::Extraction => write!(f, "knowledge extraction"),
            Stage::Writing => write!(f, "blog writing"),
        }
    }
}

/// Receives progress and intermediate results as the pipeline runs.
pub trait PipelineObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn transcript_fetched(&mut self, _output: &TranscriptToolOutput) {}

    fn knowledge_extracted(&mut self, _knowledge: &KnowledgeExtractionOutput) {}

    fn blog_written(&mut self, _post: &BlogPost) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Everything the pipeline produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub video_url: String,
    pub transcript: TranscriptToolOutput,
    pub knowledge: KnowledgeExtractionOutput,
    pub blog: BlogPost,
}

impl PipelineOutput {
    /// The blog post as Markdown, titled after the video.
    pub fn blog_markdown(&self) -> String {
        self.blog.to_markdown(&self.transcript.metadata.title)
    }
}

/// The scrape → extract → write pipeline.
pub struct Pipeline {
    source: Arc<dyn TranscriptSource>,
    knowledge_agent: KnowledgeAgent,
    blog_agent: BlogWriterAgent,
}

impl Pipeline {
    /// Create a pipeline talking to YouTube and OpenAI, configured from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let source: Arc<dyn TranscriptSource> = Arc::new(TranscriptTool::from_settings(settings)?);
        let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiBackend::with_timeout(
            Duration::from_secs(settings.general.openai_timeout_seconds),
        )?);

        Ok(Self::with_components(settings, prompts, source, backend))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        source: Arc<dyn TranscriptSource>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let knowledge_agent = knowledge_agent(
            backend.clone(),
            AgentConfig::new(&settings.extraction, prompts.extraction),
        );
        let blog_agent = blog_writer_agent(backend, AgentConfig::new(&settings.blog, prompts.blog));

        Self {
            source,
            knowledge_agent,
            blog_agent,
        }
    }

    /// Override the models used by the two agents.
    pub fn with_models(mut self, extraction: Option<&str>, blog: Option<&str>) -> Self {
        if let Some(model) = extraction {
            self.knowledge_agent = self.knowledge_agent.with_model(model);
        }
        if let Some(model) = blog {
            self.blog_agent = self.blog_agent.with_model(model);
        }
        self
    }

    /// Fetch only the transcript.
    pub async fn fetch_transcript(&self, video_url: &str, language: &str) -> Result<TranscriptToolOutput> {
        self.source
            .fetch(&TranscriptToolInput::new(video_url, language))
            .await
    }

    /// Run all three stages for a video.
    #[instrument(skip(self, observer))]
    pub async fn run(
        &mut self,
        video_url: &str,
        language: &str,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineOutput> {
        let video_id = extract_video_id(video_url).ok_or_else(|| {
            SkrivError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", video_url))
        })?;
        let video_url = watch_url(&video_id);

        observer.stage_started(Stage::Transcript);
        let transcript = self.fetch_transcript(&video_url, language).await?;
        info!(
            "Transcript fetched: {} characters, {:.0} seconds",
            transcript.transcript.len(),
            transcript.duration
        );
        observer.transcript_fetched(&transcript);

        observer.stage_started(Stage::Extraction);
        self.knowledge_agent
            .register_context_provider(Box::new(TranscriptProvider::from(&transcript)));
        let knowledge = self
            .knowledge_agent
            .run(&KnowledgeExtractionInput {
                video_url: video_url.clone(),
            })
            .await?;
        info!("Extracted {} insights", knowledge.insights.len());
        observer.knowledge_extracted(&knowledge);

        observer.stage_started(Stage::Writing);
        let blog = self.blog_agent.run(&knowledge).await?;
        info!("Drafted blog post with {} body paragraph(s)", blog.body.len());
        observer.blog_written(&blog);

        Ok(PipelineOutput {
            video_url,
            transcript,
            knowledge,
            blog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::mocks::MockBackend;
    use crate::youtube::VideoMetadata;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const KNOWLEDGE_REPLY: &str = r#"{
        "summary": "A talk about agents.",
        "insights": ["Keep agents small."],
        "quotes": ["One job per agent."],
        "habits": ["Write tests first."],
        "facts": [],
        "recommendations": ["Validate output."],
        "references": ["Rust"],
        "one_sentence_takeaway": "Small validated agents compose into reliable pipelines."
    }"#;

    const BLOG_REPLY: &str = r#"{
        "introduction": "This article explains agents.",
        "body": ["Agents are small."],
        "code": ["```python\nprint('hi')\n```"],
        "conclusion": ["Build one."]
    }"#;

    struct FixedSource {
        requests: Mutex<Vec<TranscriptToolInput>>,
    }

    #[async_trait]
    impl TranscriptSource for FixedSource {
        async fn fetch(&self, input: &TranscriptToolInput) -> Result<TranscriptToolOutput> {
            self.requests.lock().unwrap().push(input.clone());
            Ok(TranscriptToolOutput {
                transcript: "Welcome. Today we build agents.".to_string(),
                duration: 90.0,
                comments: Vec::new(),
                metadata: VideoMetadata {
                    id: "3CwWGSV0l9o".to_string(),
                    title: "Agents 101".to_string(),
                    ..Default::default()
                },
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        stages: Vec<Stage>,
        saw_transcript: bool,
        saw_knowledge: bool,
        saw_blog: bool,
    }

    impl PipelineObserver for Recorder {
        fn stage_started(&mut self, stage: Stage) {
            self.stages.push(stage);
        }

        fn transcript_fetched(&mut self, _output: &TranscriptToolOutput) {
            self.saw_transcript = true;
        }

        fn knowledge_extracted(&mut self, _knowledge: &KnowledgeExtractionOutput) {
            self.saw_knowledge = true;
        }

        fn blog_written(&mut self, _post: &BlogPost) {
            self.saw_blog = true;
        }
    }

    fn pipeline(backend: MockBackend) -> (Pipeline, Arc<FixedSource>) {
        let source = Arc::new(FixedSource {
            requests: Mutex::new(Vec::new()),
        });
        let pipeline = Pipeline::with_components(
            &Settings::default(),
            Prompts::default(),
            source.clone(),
            Arc::new(backend),
        );
        (pipeline, source)
    }

    #[tokio::test]
    async fn test_run_all_stages() {
        let backend = MockBackend::new().reply(KNOWLEDGE_REPLY).reply(BLOG_REPLY);
        let (mut pipeline, source) = pipeline(backend.clone());
        let mut recorder = Recorder::default();

        let output = pipeline
            .run("https://youtu.be/3CwWGSV0l9o", "en", &mut recorder)
            .await
            .unwrap();

        assert_eq!(output.video_url, "https://www.youtube.com/watch?v=3CwWGSV0l9o");
        assert_eq!(output.knowledge.habits, Some(vec!["Write tests first.".to_string()]));
        assert_eq!(output.blog.body, vec!["Agents are small.".to_string()]);
        assert!(output.blog_markdown().starts_with("# Agents 101\n"));

        assert_eq!(
            recorder.stages,
            vec![Stage::Transcript, Stage::Extraction, Stage::Writing]
        );
        assert!(recorder.saw_transcript && recorder.saw_knowledge && recorder.saw_blog);

        let fetched = source.requests.lock().unwrap().clone();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].language, "en");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].messages[0].content.contains("Today we build agents."));
        assert!(requests[1].messages[1].content.contains("Small validated agents"));
    }

    #[tokio::test]
    async fn test_invalid_url_stops_before_fetching() {
        let (mut pipeline, source) = pipeline(MockBackend::new());
        let err = pipeline
            .run("https://example.com/video", "en", &mut NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, SkrivError::InvalidInput(_)));
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_writing() {
        let backend = MockBackend::new().reply("{}").reply("{}").reply("{}");
        let (mut pipeline, _source) = pipeline(backend.clone());
        let mut recorder = Recorder::default();

        let err = pipeline
            .run("3CwWGSV0l9o", "en", &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, SkrivError::Agent(_)));
        assert_eq!(recorder.stages, vec![Stage::Transcript, Stage::Extraction]);
        assert!(!recorder.saw_blog);
        // Default settings allow two correction attempts.
        assert_eq!(backend.requests().len(), 3);
    }

    #[test]
    fn test_with_models() {
        let (pipeline, _source) = pipeline(MockBackend::new());
        let pipeline = pipeline.with_models(Some("gpt-4o"), None);
        assert_eq!(pipeline.knowledge_agent.model(), "gpt-4o");
        assert_eq!(pipeline.blog_agent.model(), "gpt-4o-mini");
    }
}
