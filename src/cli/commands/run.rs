//! Run command implementation.

use crate::blog::BlogPost;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, OutputFormat};
use crate::config::Settings;
use crate::knowledge::KnowledgeExtractionOutput;
use crate::pipeline::{Pipeline, PipelineObserver, PipelineOutput, Stage};
use crate::youtube::TranscriptToolOutput;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;

/// Characters of transcript shown while the pipeline runs.
const TRANSCRIPT_PREVIEW_CHARS: usize = 500;

/// Options for the run command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub video: String,
    pub language: Option<String>,
    pub extraction_model: Option<String>,
    pub blog_model: Option<String>,
    pub output: Option<String>,
    pub format: OutputFormat,
}

/// Prints each stage's result as soon as it is available.
struct ConsoleObserver {
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new() -> Self {
        Self { spinner: None }
    }

    fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl PipelineObserver for ConsoleObserver {
    fn stage_started(&mut self, stage: Stage) {
        self.clear();
        let message = match stage {
            Stage::Transcript => "Fetching transcript...",
            Stage::Extraction => "Extracting knowledge...",
            Stage::Writing => "Writing blog post...",
        };
        self.spinner = Some(Output::spinner(message));
    }

    fn transcript_fetched(&mut self, output: &TranscriptToolOutput) {
        self.clear();
        Output::transcript(output, Some(TRANSCRIPT_PREVIEW_CHARS));
    }

    fn knowledge_extracted(&mut self, knowledge: &KnowledgeExtractionOutput) {
        self.clear();
        Output::knowledge(knowledge);
    }

    fn blog_written(&mut self, _post: &BlogPost) {
        self.clear();
    }
}

/// Run the full pipeline.
pub async fn run_pipeline(options: RunOptions, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Run, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'skriv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let language = options
        .language
        .clone()
        .unwrap_or_else(|| settings.youtube.language.clone());

    let mut pipeline = Pipeline::new(&settings)?
        .with_models(options.extraction_model.as_deref(), options.blog_model.as_deref());

    let mut observer = ConsoleObserver::new();
    let output = match pipeline.run(&options.video, &language, &mut observer).await {
        Ok(output) => output,
        Err(e) => {
            observer.clear();
            Output::error(&format!("Error: {}", e));
            return Err(e.into());
        }
    };

    Output::blog(&output.blog, &output.transcript.metadata.title);

    if let Some(path) = &options.output {
        save_output(&output, Path::new(path), options.format)?;
        Output::success(&format!("Saved to {}", path));
    }

    Ok(())
}

/// Write the pipeline result to `path` in the requested format.
pub fn save_output(output: &PipelineOutput, path: &Path, format: OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Markdown => output.blog_markdown(),
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::VideoMetadata;

    fn output() -> PipelineOutput {
        PipelineOutput {
            video_url: "https://www.youtube.com/watch?v=3CwWGSV0l9o".to_string(),
            transcript: TranscriptToolOutput {
                transcript: "hello".to_string(),
                duration: 1.0,
                comments: Vec::new(),
                metadata: VideoMetadata {
                    title: "Title".to_string(),
                    ..Default::default()
                },
            },
            knowledge: KnowledgeExtractionOutput {
                summary: "s".to_string(),
                insights: Vec::new(),
                quotes: Vec::new(),
                habits: None,
                facts: Vec::new(),
                recommendations: Vec::new(),
                references: Vec::new(),
                one_sentence_takeaway: "t".to_string(),
            },
            blog: BlogPost {
                introduction: "Intro".to_string(),
                body: vec!["Body".to_string()],
                code: Vec::new(),
                conclusion: Vec::new(),
            },
        }
    }

    #[test]
    fn test_save_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts").join("post.md");
        save_output(&output(), &path, OutputFormat::Markdown).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "# Title\n\nIntro\n\nBody\n");
    }

    #[test]
    fn test_save_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.json");
        save_output(&output(), &path, OutputFormat::Json).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["blog"]["introduction"], "Intro");
        assert_eq!(value["knowledge"]["one_sentence_takeaway"], "t");
        assert_eq!(value["transcript"]["metadata"]["title"], "Title");
    }
}
