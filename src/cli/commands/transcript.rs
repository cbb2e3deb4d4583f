//! Transcript command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::youtube::{TranscriptTool, TranscriptToolInput};
use anyhow::Result;

/// Fetch and print a transcript without running the agents.
pub async fn run_transcript(video: &str, language: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'skriv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let language = language.unwrap_or_else(|| settings.youtube.language.clone());
    let tool = TranscriptTool::from_settings(&settings)?;

    let spinner = Output::spinner("Fetching transcript...");
    match tool.run(&TranscriptToolInput::new(video, language)).await {
        Ok(output) => {
            spinner.finish_and_clear();
            Output::transcript(&output, None);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to fetch transcript: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
