//! Ask command implementation.

use crate::agent::{ChatBackend, OpenAiBackend, ToolInterfaceAgent, ToolQuery, ToolResponse};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::youtube::TranscriptTool;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Answer a question about a video by letting the model call the transcript tool.
pub async fn run_ask(question: &str, raw: bool, model: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'skriv doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let tool = TranscriptTool::from_settings(&settings)?;
    let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiBackend::with_timeout(Duration::from_secs(
        settings.general.openai_timeout_seconds,
    ))?);

    let mut agent = ToolInterfaceAgent::new(tool, backend, &settings.extraction).with_raw_output(raw);
    if let Some(model) = &model {
        agent = agent.with_model(model);
    }

    let spinner = Output::spinner("Thinking...");
    let response = agent.run(&ToolQuery::new(question)).await;
    spinner.finish_and_clear();

    match response {
        Ok(ToolResponse::Answer(answer)) => {
            Output::header("Answer");
            println!("\n{}", answer.chat_message);
        }
        Ok(ToolResponse::Raw(output)) => {
            Output::transcript(&output, None);
        }
        Err(e) => {
            Output::error(&format!("Error: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
