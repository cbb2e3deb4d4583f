//! Pre-flight checks before contacting external services.
//!
//! Validates that required credentials are available before starting a
//! pipeline that would otherwise fail midway.

use crate::config::{Settings, YOUTUBE_API_KEY_ENV};
use crate::error::{Result, SkrivError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The full pipeline needs both YouTube and OpenAI credentials.
    Run,
    /// Fetching a transcript needs the YouTube key only.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Run => {
            check_youtube_key(settings)?;
            check_openai_key()?;
        }
        Operation::Transcript => {
            check_youtube_key(settings)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SkrivError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SkrivError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check if a YouTube Data API key is configured.
fn check_youtube_key(settings: &Settings) -> Result<()> {
    match settings.youtube_api_key() {
        Some(_) => Ok(()),
        None => Err(SkrivError::Config(format!(
            "{} not set. Set it with: export {}='...' or skriv config set youtube.api_key ...",
            YOUTUBE_API_KEY_ENV, YOUTUBE_API_KEY_ENV
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_passes_with_configured_key() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("configured".to_string());
        assert!(check(Operation::Transcript, &settings).is_ok());
    }
}
