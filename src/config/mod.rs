//! Configuration module for Skriv.
//!
//! Handles loading and managing application settings and agent prompts.

mod prompts;
mod settings;

pub use prompts::{AgentPrompt, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, PromptSettings, Settings, YoutubeSettings,
    YOUTUBE_API_KEY_ENV,
};
