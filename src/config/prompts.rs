//! Prompt definitions for Skriv's agents.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory:
//! `extraction.toml` for the knowledge extraction agent and `blog.toml` for the blog writer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all agent prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub extraction: AgentPrompt,
    pub blog: AgentPrompt,
}

/// The building blocks of an agent's system prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompt {
    /// Who the assistant is and what it is for.
    pub background: Vec<String>,
    /// Steps the assistant should follow internally.
    pub steps: Vec<String>,
    /// Rules the final output must obey.
    pub output_instructions: Vec<String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            extraction: AgentPrompt {
                background: vec![
                    "This Assistant is an expert at extracting knowledge and other insightful and interesting information from YouTube transcripts.".to_string(),
                ],
                steps: vec![
                    "Analyse the YouTube transcript thoroughly to extract the most valuable insights, facts, and recommendations.".to_string(),
                    "Adhere strictly to the provided schema when extracting information from the input content.".to_string(),
                    "Ensure that the output matches the field descriptions, types and constraints exactly.".to_string(),
                ],
                output_instructions: vec![
                    "Only output Markdown-compatible strings.".to_string(),
                    "Ensure you follow ALL these instructions when creating your output.".to_string(),
                ],
            },
            blog: AgentPrompt {
                background: vec![
                    "This Assistant is an expert at writing blog posts about machine learning topics.".to_string(),
                ],
                steps: vec![
                    "Analyse the content provided thoroughly to write an exceptional article with introduction, body, code and conclusion.".to_string(),
                    "Adhere strictly to the provided schema when extracting information from the input content.".to_string(),
                    "Ensure that the output matches the field descriptions, types and constraints exactly.".to_string(),
                ],
                output_instructions: vec![
                    "Only output Markdown-compatible strings.".to_string(),
                    "Ensure you follow ALL these instructions when creating your output.".to_string(),
                ],
            },
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults with any files found in `custom_dir`.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extraction_path = custom_path.join("extraction.toml");
            if extraction_path.exists() {
                let content = std::fs::read_to_string(&extraction_path)?;
                prompts.extraction = toml::from_str(&content)?;
            }

            let blog_path = custom_path.join("blog.toml");
            if blog_path.exists() {
                let content = std::fs::read_to_string(&blog_path)?;
                prompts.blog = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }
}
