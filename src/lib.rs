//! Skriv - YouTube transcripts to blog posts
//!
//! A CLI tool that turns a YouTube video into a blog post by chaining two
//! LLM agents with schema-checked inputs and outputs.
//!
//! The name "Skriv" comes from the Norwegian/Scandinavian word for "write."
//!
//! # Overview
//!
//! Skriv runs three stages:
//! - Fetch the video's transcript, metadata and top comments from YouTube
//! - Extract structured knowledge (summary, insights, quotes, ...) from the transcript
//! - Draft a blog post from the extracted knowledge
//!
//! # Architecture
//!
//! - `config` - Settings and agent prompts
//! - `youtube` - Transcript tool (Data API metadata, captions, comments)
//! - `agent` - Typed agents, system prompt generation and LLM backends
//! - `knowledge` - Knowledge extraction agent and transcript context provider
//! - `blog` - Blog writer agent and Markdown rendering
//! - `pipeline` - Stage coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use skriv::config::Settings;
//! use skriv::pipeline::{NoopObserver, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut pipeline = Pipeline::new(&settings)?;
//!
//!     let output = pipeline
//!         .run("https://www.youtube.com/watch?v=3CwWGSV0l9o", "en", &mut NoopObserver)
//!         .await?;
//!     println!("{}", output.blog_markdown());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod blog;
pub mod cli;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod openai;
pub mod pipeline;
pub mod youtube;

pub use error::{Result, SkrivError};
