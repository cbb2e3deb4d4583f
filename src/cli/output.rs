//! CLI output formatting utilities.

use crate::blog::BlogPost;
use crate::knowledge::KnowledgeExtractionOutput;
use crate::youtube::{format_duration, TranscriptToolOutput};
use chrono::DateTime;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print the fetched transcript and its metadata, optionally shortened to `max_chars`.
    pub fn transcript(output: &TranscriptToolOutput, max_chars: Option<usize>) {
        Output::header("Transcript");
        Output::kv("Title", &output.metadata.title);
        if !output.metadata.channel.is_empty() {
            Output::kv("Channel", &output.metadata.channel);
        }
        if !output.metadata.published_at.is_empty() {
            Output::kv("Published", &format_published(&output.metadata.published_at));
        }
        Output::kv(
            "Duration",
            &format!("{} ({:.0} seconds)", format_duration(output.duration), output.duration),
        );
        if !output.comments.is_empty() {
            Output::kv("Comments", &output.comments.len().to_string());
        }
        match max_chars {
            Some(max) => println!("\n{}", content_preview(&output.transcript, max)),
            None => println!("\n{}", output.transcript),
        }
    }

    /// Print extracted knowledge, one section per field.
    pub fn knowledge(knowledge: &KnowledgeExtractionOutput) {
        Output::header("Knowledge");
        println!("\n{}", style("Summary").bold());
        println!("  {}", knowledge.summary);

        let lists: [(&str, Option<&Vec<String>>); 6] = [
            ("Insights", Some(&knowledge.insights)),
            ("Quotes", Some(&knowledge.quotes)),
            ("Habits", knowledge.habits.as_ref()),
            ("Facts", Some(&knowledge.facts)),
            ("Recommendations", Some(&knowledge.recommendations)),
            ("References", Some(&knowledge.references)),
        ];
        for (title, items) in lists {
            let Some(items) = items.filter(|i| !i.is_empty()) else {
                continue;
            };
            println!("\n{}", style(title).bold());
            for item in items {
                Output::list_item(item);
            }
        }

        println!("\n{}", style("Takeaway").bold());
        println!("  {}", style(&knowledge.one_sentence_takeaway).italic());
    }

    /// Print the drafted blog post as Markdown.
    pub fn blog(post: &BlogPost, title: &str) {
        Output::header("Blog Post");
        println!("\n{}", post.to_markdown(title));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Show an RFC 3339 timestamp as a date, falling back to the raw value.
fn format_published(published_at: &str) -> String {
    DateTime::parse_from_rfc3339(published_at)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| published_at.to_string())
}

/// Truncate content with ellipsis.
pub fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        let truncated: String = content.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
