//! Blog post drafting from extracted knowledge.

use crate::agent::schema::{forbid_blank_items, require_items, require_text};
use crate::agent::{Agent, AgentConfig, ChatBackend, IoSchema};
use crate::knowledge::KnowledgeExtractionOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The blog writer consumes exactly what the extraction agent produces.
pub type BlogWriterInput = KnowledgeExtractionOutput;

/// Agent that drafts a blog post from extracted knowledge.
pub type BlogWriterAgent = Agent<BlogWriterInput, BlogPost>;

/// This schema defines how the article should be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BlogPost {
    /// A 3 paragraph introduction explaining what the article is about and what the reader should expect from the article.
    pub introduction: String,
    /// A thorough and detailed explanation of the theme of the article based on the input.
    pub body: Vec<String>,
    /// A simple use case example on how to code what has been explained in the article. You must include mock up data and a code block in your output.
    pub code: Vec<String>,
    /// A 3 paragraph conclusion about the article and what the reader should take away from it.
    pub conclusion: Vec<String>,
}

impl IoSchema for BlogPost {
    fn validate(&self) -> Result<(), String> {
        require_text("introduction", &self.introduction)?;
        require_items("body", &self.body)?;
        forbid_blank_items("code", &self.code)?;
        forbid_blank_items("conclusion", &self.conclusion)?;
        Ok(())
    }
}

impl BlogPost {
    /// Render the post as Markdown under the given title.
    pub fn to_markdown(&self, title: &str) -> String {
        let mut sections = Vec::new();

        if !title.trim().is_empty() {
            sections.push(format!("# {}", title.trim()));
        }
        sections.push(self.introduction.trim().to_string());
        sections.extend(self.body.iter().map(|p| p.trim().to_string()));

        if !self.code.is_empty() {
            sections.push("## Code".to_string());
            sections.extend(self.code.iter().map(|c| c.trim().to_string()));
        }

        if !self.conclusion.is_empty() {
            sections.push("## Conclusion".to_string());
            sections.extend(self.conclusion.iter().map(|p| p.trim().to_string()));
        }

        let mut markdown = sections.join("\n\n");
        markdown.push('\n');
        markdown
    }
}

/// Create the blog writer agent.
pub fn blog_writer_agent(backend: Arc<dyn ChatBackend>, config: AgentConfig) -> BlogWriterAgent {
    Agent::new("blog-writer", backend, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::mocks::MockBackend;
    use crate::config::{AgentSettings, Prompts};

    fn post() -> BlogPost {
        BlogPost {
            introduction: "Agents are everywhere.".to_string(),
            body: vec!["First point.".to_string(), "Second point. ".to_string()],
            code: vec!["```rust\nfn main() {}\n```".to_string()],
            conclusion: vec!["Go build one.".to_string()],
        }
    }

    fn knowledge() -> KnowledgeExtractionOutput {
        KnowledgeExtractionOutput {
            summary: "A talk about agents.".to_string(),
            insights: vec!["Keep agents small.".to_string()],
            quotes: Vec::new(),
            habits: None,
            facts: Vec::new(),
            recommendations: vec!["Validate output.".to_string()],
            references: Vec::new(),
            one_sentence_takeaway: "Small validated agents compose well.".to_string(),
        }
    }

    #[test]
    fn test_to_markdown() {
        let markdown = post().to_markdown("Building Agents");
        assert_eq!(
            markdown,
            "# Building Agents\n\nAgents are everywhere.\n\nFirst point.\n\nSecond point.\n\n## Code\n\n```rust\nfn main() {}\n```\n\n## Conclusion\n\nGo build one.\n"
        );
    }

    #[test]
    fn test_to_markdown_without_optional_sections() {
        let mut post = post();
        post.code.clear();
        post.conclusion.clear();
        let markdown = post.to_markdown("");
        assert!(markdown.starts_with("Agents are everywhere."));
        assert!(!markdown.contains("## Code"));
        assert!(!markdown.contains("## Conclusion"));
    }

    #[test]
    fn test_validation_requires_body() {
        let mut post = post();
        assert!(post.validate().is_ok());
        post.body.clear();
        assert_eq!(
            post.validate().unwrap_err(),
            "`body` must contain at least one entry"
        );
    }

    #[tokio::test]
    async fn test_blog_writer_sends_knowledge_as_input() {
        let reply = serde_json::to_string(&post()).unwrap();
        let backend = MockBackend::new().reply(reply);
        let config = AgentConfig::new(&AgentSettings::default(), Prompts::default().blog);
        let mut agent = blog_writer_agent(Arc::new(backend.clone()), config);

        let written = agent.run(&knowledge()).await.unwrap();
        assert_eq!(written, post());

        let request = &backend.requests()[0];
        assert!(request.messages[0].content.contains("expert at writing blog posts"));
        assert!(request.messages[0].content.contains("mock up data"));
        assert!(request.messages[1].content.contains("Small validated agents compose well."));
    }
}
