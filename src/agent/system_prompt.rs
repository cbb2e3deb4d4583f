//! System prompt assembly.

use crate::config::AgentPrompt;

/// A named block of information appended to an agent's system prompt.
pub trait ContextProvider: Send + Sync {
    /// Heading shown above the provided information.
    fn title(&self) -> &str;

    /// The information itself.
    fn info(&self) -> String;
}

/// Builds system prompts from background, steps, output instructions and context providers.
pub struct SystemPromptGenerator {
    prompt: AgentPrompt,
    providers: Vec<Box<dyn ContextProvider>>,
}

impl SystemPromptGenerator {
    pub fn new(prompt: AgentPrompt) -> Self {
        Self {
            prompt,
            providers: Vec::new(),
        }
    }

    /// Register a context provider. A provider with the same title replaces the old one.
    pub fn register(&mut self, provider: Box<dyn ContextProvider>) {
        self.providers.retain(|p| p.title() != provider.title());
        self.providers.push(provider);
    }

    /// Remove the provider with the given title, if any.
    pub fn unregister(&mut self, title: &str) {
        self.providers.retain(|p| p.title() != title);
    }

    pub fn provider_titles(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.title()).collect()
    }

    /// Render the system prompt. Empty sections are left out.
    pub fn generate(&self) -> String {
        let sections = [
            ("IDENTITY and PURPOSE", &self.prompt.background),
            ("INTERNAL ASSISTANT STEPS", &self.prompt.steps),
            ("OUTPUT INSTRUCTIONS", &self.prompt.output_instructions),
        ];

        let mut parts = Vec::new();
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            let mut section = format!("# {}", title);
            for item in items {
                section.push_str("\n- ");
                section.push_str(item);
            }
            parts.push(section);
        }

        if !self.providers.is_empty() {
            let mut section = "# EXTRA INFORMATION AND CONTEXT".to_string();
            for provider in &self.providers {
                section.push_str(&format!("\n## {}\n{}\n", provider.title(), provider.info()));
            }
            parts.push(section.trim_end().to_string());
        }

        parts.join("\n\n")
    }
}
