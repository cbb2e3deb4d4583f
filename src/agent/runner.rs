//! Structured-output agent runner.

use super::backend::{ChatBackend, ChatMessage, ChatRequest};
use super::schema::IoSchema;
use super::system_prompt::{ContextProvider, SystemPromptGenerator};
use crate::config::{AgentPrompt, AgentSettings};
use crate::error::{Result, SkrivError};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Model settings and prompt for an agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub prompt: AgentPrompt,
}

impl AgentConfig {
    pub fn new(settings: &AgentSettings, prompt: AgentPrompt) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
            prompt,
        }
    }
}

/// An agent that turns an `I` into an `O` through a language model.
///
/// Each run appends the input and the accepted output to the agent's memory,
/// so later runs see earlier exchanges.
pub struct Agent<I, O> {
    name: String,
    backend: Arc<dyn ChatBackend>,
    model: String,
    temperature: f32,
    max_retries: u32,
    prompt: SystemPromptGenerator,
    memory: Vec<ChatMessage>,
    _schemas: PhantomData<fn(&I) -> O>,
}

impl<I: IoSchema, O: IoSchema> Agent<I, O> {
    pub fn new(name: &str, backend: Arc<dyn ChatBackend>, config: AgentConfig) -> Self {
        Self {
            name: name.to_string(),
            backend,
            model: config.model,
            temperature: config.temperature,
            max_retries: config.max_retries,
            prompt: SystemPromptGenerator::new(config.prompt),
            memory: Vec::new(),
            _schemas: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Override the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Add context to the system prompt for subsequent runs.
    pub fn register_context_provider(&mut self, provider: Box<dyn ContextProvider>) {
        self.prompt.register(provider);
    }

    pub fn unregister_context_provider(&mut self, title: &str) {
        self.prompt.unregister(title);
    }

    /// Conversation history kept between runs.
    pub fn memory(&self) -> &[ChatMessage] {
        &self.memory
    }

    pub fn reset_memory(&mut self) {
        self.memory.clear();
    }

    /// Full system prompt, including the output schema the model must follow.
    pub fn system_prompt(&self) -> Result<String> {
        with_output_format::<O>(self.prompt.generate())
    }

    /// Run the agent on `input`.
    ///
    /// Replies that are not valid JSON for `O`, or that fail `O::validate`, are sent
    /// back to the model with the error up to `max_retries` times.
    #[instrument(skip(self, input), fields(agent = %self.name, model = %self.model))]
    pub async fn run(&mut self, input: &I) -> Result<O> {
        input
            .validate()
            .map_err(|e| SkrivError::Validation(format!("{} input: {}", self.name, e)))?;

        let user_message = ChatMessage::user(serde_json::to_string_pretty(input)?);
        let mut messages = vec![ChatMessage::system(self.system_prompt()?)];
        messages.extend(self.memory.iter().cloned());
        messages.push(user_message.clone());

        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages,
            json_output: true,
        };
        let output: O =
            request_structured(self.backend.as_ref(), request, self.max_retries, &self.name).await?;

        self.memory.push(user_message);
        self.memory.push(ChatMessage::assistant(serde_json::to_string(&output)?));
        Ok(output)
    }
}

/// Append the JSON schema of `O` to a system prompt.
pub(crate) fn with_output_format<O: IoSchema>(base: String) -> Result<String> {
    let schema = serde_json::to_string_pretty(&O::schema_value())?;
    let output_section = format!(
        "# OUTPUT FORMAT\nRespond with a single JSON object that conforms to this JSON schema. Do not wrap it in prose.\n```json\n{}\n```",
        schema
    );

    Ok(if base.is_empty() {
        output_section
    } else {
        format!("{}\n\n{}", base, output_section)
    })
}

/// Send `request` until the reply parses and validates as `O`.
///
/// Rejected replies go back to the model with the error, up to `max_retries` times.
/// Backend errors are returned as they are.
pub(crate) async fn request_structured<O: IoSchema>(
    backend: &dyn ChatBackend,
    mut request: ChatRequest,
    max_retries: u32,
    name: &str,
) -> Result<O> {
    let attempts = max_retries + 1;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        debug!("{} attempt {}/{}", name, attempt, attempts);

        let reply = backend.complete(&request).await?;

        match parse_reply::<O>(&reply) {
            Ok(output) => {
                info!("{} produced a valid response", name);
                return Ok(output);
            }
            Err(e) => {
                warn!("{} reply rejected: {}", name, e);
                request.messages.push(ChatMessage::assistant(reply));
                request.messages.push(ChatMessage::user(format!(
                    "Your previous response was invalid: {}. Respond again with a corrected JSON object that follows the schema exactly.",
                    e
                )));
                last_error = e;
            }
        }
    }

    Err(SkrivError::Agent(format!(
        "{} gave no valid response after {} attempt(s): {}",
        name, attempts, last_error
    )))
}

/// Parse and validate a model reply, tolerating surrounding prose or code fences.
pub fn parse_reply<O: IoSchema>(reply: &str) -> std::result::Result<O, String> {
    let json_start = reply.find('{');
    let json_end = reply.rfind('}');

    let json_str = match (json_start, json_end) {
        (Some(start), Some(end)) if end > start => &reply[start..=end],
        _ => reply,
    };

    let output: O = serde_json::from_str(json_str).map_err(|e| e.to_string())?;
    output.validate()?;
    Ok(output)
}
