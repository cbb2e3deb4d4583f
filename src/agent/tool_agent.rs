//! Agent that answers questions by calling a single tool.
//!
//! The model first turns the user's question into the tool's input record. The
//! tool runs, and both the call and its result are kept in memory as tool
//! messages. The agent then either returns the tool output untouched or asks the
//! model to answer from it.

use super::backend::{ChatBackend, ChatMessage, ChatRequest, ToolInvocation};
use super::runner::{request_structured, with_output_format};
use super::schema::{require_text, IoSchema};
use super::system_prompt::SystemPromptGenerator;
use crate::config::{AgentPrompt, AgentSettings};
use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Something an agent can call with a typed input.
#[async_trait]
pub trait Tool: Send + Sync {
    type Input: IoSchema;
    type Output: IoSchema;

    /// Short identifier, also used as the function name in tool messages.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, input: &Self::Input) -> Result<Self::Output>;
}

/// A question or instruction for the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolQuery {
    /// Tool input, presented as a single question or instruction.
    pub tool_input: String,
}

impl ToolQuery {
    pub fn new(tool_input: impl Into<String>) -> Self {
        Self {
            tool_input: tool_input.into(),
        }
    }
}

impl IoSchema for ToolQuery {
    fn validate(&self) -> std::result::Result<(), String> {
        require_text("tool_input", &self.tool_input)
    }
}

/// The agent's answer after reading the tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolAnswer {
    /// The response to the user, based on the tool output.
    pub chat_message: String,
}

impl IoSchema for ToolAnswer {
    fn validate(&self) -> std::result::Result<(), String> {
        require_text("chat_message", &self.chat_message)
    }
}

/// What a tool interface agent hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse<O> {
    /// The tool output as returned by the tool.
    Raw(O),
    /// The model's answer written from the tool output.
    Answer(ToolAnswer),
}

/// Build the system prompt for an agent wrapping `tool`.
pub fn tool_prompt(name: &str, description: &str, return_raw_output: bool) -> AgentPrompt {
    let final_instruction = if return_raw_output {
        "Return the raw output of the tool."
    } else {
        "Process the output of the tool into a human readable format and/or use it to respond to the user input."
    };

    AgentPrompt {
        background: vec![
            format!("This AI agent is designed to interact with the {} tool.", name),
            format!("Tool description: {}", description),
        ],
        steps: vec![
            "Get the user input.".to_string(),
            "Convert the input to the proper parameters to call the tool.".to_string(),
            "Call the tool with the parameters.".to_string(),
            "Respond to the user".to_string(),
        ],
        output_instructions: vec![
            "Make sure the tool call will maximize the utility of the tool in the context of the user input."
                .to_string(),
            final_instruction.to_string(),
        ],
    }
}

/// Agent that converts questions into calls to one tool.
pub struct ToolInterfaceAgent<T: Tool> {
    tool: T,
    backend: Arc<dyn ChatBackend>,
    model: String,
    temperature: f32,
    max_retries: u32,
    prompt: SystemPromptGenerator,
    return_raw_output: bool,
    memory: Vec<ChatMessage>,
}

impl<T: Tool> ToolInterfaceAgent<T> {
    pub fn new(tool: T, backend: Arc<dyn ChatBackend>, settings: &AgentSettings) -> Self {
        let prompt = SystemPromptGenerator::new(tool_prompt(tool.name(), tool.description(), false));
        Self {
            tool,
            backend,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_retries: settings.max_retries,
            prompt,
            return_raw_output: false,
            memory: Vec::new(),
        }
    }

    /// Return the tool output itself instead of a written answer.
    pub fn with_raw_output(mut self, return_raw_output: bool) -> Self {
        self.prompt = SystemPromptGenerator::new(tool_prompt(
            self.tool.name(),
            self.tool.description(),
            return_raw_output,
        ));
        self.return_raw_output = return_raw_output;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn memory(&self) -> &[ChatMessage] {
        &self.memory
    }

    pub fn reset_memory(&mut self) {
        self.memory.clear();
    }

    /// Answer `query` through the tool.
    ///
    /// On error the memory is left as it was before the call.
    #[instrument(skip(self, query), fields(tool = %self.tool.name(), model = %self.model))]
    pub async fn run(&mut self, query: &ToolQuery) -> Result<ToolResponse<T::Output>> {
        query
            .validate()
            .map_err(|e| SkrivError::Validation(format!("{} query: {}", self.tool.name(), e)))?;

        let checkpoint = self.memory.len();
        self.memory
            .push(ChatMessage::user(serde_json::to_string_pretty(query)?));

        let result = self.call_tool().await;
        if result.is_err() {
            self.memory.truncate(checkpoint);
        }
        result
    }

    async fn call_tool(&mut self) -> Result<ToolResponse<T::Output>> {
        let base = self.prompt.generate();
        let name = self.tool.name().to_string();

        let request = self.request(with_output_format::<T::Input>(base.clone())?);
        let tool_input: T::Input =
            request_structured(self.backend.as_ref(), request, self.max_retries, &name).await?;

        let invocation = ToolInvocation {
            id: format!("call_{}", Uuid::new_v4().simple()),
            name: name.clone(),
            arguments: serde_json::to_string(&tool_input)?,
        };
        let call_id = invocation.id.clone();
        info!("Calling tool {} with {}", name, invocation.arguments);
        self.memory.push(ChatMessage::tool_call(invocation));

        let output = self.tool.run(&tool_input).await?;
        self.memory
            .push(ChatMessage::tool_result(call_id, serde_json::to_string(&output)?));

        if self.return_raw_output {
            return Ok(ToolResponse::Raw(output));
        }

        let request = self.request(with_output_format::<ToolAnswer>(base)?);
        let answer: ToolAnswer =
            request_structured(self.backend.as_ref(), request, self.max_retries, &name).await?;
        self.memory
            .push(ChatMessage::assistant(serde_json::to_string(&answer)?));

        Ok(ToolResponse::Answer(answer))
    }

    fn request(&self, system_prompt: String) -> ChatRequest {
        let mut messages = vec![ChatMessage::system(system_prompt)];
        messages.extend(self.memory.iter().cloned());
        ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages,
            json_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::backend::Role;
    use crate::agent::mocks::MockBackend;
    use std::sync::Mutex;

    /// Lookup input.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct LookupInput {
        /// Word to define.
        word: String,
    }

    impl IoSchema for LookupInput {
        fn validate(&self) -> std::result::Result<(), String> {
            require_text("word", &self.word)
        }
    }

    /// Lookup output.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
    struct LookupOutput {
        definition: String,
    }

    impl IoSchema for LookupOutput {}

    #[derive(Default)]
    struct Dictionary {
        calls: Mutex<Vec<LookupInput>>,
        broken: bool,
    }

    #[async_trait]
    impl Tool for Dictionary {
        type Input = LookupInput;
        type Output = LookupOutput;

        fn name(&self) -> &str {
            "dictionary"
        }

        fn description(&self) -> &str {
            "Defines English words."
        }

        async fn run(&self, input: &LookupInput) -> Result<LookupOutput> {
            self.calls.lock().unwrap().push(input.clone());
            if self.broken {
                return Err(SkrivError::InvalidInput("dictionary offline".to_string()));
            }
            Ok(LookupOutput {
                definition: format!("{}: a thing", input.word),
            })
        }
    }

    fn settings() -> AgentSettings {
        AgentSettings {
            model: "test-model".to_string(),
            temperature: 0.0,
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_answer_from_tool_output() {
        let backend = MockBackend::new()
            .reply(r#"{"word": "crab"}"#)
            .reply(r#"{"chat_message": "A crab is a thing."}"#);
        let mut agent = ToolInterfaceAgent::new(
            Dictionary::default(),
            Arc::new(backend.clone()),
            &settings(),
        );

        let response = agent.run(&ToolQuery::new("What is a crab?")).await.unwrap();
        assert_eq!(
            response,
            ToolResponse::Answer(ToolAnswer {
                chat_message: "A crab is a thing.".to_string()
            })
        );

        let memory = agent.memory();
        assert_eq!(memory.len(), 4);
        assert_eq!(memory[0].role, Role::User);
        let call = memory[1].tool_call.as_ref().unwrap();
        assert_eq!(call.name, "dictionary");
        assert_eq!(call.arguments, r#"{"word":"crab"}"#);
        assert_eq!(memory[2].role, Role::Tool);
        assert_eq!(memory[2].tool_call_id.as_deref(), Some(call.id.as_str()));
        assert!(memory[2].content.contains("crab: a thing"));
        assert_eq!(memory[3].role, Role::Assistant);

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].messages[0].content.contains("interact with the dictionary tool"));
        assert!(requests[0].messages[0].content.contains("Word to define."));
        assert!(requests[1].messages[0].content.contains("chat_message"));
        assert!(requests[1]
            .messages
            .iter()
            .any(|m| m.role == Role::Tool && m.content.contains("crab: a thing")));
    }

    #[tokio::test]
    async fn test_raw_output_skips_second_call() {
        let backend = MockBackend::new().reply(r#"{"word": "crab"}"#);
        let mut agent = ToolInterfaceAgent::new(
            Dictionary::default(),
            Arc::new(backend.clone()),
            &settings(),
        )
        .with_raw_output(true);

        let response = agent.run(&ToolQuery::new("Define crab")).await.unwrap();
        assert_eq!(
            response,
            ToolResponse::Raw(LookupOutput {
                definition: "crab: a thing".to_string()
            })
        );
        assert_eq!(backend.requests().len(), 1);
        assert!(backend.requests()[0].messages[0]
            .content
            .contains("Return the raw output of the tool."));
        assert_eq!(agent.memory().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_tool_input_is_retried() {
        let backend = MockBackend::new()
            .reply(r#"{"word": " "}"#)
            .reply(r#"{"word": "crab"}"#);
        let dictionary = Dictionary::default();
        let mut agent =
            ToolInterfaceAgent::new(dictionary, Arc::new(backend.clone()), &settings())
                .with_raw_output(true);

        agent.run(&ToolQuery::new("Define crab")).await.unwrap();
        assert_eq!(backend.requests().len(), 2);
        assert_eq!(agent.tool.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_restores_memory() {
        let backend = MockBackend::new().reply(r#"{"word": "crab"}"#);
        let dictionary = Dictionary {
            broken: true,
            ..Default::default()
        };
        let mut agent = ToolInterfaceAgent::new(dictionary, Arc::new(backend), &settings());

        let err = agent.run(&ToolQuery::new("Define crab")).await.unwrap_err();
        assert!(matches!(err, SkrivError::InvalidInput(_)));
        assert!(agent.memory().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let backend = MockBackend::new();
        let mut agent =
            ToolInterfaceAgent::new(Dictionary::default(), Arc::new(backend.clone()), &settings());

        let err = agent.run(&ToolQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, SkrivError::Validation(_)));
        assert!(backend.requests().is_empty());
    }
}
