//! Chat completion backends.

use crate::error::{Result, SkrivError};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, ResponseFormat,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation made on the assistant's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Tool input serialized as JSON.
    pub arguments: String,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on assistant messages that call a tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,
    /// Set on tool messages: the id of the call they answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            tool_call: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content.into())
    }

    /// An assistant message recording a tool call.
    pub fn tool_call(invocation: ToolInvocation) -> Self {
        Self {
            tool_call: Some(invocation),
            ..Self::plain(Role::Assistant, String::new())
        }
    }

    /// The result of the tool call with the given id.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::plain(Role::Tool, content.into())
        }
    }
}

/// A chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
    /// Ask the model to answer with a single JSON object.
    pub json_output: bool,
}

/// Something that can complete a chat conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the assistant's reply text.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Chat backend backed by the OpenAI API.
pub struct OpenAiBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiBackend {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: crate::openai::create_client_with_timeout(timeout)?,
        })
    }

    fn convert(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let converted = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| SkrivError::Agent(e.to_string()))?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| SkrivError::Agent(e.to_string()))?
                .into(),
            Role::Assistant => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                match &message.tool_call {
                    Some(call) => {
                        args.tool_calls(vec![ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        }]);
                    }
                    None => {
                        args.content(message.content.clone());
                    }
                }
                args.build().map_err(|e| SkrivError::Agent(e.to_string()))?.into()
            }
            Role::Tool => {
                let call_id = message.tool_call_id.as_deref().ok_or_else(|| {
                    SkrivError::Agent("Tool message without a tool call id".to_string())
                })?;
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(call_id)
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| SkrivError::Agent(e.to_string()))?
                    .into()
            }
        };
        Ok(converted)
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let messages = request
            .messages
            .iter()
            .map(Self::convert)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(messages)
            .temperature(request.temperature);
        if request.json_output {
            args.response_format(ResponseFormat::JsonObject);
        }
        let openai_request = args.build().map_err(|e| SkrivError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| SkrivError::OpenAI(e.to_string()))?;

        if let Some(usage) = &response.usage {
            debug!(
                "Token usage: {} prompt, {} completion",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| SkrivError::Agent("Empty response from model".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("a").role, Role::System);
        assert_eq!(ChatMessage::user("b").role, Role::User);
        assert_eq!(ChatMessage::assistant("c").content, "c");
    }

    #[test]
    fn test_backend_builds() {
        assert!(OpenAiBackend::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_convert_tool_messages() {
        let call = ChatMessage::tool_call(ToolInvocation {
            id: "call_1".to_string(),
            name: "youtube_transcript".to_string(),
            arguments: r#"{"video_url":"x"}"#.to_string(),
        });
        match OpenAiBackend::convert(&call).unwrap() {
            ChatCompletionRequestMessage::Assistant(message) => {
                let calls = message.tool_calls.unwrap();
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "youtube_transcript");
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let result = ChatMessage::tool_result("call_1", "{}");
        match OpenAiBackend::convert(&result).unwrap() {
            ChatCompletionRequestMessage::Tool(message) => assert_eq!(message.tool_call_id, "call_1"),
            other => panic!("unexpected message: {:?}", other),
        }

        let orphan = ChatMessage {
            tool_call_id: None,
            ..ChatMessage::tool_result("x", "{}")
        };
        assert!(OpenAiBackend::convert(&orphan).is_err());
    }

    #[test]
    fn test_convert_roles() {
        for message in [
            ChatMessage::system("s"),
            ChatMessage::user("u"),
            ChatMessage::assistant("a"),
        ] {
            let converted = OpenAiBackend::convert(&message).unwrap();
            let matches = matches!(
                (&message.role, &converted),
                (Role::System, ChatCompletionRequestMessage::System(_))
                    | (Role::User, ChatCompletionRequestMessage::User(_))
                    | (Role::Assistant, ChatCompletionRequestMessage::Assistant(_))
            );
            assert!(matches);
        }
    }
}
