use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionTool, ChatCompletionToolArgs, ChatCompletionToolType,
        CreateChatCompletionRequestArgs, FunctionCall, FunctionObjectArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::CompletionError;
use crate::types::{Message, Role, ToolCallRequest, ToolDefinition};

pub const TEMPERATURE: f32 = 0.7;

// The seam between the orchestrator and whatever produces completions.
// An empty `tools` slice means no tools are offered to the model.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, CompletionError>;
}

pub struct Brain {
    client: Client<OpenAIConfig>,
    model: String,
}

impl Brain {
    pub fn new(settings: &Settings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(&settings.openai_api_key);
        if let Some(base) = &settings.openai_api_base {
            config = config.with_api_base(base);
        }

        // Failures are surfaced once to the caller, never retried
        let no_retry = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::ZERO),
            ..Default::default()
        };
        let client = Client::with_config(config).with_backoff(no_retry);

        info!("Brain connected. Model: {}", settings.model);
        Self {
            client,
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl Completion for Brain {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, CompletionError> {
        // 1. Convert our transcript and tools -> OpenAI types
        let api_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()?;
        let api_tools = tools
            .iter()
            .map(to_openai_tool)
            .collect::<Result<Vec<_>, _>>()?;

        // 2. Prepare the Request
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(api_messages)
            .temperature(TEMPERATURE);
        if !api_tools.is_empty() {
            args.tools(api_tools);
        }
        let request = args.build()?;

        debug!(
            "Sending {} messages and {} tools to {}",
            messages.len(),
            tools.len(),
            self.model
        );

        // 3. Send to AI
        let response = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        // 4. Map back, keeping tool calls in the order the model emitted them
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(Message {
            role: Role::Assistant,
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            tool_call_id: None,
        })
    }
}

fn to_request_message(msg: &Message) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let converted = match msg.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(msg.content.as_str())
            .build()?
            .into(),
        Role::Assistant => {
            // Content may only be left out when the turn carries tool calls
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if !msg.content.is_empty() || !msg.has_tool_calls() {
                args.content(msg.content.as_str());
            }
            if msg.has_tool_calls() {
                let calls: Vec<ChatCompletionMessageToolCall> = msg
                    .tool_calls
                    .iter()
                    .map(|call| ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect();
                args.tool_calls(calls);
            }
            args.build()?.into()
        }
        Role::Tool => ChatCompletionRequestToolMessageArgs::default()
            .content(msg.content.as_str())
            .tool_call_id(msg.tool_call_id.clone().unwrap_or_default())
            .build()?
            .into(),
    };
    Ok(converted)
}

fn to_openai_tool(tool: &ToolDefinition) -> Result<ChatCompletionTool, OpenAIError> {
    ChatCompletionToolArgs::default()
        .r#type(ChatCompletionToolType::Function)
        .function(
            FunctionObjectArgs::default()
                .name(&tool.name)
                .description(&tool.description)
                .parameters(tool.parameters.clone()) // Pass the JSON Schema directly
                .build()?,
        )
        .build()
}
