//! Conversation orchestration.
//!
//! One inbound request runs straight through:
//! availability check, system prompt, first completion, then (only if the
//! model asked for tools) sequential tool execution and a second completion.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ChatError;
use crate::llm::Completion;
use crate::registry::Registry;
use crate::runtime::Runtime;
use crate::types::{Message, Role, ToolCallRequest, ToolCallResult};

pub const PERSONA: &str = "You are RightNow, an AI financial advisor specialized in analyzing retail transaction data from Jordan malls. You provide real-time insights, trend analysis, and actionable recommendations based on financial data.";

pub const OUTAGE_CLAUSE: &str = " IMPORTANT: The MCP server that provides financial data is currently offline. Inform the user that they need to start the MCP server with \"python mcp_server.py\" to access data analysis features. Do not attempt to provide specific financial insights without the server connection.";

pub struct Orchestrator {
    brain: Arc<dyn Completion>,
    registry: Registry,
    runtime: Runtime,
}

impl Orchestrator {
    pub fn new(brain: Arc<dyn Completion>, registry: Registry, runtime: Runtime) -> Self {
        Self {
            brain,
            registry,
            runtime,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // Runs the whole pipeline for one request and returns the final answer text.
    pub async fn respond(&self, prior: Vec<Message>) -> Result<String, ChatError> {
        // STEP 1: CHECK the data service. Only shapes the prompt and tool list.
        let available = self.registry.is_available().await;
        if !available {
            warn!("Tool provider at {} is unreachable; running in degraded mode", self.registry.base_url());
        }

        // STEP 2: PROMPT. Exactly one system message, always first.
        let mut transcript = Vec::with_capacity(prior.len() + 2);
        transcript.push(system_prompt(available));
        transcript.extend(prior);

        let tools = if available {
            self.registry.list_tools().await
        } else {
            Vec::new()
        };

        // STEP 3: THINK
        let first = self
            .brain
            .complete(&transcript, &tools)
            .await
            .map_err(ChatError::from_completion)?;

        if !first.has_tool_calls() {
            info!("Model answered without tools");
            return Ok(first.content);
        }

        let calls = first.tool_calls.clone();
        transcript.push(first);

        // STEP 4: ACT. Strictly in emitted order, one at a time.
        info!("Model requested {} tool call(s)", calls.len());
        for call in &calls {
            let arguments = parse_arguments(call);
            let output = self.runtime.run_tool(&call.name, &arguments).await;
            transcript.push(ToolCallResult::new(call.id.clone(), output).into());
        }

        // STEP 5: SYNTHESIZE. No tools offered this time.
        let last = self
            .brain
            .complete(&transcript, &[])
            .await
            .map_err(ChatError::from_completion)?;

        Ok(last.content)
    }
}

pub fn system_prompt(available: bool) -> Message {
    let mut content = PERSONA.to_string();
    if !available {
        content.push_str(OUTAGE_CLAUSE);
    }
    Message::system(content)
}

fn parse_arguments(call: &ToolCallRequest) -> Value {
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(args) => args,
        Err(e) => {
            warn!(
                "Failed to parse arguments for '{}' ({}): {}; using empty arguments",
                call.name, call.id, e
            );
            Value::Object(Default::default())
        }
    }
}

// Validates an inbound `/api/chat` body before anything goes out on the network.
// Client-supplied system messages are dropped: the system prompt is ours to build.
// Tool messages must name the call they answer.
pub fn parse_messages(body: &Value) -> Result<Vec<Message>, ChatError> {
    let raw = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| ChatError::InvalidRequest("messages array is required".to_string()))?;

    let mut messages = Vec::with_capacity(raw.len());
    for (idx, entry) in raw.iter().enumerate() {
        let msg: Message = serde_json::from_value(entry.clone())
            .map_err(|e| ChatError::InvalidRequest(format!("message {}: {}", idx, e)))?;
        if msg.role == Role::System {
            warn!("Dropping client-supplied system message at index {}", idx);
            continue;
        }
        if msg.role == Role::Tool && msg.tool_call_id.as_deref().map_or(true, str::is_empty) {
            return Err(ChatError::InvalidRequest(format!(
                "message {}: tool message without tool_call_id",
                idx
            )));
        }
        messages.push(msg);
    }
    Ok(messages)
}
