use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

// One entry in the conversation transcript.
// Assistant turns may carry tool calls; tool turns carry the id of the call they answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// Tool Definition: A description of a capability the model may request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_schema")]
    pub parameters: Value, // Flexible JSON schema
}

pub(crate) fn empty_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

// A tool invocation emitted by the model inside an assistant turn.
// `arguments` is the raw text the model produced, expected (not guaranteed) to be JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub content: String,
}

impl ToolCallResult {
    // String results go through verbatim, anything structured is serialized
    pub fn new(tool_call_id: impl Into<String>, output: Value) -> Self {
        let content = match output {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            tool_call_id: tool_call_id.into(),
            content,
        }
    }
}

impl From<ToolCallResult> for Message {
    fn from(result: ToolCallResult) -> Self {
        Self {
            role: Role::Tool,
            content: result.content,
            tool_calls: Vec::new(),
            tool_call_id: Some(result.tool_call_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_content_reads_as_empty() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":null}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let res = serde_json::from_str::<Message>(r#"{"role":"wizard","content":"hi"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn structured_tool_output_is_serialized() {
        let result = ToolCallResult::new("call_1", serde_json::json!({"total": 1000}));
        assert_eq!(result.content, r#"{"total":1000}"#);

        let msg = Message::from(result);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn string_tool_output_is_verbatim() {
        let result = ToolCallResult::new("call_2", Value::String("plain text".into()));
        assert_eq!(result.content, "plain text");
    }
}
