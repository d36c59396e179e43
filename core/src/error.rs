use thiserror::Error;

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request. Messages array is required.";
pub const AI_UNAVAILABLE_MESSAGE: &str =
    "The AI service is currently unavailable. Please check your OpenAI API key and try again.";
pub const DATA_SERVICE_UNAVAILABLE_MESSAGE: &str = "The financial data service is currently unavailable. Please ensure the MCP server is running by executing \"python mcp_server.py\" in your terminal.";

// Marker used to decide whether a failure implicates the tool provider
const TOOL_PROVIDER_MARKER: &str = "MCP";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API error: {0}")]
    Api(String),
    #[error("completion API returned no choices")]
    EmptyResponse,
    #[error("failed to build completion request: {0}")]
    Build(String),
}

impl From<async_openai::error::OpenAIError> for CompletionError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        match err {
            async_openai::error::OpenAIError::InvalidArgument(msg) => Self::Build(msg),
            other => Self::Api(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("tool provider failure: {0}")]
    ToolProvider(String),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl ChatError {
    // Completion failures that mention the tool provider are reported as such,
    // so the operator is told which service to start.
    pub fn from_completion(err: CompletionError) -> Self {
        let text = err.to_string();
        if text.contains(TOOL_PROVIDER_MARKER) {
            Self::ToolProvider(text)
        } else {
            Self::Completion(err)
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    // The single text surfaced to the end user; internal details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => INVALID_REQUEST_MESSAGE,
            Self::ToolProvider(_) => DATA_SERVICE_UNAVAILABLE_MESSAGE,
            Self::Completion(_) => AI_UNAVAILABLE_MESSAGE,
        }
    }
}
