use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::types::{empty_schema, ToolDefinition};

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);
const LIST_TIMEOUT: Duration = Duration::from_secs(5);

pub const OFFLINE_TOOL_NAME: &str = "notify_server_offline";

// The shape of one entry on /list_tools.
// The MCP bridge wraps each tool in the OpenAI function envelope, but a flat
// definition is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListedTool {
    Wrapped { function: ToolDefinition },
    Flat(ToolDefinition),
}

impl From<ListedTool> for ToolDefinition {
    fn from(listed: ListedTool) -> Self {
        match listed {
            ListedTool::Wrapped { function } => function,
            ListedTool::Flat(def) => def,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListToolsResponse {
    tools: Vec<ListedTool>,
}

// Tool Registry Client: asks the tool provider what it can do.
// Nothing is cached; every request gets a fresh list.
#[derive(Debug, Clone)]
pub struct Registry {
    http: reqwest::Client,
    base_url: String,
}

impl Registry {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // True only on a 200 from /status. Any other outcome means unreachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/status", self.base_url);
        match self.http.get(&url).timeout(STATUS_TIMEOUT).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => true,
            Ok(resp) => {
                warn!("Tool provider status check returned {}", resp.status());
                false
            }
            Err(e) => {
                error!("Tool provider connection error: {}", e);
                false
            }
        }
    }

    // Single attempt. On any failure we hand back the offline sentinel so the
    // model can tell the user the data service is down.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        match self.fetch_tools().await {
            Ok(tools) => {
                info!("Loaded {} tools from provider", tools.len());
                tools
            }
            Err(e) => {
                error!("Error fetching tools: {:#}", e);
                vec![offline_tool()]
            }
        }
    }

    async fn fetch_tools(&self) -> anyhow::Result<Vec<ToolDefinition>> {
        let url = format!("{}/list_tools", self.base_url);
        let resp = self.http.get(&url).timeout(LIST_TIMEOUT).send().await?;

        if resp.status() != reqwest::StatusCode::OK {
            anyhow::bail!("Failed to fetch tools: {}", resp.status());
        }

        let body: ListToolsResponse = resp.json().await?;
        Ok(body.tools.into_iter().map(ToolDefinition::from).collect())
    }
}

pub fn offline_tool() -> ToolDefinition {
    ToolDefinition {
        name: OFFLINE_TOOL_NAME.to_string(),
        description: "Notify the user that the MCP server is offline".to_string(),
        parameters: empty_schema(),
    }
}
