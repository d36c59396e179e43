use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MCP_SERVER_URL: &str = "http://localhost:8001";
pub const DEFAULT_WHATSAPP_API_URL: &str = "http://localhost:8002";
pub const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:3000";

// Process-wide settings. Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub model: String,
    pub mcp_server_url: String,
    pub whatsapp_api_url: String,
    pub gateway_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // Split out from `from_env` so tests don't have to touch the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY").unwrap_or_default();
        if openai_api_key.is_empty() {
            warn!("OPENAI_API_KEY is not set; completion calls will fail until it is provided");
        }

        let addr = get("GATEWAY_ADDR").unwrap_or_else(|| DEFAULT_GATEWAY_ADDR.to_string());
        let gateway_addr = addr
            .parse()
            .with_context(|| format!("GATEWAY_ADDR '{}' is not a valid socket address", addr))?;

        Ok(Self {
            openai_api_key,
            openai_api_base: get("OPENAI_API_BASE").map(trim_base),
            model: get("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            mcp_server_url: trim_base(
                get("MCP_SERVER_URL").unwrap_or_else(|| DEFAULT_MCP_SERVER_URL.to_string()),
            ),
            whatsapp_api_url: trim_base(
                get("WHATSAPP_API_URL").unwrap_or_else(|| DEFAULT_WHATSAPP_API_URL.to_string()),
            ),
            gateway_addr,
        })
    }
}

fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
