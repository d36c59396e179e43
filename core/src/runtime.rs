use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

// Tool execution may be slow (the provider runs a RAG pipeline behind some tools)
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct CallToolRequest<'a> {
    tool_name: &'a str,
    arguments: &'a Value,
}

#[derive(Debug, Deserialize)]
struct CallToolResponse {
    result: Option<Value>,
}

// Tool Invoker: executes a named tool on the provider.
// Never fails outward; a failed call turns into an explanatory string that is
// folded into the conversation like any other result.
#[derive(Debug, Clone)]
pub struct Runtime {
    http: reqwest::Client,
    base_url: String,
}

impl Runtime {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn run_tool(&self, tool_name: &str, arguments: &Value) -> Value {
        info!("Tool Call: {} args={}", tool_name, arguments);

        match self.call(tool_name, arguments).await {
            Ok(result) => {
                info!("Tool '{}' succeeded", tool_name);
                result
            }
            Err(e) => {
                error!("Error calling tool '{}': {:#}", tool_name, e);
                Value::String(unavailable_result(tool_name))
            }
        }
    }

    async fn call(&self, tool_name: &str, arguments: &Value) -> anyhow::Result<Value> {
        let url = format!("{}/call_tool", self.base_url);
        let resp = self
            .http
            .post(&url)
            .timeout(CALL_TIMEOUT)
            .json(&CallToolRequest {
                tool_name,
                arguments,
            })
            .send()
            .await?;

        if resp.status() != reqwest::StatusCode::OK {
            anyhow::bail!("Failed to call tool: {}", resp.status());
        }

        let body: CallToolResponse = resp.json().await?;
        body.result
            .ok_or_else(|| anyhow::anyhow!("response carried no 'result' field"))
    }
}

pub fn unavailable_result(tool_name: &str) -> String {
    format!(
        "Error: Unable to call the tool {}. The financial data service is currently unavailable. Please ensure the MCP server is running.",
        tool_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn forwards_name_and_arguments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call_tool"))
            .and(body_json(json!({
                "tool_name": "generate_monthly_report",
                "arguments": {"month": "June"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "June revenue: 1000 JOD"})))
            .expect(1)
            .mount(&server)
            .await;

        let runtime = Runtime::new(reqwest::Client::new(), server.uri());
        let out = runtime
            .run_tool("generate_monthly_report", &json!({"month": "June"}))
            .await;
        assert_eq!(out, json!("June revenue: 1000 JOD"));
    }

    #[tokio::test]
    async fn structured_results_keep_their_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call_tool"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"total": 1000}})))
            .mount(&server)
            .await;

        let runtime = Runtime::new(reqwest::Client::new(), server.uri());
        let out = runtime.run_tool("get_sales_summary", &json!({})).await;
        assert_eq!(out, json!({"total": 1000}));
    }

    #[tokio::test]
    async fn provider_error_becomes_result_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call_tool"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Tool 'nope' not found"})))
            .mount(&server)
            .await;

        let runtime = Runtime::new(reqwest::Client::new(), server.uri());
        let out = runtime.run_tool("nope", &json!({})).await;
        let text = out.as_str().unwrap();
        assert!(text.contains("Unable to call the tool nope"));
        assert!(text.contains("ensure the MCP server is running"));
    }

    #[tokio::test]
    async fn unreachable_provider_becomes_result_text() {
        let runtime = Runtime::new(reqwest::Client::new(), "http://127.0.0.1:1");
        let out = runtime.run_tool("get_mall_summary", &json!({})).await;
        assert_eq!(out, Value::String(unavailable_result("get_mall_summary")));
    }
}
