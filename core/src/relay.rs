use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

const STATUS_FAILED: &str = "Failed to connect to WhatsApp integration server";
const STATUS_ERROR: &str = "Error connecting to WhatsApp integration server";
const SEND_FAILED: &str = "Failed to send WhatsApp message";
const SEND_ERROR: &str = "Error sending WhatsApp message";
pub const MISSING_FIELDS: &str = "Both \"to\" and \"message\" fields are required";

// What the gateway should answer with: an HTTP status plus a JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub status: u16,
    pub body: Value,
}

impl RelayReply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    to: &'a str,
    message: &'a str,
}

// Thin pass-through to the messaging gateway process
#[derive(Debug, Clone)]
pub struct Relay {
    http: reqwest::Client,
    base_url: String,
}

impl Relay {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn status(&self) -> RelayReply {
        let url = format!("{}/status", self.base_url);
        let resp = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Error connecting to WhatsApp server: {}", e);
                return RelayReply::error(500, STATUS_ERROR);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return RelayReply::error(status.as_u16(), STATUS_FAILED);
        }

        match resp.json::<Value>().await {
            Ok(body) => RelayReply::ok(body),
            Err(e) => {
                error!("WhatsApp server returned unreadable status: {}", e);
                RelayReply::error(500, STATUS_ERROR)
            }
        }
    }

    // `to` and `message` must both be present; nothing is sent otherwise.
    // The message text is forwarded exactly as received.
    pub async fn send(&self, to: Option<&str>, message: Option<&str>) -> RelayReply {
        let (to, message) = match (present(to), present(message)) {
            (Some(to), Some(message)) => (normalize_number(to), message),
            _ => return RelayReply::error(400, MISSING_FIELDS),
        };

        info!("Relaying WhatsApp message to {}", to);
        let url = format!("{}/send_message", self.base_url);
        let resp = match self
            .http
            .post(&url)
            .json(&SendMessage { to: &to, message })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Error sending WhatsApp message: {}", e);
                return RelayReply::error(500, SEND_ERROR);
            }
        };

        let status = resp.status();
        let body = match resp.json::<Value>().await {
            Ok(body) => body,
            Err(e) => {
                error!("WhatsApp server returned unreadable reply: {}", e);
                return RelayReply::error(500, SEND_ERROR);
            }
        };

        if status.is_success() {
            RelayReply::ok(body)
        } else {
            // Upstream detail keeps its shape (FastAPI validation errors are arrays)
            let detail = match body.get("detail") {
                Some(detail) if !detail.is_null() => detail.clone(),
                _ => Value::from(SEND_FAILED),
            };
            RelayReply {
                status: status.as_u16(),
                body: json!({ "error": detail }),
            }
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// "962 7 9123 4567" -> "+962791234567"
pub fn normalize_number(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('+') {
        compact
    } else {
        format!("+{}", compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn relay(server: &MockServer) -> Relay {
        Relay::new(reqwest::Client::new(), server.uri())
    }

    #[test]
    fn numbers_get_plus_prefix() {
        assert_eq!(normalize_number("962 79 123 4567"), "+962791234567");
        assert_eq!(normalize_number("+14155550100"), "+14155550100");
    }

    #[tokio::test]
    async fn status_passes_through() {
        let server = MockServer::start().await;
        let upstream = json!({"twilio_configured": true, "mcp_connection": "connected"});
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(upstream.clone()))
            .mount(&server)
            .await;

        assert_eq!(relay(&server).status().await, RelayReply::ok(upstream));
    }

    #[tokio::test]
    async fn status_failure_keeps_upstream_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let reply = relay(&server).status().await;
        assert_eq!(reply.status, 502);
        assert_eq!(reply.body["error"], STATUS_FAILED);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_500() {
        let reply = Relay::new(reqwest::Client::new(), "http://127.0.0.1:1")
            .status()
            .await;
        assert_eq!(reply, RelayReply::error(500, STATUS_ERROR));
    }

    #[tokio::test]
    async fn missing_fields_send_nothing() {
        let server = MockServer::start().await;
        let r = relay(&server);

        assert_eq!(r.send(None, Some("hi")).await.status, 400);
        assert_eq!(r.send(Some("+1555"), Some("")).await.status, 400);
        assert_eq!(r.send(Some("+1555"), None).await.status, 400);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_text_is_forwarded_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .and(body_json(json!({"to": "+1555", "message": "  Report:\n  line1\n"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .and(body_json(json!({"to": "+1555", "message": "   "})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        let r = relay(&server);
        assert_eq!(r.send(Some("+1555"), Some("  Report:\n  line1\n")).await.status, 200);
        assert_eq!(r.send(Some("+1555"), Some("   ")).await.status, 200);
    }

    #[tokio::test]
    async fn send_forwards_normalized_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .and(body_json(json!({"to": "+962791234567", "message": "Monthly report ready"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "success", "message_sid": "SM123"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = relay(&server)
            .send(Some("962791234567"), Some("Monthly report ready"))
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["message_sid"], "SM123");
    }

    #[tokio::test]
    async fn send_failure_uses_upstream_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"detail": "Failed to send message: auth"})),
            )
            .mount(&server)
            .await;

        let reply = relay(&server).send(Some("+1555"), Some("hi")).await;
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body["error"], "Failed to send message: auth");
    }

    #[tokio::test]
    async fn structured_detail_is_passed_through() {
        let server = MockServer::start().await;
        let detail = json!([{"loc": ["body", "to"], "msg": "field required", "type": "value_error.missing"}]);
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "detail": detail.clone() })))
            .mount(&server)
            .await;

        let reply = relay(&server).send(Some("+1555"), Some("hi")).await;
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body["error"], detail);
    }

    #[tokio::test]
    async fn null_detail_falls_back_to_generic_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_message"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": null })))
            .mount(&server)
            .await;

        let reply = relay(&server).send(Some("+1555"), Some("hi")).await;
        assert_eq!(reply.body["error"], SEND_FAILED);
    }
}
