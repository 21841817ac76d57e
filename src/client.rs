use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const NO_REPLY: &str = "No reply received";

/// Probes must not outlive the 1s poll cadence.
const PROBE_TIMEOUT: Duration = Duration::from_millis(750);

#[derive(Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
}

/// The service answers with either a bare string or an object carrying the
/// reply under `message.content`. Anything else resolves to the fallback.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatReply {
    Text(String),
    Structured { message: Option<ReplyMessage> },
    Other(serde_json::Value),
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl ChatReply {
    fn into_text(self) -> String {
        match self {
            ChatReply::Text(text) => text,
            ChatReply::Structured { message } => message
                .and_then(|m| m.content)
                .unwrap_or_else(|| NO_REPLY.to_string()),
            ChatReply::Other(_) => NO_REPLY.to_string(),
        }
    }
}

/// Thin client for the external AI chat service. The service itself is a
/// black box reached through two endpoints: a health check used by the
/// readiness poll and the chat call that produces a reply.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Relay one prompt and resolve the reply shape. The call is unbounded
    /// in time; the service is trusted to eventually settle.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "chat request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply.into_text())
    }

    /// One readiness check: true when the service answers its health
    /// endpoint with a success status within the probe window.
    pub async fn probe(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);

        match tokio::time::timeout(PROBE_TIMEOUT, self.client.get(&url).send()).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> String {
        serde_json::from_str::<ChatReply>(body)
            .expect("reply should deserialize")
            .into_text()
    }

    #[test]
    fn test_plain_string_reply() {
        assert_eq!(decode("\"Hi there\""), "Hi there");
    }

    #[test]
    fn test_structured_reply_with_content() {
        assert_eq!(
            decode(r#"{"message": {"content": "Sure"}}"#),
            "Sure"
        );
    }

    #[test]
    fn test_structured_reply_missing_content() {
        assert_eq!(decode(r#"{"message": {}}"#), NO_REPLY);
    }

    #[test]
    fn test_structured_reply_missing_message() {
        assert_eq!(decode(r#"{"status": "ok"}"#), NO_REPLY);
    }

    #[test]
    fn test_null_content_falls_back() {
        assert_eq!(decode(r#"{"message": {"content": null}}"#), NO_REPLY);
    }

    #[test]
    fn test_unrecognized_shapes_fall_back() {
        assert_eq!(decode("42"), NO_REPLY);
        assert_eq!(decode("[\"Hi\"]"), NO_REPLY);
        assert_eq!(decode("null"), NO_REPLY);
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = ChatClient::new("http://localhost:8787/");
        assert_eq!(client.base_url, "http://localhost:8787");
    }
}
