use crate::error::ChatError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Placeholder answer shown when the generation endpoint responds with a
/// non-success status. The conversation continues with this text in place of
/// a real answer.
pub const COMPLETION_UNAVAILABLE: &str = "Error: could not get a response from Ollama.";

/// What a generation call produced. A degraded outcome still carries a
/// displayable string, so callers can always show something while telling
/// real answers apart from placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Answer(String),
    Degraded(String),
}

impl CompletionOutcome {
    pub fn text(&self) -> &str {
        match self {
            CompletionOutcome::Answer(text) | CompletionOutcome::Degraded(text) => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CompletionOutcome::Degraded(_))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Client for the text-generation endpoint of an Ollama-compatible server.
pub struct CompletionClient {
    client: Client,
    base_url: String,
}

impl CompletionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// One non-streaming generation call. A non-success status maps to a
    /// degraded outcome; transport faults surface as errors. No retries, no
    /// explicit timeout.
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<CompletionOutcome, ChatError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(CompletionOutcome::Degraded(
                COMPLETION_UNAVAILABLE.to_string(),
            ));
        }

        let payload: GenerateResponse = response.json().await?;
        Ok(CompletionOutcome::Answer(payload.response.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{CompletionClient, CompletionOutcome, COMPLETION_UNAVAILABLE};
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serves exactly one canned HTTP response on a loopback port.
    fn spawn_stub(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buffer = [0u8; 8192];
            let _ = stream.read(&mut buffer);

            let response = format!(
                "HTTP/1.1 {status_line}\r\nconnection: close\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            let _ = stream.flush();
            // drain whatever the client still had in flight
            while let Ok(read) = stream.read(&mut buffer) {
                if read == 0 {
                    break;
                }
            }
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn success_response_is_trimmed_into_an_answer() {
        let base_url = spawn_stub("200 OK", r#"{"response":"  hello there  "}"#);
        let client = CompletionClient::new(base_url);

        let outcome = client.complete("tinyllama:latest", "User: hi\nAssistant:").await.unwrap();
        assert_eq!(outcome, CompletionOutcome::Answer("hello there".to_string()));
        assert!(!outcome.is_degraded());
    }

    #[tokio::test]
    async fn server_error_yields_placeholder_not_error() {
        let base_url = spawn_stub("500 Internal Server Error", "{}");
        let client = CompletionClient::new(base_url);

        let outcome = client.complete("tinyllama:latest", "Assistant:").await.unwrap();
        assert!(outcome.is_degraded());
        assert_eq!(outcome.text(), COMPLETION_UNAVAILABLE);
    }

    #[tokio::test]
    async fn connection_failure_is_a_hard_error() {
        // nothing listens on this port
        let client = CompletionClient::new("http://127.0.0.1:1");
        assert!(client.complete("tinyllama:latest", "Assistant:").await.is_err());
    }
}
