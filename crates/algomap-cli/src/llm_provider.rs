//! OpenAI-compatible chat client with a rotating key pool.
//!
//! Every call starts from the key that last succeeded. On failure the next
//! key is tried until the pool is exhausted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use algomap_translate::{CollaboratorError, LanguageModel};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        model: &str,
        keys: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    fn call(&self, key: &str, prompt: &str) -> Result<String, CollaboratorError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}]
        });
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&body)
            .send()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(CollaboratorError::Request(format!("{status}: {text}")));
        }
        content_of(&text)
    }
}

impl LanguageModel for OpenAiProvider {
    fn ask(&self, prompt: &str) -> Result<String, CollaboratorError> {
        if self.keys.is_empty() {
            return Err(CollaboratorError::Unavailable);
        }
        let start = self.cursor.load(Ordering::Relaxed);
        let mut last = String::new();
        for attempt in 0..self.keys.len() {
            let index = (start + attempt) % self.keys.len();
            match self.call(&self.keys[index], prompt) {
                Ok(content) => {
                    self.cursor.store(index, Ordering::Relaxed);
                    debug!(key = index, chars = content.len(), "model reply received");
                    return Ok(content);
                }
                Err(err) => {
                    warn!(key = index, %err, "model call failed; retrying with next key");
                    last = err.to_string();
                }
            }
        }
        Err(CollaboratorError::Exhausted {
            attempts: self.keys.len(),
            last,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Assistant text of a chat-completions response body.
fn content_of(body: &str) -> Result<String, CollaboratorError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| CollaboratorError::Decode(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CollaboratorError::Decode("response has no assistant content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "  {\"steps\": []} "}}]}"#;
        assert_eq!(content_of(body).unwrap(), r#"{"steps": []}"#);
    }

    #[test]
    fn empty_content_is_a_decode_error() {
        let body = r#"{"choices": [{"message": {"content": null}}]}"#;
        assert!(matches!(content_of(body), Err(CollaboratorError::Decode(_))));
        assert!(matches!(content_of("not json"), Err(CollaboratorError::Decode(_))));
    }

    #[test]
    fn empty_pool_is_unavailable() {
        let provider =
            OpenAiProvider::new("http://127.0.0.1:9", "m", Vec::new(), Duration::from_secs(1))
                .unwrap();
        assert!(matches!(provider.ask("hi"), Err(CollaboratorError::Unavailable)));
    }

    #[test]
    fn unreachable_endpoint_exhausts_every_key() {
        let keys = vec!["a".to_string(), "b".to_string()];
        let provider =
            OpenAiProvider::new("http://127.0.0.1:9/", "m", keys, Duration::from_secs(2)).unwrap();
        match provider.ask("hi") {
            Err(CollaboratorError::Exhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }
}
