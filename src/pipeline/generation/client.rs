use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::GenerationError;
use crate::models::enums::LlmProvider;
use crate::pipeline_config::LlmSettings;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 1024;

/// Text-generation service abstraction (allows mocking).
pub trait LlmClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerationError>;
}

/// Build the client for the configured provider. OpenAI and Anthropic need
/// an API key; Ollama runs without one.
pub fn build_client(settings: &LlmSettings) -> Result<Box<dyn LlmClient + Send + Sync>, GenerationError> {
    let base_url = settings.base_url.as_deref();
    let key = settings.api_key.clone().filter(|k| !k.trim().is_empty());

    Ok(match settings.provider {
        LlmProvider::OpenAi => {
            let key = key.ok_or_else(|| GenerationError::MissingCredential("OPENAI_API_KEY".into()))?;
            Box::new(OpenAiClient::new(
                base_url.unwrap_or(OPENAI_BASE_URL),
                &key,
                settings.temperature,
                settings.timeout_secs,
            )?)
        }
        LlmProvider::Anthropic => {
            let key =
                key.ok_or_else(|| GenerationError::MissingCredential("ANTHROPIC_API_KEY".into()))?;
            Box::new(AnthropicClient::new(
                base_url.unwrap_or(ANTHROPIC_BASE_URL),
                &key,
                settings.temperature,
                settings.timeout_secs,
            )?)
        }
        LlmProvider::Ollama => Box::new(OllamaClient::new(
            base_url.unwrap_or(OLLAMA_BASE_URL),
            settings.temperature,
            settings.timeout_secs,
        )?),
    })
}

fn http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, GenerationError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GenerationError::HttpClient(format!("Failed to create HTTP client: {e}")))
}

fn send_error(e: reqwest::Error, base_url: &str, timeout_secs: u64) -> GenerationError {
    if e.is_connect() {
        GenerationError::ServiceConnection(base_url.to_string())
    } else if e.is_timeout() {
        GenerationError::HttpClient(format!("Request timed out after {timeout_secs}s"))
    } else {
        GenerationError::HttpClient(e.to_string())
    }
}

/// Turn a non-success status into `ServiceError`, otherwise decode JSON.
fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::blocking::Response,
) -> Result<T, GenerationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(GenerationError::ServiceError {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .map_err(|e| GenerationError::ResponseParsing(e.to_string()))
}

// ═══════════════════════════════════════════════════════════
// Ollama
// ═══════════════════════════════════════════════════════════

/// Ollama HTTP client for local inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    temperature: f32,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, temperature: f32, timeout_secs: u64) -> Result<Self, GenerationError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(timeout_secs)?,
            temperature,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| send_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: OllamaGenerateResponse = read_json(response)?;
        Ok(parsed.response)
    }
}

// ═══════════════════════════════════════════════════════════
// OpenAI
// ═══════════════════════════════════════════════════════════

/// Chat Completions client.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout_secs)?,
            temperature,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.trim().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| send_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: ChatResponse = read_json(response)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::ResponseParsing("Response has no message content".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Anthropic
// ═══════════════════════════════════════════════════════════

/// Messages API client.
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    temperature: f32,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: http_client(timeout_secs)?,
            temperature,
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl LlmClient for AnthropicClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model,
            max_tokens: ANTHROPIC_MAX_TOKENS,
            system: system.trim(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .map_err(|e| send_error(e, &self.base_url, self.timeout_secs))?;

        let parsed: MessagesResponse = read_json(response)?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.is_empty() {
            return Err(GenerationError::ResponseParsing("Response has no text content".into()));
        }
        Ok(text)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock
// ═══════════════════════════════════════════════════════════

/// Mock client for testing: returns a configured response.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, _prompt: &str, _system: &str) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: LlmProvider, key: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider,
            api_key: key.map(str::to_string),
            ..LlmSettings::default()
        }
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        assert_eq!(client.generate("model", "prompt", "system").unwrap(), "test response");
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = OllamaClient::new("http://localhost:11434/", 0.3, 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn hosted_providers_require_key() {
        for provider in [LlmProvider::OpenAi, LlmProvider::Anthropic] {
            assert!(matches!(
                build_client(&settings(provider, None)),
                Err(GenerationError::MissingCredential(_))
            ));
            assert!(matches!(
                build_client(&settings(provider, Some("  "))),
                Err(GenerationError::MissingCredential(_))
            ));
            assert!(build_client(&settings(provider, Some("sk-test"))).is_ok());
        }
    }

    #[test]
    fn ollama_needs_no_key() {
        assert!(build_client(&settings(LlmProvider::Ollama, None)).is_ok());
    }

    #[test]
    fn unreachable_service_is_connection_error() {
        // Port 9 (discard) is closed on test machines.
        let client = OllamaClient::new("http://127.0.0.1:9", 0.3, 2).unwrap();
        let err = client.generate("llama3.1", "prompt", "system").unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ServiceConnection(_) | GenerationError::HttpClient(_)
        ));
    }
}
