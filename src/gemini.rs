/// Gemini HTTP client implementation.
///
/// This module provides `GeminiClient` for making synchronous HTTP requests to
/// the Gemini generateContent API, along with error types and builder patterns
/// for configuration. Callers interact through the `ModelClient` trait so the
/// network layer can be mocked in tests.
use std::thread;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
const QUOTA_STATUS_CODE: u16 = 429;

/// Errors that can occur when interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Quota exhaustion (HTTP 429); surfaced separately so callers can tell
    /// the user to slow down rather than retry
    #[error("API quota exceeded")]
    Quota,

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Gemini API-specific errors
    #[error("Gemini API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// A model completion: the raw generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub text: String,
}

/// Trait for model prediction operations.
///
/// This trait enables mocking in unit tests and provides a clean interface
/// for sending prompts to the model.
pub trait ModelClient: Send + Sync {
    /// Sends a prompt with stop tokens and returns the generated text.
    fn predict(&self, prompt: &str, stop_tokens: &[String]) -> Result<ModelResponse, ModelError>;
}

/// Builder for constructing `GeminiClient` instances.
///
/// # Examples
///
/// ```
/// use jot::gemini::GeminiClientBuilder;
///
/// let client = GeminiClientBuilder::new()
///     .api_key("test-key")
///     .model("gemini-1.5-flash")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct GeminiClientBuilder {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<u32>,
    max_output_tokens: Option<u32>,
}

impl GeminiClientBuilder {
    /// Creates a new `GeminiClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the Gemini API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model name (e.g., "gemini-1.5-pro-latest").
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the sampling temperature (default 0.5).
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets nucleus sampling top-p (default 0.1).
    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets top-k sampling (default 16).
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the response token cap (default 1000).
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Builds the `GeminiClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `api_key()` was not called, this method reads `GEMINI_API_KEY`.
    /// If `model()` was not called, it reads `GEMINI_MODEL`, falling back to
    /// `gemini-1.5-pro-latest`.
    pub fn build(self) -> Result<GeminiClient, ModelError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = if let Some(m) = self.model {
            m
        } else {
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
        };

        let api_key = if let Some(key) = self.api_key {
            key
        } else {
            std::env::var("GEMINI_API_KEY").map_err(|_| ModelError::Api {
                message: "No API key: set GEMINI_API_KEY or pass api_key()".to_string(),
            })?
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| ModelError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(ModelError::Network)?;

        Ok(GeminiClient {
            client,
            base_url,
            model,
            api_key,
            temperature: self.temperature.unwrap_or(0.5),
            top_p: self.top_p.unwrap_or(0.1),
            top_k: self.top_k.unwrap_or(16),
            max_output_tokens: self.max_output_tokens.unwrap_or(1000),
        })
    }
}

/// Synchronous HTTP client for the Gemini generateContent API.
///
/// Handles request construction, stop sequences, and retry with backoff.
/// Construct it with `GeminiClientBuilder`.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f64,
    top_p: f64,
    top_k: u32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn predict_internal(
        &self,
        prompt: &str,
        stop_tokens: &[String],
    ) -> Result<ModelResponse, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let request_body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "topP": self.top_p,
                "topK": self.top_k,
                "maxOutputTokens": self.max_output_tokens,
                "stopSequences": stop_tokens,
            },
        });

        retry_with_backoff(|| {
            let response = self
                .client
                .post(&url)
                .json(&request_body)
                .send()
                .map_err(|e| {
                    if e.is_timeout() {
                        ModelError::Timeout(e)
                    } else {
                        ModelError::Network(e)
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                if status.as_u16() == QUOTA_STATUS_CODE {
                    return Err(ModelError::Quota);
                }
                return Err(ModelError::Http {
                    status: status.as_u16(),
                });
            }

            let json: serde_json::Value = response.json().map_err(ModelError::Network)?;

            // Candidate text lives at candidates[0].content.parts[0].text.
            let text = json
                .get("candidates")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("content"))
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.get(0))
                .and_then(|p| p.get("text"))
                .and_then(|t| t.as_str())
                .ok_or_else(|| ModelError::Api {
                    message: "Missing candidate text in API response".to_string(),
                })?;

            Ok(ModelResponse {
                text: text.to_string(),
            })
        })
    }
}

impl ModelClient for GeminiClient {
    fn predict(&self, prompt: &str, stop_tokens: &[String]) -> Result<ModelResponse, ModelError> {
        self.predict_internal(prompt, stop_tokens)
    }
}

/// Retries an operation with exponential backoff.
///
/// Retries up to 3 times with delays of 1s, 2s, and 4s, and only on transient
/// errors (HTTP 5xx, network errors, timeouts). Client errors and quota
/// exhaustion return immediately.
pub fn retry_with_backoff<F, T>(mut f: F) -> Result<T, ModelError>
where
    F: FnMut() -> Result<T, ModelError>,
{
    const MAX_RETRIES: usize = 3;
    const DELAYS: [u64; MAX_RETRIES] = [1, 2, 4]; // seconds

    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for &delay_secs in &DELAYS {
        thread::sleep(Duration::from_secs(delay_secs));

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
///
/// Returns `true` for transient errors (HTTP 5xx, network errors, timeouts).
/// Returns `false` for client errors, quota exhaustion, and everything else.
fn should_retry(error: &ModelError) -> bool {
    match error {
        ModelError::Network(_) => true,
        ModelError::Timeout(_) => true,
        ModelError::Http { status } => *status >= 500 && *status < 600,
        ModelError::Quota => false,
        ModelError::Serialization(_) => false,
        ModelError::Api { .. } => false,
        ModelError::InvalidUrl(_) => false,
    }
}
