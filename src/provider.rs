//! Completion providers that turn a natural-language request into a command.
//!
//! [`CommandProvider`] is the capability the resolution loop talks to.
//! [`OpenAiProvider`] is the real implementation on top of an
//! OpenAI-compatible chat completions endpoint; [`MockProvider`] answers
//! from a fixed table and never touches the network.

use crate::conversation::{Conversation, Role};
use crate::decoder::{self, CompletionRequest, Decoded};
use crate::error::{classify_api_error, ApiError, Failure, INVALID_API_KEY_CODE};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use async_trait::async_trait;
use tracing::{debug, info};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Whether a request builds on the conversation so far or starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMode {
    WithContext,
    WithoutContext,
}

impl From<bool> for ContextMode {
    fn from(with_context: bool) -> Self {
        if with_context {
            ContextMode::WithContext
        } else {
            ContextMode::WithoutContext
        }
    }
}

/// What the caller should do about a failed resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Ask the user for a new API key, then retry the same request.
    ReenterKey,
    /// Give up and surface the failure.
    Abort,
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_tokens: 256,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[async_trait]
pub trait CommandProvider: Send {
    /// Resolves `request` to the raw completion text.
    async fn resolve(&mut self, request: &str, mode: ContextMode) -> Result<String, Failure>;

    /// Replaces the API key, e.g. after the previous one was rejected.
    fn set_api_key(&mut self, key: String);

    /// True when a non-empty key is configured.
    fn has_api_key(&self) -> bool;

    fn handle_failure(&self, failure: &Failure) -> Recovery {
        match failure {
            Failure::InvalidKey(_) => Recovery::ReenterKey,
            _ => Recovery::Abort,
        }
    }
}

/// Provider backed by an OpenAI-compatible chat completions endpoint.
///
/// # Example
///
/// ```ignore
/// use aiterm::provider::{CommandProvider, ContextMode, OpenAiProvider, RequestParameters};
///
/// let mut provider = OpenAiProvider::new(
///     "https://api.openai.com/v1/chat/completions",
///     "sk-...",
///     RequestParameters::default(),
/// )?;
/// let command = provider.resolve("list files", ContextMode::WithoutContext).await?;
/// ```
pub struct OpenAiProvider<C: HttpClient = ReqwestHttpClient> {
    client: C,
    endpoint: String,
    api_key: String,
    params: RequestParameters,
    conversation: Conversation,
}

impl OpenAiProvider<ReqwestHttpClient> {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        params: RequestParameters,
    ) -> Result<Self, Failure> {
        let client = ReqwestHttpClient::new().map_err(Failure::Transport)?;
        Ok(Self::with_client(client, endpoint, api_key, params))
    }
}

impl<C: HttpClient> OpenAiProvider<C> {
    /// Creates a provider with a custom transport (for testing).
    pub fn with_client(
        client: C,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        params: RequestParameters,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            params,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Sends the current log and returns the first choice's text.
    async fn send(&self) -> Result<String, Failure> {
        let request = CompletionRequest {
            model: &self.params.model,
            messages: self.conversation.messages(),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            top_p: self.params.top_p,
            frequency_penalty: self.params.frequency_penalty,
            presence_penalty: self.params.presence_penalty,
        };
        let body = serde_json::to_value(&request).map_err(Failure::Serialize)?;

        let authorization = format!("Bearer {}", self.api_key);
        let headers = [
            ("Content-Type", "application/json"),
            ("Authorization", authorization.as_str()),
        ];

        debug!(
            "Posting {} messages to {}",
            self.conversation.len(),
            self.endpoint
        );
        let response = self
            .client
            .post_json(&self.endpoint, &headers, &body)
            .await
            .map_err(Failure::Transport)?;
        debug!("Completion API answered with status {}", response.status);

        match decoder::decode(response.status, &response.body).map_err(Failure::Decode)? {
            Decoded::Completion(completion) => completion
                .first_text()
                .map(str::to_string)
                .ok_or(Failure::EmptyCompletion),
            Decoded::Error(error) => Err(classify_api_error(error)),
        }
    }
}

#[async_trait]
impl<C: HttpClient> CommandProvider for OpenAiProvider<C> {
    async fn resolve(&mut self, request: &str, mode: ContextMode) -> Result<String, Failure> {
        if mode == ContextMode::WithoutContext {
            self.conversation.reset();
        }
        let checkpoint = self.conversation.len();
        self.conversation.push(Role::User, request);

        info!("Resolving request ({:?}): {}", mode, request);
        match self.send().await {
            Ok(text) => {
                self.conversation.push(Role::Assistant, text.as_str());
                Ok(text)
            }
            Err(failure) => {
                // Failed turns never stay in the log.
                self.conversation.truncate(checkpoint);
                debug!("Resolve failed ({}): {}", failure.kind(), failure);
                Err(failure)
            }
        }
    }

    fn set_api_key(&mut self, key: String) {
        self.api_key = key;
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Offline provider answering from a keyword table.
///
/// Keys starting with `invalid` are rejected the way the real API rejects
/// them, so the key re-entry flow can be exercised without a network.
pub struct MockProvider {
    api_key: String,
    conversation: Conversation,
}

impl MockProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn mock_command(request: &str) -> String {
        let lowered = request.to_lowercase();
        if lowered.contains("list") && lowered.contains("file") {
            "ls -la".to_string()
        } else if lowered.contains("directory") || lowered.contains("where am i") {
            "pwd".to_string()
        } else if lowered.contains("disk") {
            "df -h".to_string()
        } else if lowered.contains("hello") || lowered.contains("greet") {
            "echo hello".to_string()
        } else if lowered.contains("fail") {
            "exit 3".to_string()
        } else if lowered.trim().is_empty() || lowered.contains("sandwich") {
            "Not a command.".to_string()
        } else {
            format!("echo '{}'", request.replace('\'', ""))
        }
    }
}

#[async_trait]
impl CommandProvider for MockProvider {
    async fn resolve(&mut self, request: &str, mode: ContextMode) -> Result<String, Failure> {
        if self.api_key.starts_with("invalid") {
            return Err(Failure::InvalidKey(ApiError {
                kind: "invalid_request_error".to_string(),
                message: "Incorrect API key provided".to_string(),
                code: INVALID_API_KEY_CODE.to_string(),
            }));
        }

        info!("Using mock provider (AITERM_USE_MOCK=1)");
        if mode == ContextMode::WithoutContext {
            self.conversation.reset();
        }
        self.conversation.push(Role::User, request);
        let text = Self::mock_command(request);
        self.conversation.push(Role::Assistant, text.as_str());
        Ok(text)
    }

    fn set_api_key(&mut self, key: String) {
        self.api_key = key;
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}
