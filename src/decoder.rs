//! Wire format of the chat completion API and decoding of raw responses.

use crate::conversation::Message;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

/// Request body sent to the completions endpoint.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    param: Option<serde_json::Value>,
    #[serde(default)]
    code: Option<String>,
}

impl From<ErrorBody> for ApiError {
    fn from(body: ErrorBody) -> Self {
        ApiError {
            kind: body.kind.unwrap_or_default(),
            message: body.message.unwrap_or_default(),
            code: body.code.unwrap_or_default(),
        }
    }
}

/// Outcome of decoding a response: either a completion or a structured error.
#[derive(Debug)]
pub enum Decoded {
    Completion(CompletionResponse),
    Error(ApiError),
}

impl CompletionResponse {
    /// Text of the first choice, or `None` when the choice list is empty.
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_deref().unwrap_or(""))
    }
}

pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Decodes a raw body according to its status code.
///
/// 2xx bodies must parse as a completion; anything else must parse as an
/// error envelope. A body that parses as neither is a decode error, never an
/// API error.
pub fn decode(status: u16, body: &str) -> Result<Decoded, serde_json::Error> {
    if is_success(status) {
        serde_json::from_str::<CompletionResponse>(body).map(Decoded::Completion)
    } else {
        serde_json::from_str::<ErrorEnvelope>(body).map(|envelope| Decoded::Error(envelope.error.into()))
    }
}
