//! WebSocket message types for the search service. Client ↔ server JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameError;

/// Search backend the service should query. Closed set accepted by the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "duckduckgo")]
    DuckDuckGo,
    #[default]
    Wikipedia,
    Google,
    Bing,
    Brave,
    /// Every backend in parallel.
    All,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::DuckDuckGo => "duckduckgo",
            Provider::Wikipedia => "wikipedia",
            Provider::Google => "google",
            Provider::Bing => "bing",
            Provider::Brave => "brave",
            Provider::All => "all",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client → server: the one request sent per session, right after the channel opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundRequest {
    pub query: String,
    pub use_cache: bool,
    pub provider: Provider,
}

impl OutboundRequest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One result reference as sent by the service. Extra fields (content, snippet) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl SourceRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct DataFrame<T> {
    data: T,
}

#[derive(Deserialize)]
struct OptionalDataFrame<T> {
    #[serde(default)]
    data: Option<T>,
}

#[derive(Deserialize)]
struct MessageFrame {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct CachedPayload {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    sources: Vec<SourceRecord>,
}

/// One server frame; discriminator is the JSON "type" field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Status(String),
    Sources(Vec<SourceRecord>),
    Token(String),
    Cached {
        answer: String,
        sources: Vec<SourceRecord>,
    },
    Complete,
    Suggestions(Vec<String>),
    Error(String),
    /// A `type` this client does not know. Ignored by the dispatcher.
    Unknown(String),
}

impl ServerFrame {
    /// Parse one text frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text).map_err(FrameError::NotJson)?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, FrameError> {
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => {
                // The service answers a request without a query with a bare
                // `{"error": "..."}` object.
                if let Some(message) = value.get("error").and_then(Value::as_str) {
                    return Ok(ServerFrame::Error(message.to_string()));
                }
                return Err(FrameError::MissingType);
            }
        };

        let frame = match kind.as_str() {
            "status" => {
                let m: MessageFrame = payload(value, &kind)?;
                ServerFrame::Status(m.message.unwrap_or_default())
            }
            "sources" => {
                let m: DataFrame<Vec<SourceRecord>> = payload(value, &kind)?;
                ServerFrame::Sources(m.data)
            }
            "token" => {
                let m: DataFrame<String> = payload(value, &kind)?;
                ServerFrame::Token(m.data)
            }
            "cached" => {
                let m: DataFrame<CachedPayload> = payload(value, &kind)?;
                ServerFrame::Cached {
                    answer: m.data.answer,
                    sources: m.data.sources,
                }
            }
            "complete" => ServerFrame::Complete,
            "suggestions" => {
                let m: OptionalDataFrame<Vec<String>> = payload(value, &kind)?;
                ServerFrame::Suggestions(m.data.unwrap_or_default())
            }
            "error" => {
                let m: MessageFrame = payload(value, &kind)?;
                ServerFrame::Error(
                    m.message
                        .unwrap_or_else(|| "the search service reported an error".into()),
                )
            }
            _ => ServerFrame::Unknown(kind),
        };
        Ok(frame)
    }

    /// The wire tag, for logging.
    pub fn kind(&self) -> &str {
        match self {
            ServerFrame::Status(_) => "status",
            ServerFrame::Sources(_) => "sources",
            ServerFrame::Token(_) => "token",
            ServerFrame::Cached { .. } => "cached",
            ServerFrame::Complete => "complete",
            ServerFrame::Suggestions(_) => "suggestions",
            ServerFrame::Error(_) => "error",
            ServerFrame::Unknown(kind) => kind,
        }
    }
}

fn payload<T: DeserializeOwned>(value: Value, kind: &str) -> Result<T, FrameError> {
    serde_json::from_value(value).map_err(|source| FrameError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}
