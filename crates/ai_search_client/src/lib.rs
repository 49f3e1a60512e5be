//! Streaming session client for the AI search service (config, WebSocket
//! protocol, session state machine, answer formatting, source and suggestion
//! display state). Used by the `ai-search` terminal binary.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod messages;
pub mod session;
pub mod sources;
pub mod suggestions;
pub mod view;

pub use app::App;
pub use client::{Channel, ChannelEvent, EventReceiver};
pub use config::{default_config_path, Config, SearchSection, ServerSection, UiSection};
pub use error::{ClientError, ConfigError, FrameError};
pub use format::{format_answer, AnswerBuffer};
pub use messages::{OutboundRequest, Provider, ServerFrame, SourceRecord};
pub use session::{Effect, Phase, Selection, SessionController, SessionId};
pub use sources::{derive_domain, SourceList, SourceRef, UNKNOWN_DOMAIN};
pub use suggestions::SuggestionSet;
pub use view::{View, ViewChange};
