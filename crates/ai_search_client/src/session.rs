//! Session controller: one live session, its phase machine and frame dispatch.
//!
//! The controller never touches the network. It consumes events tagged with the
//! [`SessionId`] of the channel that produced them and answers with [`Effect`]s
//! for the event loop to carry out. Events from a superseded session are
//! dropped before they reach any state.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::format::AnswerBuffer;
use crate::messages::{OutboundRequest, Provider, ServerFrame};
use crate::view::{View, ViewChange};

/// Identity of one session. Increases with every started query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    AwaitingResponse,
    Streaming,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    /// Whether the session's channel may still be open.
    fn holds_channel(&self) -> bool {
        !matches!(self, Phase::Idle | Phase::Failed)
    }
}

/// One query's exchange.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    request: OutboundRequest,
    phase: Phase,
    answer: AnswerBuffer,
    /// A cached answer arrived and its follow-up suggestions have not.
    awaiting_suggestions: bool,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &OutboundRequest {
        &self.request
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn answer(&self) -> &AnswerBuffer {
        &self.answer
    }
}

/// Work the event loop must do on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a fresh channel for this session.
    Open(SessionId),
    /// Send the session's request on its channel.
    Send(SessionId, OutboundRequest),
    /// Close the session's channel.
    Close(SessionId),
    /// Call [`SessionController::on_progress_grace_elapsed`] after the delay.
    ScheduleProgressClear(SessionId, Duration),
    /// Call [`SessionController::on_suggestion_wait_elapsed`] after the delay.
    ScheduleSuggestionDeadline(SessionId, Duration),
}

/// Request settings chosen in the UI. Read when a query is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub provider: Provider,
    pub use_cache: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            use_cache: true,
        }
    }
}

pub const REQUEST_SENT_STATUS: &str = "Request sent, waiting for response...";
pub const CONNECTING_STATUS: &str = "Connecting...";

/// How long a cached answer waits for its follow-up suggestions.
pub const DEFAULT_SUGGESTION_WAIT: Duration = Duration::from_secs(10);

pub struct SessionController {
    selection: Selection,
    grace: Duration,
    suggestion_wait: Duration,
    next_id: u64,
    session: Option<Session>,
    view: View,
}

impl SessionController {
    pub fn new(selection: Selection, grace: Duration, icon_service: &str) -> Self {
        Self {
            selection,
            grace,
            suggestion_wait: DEFAULT_SUGGESTION_WAIT,
            next_id: 1,
            session: None,
            view: View::new(icon_service),
        }
    }

    pub fn with_suggestion_wait(mut self, wait: Duration) -> Self {
        self.suggestion_wait = wait;
        self
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The live session completed from the cache and its suggestions may
    /// still arrive on the open channel.
    pub fn awaiting_suggestions(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.phase == Phase::Completed && s.awaiting_suggestions)
    }

    /// Drain the view changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<ViewChange> {
        self.view.take_changes()
    }

    /// Start a new session for `query`, superseding the current one.
    /// A blank query changes nothing.
    pub fn start_query(&mut self, query: &str) -> Vec<Effect> {
        let query = query.trim();
        if query.is_empty() {
            debug!("ignoring blank query");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(old) = self.session.take() {
            if old.phase.holds_channel() {
                debug!(session = %old.id, "superseding session");
                effects.push(Effect::Close(old.id));
            }
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;
        let request = OutboundRequest {
            query: query.to_string(),
            use_cache: self.selection.use_cache,
            provider: self.selection.provider,
        };
        info!(session = %id, provider = %request.provider, query = %query, "starting session");
        self.session = Some(Session {
            id,
            request,
            phase: Phase::Connecting,
            answer: AnswerBuffer::new(),
            awaiting_suggestions: false,
        });

        self.view.reset(query);
        self.view.set_status(CONNECTING_STATUS);
        effects.push(Effect::Open(id));
        effects
    }

    /// Activate suggestion chip `index`; same as submitting its text.
    pub fn activate_suggestion(&mut self, index: usize) -> Vec<Effect> {
        match self.view.suggestions().get(index).map(str::to_string) {
            Some(query) => self.start_query(&query),
            None => {
                debug!(index, "no suggestion at index");
                Vec::new()
            }
        }
    }

    /// The channel for `id` is open: send the request.
    pub fn on_open(&mut self, id: SessionId) -> Vec<Effect> {
        let Some(session) = self.live_mut(id, "open") else {
            return Vec::new();
        };
        if session.phase != Phase::Connecting {
            debug!(session = %id, phase = ?session.phase, "open outside Connecting");
            return Vec::new();
        }
        session.phase = Phase::AwaitingResponse;
        let request = session.request.clone();
        self.view.set_status(REQUEST_SENT_STATUS);
        vec![Effect::Send(id, request)]
    }

    /// The channel for `id` failed to open or dropped.
    pub fn on_transport_error(&mut self, id: SessionId, message: &str) -> Vec<Effect> {
        let Some(session) = self.live_mut(id, "transport error") else {
            return Vec::new();
        };
        if session.phase.is_terminal() {
            debug!(session = %id, error = %message, "transport error after session ended");
            session.awaiting_suggestions = false;
            return Vec::new();
        }
        self.fail(format!("Connection error: {message}"));
        Vec::new()
    }

    /// The channel for `id` closed. Only an error before the answer finished.
    pub fn on_closed(&mut self, id: SessionId) -> Vec<Effect> {
        let Some(session) = self.live_mut(id, "close") else {
            return Vec::new();
        };
        if session.phase.is_terminal() {
            debug!(session = %id, "channel closed");
            session.awaiting_suggestions = false;
            return Vec::new();
        }
        self.fail(format!("Connection error: {}", ClientError::ClosedEarly));
        Vec::new()
    }

    /// The grace delay after completion is over: hide the progress indicator.
    pub fn on_progress_grace_elapsed(&mut self, id: SessionId) -> Vec<Effect> {
        let completed = self
            .live_mut(id, "progress timer")
            .is_some_and(|session| session.phase == Phase::Completed);
        if completed {
            self.view.clear_progress();
        }
        Vec::new()
    }

    /// Stop waiting for the suggestions of a cached answer.
    pub fn on_suggestion_wait_elapsed(&mut self, id: SessionId) -> Vec<Effect> {
        if let Some(session) = self.live_mut(id, "suggestion timer") {
            if session.awaiting_suggestions {
                debug!(session = %id, "no suggestions for cached answer");
                session.awaiting_suggestions = false;
            }
        }
        Vec::new()
    }

    /// Dispatch one inbound frame from the channel of session `id`.
    pub fn on_frame(&mut self, id: SessionId, frame: ServerFrame) -> Vec<Effect> {
        let grace = self.grace;
        let suggestion_wait = self.suggestion_wait;
        let session = match self.session.as_mut() {
            Some(session) if session.id == id => session,
            _ => {
                debug!(session = %id, kind = frame.kind(), "dropping frame from superseded session");
                return Vec::new();
            }
        };
        let phase = session.phase;

        match frame {
            ServerFrame::Status(message) => {
                if phase == Phase::Failed {
                    return Vec::new();
                }
                self.view.set_status(&message);
                Vec::new()
            }
            ServerFrame::Sources(records) => {
                if !matches!(phase, Phase::AwaitingResponse | Phase::Streaming) {
                    debug!(session = %id, ?phase, "sources outside the answer stream");
                    return Vec::new();
                }
                session.phase = Phase::Streaming;
                self.view.show_answer_surface();
                self.view.replace_sources(&records);
                Vec::new()
            }
            ServerFrame::Token(fragment) => {
                if !matches!(phase, Phase::AwaitingResponse | Phase::Streaming) {
                    debug!(session = %id, ?phase, "token outside the answer stream");
                    return Vec::new();
                }
                session.phase = Phase::Streaming;
                session.answer.push(&fragment);
                self.view.show_answer_surface();
                self.view
                    .append_answer(&fragment, session.answer.formatted());
                Vec::new()
            }
            ServerFrame::Cached { answer, sources } => {
                if !matches!(phase, Phase::AwaitingResponse | Phase::Streaming) {
                    debug!(session = %id, ?phase, "cached result outside the answer stream");
                    return Vec::new();
                }
                session.phase = Phase::Completed;
                session.awaiting_suggestions = true;
                session.answer.replace(&answer);
                info!(session = %id, "served from cache");
                self.view.show_answer_surface();
                self.view.replace_sources(&sources);
                self.view
                    .replace_answer(session.answer.raw(), session.answer.formatted());
                vec![
                    Effect::ScheduleProgressClear(id, grace),
                    Effect::ScheduleSuggestionDeadline(id, suggestion_wait),
                ]
            }
            ServerFrame::Complete => {
                if !matches!(phase, Phase::AwaitingResponse | Phase::Streaming) {
                    debug!(session = %id, ?phase, "duplicate complete");
                    return Vec::new();
                }
                session.phase = Phase::Completed;
                info!(session = %id, chars = session.answer.raw().len(), "answer complete");
                vec![Effect::ScheduleProgressClear(id, grace)]
            }
            ServerFrame::Suggestions(suggestions) => {
                session.awaiting_suggestions = false;
                self.view.replace_suggestions(&suggestions);
                Vec::new()
            }
            ServerFrame::Error(message) => {
                if phase.is_terminal() {
                    warn!(session = %id, error = %message, "service error after session ended");
                    return Vec::new();
                }
                self.fail(message);
                vec![Effect::Close(id)]
            }
            ServerFrame::Unknown(kind) => {
                debug!(session = %id, kind = %kind, "ignoring unknown frame type");
                Vec::new()
            }
        }
    }

    /// The live session if it is `id`. Anything else is a stale event.
    fn live_mut(&mut self, id: SessionId, event: &str) -> Option<&mut Session> {
        match self.session.as_mut() {
            Some(session) if session.id == id => Some(session),
            _ => {
                debug!(session = %id, event, "dropping event from superseded session");
                None
            }
        }
    }

    fn fail(&mut self, message: String) {
        if let Some(session) = self.session.as_mut() {
            warn!(session = %session.id, error = %message, "session failed");
            session.phase = Phase::Failed;
        }
        self.view.fail(&message);
    }
}
