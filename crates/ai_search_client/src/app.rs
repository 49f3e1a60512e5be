//! Event loop glue: query entry points, channel events in, controller effects out.
//!
//! Everything runs on one task. Channel tasks and timers only post
//! [`ChannelEvent`]s; [`App::handle`] is the single place state changes.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::{Channel, ChannelEvent, EventReceiver, EventSender};
use crate::config::Config;
use crate::session::{Effect, Phase, SessionController, SessionId};
use crate::view::{View, ViewChange};

pub struct App {
    url: String,
    controller: SessionController,
    channel: Option<Channel>,
    events: EventSender,
}

impl App {
    /// Build the app and the receiving end of its event queue. The caller
    /// feeds every received event back into [`App::handle`].
    pub fn new(config: &Config) -> (Self, EventReceiver) {
        let controller = SessionController::new(
            config.selection(),
            config.completion_grace(),
            config.icon_service(),
        )
        .with_suggestion_wait(config.suggestion_wait());
        Self::with_controller(config.server_url(), controller)
    }

    pub fn with_controller(url: &str, controller: SessionController) -> (Self, EventReceiver) {
        let (events, receiver) = mpsc::unbounded_channel();
        let app = Self {
            url: url.to_string(),
            controller,
            channel: None,
            events,
        };
        (app, receiver)
    }

    /// Submit a query (button or enter key). Returns `false` for a blank query.
    pub fn submit(&mut self, query: &str) -> bool {
        let effects = self.controller.start_query(query);
        let started = !effects.is_empty();
        self.apply(effects);
        started
    }

    /// Click suggestion chip `index` (0-based).
    pub fn activate_suggestion(&mut self, index: usize) -> bool {
        let effects = self.controller.activate_suggestion(index);
        let started = !effects.is_empty();
        self.apply(effects);
        started
    }

    pub fn handle(&mut self, event: ChannelEvent) {
        let effects = match event {
            ChannelEvent::Opened(id) => self.controller.on_open(id),
            ChannelEvent::Frame(id, frame) => self.controller.on_frame(id, frame),
            ChannelEvent::Error(id, e) => self.controller.on_transport_error(id, &e.to_string()),
            ChannelEvent::Closed(id) => self.controller.on_closed(id),
            ChannelEvent::ProgressGraceElapsed(id) => self.controller.on_progress_grace_elapsed(id),
            ChannelEvent::SuggestionWaitElapsed(id) => {
                self.controller.on_suggestion_wait_elapsed(id)
            }
        };
        self.apply(effects);
    }

    /// Process events until the live session has finished, its progress
    /// indicator is gone and a cached answer has its suggestions (or gave up
    /// on them).
    pub async fn run_until_settled(&mut self, events: &mut EventReceiver) {
        while !self.is_settled() {
            match events.recv().await {
                Some(event) => self.handle(event),
                None => break,
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        match self.controller.phase() {
            Phase::Idle | Phase::Failed => true,
            Phase::Completed => {
                !self.controller.view().in_progress() && !self.controller.awaiting_suggestions()
            }
            Phase::Connecting | Phase::AwaitingResponse | Phase::Streaming => false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn view(&self) -> &View {
        self.controller.view()
    }

    pub fn take_changes(&mut self) -> Vec<ViewChange> {
        self.controller.take_changes()
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Open(id) => {
                    if let Some(old) = self.channel.take() {
                        old.close();
                    }
                    self.channel = Some(Channel::open(&self.url, id, self.events.clone()));
                }
                Effect::Send(id, request) => match self.channel_for(id) {
                    Some(channel) => {
                        if !channel.send(request) {
                            warn!(session = %id, "channel task gone before request was sent");
                        }
                    }
                    None => debug!(session = %id, "no channel to send on"),
                },
                Effect::Close(id) => {
                    if self.channel_for(id).is_some() {
                        if let Some(channel) = self.channel.take() {
                            channel.close();
                        }
                    }
                }
                Effect::ScheduleProgressClear(id, after) => {
                    self.schedule(after, ChannelEvent::ProgressGraceElapsed(id))
                }
                Effect::ScheduleSuggestionDeadline(id, after) => {
                    self.schedule(after, ChannelEvent::SuggestionWaitElapsed(id))
                }
            }
        }
    }

    fn channel_for(&self, id: SessionId) -> Option<&Channel> {
        self.channel.as_ref().filter(|c| c.session() == id)
    }

    /// Post `event` to the loop after `after`.
    fn schedule(&self, after: Duration, event: ChannelEvent) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(event);
        });
    }
}
