//! WebSocket channel driver: one task per session owns the socket, sends the
//! session's request, and reports every inbound frame to the event loop.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::messages::{OutboundRequest, ServerFrame};
use crate::session::SessionId;

/// Something that happened on a channel (or a timer), tagged with the session
/// it belongs to.
#[derive(Debug)]
pub enum ChannelEvent {
    Opened(SessionId),
    Frame(SessionId, ServerFrame),
    Error(SessionId, ClientError),
    Closed(SessionId),
    ProgressGraceElapsed(SessionId),
    SuggestionWaitElapsed(SessionId),
}

pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// Handle to the channel of one session. Dropping or closing it makes the
/// task close the socket and exit.
#[derive(Debug)]
pub struct Channel {
    session: SessionId,
    outbound: mpsc::UnboundedSender<OutboundRequest>,
}

impl Channel {
    /// Connect to `url` (e.g. `ws://localhost:8000/ws`) in a new task. The
    /// outcome arrives on `events` as `Opened` or `Error`.
    pub fn open(url: &str, session: SessionId, events: EventSender) -> Self {
        let (outbound, requests) = mpsc::unbounded_channel();
        tokio::spawn(run_channel(url.to_string(), session, requests, events));
        Self { session, outbound }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Queue `request` for sending. `false` when the task has already exited.
    pub fn send(&self, request: OutboundRequest) -> bool {
        self.outbound.send(request).is_ok()
    }

    pub fn close(self) {
        debug!(session = %self.session, "closing channel");
        drop(self.outbound);
    }
}

async fn run_channel(
    url: String,
    session: SessionId,
    mut requests: mpsc::UnboundedReceiver<OutboundRequest>,
    events: EventSender,
) {
    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            let _ = events.send(ChannelEvent::Error(session, e.into()));
            return;
        }
    };
    debug!(session = %session, url = %url, "channel open");
    if events.send(ChannelEvent::Opened(session)).is_err() {
        return;
    }

    let (mut write, mut read) = ws_stream.split();
    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else {
                    let _ = write.send(Message::Close(None)).await;
                    return;
                };
                let sent = match request.to_json() {
                    Ok(json) => write.send(Message::Text(json)).await.map_err(ClientError::from),
                    Err(e) => Err(ClientError::from(e)),
                };
                if let Err(e) = sent {
                    let _ = events.send(ChannelEvent::Error(session, e));
                    return;
                }
            }
            item = read.next() => {
                let message = match item {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        let _ = events.send(ChannelEvent::Error(session, e.into()));
                        return;
                    }
                    None => {
                        let _ = events.send(ChannelEvent::Closed(session));
                        return;
                    }
                };
                let text = match message {
                    Message::Text(t) => t,
                    Message::Close(_) => {
                        let _ = events.send(ChannelEvent::Closed(session));
                        return;
                    }
                    _ => continue,
                };
                match ServerFrame::parse(&text) {
                    Ok(frame) => {
                        if events.send(ChannelEvent::Frame(session, frame)).is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(session = %session, error = %e, "skipping malformed frame"),
                }
            }
        }
    }
}
