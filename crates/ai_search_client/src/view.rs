//! In-memory display state driven by the session controller, plus the change
//! log a frontend drains to update itself.

use crate::messages::SourceRecord;
use crate::sources::{SourceList, SourceRef};
use crate::suggestions::SuggestionSet;

/// One visible change, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    /// A new session started; every surface was cleared.
    Reset { query: String },
    Status(String),
    AnswerSurfaceShown,
    /// A streamed fragment was appended to the answer.
    AnswerAppended { fragment: String },
    /// The answer was replaced in one step (cached result).
    AnswerReplaced { raw: String },
    SourcesReplaced,
    SuggestionsReplaced,
    ProgressCleared,
    Failed(String),
}

/// What the user currently sees.
///
/// Every mutation is also recorded as a [`ViewChange`]; frontends drain the
/// log with [`View::take_changes`]. A new session's reset drops whatever was
/// left undrained.
#[derive(Debug, Clone, Default)]
pub struct View {
    status: String,
    answer: Option<String>,
    sources: SourceList,
    suggestions: SuggestionSet,
    in_progress: bool,
    error: Option<String>,
    changes: Vec<ViewChange>,
}

impl View {
    pub fn new(icon_service: &str) -> Self {
        Self {
            sources: SourceList::new(icon_service),
            ..Self::default()
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Formatted answer markup, or `None` while the answer surface is not installed.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn has_answer_surface(&self) -> bool {
        self.answer.is_some()
    }

    pub fn sources(&self) -> &[SourceRef] {
        self.sources.cards()
    }

    pub fn suggestions(&self) -> &SuggestionSet {
        &self.suggestions
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drain the changes recorded since the last call.
    pub fn take_changes(&mut self) -> Vec<ViewChange> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn reset(&mut self, query: &str) {
        self.status.clear();
        self.answer = None;
        self.sources.clear();
        self.suggestions.clear();
        self.error = None;
        self.in_progress = true;
        // Undrained changes describe the state being wiped.
        self.changes.clear();
        self.changes.push(ViewChange::Reset {
            query: query.to_string(),
        });
    }

    pub(crate) fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.changes.push(ViewChange::Status(self.status.clone()));
    }

    /// Install the answer surface unless it is already there.
    pub(crate) fn show_answer_surface(&mut self) {
        if self.answer.is_none() {
            self.answer = Some(String::new());
            self.changes.push(ViewChange::AnswerSurfaceShown);
        }
    }

    pub(crate) fn append_answer(&mut self, fragment: &str, formatted: &str) {
        self.answer = Some(formatted.to_string());
        self.changes.push(ViewChange::AnswerAppended {
            fragment: fragment.to_string(),
        });
    }

    pub(crate) fn replace_answer(&mut self, raw: &str, formatted: &str) {
        self.answer = Some(formatted.to_string());
        self.changes.push(ViewChange::AnswerReplaced {
            raw: raw.to_string(),
        });
    }

    pub(crate) fn replace_sources(&mut self, records: &[SourceRecord]) {
        self.sources.replace(records);
        self.changes.push(ViewChange::SourcesReplaced);
    }

    pub(crate) fn replace_suggestions(&mut self, suggestions: &[String]) {
        if self.suggestions.replace(suggestions) {
            self.changes.push(ViewChange::SuggestionsReplaced);
        }
    }

    pub(crate) fn clear_progress(&mut self) {
        if self.in_progress {
            self.in_progress = false;
            self.changes.push(ViewChange::ProgressCleared);
        }
    }

    pub(crate) fn fail(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.in_progress = false;
        self.changes.push(ViewChange::Failed(message.to_string()));
    }
}
