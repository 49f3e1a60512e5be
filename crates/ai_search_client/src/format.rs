//! Answer text formatting: `**bold**`, `` `code` `` and line breaks to display markup.

use std::sync::OnceLock;

use regex::Regex;

fn emphasis() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("emphasis pattern is valid"))
}

fn inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`(.+?)`").expect("inline code pattern is valid"))
}

/// Format raw answer text into display markup.
///
/// Rules run in a fixed order so later rules never re-match markup produced by
/// earlier ones: emphasis, then inline code, then newlines. Spans never cross a
/// newline; an unmatched delimiter is left as literal text.
pub fn format_answer(raw: &str) -> String {
    let text = emphasis().replace_all(raw, "<strong>$1</strong>");
    let text = inline_code().replace_all(&text, "<code>$1</code>");
    text.replace('\n', "<br>")
}

/// The answer of one session: fragments in receipt order plus their formatted rendering.
///
/// No formatting rule spans a newline, so everything up to the last newline is
/// formatted once and cached; each new fragment only re-formats the trailing
/// unfinished line. `formatted()` is always equal to `format_answer(raw())`.
#[derive(Debug, Clone, Default)]
pub struct AnswerBuffer {
    fragments: Vec<String>,
    raw: String,
    stable_len: usize,
    stable_formatted: String,
    formatted: String,
}

impl AnswerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one streamed fragment and refresh the formatted text.
    pub fn push(&mut self, fragment: &str) {
        self.fragments.push(fragment.to_string());
        self.raw.push_str(fragment);

        if let Some(pos) = self.raw[self.stable_len..].rfind('\n') {
            let end = self.stable_len + pos + 1;
            self.stable_formatted
                .push_str(&format_answer(&self.raw[self.stable_len..end]));
            self.stable_len = end;
        }

        self.formatted.clear();
        self.formatted.push_str(&self.stable_formatted);
        self.formatted
            .push_str(&format_answer(&self.raw[self.stable_len..]));
    }

    /// Drop everything and hold `text` as the whole answer.
    pub fn replace(&mut self, text: &str) {
        *self = Self::default();
        self.push(text);
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
