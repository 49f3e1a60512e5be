//! Follow-up query chips.

/// The active set of suggestion chips. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSet {
    chips: Vec<String>,
}

impl SuggestionSet {
    /// Replace the chips with `suggestions`. Blank entries are dropped; an
    /// empty input leaves the current chips in place and returns `false`.
    pub fn replace(&mut self, suggestions: &[String]) -> bool {
        let chips: Vec<String> = suggestions
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if chips.is_empty() {
            return false;
        }
        self.chips = chips;
        true
    }

    pub fn clear(&mut self) {
        self.chips.clear();
    }

    /// Query text of chip `index` (0-based).
    pub fn get(&self, index: usize) -> Option<&str> {
        self.chips.get(index).map(String::as_str)
    }

    pub fn chips(&self) -> &[String] {
        &self.chips
    }

    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}
