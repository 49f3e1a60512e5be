//! Source cards: ranked result references with a derived domain and favicon URL.

use url::Url;

use crate::messages::SourceRecord;

/// Domain shown for a source whose URL cannot be parsed or has no host.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Favicon lookup used when the config does not name one. `{domain}` is substituted.
pub const DEFAULT_ICON_SERVICE: &str = "https://www.google.com/s2/favicons?domain={domain}&sz=32";

/// One rendered source card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// 1-based position in the list the service sent.
    pub rank: usize,
    pub title: String,
    pub url: String,
    pub domain: String,
    /// Best-effort favicon for `domain`. The frontend may fail to load it;
    /// nothing else depends on it.
    pub icon_url: String,
}

/// Host part of `url`, or [`UNKNOWN_DOMAIN`].
pub fn derive_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}

pub fn icon_url(icon_service: &str, domain: &str) -> String {
    icon_service.replace("{domain}", domain)
}

/// The rendered source list of the live session.
#[derive(Debug, Clone)]
pub struct SourceList {
    icon_service: String,
    cards: Vec<SourceRef>,
}

impl Default for SourceList {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_SERVICE)
    }
}

impl SourceList {
    pub fn new(icon_service: impl Into<String>) -> Self {
        Self {
            icon_service: icon_service.into(),
            cards: Vec::new(),
        }
    }

    /// Replace every card with cards built from `records`. The new list is
    /// built completely before it is swapped in.
    pub fn replace(&mut self, records: &[SourceRecord]) {
        let cards = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let domain = derive_domain(&record.url);
                SourceRef {
                    rank: i + 1,
                    title: record.title.clone(),
                    url: record.url.clone(),
                    icon_url: icon_url(&self.icon_service, &domain),
                    domain,
                }
            })
            .collect();
        self.cards = cards;
    }

    pub fn clear(&mut self) {
        self.cards = Vec::new();
    }

    pub fn cards(&self) -> &[SourceRef] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
