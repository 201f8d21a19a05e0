//! Source connectors: one adapter per listing board.
//!
//! Each connector turns a board's HTML into normalized [`Posting`] records.
//! Connectors are mutually independent — one board's failure never blocks the
//! others — and every HTTP call goes through the shared [`FetchClient`], so
//! timeout and retry policy are uniform across boards.

mod craigslist;
mod generic;
mod remoteok;
mod weworkremotely;

use async_trait::async_trait;

use jobscout_fetch::FetchClient;
use jobscout_shared::{Posting, Result, RunConfig};

pub use craigslist::CraigslistConnector;
pub use generic::GenericConnector;
pub use remoteok::RemoteOkConnector;
pub use weworkremotely::WeWorkRemotelyConnector;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A source-specific adapter producing normalized postings.
///
/// `discover` returns `Ok(vec![])` on "no results"; it errs only on hard
/// failure (fetch exhaustion, unusable markup), which the orchestrator
/// treats as "no postings from this source".
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch and normalize the board's current listings.
    async fn discover(&self) -> Result<Vec<Posting>>;

    /// Connector identity for diagnostics and artifact naming.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the connector set for a run: one Craigslist connector per configured
/// city, RemoteOK, WeWorkRemotely, and a generic connector per extra board.
pub fn build_connectors(config: &RunConfig, client: &FetchClient) -> Vec<Box<dyn Connector>> {
    let mut connectors: Vec<Box<dyn Connector>> = Vec::new();

    for city in &config.craigslist_sites {
        connectors.push(Box::new(CraigslistConnector::new(
            client.clone(),
            city.clone(),
            config.query.clone(),
        )));
    }
    connectors.push(Box::new(RemoteOkConnector::new(
        client.clone(),
        config.query.clone(),
    )));
    connectors.push(Box::new(WeWorkRemotelyConnector::new(
        client.clone(),
        config.query.clone(),
    )));
    for board in &config.extra_boards {
        connectors.push(Box::new(GenericConnector::new(client.clone(), board.clone())));
    }

    connectors
}

// ---------------------------------------------------------------------------
// Shared extraction helpers
// ---------------------------------------------------------------------------

/// Collect an element's text with whitespace collapsed to single spaces.
pub(crate) fn element_text(el: &scraper::ElementRef<'_>) -> String {
    let raw: String = el.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a possibly-relative href against the page URL.
pub(crate) fn resolve_href(base: &str, href: &str) -> Option<String> {
    if href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let base_url = url::Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn element_text_collapses_whitespace() {
        let doc = Html::parse_fragment("<p>  Senior\n\t Rust   Engineer </p>");
        let sel = Selector::parse("p").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(element_text(&el), "Senior Rust Engineer");
    }

    #[test]
    fn resolve_href_joins_and_strips_fragments() {
        assert_eq!(
            resolve_href("https://board.example.com/jobs", "/listing/42#apply").as_deref(),
            Some("https://board.example.com/listing/42")
        );
        assert_eq!(resolve_href("https://board.example.com", "mailto:hr@x.com"), None);
        assert_eq!(resolve_href("https://board.example.com", "javascript:void(0)"), None);
    }
}
