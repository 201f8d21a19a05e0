//! WeWorkRemotely connector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;

use jobscout_fetch::FetchClient;
use jobscout_shared::{Posting, Result};

use crate::{Connector, element_text, resolve_href};

const SOURCE: &str = "weworkremotely";

/// Scrapes `https://weworkremotely.com/remote-jobs/search` feature listings.
pub struct WeWorkRemotelyConnector {
    client: FetchClient,
    query: String,
    base_url: String,
}

impl WeWorkRemotelyConnector {
    pub fn new(client: FetchClient, query: String) -> Self {
        Self {
            client,
            query,
            base_url: "https://weworkremotely.com".into(),
        }
    }

    /// Point the connector at a different host (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self) -> String {
        format!(
            "{}/remote-jobs/search?term={}",
            self.base_url,
            self.query.replace(' ', "+")
        )
    }

    fn parse_listings(html: &str, base_url: &str) -> Vec<Posting> {
        let doc = Html::parse_document(html);
        let item_sel = Selector::parse("section.jobs li.feature").expect("static selector");
        let link_sel = Selector::parse("a").expect("static selector");
        let title_sel = Selector::parse("span.title").expect("static selector");
        let company_sel = Selector::parse("span.company").expect("static selector");
        let time_sel = Selector::parse("time").expect("static selector");

        let mut postings = Vec::new();
        for item in doc.select(&item_sel) {
            let Some(url) = item
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_href(base_url, href))
            else {
                continue;
            };

            // Listings occasionally omit the title span; the company span is
            // the next-best label.
            let title = item
                .select(&title_sel)
                .next()
                .or_else(|| item.select(&company_sel).next())
                .map(|el| element_text(&el))
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }

            let published_at = item
                .select(&time_sel)
                .next()
                .and_then(|t| t.value().attr("datetime"))
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            postings.push(Posting {
                title,
                url,
                published_at,
                source: SOURCE.to_string(),
                summary: element_text(&item),
            });
        }
        postings
    }
}

#[async_trait]
impl Connector for WeWorkRemotelyConnector {
    async fn discover(&self) -> Result<Vec<Posting>> {
        let html = self.client.get_text(&self.search_url()).await?;
        let postings = Self::parse_listings(&html, &self.base_url);
        debug!(count = postings.len(), "weworkremotely listings parsed");
        Ok(postings)
    }

    fn name(&self) -> &str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <html><body><section class="jobs"><ul>
      <li class="feature">
        <a href="/remote-jobs/acme-senior-python-dev">
          <span class="company">Acme</span>
          <span class="title">Senior Python Dev</span>
        </a>
        <time datetime="2024-04-20T08:30:00Z">Apr 20</time>
      </li>
      <li class="feature">
        <a href="/remote-jobs/globex-sre">
          <span class="company">Globex</span>
        </a>
      </li>
    </ul></section></body></html>"#;

    #[test]
    fn parses_features_with_company_fallback() {
        let postings =
            WeWorkRemotelyConnector::parse_listings(FIXTURE, "https://weworkremotely.com");
        assert_eq!(postings.len(), 2);

        assert_eq!(postings[0].title, "Senior Python Dev");
        assert_eq!(
            postings[0].url,
            "https://weworkremotely.com/remote-jobs/acme-senior-python-dev"
        );
        assert_eq!(postings[0].published_at.timestamp(), 1_713_601_800);

        // No title span: company name stands in; no time: falls back to now
        assert_eq!(postings[1].title, "Globex");
        assert!(postings[1].published_at > postings[0].published_at);
    }

    #[tokio::test]
    async fn discover_passes_search_term() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/remote-jobs/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .mount(&server)
            .await;

        let client = FetchClient::new(jobscout_fetch::RetryPolicy::fetch(), 5).unwrap();
        let connector = WeWorkRemotelyConnector::new(client, "python developer".into())
            .with_base_url(server.uri());

        let postings = connector.discover().await.unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(connector.name(), "weworkremotely");
    }
}
