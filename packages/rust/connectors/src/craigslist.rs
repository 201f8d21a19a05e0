//! Craigslist jobs-board connector (one instance per city subdomain).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;

use jobscout_fetch::FetchClient;
use jobscout_shared::{Posting, Result};

use crate::{Connector, element_text};

/// Scrapes `https://<city>.craigslist.org/search/jjj` result rows.
pub struct CraigslistConnector {
    client: FetchClient,
    city: String,
    query: String,
    base_url: String,
}

impl CraigslistConnector {
    pub fn new(client: FetchClient, city: String, query: String) -> Self {
        let base_url = format!("https://{city}.craigslist.org");
        Self {
            client,
            city,
            query,
            base_url,
        }
    }

    /// Point the connector at a different host (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self) -> String {
        format!(
            "{}/search/jjj?sort=date&query={}",
            self.base_url,
            self.query.replace(' ', "+")
        )
    }

    /// Parse result rows out of a search page. Rows without a title link or
    /// a numeric `data-time` are skipped, as the board intermixes ads.
    fn parse_listings(html: &str, source: &str) -> Vec<Posting> {
        let doc = Html::parse_document(html);
        let row_sel = Selector::parse("li.result-row").expect("static selector");
        let title_sel = Selector::parse("a.result-title").expect("static selector");

        let mut postings = Vec::new();
        for row in doc.select(&row_sel) {
            let Some(link) = row.select(&title_sel).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let title = element_text(&link);
            if title.is_empty() {
                continue;
            }

            // data-time is epoch milliseconds
            let published_at = row
                .value()
                .attr("data-time")
                .and_then(|t| t.parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or_else(Utc::now);

            postings.push(Posting {
                title,
                url: href.to_string(),
                published_at,
                source: source.to_string(),
                summary: element_text(&row),
            });
        }
        postings
    }
}

#[async_trait]
impl Connector for CraigslistConnector {
    async fn discover(&self) -> Result<Vec<Posting>> {
        let url = self.search_url();
        let html = self.client.get_text(&url).await?;
        let postings = Self::parse_listings(&html, &format!("craigslist-{}", self.city));
        debug!(city = %self.city, count = postings.len(), "craigslist listings parsed");
        Ok(postings)
    }

    fn name(&self) -> &str {
        &self.city
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <html><body><ul>
      <li class="result-row" data-time="1714089600000">
        <a class="result-title" href="https://newyork.craigslist.org/jobs/1.html">Python Developer</a>
        <span class="result-meta">Midtown · full-time</span>
      </li>
      <li class="result-row" data-time="not-a-number">
        <a class="result-title" href="https://newyork.craigslist.org/jobs/2.html">Undated role</a>
      </li>
      <li class="result-row" data-time="1714089700000">
        <span class="no-link">sponsored filler</span>
      </li>
    </ul></body></html>"#;

    #[test]
    fn parses_rows_and_falls_back_on_bad_dates() {
        let postings = CraigslistConnector::parse_listings(FIXTURE, "craigslist-newyork");
        assert_eq!(postings.len(), 2);

        assert_eq!(postings[0].title, "Python Developer");
        assert_eq!(postings[0].url, "https://newyork.craigslist.org/jobs/1.html");
        assert_eq!(postings[0].source, "craigslist-newyork");
        assert!(postings[0].summary.contains("Midtown"));
        assert_eq!(postings[0].published_at.timestamp(), 1_714_089_600);

        // Bad data-time keeps the row but falls back to "now"
        assert_eq!(postings[1].title, "Undated role");
        assert!(postings[1].published_at > postings[0].published_at);
    }

    #[test]
    fn empty_page_yields_no_postings() {
        let postings = CraigslistConnector::parse_listings("<html><body/></html>", "craigslist-x");
        assert!(postings.is_empty());
    }

    #[tokio::test]
    async fn discover_against_mock_server() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/jjj"))
            .and(query_param("query", "python+developer"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .mount(&server)
            .await;

        let client = FetchClient::new(jobscout_fetch::RetryPolicy::fetch(), 5).unwrap();
        let connector =
            CraigslistConnector::new(client, "newyork".into(), "python developer".into())
                .with_base_url(server.uri());

        let postings = connector.discover().await.unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(connector.name(), "newyork");
    }
}
