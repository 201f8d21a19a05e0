//! RemoteOK connector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use tracing::debug;

use jobscout_fetch::FetchClient;
use jobscout_shared::{Posting, Result};

use crate::{Connector, element_text, resolve_href};

const SOURCE: &str = "remoteok";

/// Scrapes `https://remoteok.com/remote-<query>-jobs` table rows.
pub struct RemoteOkConnector {
    client: FetchClient,
    query: String,
    base_url: String,
}

impl RemoteOkConnector {
    pub fn new(client: FetchClient, query: String) -> Self {
        Self {
            client,
            query,
            base_url: "https://remoteok.com".into(),
        }
    }

    /// Point the connector at a different host (for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self) -> String {
        format!(
            "{}/remote-{}-jobs",
            self.base_url,
            self.query.replace(' ', "-")
        )
    }

    fn parse_listings(html: &str, base_url: &str) -> Vec<Posting> {
        let doc = Html::parse_document(html);
        let row_sel = Selector::parse("tr.job").expect("static selector");
        let title_sel = Selector::parse("h2").expect("static selector");
        let link_sel = Selector::parse("a.preventLink").expect("static selector");
        let time_sel = Selector::parse("time").expect("static selector");

        let mut postings = Vec::new();
        for row in doc.select(&row_sel) {
            let (Some(heading), Some(link)) =
                (row.select(&title_sel).next(), row.select(&link_sel).next())
            else {
                continue;
            };
            let title = element_text(&heading);
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| resolve_href(base_url, href))
            else {
                continue;
            };
            if title.is_empty() {
                continue;
            }

            let published_at = row
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
                summary: element_text(&row),
            });
        }
        postings
    }
}

#[async_trait]
impl Connector for RemoteOkConnector {
    async fn discover(&self) -> Result<Vec<Posting>> {
        let html = self.client.get_text(&self.search_url()).await?;
        let postings = Self::parse_listings(&html, &self.base_url);
        debug!(count = postings.len(), "remoteok listings parsed");
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
    <html><body><table>
      <tr class="job">
        <td><h2>Rust Backend Engineer</h2></td>
        <td><a class="preventLink" href="/remote-jobs/100-rust-backend"></a></td>
        <td><time datetime="2024-04-25T12:00:00+00:00">2d</time></td>
        <td>Work on a storage engine. Remote, worldwide.</td>
      </tr>
      <tr class="job">
        <td><h2>Platform Engineer</h2></td>
        <td><a class="preventLink" href="/remote-jobs/101-platform"></a></td>
      </tr>
      <tr class="job"><td>malformed row, no heading</td></tr>
    </table></body></html>"#;

    #[test]
    fn parses_rows_and_absolutizes_urls() {
        let postings = RemoteOkConnector::parse_listings(FIXTURE, "https://remoteok.com");
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].title, "Rust Backend Engineer");
        assert_eq!(postings[0].url, "https://remoteok.com/remote-jobs/100-rust-backend");
        assert_eq!(postings[0].published_at.timestamp(), 1_714_046_400);
        assert!(postings[0].summary.contains("storage engine"));

        // Missing <time> falls back to now
        assert_eq!(postings[1].source, "remoteok");
        assert!(postings[1].published_at > postings[0].published_at);
    }

    #[tokio::test]
    async fn discover_builds_dashed_search_path() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/remote-python-developer-jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .mount(&server)
            .await;

        let client = FetchClient::new(jobscout_fetch::RetryPolicy::fetch(), 5).unwrap();
        let connector = RemoteOkConnector::new(client, "python developer".into())
            .with_base_url(server.uri());

        let postings = connector.discover().await.unwrap();
        assert_eq!(postings.len(), 2);
    }
}
