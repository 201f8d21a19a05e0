//! Generic article-list connector for extra boards configured by URL.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use tracing::debug;

use jobscout_fetch::FetchClient;
use jobscout_shared::{Posting, Result};

use crate::{Connector, element_text, resolve_href};

const SOURCE: &str = "generic";

/// Treats every `<article>` with a link as one listing. Boards without a
/// dedicated connector get this lowest-common-denominator extraction;
/// `published_at` is always "now" since generic markup carries no usable date.
pub struct GenericConnector {
    client: FetchClient,
    board_url: String,
}

impl GenericConnector {
    pub fn new(client: FetchClient, board_url: String) -> Self {
        Self { client, board_url }
    }

    fn parse_listings(html: &str, page_url: &str) -> Vec<Posting> {
        let doc = Html::parse_document(html);
        let article_sel = Selector::parse("article").expect("static selector");
        let link_sel = Selector::parse("a[href]").expect("static selector");

        let mut postings = Vec::new();
        for article in doc.select(&article_sel) {
            let Some(link) = article.select(&link_sel).next() else {
                continue;
            };
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| resolve_href(page_url, href))
            else {
                continue;
            };
            let title = element_text(&link);
            if title.is_empty() {
                continue;
            }

            postings.push(Posting {
                title,
                url,
                published_at: Utc::now(),
                source: SOURCE.to_string(),
                summary: element_text(&article),
            });
        }
        postings
    }
}

#[async_trait]
impl Connector for GenericConnector {
    async fn discover(&self) -> Result<Vec<Posting>> {
        let html = self.client.get_text(&self.board_url).await?;
        let postings = Self::parse_listings(&html, &self.board_url);
        debug!(board = %self.board_url, count = postings.len(), "generic listings parsed");
        Ok(postings)
    }

    fn name(&self) -> &str {
        SOURCE
    }
}
