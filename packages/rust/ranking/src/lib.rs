//! Relevance ranking against the applicant profile.
//!
//! One batch embedding request covers the profile text and every posting, so
//! a run costs a single round-trip to the scoring service. Scores are cosine
//! similarities; ranking fails as a whole when the service is unreachable or
//! returns unusable data — the orchestrator then degrades to zero selections.

use serde::Deserialize;
use tracing::{debug, instrument};

use jobscout_fetch::FetchClient;
use jobscout_shared::{JobscoutError, Posting, Result};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A posting paired with its cosine similarity to the profile, in [-1, 1].
#[derive(Debug, Clone)]
pub struct RankedPosting {
    pub posting: Posting,
    pub score: f32,
}

/// Response shape of the embeddings endpoint: one vector per input text,
/// in input order.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// EmbeddingClient
// ---------------------------------------------------------------------------

/// Thin client for the batch embeddings endpoint.
pub struct EmbeddingClient {
    fetch: FetchClient,
    api_base: String,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(
        fetch: FetchClient,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            fetch,
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Embed a batch of texts. Returns one vector per input, same order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let reply = self.fetch.post_json(&url, Some(&self.api_key), &body).await?;

        let parsed: EmbeddingResponse = serde_json::from_value(reply)
            .map_err(|e| JobscoutError::Ranking(format!("malformed embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(JobscoutError::Ranking(format!(
                "embedding count mismatch: sent {}, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Rank postings by relevance to the profile text, descending.
///
/// Equal scores keep their relative input order. An empty input returns
/// empty without calling the scoring service.
#[instrument(skip_all, fields(postings = postings.len()))]
pub async fn rank(
    client: &EmbeddingClient,
    profile_text: &str,
    postings: Vec<Posting>,
) -> Result<Vec<RankedPosting>> {
    if postings.is_empty() {
        return Ok(Vec::new());
    }

    let mut texts = Vec::with_capacity(postings.len() + 1);
    texts.push(profile_text.to_string());
    texts.extend(postings.iter().map(|p| p.ranking_text()));

    let mut vectors = client.embed_batch(&texts).await?;
    let profile_vec = vectors.remove(0);

    let ranked = order_by_similarity(&profile_vec, &vectors, postings)?;
    debug!(
        top_score = ranked.first().map(|r| r.score),
        "ranking complete"
    );
    Ok(ranked)
}

/// Score postings against the profile vector and stable-sort descending.
/// Exposed separately so ordering semantics are testable without a network.
pub fn order_by_similarity(
    profile_vec: &[f32],
    posting_vecs: &[Vec<f32>],
    postings: Vec<Posting>,
) -> Result<Vec<RankedPosting>> {
    if posting_vecs.len() != postings.len() {
        return Err(JobscoutError::Ranking(format!(
            "vector count mismatch: {} vectors for {} postings",
            posting_vecs.len(),
            postings.len()
        )));
    }

    let mut ranked = Vec::with_capacity(postings.len());
    for (posting, vec) in postings.into_iter().zip(posting_vecs) {
        let score = cosine(profile_vec, vec)?;
        ranked.push(RankedPosting { posting, score });
    }

    // Vec::sort_by is stable: equal scores retain input order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}

/// Cosine similarity. Zero-norm or non-finite inputs are a ranking failure,
/// never silently coerced to zero.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() || a.is_empty() {
        return Err(JobscoutError::Ranking(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let score = dot / (norm_a * norm_b);
    if !score.is_finite() {
        return Err(JobscoutError::Ranking(
            "non-finite similarity (zero-norm or invalid vector)".into(),
        ));
    }
    Ok(score)
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use chrono::Utc;
    use jobscout_fetch::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn posting(title: &str, url: &str) -> Posting {
        Posting {
            title: title.into(),
            url: url.into(),
            published_at: Utc::now(),
            source: "test".into(),
            summary: "stuff".into(),
        }
    }

    fn client(server: &MockServer) -> EmbeddingClient {
        let policy = RetryPolicy::new(2, Duration::from_millis(5), Duration::from_millis(10));
        EmbeddingClient::new(
            FetchClient::new(policy, 5).unwrap(),
            server.uri(),
            "sk-test",
            "text-embedding-3-small",
        )
    }

    #[tokio::test]
    async fn ranks_against_batch_embeddings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"embedding": [1.0, 0.0]},
                    {"embedding": [0.2, 0.9797958971]},
                    {"embedding": [0.8, 0.6]},
                ]
            })))
            .mount(&server)
            .await;

        let postings = vec![
            posting("low", "https://x.test/low"),
            posting("high", "https://x.test/high"),
        ];
        let ranked = rank(&client(&server), "profile skills", postings)
            .await
            .unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].posting.title, "high");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[tokio::test]
    async fn count_mismatch_fails_ranking_as_a_whole() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let err = rank(
            &client(&server),
            "profile",
            vec![posting("a", "https://x.test/a")],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("count mismatch"));
    }

    #[tokio::test]
    async fn malformed_response_fails_ranking() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"oops": []})),
            )
            .mount(&server)
            .await;

        let err = rank(
            &client(&server),
            "profile",
            vec![posting("a", "https://x.test/a")],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, JobscoutError::Ranking(_)));
    }

    #[tokio::test]
    async fn empty_input_short_circuits_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ranked = rank(&client(&server), "profile", Vec::new()).await.unwrap();
        assert!(ranked.is_empty());
    }
}
