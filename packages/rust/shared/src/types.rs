//! Core domain types for the jobscout pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Posting
// ---------------------------------------------------------------------------

/// One normalized job listing, produced by a connector.
///
/// The `url` is the posting's identity: deduplication within a run and
/// across runs keys on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Listing title. Non-empty.
    pub title: String,
    /// Canonical listing URL — the dedup key.
    pub url: String,
    /// Publication time; connectors fall back to "now" when the source
    /// omits it.
    pub published_at: DateTime<Utc>,
    /// Connector identity, e.g. `"craigslist-newyork"` or `"remoteok"`.
    /// Used for diagnostics and artifact naming.
    pub source: String,
    /// Free-text blurb scraped from the listing. May be empty.
    #[serde(default)]
    pub summary: String,
}

impl Posting {
    /// The text handed to the relevance ranker for this posting.
    pub fn ranking_text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The fixed applicant profile postings are ranked against and generation
/// is personalized with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Applicant display name.
    pub name: String,
    /// Headline achievements / skills, one sentence each.
    pub top_skills: Vec<String>,
    /// Short career-goals paragraph.
    pub career_goals: String,
}

impl Profile {
    /// The text embedded as the ranking anchor vector.
    pub fn ranking_text(&self) -> String {
        self.top_skills.join(" ")
    }
}
