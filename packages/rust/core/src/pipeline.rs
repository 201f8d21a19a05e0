//! End-to-end run: gather → filter → rank → select → generate → persist.
//!
//! The run is a linear state machine. Every phase either completes or
//! degrades in a defined way: a failed board drops out of gathering, a
//! failed ranking selects nothing, a failed generation skips one posting.
//! Only lock contention and storage corruption abort the run, and the lock
//! releases on every exit path because [`RunLock`] removes its marker on
//! drop.

use std::path::PathBuf;
use std::time::Instant;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use jobscout_artifacts::{append_followup, write_letter};
use jobscout_connectors::Connector;
use jobscout_fetch::{FetchClient, RetryPolicy};
use jobscout_generate::{GenerationClient, GenerationOutcome, mood_today};
use jobscout_ranking::EmbeddingClient;
use jobscout_shared::{Posting, Result, RunConfig, RunId};
use jobscout_storage::{RunLock, SeenStore};

/// Seen-URL store file inside the data directory.
const SEEN_FILE: &str = "seen.json";

/// Lock marker file inside the data directory.
const LOCK_FILE: &str = "run.lock";

// ---------------------------------------------------------------------------
// Configuration and report
// ---------------------------------------------------------------------------

/// Everything one run needs: merged run settings plus the scoring/generation
/// endpoint credentials.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Merged config-file + CLI settings.
    pub run: RunConfig,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// Bearer token for the scoring and generation endpoints.
    pub api_key: String,
    /// Embedding model for relevance scoring.
    pub embed_model: String,
    /// Chat model for letter generation.
    pub chat_model: String,
}

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Postings gathered across all boards, before dedup.
    pub gathered: usize,
    /// Postings surviving the seen-store and in-run dedup filter.
    pub fresh: usize,
    /// Postings handed to generation (top-K of the ranking).
    pub selected: usize,
    /// Letters written.
    pub accepted: usize,
    /// Generation failures (posting stays unseen and retries next run).
    pub failed: usize,
    /// Paths of the letters written this run.
    pub letters: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Run phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Locking,
    Gathering,
    Filtering,
    Ranking,
    Selecting,
    Generating,
    Persisting,
    Unlocking,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locking => "Locking",
            Self::Gathering => "Gathering",
            Self::Filtering => "Filtering",
            Self::Ranking => "Ranking",
            Self::Selecting => "Selecting",
            Self::Generating => "Generating",
            Self::Persisting => "Persisting",
            Self::Unlocking => "Unlocking",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, phase: Phase);
    /// Called after each board finishes gathering.
    fn source_done(&self, name: &str, count: usize, ok: bool);
    /// Called per generation outcome.
    fn outcome(&self, url: &str, accepted: bool);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _phase: Phase) {}
    fn source_done(&self, _name: &str, _count: usize, _ok: bool) {}
    fn outcome(&self, _url: &str, _accepted: bool) {}
    fn done(&self, _report: &RunReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline.
///
/// Returns [`jobscout_shared::JobscoutError::Locked`] when another run holds
/// the lock; callers should treat that as a quiet no-op, not a failure.
#[instrument(skip_all, fields(query = %config.run.query))]
pub async fn run(
    config: &PipelineConfig,
    connectors: &[Box<dyn Connector>],
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    let data_dir = &config.run.data_dir;

    info!(%run_id, boards = connectors.len(), "starting run");

    // --- Locking ---
    progress.phase(Phase::Locking);
    let mut lock = RunLock::acquire(data_dir.join(LOCK_FILE))?;

    // --- Gathering ---
    progress.phase(Phase::Gathering);
    let gathered = gather(connectors, progress).await;

    // --- Filtering ---
    progress.phase(Phase::Filtering);
    let mut seen = SeenStore::load(data_dir.join(SEEN_FILE))?;
    let fresh = filter_fresh(gathered.clone(), &seen);
    info!(gathered = gathered.len(), fresh = fresh.len(), "filtered postings");

    // --- Ranking ---
    progress.phase(Phase::Ranking);
    let fetch = FetchClient::new(RetryPolicy::scoring(), config.run.timeout_secs)?;
    let embed_client = EmbeddingClient::new(
        fetch.clone(),
        &config.api_base,
        &config.api_key,
        &config.embed_model,
    );
    let profile_text = config.run.profile.ranking_text();
    let fresh_count = fresh.len();

    // A dead scoring service costs this run its selections, nothing more:
    // the seen store is untouched, so every fresh posting retries next run.
    let ranked = match jobscout_ranking::rank(&embed_client, &profile_text, fresh).await {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!(error = %e, "ranking failed, selecting nothing this run");
            Vec::new()
        }
    };

    // --- Selecting ---
    progress.phase(Phase::Selecting);
    let selected: Vec<Posting> = ranked
        .into_iter()
        .take(config.run.max_apply)
        .map(|r| r.posting)
        .collect();
    info!(selected = selected.len(), "selection complete");

    // --- Generating ---
    progress.phase(Phase::Generating);
    let gen_client = GenerationClient::new(
        fetch,
        &config.api_base,
        &config.api_key,
        &config.chat_model,
    );
    let mood = mood_today();
    let selected_count = selected.len();

    let outcomes = join_all(
        selected
            .into_iter()
            .map(|posting| gen_client.generate(posting, &config.run.profile, &mood)),
    )
    .await;

    // --- Persisting ---
    progress.phase(Phase::Persisting);
    let mut letters = Vec::new();
    let mut failed = 0usize;

    for outcome in outcomes {
        match outcome {
            GenerationOutcome::Accepted { posting, letter } => {
                let path = write_letter(data_dir, &posting, &letter)?;
                append_followup(data_dir, &posting.url)?;
                seen.insert(posting.url.clone());
                progress.outcome(&posting.url, true);
                letters.push(path);
            }
            GenerationOutcome::Failed { posting, reason } => {
                warn!(url = %posting.url, %reason, "posting skipped");
                progress.outcome(&posting.url, false);
                failed += 1;
            }
        }
    }

    // --- Unlocking ---
    progress.phase(Phase::Unlocking);
    seen.persist()?;
    lock.release();

    progress.phase(Phase::Done);
    let report = RunReport {
        run_id,
        gathered: gathered.len(),
        fresh: fresh_count,
        selected: selected_count,
        accepted: letters.len(),
        failed,
        letters,
        elapsed: start.elapsed(),
    };
    progress.done(&report);

    info!(
        run_id = %report.run_id,
        gathered = report.gathered,
        fresh = report.fresh,
        selected = report.selected,
        accepted = report.accepted,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis(),
        "run complete"
    );

    Ok(report)
}

/// Fan out over all boards concurrently. A failing board contributes zero
/// postings and a warning; the others are unaffected.
async fn gather(
    connectors: &[Box<dyn Connector>],
    progress: &dyn ProgressReporter,
) -> Vec<Posting> {
    let results = join_all(connectors.iter().map(|c| c.discover())).await;

    let mut postings = Vec::new();
    for (connector, result) in connectors.iter().zip(results) {
        match result {
            Ok(mut found) => {
                info!(source = connector.name(), count = found.len(), "board gathered");
                progress.source_done(connector.name(), found.len(), true);
                postings.append(&mut found);
            }
            Err(e) => {
                warn!(source = connector.name(), error = %e, "board failed, continuing");
                progress.source_done(connector.name(), 0, false);
            }
        }
    }
    postings
}

/// Drop postings already handled in a previous run, and collapse in-run
/// duplicates keeping the first occurrence (gathering order).
fn filter_fresh(postings: Vec<Posting>, seen: &SeenStore) -> Vec<Posting> {
    let mut in_run = std::collections::HashSet::new();
    postings
        .into_iter()
        .filter(|p| !seen.contains(&p.url) && in_run.insert(p.url.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
