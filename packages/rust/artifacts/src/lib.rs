//! Artifact persistence: cover-letter files and the follow-up journal.
//!
//! Letters land in the data directory as Markdown, named by date, sanitized
//! title, and source board. The journal (`followups.txt`) is a newest-first
//! list of `<ISO timestamp>||<url>` lines; the timestamp is the follow-up
//! due date, two days after acceptance. All writes go through a temp file
//! and rename so a crash never leaves a half-written artifact.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tracing::{debug, info};

use jobscout_shared::{JobscoutError, Posting, Result};

/// Follow-up reminders come due this long after a letter is accepted.
const FOLLOWUP_DELAY_DAYS: i64 = 2;

const TITLE_MAX_LEN: usize = 40;

pub const JOURNAL_FILE: &str = "followups.txt";

// ---------------------------------------------------------------------------
// Letter files
// ---------------------------------------------------------------------------

/// Collapse every run of non-word characters to a single underscore and trim
/// the result to the filename budget.
fn sanitize_title(title: &str) -> String {
    static NON_WORD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\W+").expect("valid regex"));

    let cleaned = NON_WORD_RE.replace_all(title, "_");
    let trimmed = cleaned.trim_matches('_');
    trimmed.chars().take(TITLE_MAX_LEN).collect()
}

/// Letter filename: `{YYYY-MM-DD}_{sanitized title}_{source}.md`.
pub fn letter_filename(posting: &Posting, date: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.md",
        date.format("%Y-%m-%d"),
        sanitize_title(&posting.title),
        posting.source,
    )
}

/// Write one letter atomically into `data_dir`. Returns the final path.
pub fn write_letter(data_dir: &Path, posting: &Posting, letter: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir).map_err(|e| JobscoutError::io(data_dir, e))?;

    let target = data_dir.join(letter_filename(posting, Utc::now()));
    let temp = target.with_extension("md.tmp");

    std::fs::write(&temp, letter).map_err(|e| JobscoutError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| JobscoutError::io(&target, e))?;

    info!(path = %target.display(), "letter written");
    Ok(target)
}

// ---------------------------------------------------------------------------
// Follow-up journal
// ---------------------------------------------------------------------------

/// Prepend a follow-up entry for `url` to the journal in `data_dir`.
///
/// The whole file is rewritten with the new line first, so the journal reads
/// newest to oldest. A missing journal is created.
pub fn append_followup(data_dir: &Path, url: &str) -> Result<DateTime<Utc>> {
    let eta = Utc::now() + Duration::days(FOLLOWUP_DELAY_DAYS);
    prepend_followup_at(data_dir, url, eta)?;
    Ok(eta)
}

/// Journal write with an explicit due timestamp. Split out for tests.
pub fn prepend_followup_at(data_dir: &Path, url: &str, eta: DateTime<Utc>) -> Result<()> {
    std::fs::create_dir_all(data_dir).map_err(|e| JobscoutError::io(data_dir, e))?;

    let path = data_dir.join(JOURNAL_FILE);
    let existing = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(JobscoutError::io(&path, e)),
    };

    let mut contents = format!("{}||{}\n", eta.to_rfc3339(), url);
    contents.push_str(&existing);

    let temp = path.with_extension("txt.tmp");
    std::fs::write(&temp, contents).map_err(|e| JobscoutError::io(&temp, e))?;
    std::fs::rename(&temp, &path).map_err(|e| JobscoutError::io(&path, e))?;

    debug!(url, eta = %eta, "follow-up journaled");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
