//! Daily mood parameters for generation.
//!
//! The mood is a pure function of the calendar date: the same day always
//! produces the same palette, so reruns within a day keep a consistent voice.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Tone/temperature tuple fed into the generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mood {
    /// Palette tag: `calm`, `energetic`, or `visionary`.
    pub tag: &'static str,
    /// Brand tone phrase used in the applicant payload.
    pub tone: &'static str,
    /// Sampling temperature.
    pub temp: f32,
    /// Nucleus sampling bound.
    pub top_p: f32,
}

const CALM: Mood = Mood {
    tag: "calm",
    tone: "measured mentor",
    temp: 0.40,
    top_p: 0.90,
};
const ENERGETIC: Mood = Mood {
    tag: "energetic",
    tone: "confident builder",
    temp: 0.60,
    top_p: 0.95,
};
const VISIONARY: Mood = Mood {
    tag: "visionary",
    tone: "inspiring strategist",
    temp: 0.75,
    top_p: 0.98,
};

/// Mood for a given date.
pub fn mood_for_date(date: NaiveDate) -> Mood {
    let seed = date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64;
    palette(index_from_seed(seed))
}

/// Mood for today (UTC).
pub fn mood_today() -> Mood {
    mood_for_date(chrono::Utc::now().date_naive())
}

/// Scramble the YYYYMMDD seed into a uniform-ish index in [0, 1).
fn index_from_seed(seed: u64) -> f64 {
    // FNV-1a over the seed bytes
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in seed.to_le_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

fn palette(idx: f64) -> Mood {
    if idx < 0.33 {
        CALM
    } else if idx < 0.66 {
        ENERGETIC
    } else {
        VISIONARY
    }
}
