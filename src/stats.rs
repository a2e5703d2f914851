//! Weekly statistics over normalized mood entries.

use crate::mood::{Bucket, MoodEntry};

/// How many entries fell into each score band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Distribution {
    pub low: usize,
    pub mid: usize,
    pub high: usize,
}

/// Aggregated view of one user's trailing week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStats {
    pub total_entries: usize,
    /// Mean of normalized scores, rounded to one decimal. 0.0 when empty.
    pub average_mood: f64,
    pub distribution: Distribution,
}

/// Fold a window of entries into weekly totals. Each entry is normalized
/// onto the 0-10 scale first, so old categorical records count alongside
/// numeric ones.
pub fn aggregate(entries: &[MoodEntry]) -> WeeklyStats {
    let mut distribution = Distribution::default();
    let mut sum: u32 = 0;

    for entry in entries {
        let score = entry.value.normalize();
        sum += score as u32;
        match Bucket::of(score) {
            Bucket::Low => distribution.low += 1,
            Bucket::Mid => distribution.mid += 1,
            Bucket::High => distribution.high += 1,
        }
    }

    let total_entries = entries.len();
    let average_mood = if total_entries == 0 {
        0.0
    } else {
        (sum as f64 / total_entries as f64 * 10.0).round() / 10.0
    };

    WeeklyStats {
        total_entries,
        average_mood,
        distribution,
    }
}
