use crate::letters::Letter;
use crate::util::mean;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use parking_lot::Mutex;
use serde::Serialize;

/// Samples kept before the window is truncated.
pub const SAMPLE_CAP: usize = 100;
/// Samples retained after truncation.
pub const SAMPLE_KEEP: usize = 50;
pub const TOP_LETTERS: usize = 5;

/// Raw counters; only reachable through [`StatsTracker`].
#[derive(Debug, Clone)]
struct RunningStats {
    started_at: DateTime<Utc>,
    requests_handled: u64,
    analysis_requests: u64,
    confidence_samples: Vec<f64>,
    // First-seen order doubles as the tie breaker for the ranking.
    letter_counts: Vec<(Letter, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LetterCount {
    pub letter: Letter,
    pub count: u64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_ms: i64,
    pub requests_handled: u64,
    pub analysis_requests: u64,
    pub average_confidence: f64,
    pub total_samples: usize,
    pub top_letters: Vec<LetterCount>,
}

/// Process-lifetime usage counters, safe to share between handlers.
#[derive(Debug)]
pub struct StatsTracker {
    inner: Mutex<RunningStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(RunningStats {
                started_at,
                requests_handled: 0,
                analysis_requests: 0,
                confidence_samples: Vec::with_capacity(SAMPLE_CAP + 1),
                letter_counts: Vec::new(),
            }),
        }
    }

    pub fn record_request(&self) {
        self.inner.lock().requests_handled += 1;
    }

    pub fn record_analysis(&self, letter: &Letter, confidence: f64) {
        let mut stats = self.inner.lock();
        stats.analysis_requests += 1;

        stats.confidence_samples.push(confidence);
        if stats.confidence_samples.len() > SAMPLE_CAP {
            let excess = stats.confidence_samples.len() - SAMPLE_KEEP;
            stats.confidence_samples.drain(..excess);
        }

        match stats.letter_counts.iter().position(|(l, _)| l == letter) {
            Some(idx) => stats.letter_counts[idx].1 += 1,
            None => stats.letter_counts.push((letter.clone(), 1)),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> StatsSnapshot {
        let stats = self.inner.lock();

        let top_letters = stats
            .letter_counts
            .iter()
            .sorted_by(|a, b| b.1.cmp(&a.1))
            .take(TOP_LETTERS)
            .map(|(letter, count)| LetterCount {
                letter: letter.clone(),
                count: *count,
            })
            .collect();

        StatsSnapshot {
            started_at: stats.started_at,
            uptime_ms: (now - stats.started_at).num_milliseconds().max(0),
            requests_handled: stats.requests_handled,
            analysis_requests: stats.analysis_requests,
            average_confidence: mean(&stats.confidence_samples).unwrap_or(0.0),
            total_samples: stats.confidence_samples.len(),
            top_letters,
        }
    }

    /// Copy of the current sample window, oldest first.
    pub fn samples(&self) -> Vec<f64> {
        self.inner.lock().confidence_samples.clone()
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}
