//! Timed practice sessions and their end-of-session report

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::models::PresentationMode;
use super::store::{ProgressStore, Result};

/// Counters shown in the session report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub new_words: u32,
    /// Correct answers so far; drives the review/new mix
    pub words_progressed: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub stats: SessionStats,
}

impl Session {
    pub fn new(minutes: u32) -> Self {
        Self::starting_at(Utc::now(), minutes)
    }

    pub fn starting_at(started_at: DateTime<Utc>, minutes: u32) -> Self {
        Self {
            started_at,
            ends_at: started_at + Duration::minutes(minutes as i64),
            stats: SessionStats::default(),
        }
    }

    pub fn is_over(&self) -> bool {
        self.is_over_at(Utc::now())
    }

    pub fn is_over_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Utc::now())
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.ends_at - now).max(Duration::zero())
    }

    /// Value to pass to `Scheduler::select_next`
    pub fn progress_count(&self) -> u32 {
        self.stats.words_progressed
    }

    /// Count a graded answer. Only right answers move the counters.
    pub fn record_answer(&mut self, mode: PresentationMode, correct: bool) {
        if !correct {
            return;
        }
        match mode {
            PresentationMode::MultipleChoice => {
                self.stats.new_words += 1;
                self.stats.words_progressed += 1;
            }
            PresentationMode::FreeText => self.stats.words_progressed += 1,
            PresentationMode::Introduction => {}
        }
    }
}

/// Summary shown when a session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub new_words: u32,
    pub words_progressed: u32,
    pub mastered: usize,
    pub total: usize,
    pub percent_learned: f64,
}

impl SessionReport {
    pub fn build<S: ProgressStore + ?Sized>(
        store: &S,
        stats: SessionStats,
        mastery_threshold: u32,
    ) -> Result<Self> {
        let total = store.count_words()?;
        let mastered = store.count_mastered(mastery_threshold)?;
        let percent_learned = if total > 0 {
            mastered as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Ok(Self {
            new_words: stats.new_words,
            words_progressed: stats.words_progressed,
            mastered,
            total,
            percent_learned,
        })
    }
}
