//! Persistence boundary consumed by the scheduler
//!
//! Any backend (SQLite file, in-memory map, ...) that implements
//! [`ProgressStore`] can drive a [`Scheduler`](super::Scheduler).
//! Every call is treated as a blocking call that may fail; the
//! scheduler never retries.

use chrono::NaiveDate;
use thiserror::Error;

use super::models::*;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Progress store unavailable: {0}")]
    Unavailable(String),

    #[error("Word not found: {0}")]
    WordNotFound(WordId),

    #[error("Word {word_id} has a {source}")]
    MalformedDate {
        word_id: WordId,
        #[source]
        source: MalformedDate,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage capabilities the scheduler relies on
pub trait ProgressStore {
    // ==================== Selection ====================

    /// Introduced words whose review date is on or before `today`, oldest
    /// first. Records with an unreadable date are logged and skipped.
    fn fetch_due_words(&self, today: NaiveDate) -> Result<Vec<Candidate>>;

    /// One word that has never been introduced, lowest id first
    fn fetch_one_unintroduced_word(&self) -> Result<Option<Candidate>>;

    /// Flag a word as introduced. Calling it twice is harmless.
    fn mark_introduced(&mut self, word_id: WordId) -> Result<()>;

    /// A uniformly random introduced word, ignoring its due date
    fn fetch_any_introduced_word(&self) -> Result<Option<Candidate>>;

    /// A uniformly random word from the whole vocabulary
    fn fetch_any_word_at_all(&self) -> Result<Option<Candidate>>;

    // ==================== Progress ====================

    fn fetch_progress(&self, word_id: WordId) -> Result<Option<ProgressRecord>>;

    /// Create or replace the progress record of a word, all fields at once.
    ///
    /// The word-level correct answer count is refreshed in the same write.
    fn write_progress(&mut self, word_id: WordId, record: &ProgressRecord) -> Result<()>;

    fn append_response_event(&mut self, event: &ResponseEvent) -> Result<()>;

    /// Insert default progress for every word that has none. Returns how
    /// many records were created.
    fn seed_all_progress(&mut self, today: NaiveDate) -> Result<usize>;

    // ==================== Vocabulary ====================

    fn insert_word(&mut self, word: NewWord) -> Result<Word>;

    fn list_words(&self) -> Result<Vec<Word>>;

    fn count_words(&self) -> Result<usize>;

    // ==================== Statistics ====================

    /// Number of progress records with at least `threshold` correct answers
    fn count_mastered(&self, threshold: u32) -> Result<usize>;

    /// Per-day answer counts for a word, ordered by date
    fn response_history(&self, word_id: WordId) -> Result<Vec<HistoryPoint>>;
}
