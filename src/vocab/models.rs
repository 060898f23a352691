//! Data models for the vocabulary scheduler

use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a vocabulary entry (the words table rowid)
pub type WordId = i64;

/// Ease factor every progress record starts from
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Correct answers needed before a word counts as mastered
pub const MASTERY_THRESHOLD: u32 = 5;

/// Interval given to a word the learner marks as already known
pub const KNOWN_INTERVAL_DAYS: u32 = 21;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A vocabulary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: WordId,
    /// Text in the language being learned
    pub source_text: String,
    /// Translation in the learner's language
    pub target_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    /// False until the word has been shown to the learner
    #[serde(default)]
    pub introduced: bool,
}

/// A word that has not been stored yet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewWord {
    pub source_text: String,
    pub target_text: String,
    pub level: Option<String>,
    pub media_ref: Option<String>,
}

impl NewWord {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
            ..Default::default()
        }
    }
}

/// Spaced repetition state of an introduced word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Days until the next scheduled review (always >= 1)
    pub interval: u32,
    /// Consecutive qualifying reviews since the last reset
    pub repetitions: u32,
    /// SM-2 ease factor (never below 1.3)
    pub ease_factor: f64,
    pub next_review_date: NaiveDate,
    /// Consecutive correct answers, reset to zero by a miss
    pub correct_answers: u32,
}

impl ProgressRecord {
    /// Fresh state for a word the learner is starting on today
    pub fn new(today: NaiveDate) -> Self {
        Self {
            interval: 1,
            repetitions: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review_date: today,
            correct_answers: 0,
        }
    }

    /// State for a word the learner already knows
    pub fn known(today: NaiveDate) -> Self {
        Self {
            interval: KNOWN_INTERVAL_DAYS,
            repetitions: 5,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review_date: today + Duration::days(KNOWN_INTERVAL_DAYS as i64),
            correct_answers: MASTERY_THRESHOLD,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }

    pub fn is_mastered(&self, threshold: u32) -> bool {
        self.correct_answers >= threshold
    }
}

/// A single logged answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub word_id: WordId,
    pub date: NaiveDate,
    pub correct: bool,
}

/// Which store query produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    /// Never shown to the learner before
    New,
    /// Previously introduced, offered for review
    Due,
    /// Drawn from the whole vocabulary regardless of status
    Random,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Due => "due",
            Self::Random => "random",
        }
    }
}

/// A word offered to the learner, with the progress known at selection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub kind: CandidateKind,
    pub word: Word,
    /// Authoritative count from the progress record (0 when there is none)
    pub correct_answers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressRecord>,
}

impl Candidate {
    pub fn new(kind: CandidateKind, word: Word, progress: Option<ProgressRecord>) -> Self {
        let correct_answers = progress.as_ref().map_or(0, |p| p.correct_answers);
        Self {
            kind,
            word,
            correct_answers,
            progress,
        }
    }

    pub fn word_id(&self) -> WordId {
        self.word.id
    }
}

/// How a candidate should be put in front of the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationMode {
    /// Show both sides and ask whether the word is already known
    Introduction,
    /// Pick the right translation among several options
    MultipleChoice,
    /// Type the translation
    FreeText,
}

/// Correct and incorrect answers logged for one word on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub correct: u32,
    pub incorrect: u32,
}

/// A review date as found in storage, before normalisation
#[derive(Debug, Clone, PartialEq)]
pub enum StoredDate {
    Text(String),
    Timestamp(i64),
    /// Anything that is neither text nor a number
    Other(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed review date: {value}")]
pub struct MalformedDate {
    pub value: String,
}

impl StoredDate {
    /// Normalise to a calendar date.
    ///
    /// Accepts `YYYY-MM-DD` strings and epoch timestamps in seconds (either
    /// as numbers or as digit strings, since SQLite text affinity turns
    /// integers into text). Timestamps are read in local time.
    pub fn to_date(&self) -> Result<NaiveDate, MalformedDate> {
        match self {
            Self::Text(s) => {
                let s = s.trim();
                if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
                    return Ok(date);
                }
                match s.parse::<i64>() {
                    Ok(secs) => timestamp_to_date(secs).ok_or_else(|| MalformedDate {
                        value: s.to_string(),
                    }),
                    Err(_) => Err(MalformedDate {
                        value: s.to_string(),
                    }),
                }
            }
            Self::Timestamp(secs) => timestamp_to_date(*secs).ok_or_else(|| MalformedDate {
                value: secs.to_string(),
            }),
            Self::Other(kind) => Err(MalformedDate {
                value: format!("<{}>", kind),
            }),
        }
    }
}

fn timestamp_to_date(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Format a date the way it is exchanged with stores
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_progress_defaults() {
        let today = date(2024, 3, 1);
        let record = ProgressRecord::new(today);
        assert_eq!(record.interval, 1);
        assert_eq!(record.repetitions, 0);
        assert_eq!(record.ease_factor, 2.5);
        assert_eq!(record.next_review_date, today);
        assert_eq!(record.correct_answers, 0);
        assert!(record.is_due(today));
    }

    #[test]
    fn test_known_progress() {
        let today = date(2024, 3, 1);
        let record = ProgressRecord::known(today);
        assert_eq!(record.interval, 21);
        assert_eq!(record.repetitions, 5);
        assert_eq!(record.next_review_date, date(2024, 3, 22));
        assert!(record.is_mastered(MASTERY_THRESHOLD));
        assert!(!record.is_due(today));
    }

    #[test]
    fn test_stored_date_iso() {
        let stored = StoredDate::Text("2024-02-29".to_string());
        assert_eq!(stored.to_date().unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_stored_date_timestamp() {
        // Noon UTC stays on the same calendar day in every timezone offset up to +-11h
        let secs = date(2024, 5, 10).and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp();
        assert_eq!(StoredDate::Timestamp(secs).to_date().unwrap(), date(2024, 5, 10));
        assert_eq!(
            StoredDate::Text(secs.to_string()).to_date().unwrap(),
            date(2024, 5, 10)
        );
    }

    #[test]
    fn test_stored_date_malformed() {
        assert!(StoredDate::Text("next tuesday".to_string()).to_date().is_err());
        assert!(StoredDate::Text("2024-13-01".to_string()).to_date().is_err());
        assert!(StoredDate::Other("null").to_date().is_err());
    }

    #[test]
    fn test_candidate_reports_progress_count() {
        let word = Word {
            id: 7,
            source_text: "gato".to_string(),
            target_text: "cat".to_string(),
            level: None,
            media_ref: None,
            introduced: true,
        };
        let mut progress = ProgressRecord::new(date(2024, 1, 1));
        progress.correct_answers = 3;

        let candidate = Candidate::new(CandidateKind::Due, word.clone(), Some(progress));
        assert_eq!(candidate.correct_answers, 3);
        assert_eq!(candidate.word_id(), 7);

        let bare = Candidate::new(CandidateKind::Random, word, None);
        assert_eq!(bare.correct_answers, 0);
    }
}
