//! Word selection and progress updates
//!
//! The scheduler owns its store and asks it for candidates in a fixed
//! priority order:
//! 1. With probability [`SelectionPolicy::review_chance`], any introduced word
//! 2. Otherwise the next unintroduced word, falling back to any introduced word
//! 3. If the chosen path found nothing, the other path
//! 4. Any word at all
//!
//! The selected [`Candidate`] is handed to the host, which threads its
//! word id back into [`Scheduler::record_response`]. No "current word"
//! is kept between calls.

use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::algorithm::{self, calculate_next_review};
use super::models::*;
use super::store::{ProgressStore, StoreError};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("No progress recorded for word {0}")]
    ProgressNotFound(WordId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Source of "today" for due dates
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Mix between review practice and new material
pub trait SelectionPolicy {
    /// Probability in [0, 1] of drawing a review word, given how many
    /// words have been progressed so far in the session
    fn review_chance(&self, session_progress_count: u32) -> f64;
}

/// Review-heavy at the start of a session, shifting toward new words
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBias;

impl SelectionPolicy for SessionBias {
    fn review_chance(&self, session_progress_count: u32) -> f64 {
        algorithm::review_chance(session_progress_count)
    }
}

pub struct Scheduler<S: ProgressStore> {
    store: S,
    clock: Box<dyn Clock>,
    policy: Box<dyn SelectionPolicy>,
    rng: StdRng,
}

impl<S: ProgressStore> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            policy: Box::new(SessionBias),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_policy(mut self, policy: impl SelectionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ==================== Selection ====================

    /// Pick the next word to show.
    ///
    /// Returns `Ok(None)` when no usable word is left (empty vocabulary, or
    /// only records the store had to skip). A word taken from the
    /// unintroduced pool is marked introduced before returning.
    pub fn select_next(&mut self, session_progress_count: u32) -> Result<Option<Candidate>> {
        let chance = self.policy.review_chance(session_progress_count);
        let roll: f64 = self.rng.gen();

        let candidate = if roll < chance {
            log::debug!("Review draw ({:.3} < {:.3})", roll, chance);
            match self.review_candidate()? {
                Some(c) => Some(c),
                None => self.next_word_candidate()?,
            }
        } else {
            log::debug!("New word draw ({:.3} >= {:.3})", roll, chance);
            self.next_word_candidate()?
        };

        if candidate.is_some() {
            return Ok(candidate);
        }

        match self.store.fetch_any_word_at_all()? {
            Some(mut c) => {
                if !c.word.introduced {
                    // Shown for the first time: present it as a new word
                    self.store.mark_introduced(c.word_id())?;
                    c.word.introduced = true;
                    c.kind = CandidateKind::New;
                }
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    /// Any introduced word, regardless of due date
    fn review_candidate(&self) -> Result<Option<Candidate>> {
        Ok(self.store.fetch_any_introduced_word()?)
    }

    /// A fresh word if one is left, otherwise a review word
    fn next_word_candidate(&mut self) -> Result<Option<Candidate>> {
        if let Some(mut candidate) = self.store.fetch_one_unintroduced_word()? {
            self.store.mark_introduced(candidate.word_id())?;
            candidate.word.introduced = true;
            log::debug!("Introducing word {}", candidate.word_id());
            return Ok(Some(candidate));
        }
        self.review_candidate()
    }

    /// Introduced words due today or earlier
    pub fn due_words(&self) -> Result<Vec<Candidate>> {
        Ok(self.store.fetch_due_words(self.today())?)
    }

    pub fn presentation_mode(&self, candidate: &Candidate) -> PresentationMode {
        algorithm::presentation_mode(candidate)
    }

    // ==================== Progress ====================

    /// Apply an answer to a word's progress and log it.
    ///
    /// The word must already have a progress record (see
    /// [`mark_unknown`](Self::mark_unknown) and
    /// [`mark_known_outright`](Self::mark_known_outright)).
    pub fn record_response(
        &mut self,
        word_id: WordId,
        quality: u8,
        was_correct: bool,
    ) -> Result<ProgressRecord> {
        let today = self.today();
        let current = self
            .store
            .fetch_progress(word_id)?
            .ok_or(SchedulerError::ProgressNotFound(word_id))?;

        let updated = calculate_next_review(&current, quality, was_correct, today);
        self.store.write_progress(word_id, &updated)?;
        self.store.append_response_event(&ResponseEvent {
            word_id,
            date: today,
            correct: was_correct,
        })?;

        log::debug!(
            "Word {}: quality {}, interval {} -> {}, ease {:.2}",
            word_id,
            quality,
            current.interval,
            updated.interval,
            updated.ease_factor
        );
        Ok(updated)
    }

    /// Learner already knows the word: skip straight to a three week interval
    pub fn mark_known_outright(&mut self, word_id: WordId) -> Result<ProgressRecord> {
        let record = ProgressRecord::known(self.today());
        self.seed(word_id, record)
    }

    /// Learner does not know the word yet: start it from scratch today
    pub fn mark_unknown(&mut self, word_id: WordId) -> Result<ProgressRecord> {
        let record = ProgressRecord::new(self.today());
        self.seed(word_id, record)
    }

    fn seed(&mut self, word_id: WordId, record: ProgressRecord) -> Result<ProgressRecord> {
        self.store.mark_introduced(word_id)?;
        self.store.write_progress(word_id, &record)?;
        log::info!(
            "Word {} scheduled for {}",
            word_id,
            format_date(record.next_review_date)
        );
        Ok(record)
    }
}
