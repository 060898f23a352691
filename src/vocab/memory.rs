//! In-memory progress store
//!
//! Keeps everything in ordered maps. Useful for tests and for hosts
//! that persist the vocabulary some other way.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::seq::IteratorRandom;

use super::models::*;
use super::store::{ProgressStore, Result, StoreError};

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    words: BTreeMap<WordId, Word>,
    progress: BTreeMap<WordId, ProgressRecord>,
    responses: Vec<ResponseEvent>,
    next_id: WordId,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every logged answer, oldest first
    pub fn responses(&self) -> &[ResponseEvent] {
        &self.responses
    }

    pub fn word(&self, word_id: WordId) -> Option<&Word> {
        self.words.get(&word_id)
    }

    fn candidate(&self, kind: CandidateKind, word: &Word) -> Candidate {
        Candidate::new(kind, word.clone(), self.progress.get(&word.id).cloned())
    }
}

impl ProgressStore for MemoryProgressStore {
    fn fetch_due_words(&self, today: NaiveDate) -> Result<Vec<Candidate>> {
        let mut due: Vec<Candidate> = self
            .words
            .values()
            .filter(|w| w.introduced)
            .filter(|w| self.progress.get(&w.id).is_some_and(|p| p.is_due(today)))
            .map(|w| self.candidate(CandidateKind::Due, w))
            .collect();

        due.sort_by_key(|c| c.progress.as_ref().map(|p| p.next_review_date));
        Ok(due)
    }

    fn fetch_one_unintroduced_word(&self) -> Result<Option<Candidate>> {
        Ok(self
            .words
            .values()
            .find(|w| !w.introduced)
            .map(|w| self.candidate(CandidateKind::New, w)))
    }

    fn mark_introduced(&mut self, word_id: WordId) -> Result<()> {
        let word = self
            .words
            .get_mut(&word_id)
            .ok_or(StoreError::WordNotFound(word_id))?;
        word.introduced = true;
        Ok(())
    }

    fn fetch_any_introduced_word(&self) -> Result<Option<Candidate>> {
        let mut rng = rand::thread_rng();
        Ok(self
            .words
            .values()
            .filter(|w| w.introduced)
            .choose(&mut rng)
            .map(|w| self.candidate(CandidateKind::Due, w)))
    }

    fn fetch_any_word_at_all(&self) -> Result<Option<Candidate>> {
        let mut rng = rand::thread_rng();
        Ok(self
            .words
            .values()
            .choose(&mut rng)
            .map(|w| self.candidate(CandidateKind::Random, w)))
    }

    fn fetch_progress(&self, word_id: WordId) -> Result<Option<ProgressRecord>> {
        Ok(self.progress.get(&word_id).cloned())
    }

    fn write_progress(&mut self, word_id: WordId, record: &ProgressRecord) -> Result<()> {
        if !self.words.contains_key(&word_id) {
            return Err(StoreError::WordNotFound(word_id));
        }
        self.progress.insert(word_id, record.clone());
        Ok(())
    }

    fn append_response_event(&mut self, event: &ResponseEvent) -> Result<()> {
        self.responses.push(event.clone());
        Ok(())
    }

    fn seed_all_progress(&mut self, today: NaiveDate) -> Result<usize> {
        let mut inserted = 0;
        for id in self.words.keys() {
            if !self.progress.contains_key(id) {
                self.progress.insert(*id, ProgressRecord::new(today));
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn insert_word(&mut self, word: NewWord) -> Result<Word> {
        self.next_id += 1;
        let word = Word {
            id: self.next_id,
            source_text: word.source_text,
            target_text: word.target_text,
            level: word.level,
            media_ref: word.media_ref,
            introduced: false,
        };
        self.words.insert(word.id, word.clone());
        Ok(word)
    }

    fn list_words(&self) -> Result<Vec<Word>> {
        Ok(self.words.values().cloned().collect())
    }

    fn count_words(&self) -> Result<usize> {
        Ok(self.words.len())
    }

    fn count_mastered(&self, threshold: u32) -> Result<usize> {
        Ok(self
            .progress
            .values()
            .filter(|p| p.is_mastered(threshold))
            .count())
    }

    fn response_history(&self, word_id: WordId) -> Result<Vec<HistoryPoint>> {
        let mut by_day: BTreeMap<NaiveDate, HistoryPoint> = BTreeMap::new();
        for event in self.responses.iter().filter(|e| e.word_id == word_id) {
            let point = by_day.entry(event.date).or_insert(HistoryPoint {
                date: event.date,
                correct: 0,
                incorrect: 0,
            });
            if event.correct {
                point.correct += 1;
            } else {
                point.incorrect += 1;
            }
        }
        Ok(by_day.into_values().collect())
    }
}
