//! Answer grading and multiple-choice options

use rand::seq::SliceRandom;
use rand::Rng;

use super::models::Word;

/// Quality score given to a right answer
pub const CORRECT_QUALITY: u8 = 5;

/// Quality score given to a wrong answer
pub const INCORRECT_QUALITY: u8 = 2;

/// Score fed back to the scheduler for one answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub quality: u8,
    pub correct: bool,
}

impl Grade {
    pub fn from_correct(correct: bool) -> Self {
        let quality = if correct { CORRECT_QUALITY } else { INCORRECT_QUALITY };
        Self { quality, correct }
    }
}

/// Typed answers are compared trimmed and case-insensitively
pub fn check_written_answer(expected: &str, given: &str) -> bool {
    given.trim().to_lowercase() == expected.trim().to_lowercase()
}

/// Build shuffled options for a multiple-choice question.
///
/// The correct text is always included. Distractors are distinct source
/// texts from the vocabulary; a small vocabulary yields fewer options.
pub fn generate_choices<R: Rng + ?Sized>(
    correct: &str,
    vocabulary: &[Word],
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut pool: Vec<&str> = vocabulary
        .iter()
        .map(|w| w.source_text.as_str())
        .filter(|s| *s != correct)
        .collect();
    pool.sort_unstable();
    pool.dedup();
    pool.shuffle(rng);

    let mut choices = vec![correct.to_string()];
    choices.extend(
        pool.into_iter()
            .take(count.saturating_sub(1))
            .map(str::to_string),
    );
    choices.shuffle(rng);
    choices
}
