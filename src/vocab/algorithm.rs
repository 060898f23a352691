//! SM-2 Spaced Repetition Algorithm
//!
//! Variant of the SuperMemo 2 algorithm used to evolve a word's
//! progress record after every answer, plus the small policies that
//! decide how words are put in front of the learner.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation

use chrono::{Duration, NaiveDate};

use super::models::{Candidate, CandidateKind, PresentationMode, ProgressRecord};

/// Minimum ease factor allowed
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Lowest quality that counts as a successful recall
pub const PASSING_QUALITY: u8 = 3;

/// Longest interval a word can reach (about a hundred years)
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Correct answers after which recall switches to typed answers
pub const FREE_TEXT_THRESHOLD: u32 = 4;

/// Calculate the next progress state after an answer
///
/// # Arguments
/// * `record` - Current progress record
/// * `quality` - Quality rating (0-5), clamped into range
/// * `correct` - Whether the answer was right; drives `correct_answers`
/// * `today` - Date the answer was given
pub fn calculate_next_review(
    record: &ProgressRecord,
    quality: u8,
    correct: bool,
    today: NaiveDate,
) -> ProgressRecord {
    let quality = quality.min(5);

    // A miss wipes out mastery progress
    let correct_answers = if correct { record.correct_answers + 1 } else { 0 };

    let (repetitions, interval) = if quality < PASSING_QUALITY {
        (0, 1)
    } else {
        let repetitions = record.repetitions + 1;
        let interval = match repetitions {
            1 => 1,
            2 => 6,
            // Truncated toward zero
            _ => (record.interval as f64 * record.ease_factor) as u32,
        };
        (repetitions, interval.clamp(1, MAX_INTERVAL_DAYS))
    };

    // EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
    let ease_factor = (record.ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR);

    ProgressRecord {
        interval,
        repetitions,
        ease_factor,
        next_review_date: add_days(today, interval),
        correct_answers,
    }
}

/// `date + days`, saturating at the last representable date
pub fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_signed(Duration::days(days as i64))
        .unwrap_or(NaiveDate::MAX)
}

/// Change applied to the ease factor for a given quality
pub fn ease_delta(quality: u8) -> f64 {
    let miss = (5 - quality.min(5)) as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Probability of drawing a review word instead of the next new word.
///
/// Starts at 1.0 and decays as more words are progressed in a session.
pub fn review_chance(session_progress_count: u32) -> f64 {
    1.0 / (session_progress_count as f64 * 0.025 + 1.0)
}

/// Decide how a candidate is presented, escalating with mastery
pub fn presentation_mode(candidate: &Candidate) -> PresentationMode {
    if candidate.kind == CandidateKind::New || !candidate.word.introduced {
        PresentationMode::Introduction
    } else if candidate.correct_answers < FREE_TEXT_THRESHOLD {
        PresentationMode::MultipleChoice
    } else {
        PresentationMode::FreeText
    }
}

/// Format an interval in days to a human-readable string
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::models::Word;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn fresh() -> ProgressRecord {
        ProgressRecord::new(today())
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_first_review_correct() {
        let result = calculate_next_review(&fresh(), 5, true, today());

        assert_eq!(result.repetitions, 1);
        assert_eq!(result.interval, 1);
        assert_eq!(result.correct_answers, 1);
        assert_close(result.ease_factor, 2.6);
        assert_eq!(result.next_review_date, today() + Duration::days(1));
    }

    #[test]
    fn test_second_review_correct() {
        let mut record = fresh();
        record.repetitions = 1;
        record.ease_factor = 2.6;
        record.correct_answers = 1;

        let result = calculate_next_review(&record, 5, true, today());

        assert_eq!(result.repetitions, 2);
        assert_eq!(result.interval, 6);
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.next_review_date, today() + Duration::days(6));
    }

    #[test]
    fn test_subsequent_review_truncates() {
        let mut record = fresh();
        record.repetitions = 2;
        record.interval = 6;
        record.ease_factor = 2.7;

        let result = calculate_next_review(&record, 5, true, today());

        // 6 * 2.7 = 16.2
        assert_eq!(result.repetitions, 3);
        assert_eq!(result.interval, 16);
    }

    #[test]
    fn test_failed_review_resets() {
        let mut record = fresh();
        record.repetitions = 2;
        record.interval = 6;
        record.ease_factor = 2.7;
        record.correct_answers = 2;

        let result = calculate_next_review(&record, 2, false, today());

        assert_eq!(result.repetitions, 0);
        assert_eq!(result.interval, 1);
        assert_eq!(result.correct_answers, 0);
        // 2.7 + (0.1 - 3 * 0.14)
        assert_close(result.ease_factor, 2.38);
    }

    #[test]
    fn test_correct_flag_independent_of_quality() {
        let mut record = fresh();
        record.correct_answers = 3;

        let result = calculate_next_review(&record, 1, true, today());
        assert_eq!(result.correct_answers, 4);
        assert_eq!(result.repetitions, 0);

        let result = calculate_next_review(&record, 4, false, today());
        assert_eq!(result.correct_answers, 0);
        assert_eq!(result.repetitions, 1);
    }

    #[test]
    fn test_ease_factor_minimum() {
        let mut record = fresh();
        record.ease_factor = 1.4;

        for quality in 0..=5 {
            let result = calculate_next_review(&record, quality, quality >= 3, today());
            assert!(result.ease_factor >= MIN_EASE_FACTOR);
            assert!(result.interval >= 1);
        }

        let mut state = record.clone();
        for _ in 0..20 {
            state = calculate_next_review(&state, 0, false, today());
            assert!(state.ease_factor >= MIN_EASE_FACTOR);
        }
        assert_close(state.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_interval_never_zero() {
        let mut record = fresh();
        record.repetitions = 4;
        record.interval = 0;
        record.ease_factor = MIN_EASE_FACTOR;

        let result = calculate_next_review(&record, 3, true, today());
        assert_eq!(result.interval, 1);
    }

    #[test]
    fn test_long_correct_streak_caps_interval() {
        let mut record = fresh();
        for _ in 0..50 {
            record = calculate_next_review(&record, 5, true, today());
            assert!(record.interval >= 1 && record.interval <= MAX_INTERVAL_DAYS);
        }
        assert_eq!(record.interval, MAX_INTERVAL_DAYS);
        assert_eq!(record.correct_answers, 50);
        assert_eq!(
            record.next_review_date,
            today() + Duration::days(MAX_INTERVAL_DAYS as i64)
        );
    }

    #[test]
    fn test_add_days_saturates() {
        assert_eq!(add_days(today(), 6), today() + Duration::days(6));
        assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn test_quality_clamped() {
        let result = calculate_next_review(&fresh(), 9, true, today());
        assert_close(result.ease_factor, 2.6);
    }

    #[test]
    fn test_review_chance_decays() {
        assert_close(review_chance(0), 1.0);
        assert_close(review_chance(40), 0.5);
        assert!(review_chance(10) > review_chance(11));
        assert!(review_chance(10_000) > 0.0);
    }

    #[test]
    fn test_presentation_tiers() {
        let word = Word {
            id: 1,
            source_text: "perro".to_string(),
            target_text: "dog".to_string(),
            level: None,
            media_ref: None,
            introduced: true,
        };
        let mut candidate = Candidate::new(CandidateKind::Due, word, None);
        assert_eq!(presentation_mode(&candidate), PresentationMode::MultipleChoice);

        candidate.correct_answers = 3;
        assert_eq!(presentation_mode(&candidate), PresentationMode::MultipleChoice);

        candidate.correct_answers = 4;
        assert_eq!(presentation_mode(&candidate), PresentationMode::FreeText);

        candidate.kind = CandidateKind::New;
        assert_eq!(presentation_mode(&candidate), PresentationMode::Introduction);

        candidate.kind = CandidateKind::Random;
        candidate.word.introduced = false;
        assert_eq!(presentation_mode(&candidate), PresentationMode::Introduction);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(6), "6d");
        assert_eq!(format_interval(21), "3w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
    }
}
