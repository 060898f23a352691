use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use vocab_lib::vocab::algorithm::format_interval;
use vocab_lib::vocab::quiz::{check_written_answer, generate_choices, Grade};
use vocab_lib::vocab::session::{Session, SessionReport};
use vocab_lib::vocab::{Candidate, PresentationMode, ProgressStore, StoreError};

use crate::app::App;

/// What the learner typed at a prompt
enum Reply {
    Answer(String),
    Quit,
}

fn prompt(input: &mut impl BufRead, text: &str) -> Result<Reply> {
    print!("{} ", text);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Reply::Quit);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(Reply::Quit);
    }
    Ok(Reply::Answer(line.to_string()))
}

pub fn run(app: &mut App, minutes: Option<u32>) -> Result<()> {
    let minutes = minutes.unwrap_or(app.config.session_minutes);
    let mut session = Session::new(minutes);
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Practice for {} minutes. Type q to stop.\n", minutes);

    while !session.is_over() {
        let Some(candidate) = app
            .scheduler
            .select_next(session.progress_count())
            .context("Failed to select the next word")?
        else {
            println!("No words to practice. Import a vocabulary first.");
            break;
        };

        let mode = app.scheduler.presentation_mode(&candidate);
        log::debug!(
            "Selected word {} ({})",
            candidate.word_id(),
            candidate.kind.as_str()
        );
        let keep_going = match mode {
            PresentationMode::Introduction => introduce(app, &candidate, &mut input)?,
            PresentationMode::MultipleChoice | PresentationMode::FreeText => {
                quiz(app, &mut session, &candidate, mode, &mut input)?
            }
        };
        if !keep_going {
            break;
        }

        let remaining = session.remaining();
        if remaining.num_seconds() <= 60 {
            println!("[{} seconds left]", remaining.num_seconds());
        }
        println!();
    }

    let report = SessionReport::build(
        app.scheduler.store(),
        session.stats,
        app.config.mastery_threshold,
    )
    .context("Failed to build session report")?;

    println!("Session report");
    println!("  New words learned:    {}", report.new_words);
    println!("  Words progressed:     {}", report.words_progressed);
    println!("  Total words mastered: {}/{}", report.mastered, report.total);
    println!("  Current level learned: {:.2}%", report.percent_learned);

    Ok(())
}

fn introduce(app: &mut App, candidate: &Candidate, input: &mut impl BufRead) -> Result<bool> {
    let word = &candidate.word;
    println!("New word: {} - {}", word.source_text, word.target_text);

    loop {
        let reply = prompt(&mut *input, "Do you already know it? [y/n]")?;
        let Reply::Answer(answer) = reply else {
            return Ok(false);
        };
        match answer.to_lowercase().as_str() {
            "y" | "yes" => {
                let record = app.scheduler.mark_known_outright(word.id)?;
                println!(
                    "Great! '{}' marked as known. Next review in {}.",
                    word.source_text,
                    format_interval(record.interval)
                );
                return Ok(true);
            }
            "n" | "no" => {
                app.scheduler.mark_unknown(word.id)?;
                println!("'{}' added to your learning queue.", word.source_text);
                return Ok(true);
            }
            _ => continue,
        }
    }
}

fn quiz(
    app: &mut App,
    session: &mut Session,
    candidate: &Candidate,
    mode: PresentationMode,
    input: &mut impl BufRead,
) -> Result<bool> {
    let word = &candidate.word;

    // Introduced in an earlier session that ended before the learner answered,
    // or left with a record whose date can no longer be read
    if candidate.progress.is_none() {
        match app.scheduler.store().fetch_progress(word.id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                app.scheduler.mark_unknown(word.id)?;
            }
            Err(e @ StoreError::MalformedDate { .. }) => {
                log::warn!("Resetting progress for word {}: {}", word.id, e);
                app.scheduler.mark_unknown(word.id)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    let correct = if mode == PresentationMode::MultipleChoice {
        let vocabulary = app.scheduler.store().list_words()?;
        let choices = generate_choices(
            &word.source_text,
            &vocabulary,
            app.config.choice_count,
            &mut rand::thread_rng(),
        );

        println!("Select the correct Spanish translation of: {}", word.target_text);
        for (i, choice) in choices.iter().enumerate() {
            println!("  {}) {}", i + 1, choice);
        }

        let Reply::Answer(answer) = prompt(&mut *input, "Your choice:")? else {
            return Ok(false);
        };
        answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| choices.get(i))
            .is_some_and(|choice| *choice == word.source_text)
    } else {
        println!("Translate to Spanish: {}", word.target_text);
        let Reply::Answer(answer) = prompt(&mut *input, ">")? else {
            return Ok(false);
        };
        check_written_answer(&word.source_text, &answer)
    };

    if correct {
        println!("Correct!");
    } else {
        println!("Incorrect. The correct answer is: {}", word.source_text);
    }

    let grade = Grade::from_correct(correct);
    let record = app
        .scheduler
        .record_response(word.id, grade.quality, grade.correct)
        .context("Failed to save progress")?;
    session.record_answer(mode, correct);
    log::debug!("Next review of word {} in {}", word.id, format_interval(record.interval));

    Ok(true)
}
