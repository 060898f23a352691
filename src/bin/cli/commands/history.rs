use anyhow::{Context, Result};

use vocab_lib::vocab::algorithm::format_interval;
use vocab_lib::vocab::{ProgressStore, WordId};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, word_id: WordId, format: &OutputFormat) -> Result<()> {
    let store = app.scheduler.store();
    let history = store
        .response_history(word_id)
        .context("Failed to read response history")?;
    let progress = store
        .fetch_progress(word_id)
        .context("Failed to read progress")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "wordId": word_id,
                "progress": progress,
                "history": history,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if let Some(p) = &progress {
                println!(
                    "Interval {} | ease {:.2} | {} correct in a row | next review {}",
                    format_interval(p.interval),
                    p.ease_factor,
                    p.correct_answers,
                    p.next_review_date
                );
            }

            if history.is_empty() {
                println!("No answers recorded for word {}.", word_id);
                return Ok(());
            }

            println!("{:<12} {:>8} {:>10}", "Date", "Correct", "Incorrect");
            println!("{}", "\u{2500}".repeat(32));

            let (mut correct, mut incorrect) = (0, 0);
            for point in &history {
                correct += point.correct;
                incorrect += point.incorrect;
                println!("{:<12} {:>8} {:>10}", point.date.to_string(), correct, incorrect);
            }
        }
    }

    Ok(())
}
