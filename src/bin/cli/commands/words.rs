use anyhow::{Context, Result};

use vocab_lib::vocab::{ProgressStore, StoreError};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let store = app.scheduler.store();
    let threshold = app.config.mastery_threshold;
    let words = store.list_words().context("Failed to list words")?;

    let mut rows = Vec::with_capacity(words.len());
    for word in words {
        let correct = match store.fetch_progress(word.id) {
            Ok(progress) => progress.map(|p| p.correct_answers).unwrap_or(0),
            Err(e @ StoreError::MalformedDate { .. }) => {
                log::warn!("{}", e);
                0
            }
            Err(e) => return Err(e).context("Failed to read progress"),
        };
        rows.push((word, correct));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = rows
                .iter()
                .map(|(word, correct)| {
                    serde_json::json!({
                        "id": word.id,
                        "sourceText": word.source_text,
                        "targetText": word.target_text,
                        "introduced": word.introduced,
                        "correctAnswers": correct,
                        "masteryThreshold": threshold,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if rows.is_empty() {
                println!("No words. Import a vocabulary first.");
                return Ok(());
            }

            println!("{:>5}  {:<24} {:<24} {:>8}", "Id", "Word", "Meaning", "Correct");
            println!("{}", "\u{2500}".repeat(64));
            for (word, correct) in &rows {
                println!(
                    "{:>5}  {:<24} {:<24} {:>8}",
                    word.id,
                    word.source_text,
                    word.target_text,
                    format!("{}/{}", correct, threshold)
                );
            }
        }
    }

    Ok(())
}
