use anyhow::{Context, Result};

use vocab_lib::vocab::session::{SessionReport, SessionStats};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let report = SessionReport::build(
        app.scheduler.store(),
        SessionStats::default(),
        app.config.mastery_threshold,
    )
    .context("Failed to read progress")?;
    let due = app.scheduler.due_words().context("Failed to list due words")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "total": report.total,
                "mastered": report.mastered,
                "percentLearned": report.percent_learned,
                "dueToday": due.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Words:          {}", report.total);
            println!("Mastered:       {}/{}", report.mastered, report.total);
            println!("Level learned:  {:.2}%", report.percent_learned);
            println!("Due for review: {}", due.len());
        }
    }

    Ok(())
}
