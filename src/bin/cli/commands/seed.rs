use anyhow::{Context, Result};

use vocab_lib::vocab::ProgressStore;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, format: &OutputFormat) -> Result<()> {
    let today = app.scheduler.today();
    let seeded = app
        .scheduler
        .store_mut()
        .seed_all_progress(today)
        .context("Failed to seed progress")?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "seeded": seeded }))?
            );
        }
        OutputFormat::Plain => println!("Seeded progress for {} words.", seeded),
    }

    Ok(())
}
