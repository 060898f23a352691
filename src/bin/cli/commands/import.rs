use std::path::Path;

use anyhow::{Context, Result};

use vocab_lib::vocab::import::{import_csv, load_vocabulary_if_needed};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &mut App, file: &Path, if_empty: bool, format: &OutputFormat) -> Result<()> {
    let store = app.scheduler.store_mut();
    let imported = if if_empty {
        load_vocabulary_if_needed(file, store)
    } else {
        import_csv(file, store)
    }
    .with_context(|| format!("Failed to import {:?}", file))?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "imported": imported }))?
            );
        }
        OutputFormat::Plain => {
            if imported == 0 {
                println!("No words imported.");
            } else {
                println!("Imported {} words.", imported);
            }
        }
    }

    Ok(())
}
