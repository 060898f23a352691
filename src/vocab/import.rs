//! Vocabulary import from CSV
//!
//! Expected headers: `spanish`, `english`, and optionally `level` and
//! `image_path`. Extra columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use super::models::NewWord;
use super::store::{ProgressStore, StoreError};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ImportError>;

const SOURCE_COLUMN: &str = "spanish";
const TARGET_COLUMN: &str = "english";
const LEVEL_COLUMN: &str = "level";
const MEDIA_COLUMN: &str = "image_path";

/// Import every row of a CSV file. Returns the number of words added.
pub fn import_csv<S: ProgressStore + ?Sized>(path: &Path, store: &mut S) -> Result<usize> {
    let file = File::open(path)?;
    let count = import_reader(file, store)?;
    log::info!("Imported {} words from {:?}", count, path);
    Ok(count)
}

/// Import from any CSV source
pub fn import_reader<R: Read, S: ProgressStore + ?Sized>(reader: R, store: &mut S) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let source_col = column(SOURCE_COLUMN).ok_or(ImportError::MissingColumn(SOURCE_COLUMN))?;
    let target_col = column(TARGET_COLUMN).ok_or(ImportError::MissingColumn(TARGET_COLUMN))?;
    let level_col = column(LEVEL_COLUMN);
    let media_col = column(MEDIA_COLUMN);

    let mut count = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let (Some(source_text), Some(target_text)) = (field(Some(source_col)), field(Some(target_col)))
        else {
            log::warn!("Skipping CSV row {}: missing word or translation", line + 2);
            continue;
        };

        store.insert_word(NewWord {
            source_text,
            target_text,
            level: field(level_col),
            media_ref: field(media_col),
        })?;
        count += 1;
    }

    Ok(count)
}

/// Import the file only when the store has no words yet.
///
/// A missing file is logged and treated as nothing to import.
pub fn load_vocabulary_if_needed<S: ProgressStore + ?Sized>(
    path: &Path,
    store: &mut S,
) -> Result<usize> {
    if store.count_words()? > 0 {
        return Ok(0);
    }
    if !path.exists() {
        log::warn!("Vocabulary file {:?} not found", path);
        return Ok(0);
    }
    import_csv(path, store)
}
