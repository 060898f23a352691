//! SQLite-backed progress store
//!
//! Three tables: `words` (the vocabulary), `progress` (one row per
//! introduced word) and `response_history` (append-only answer log).
//! Dates are stored as `YYYY-MM-DD` text.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::*;
use super::store::{ProgressStore, Result, StoreError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_text TEXT NOT NULL,
        target_text TEXT NOT NULL,
        level TEXT,
        media_ref TEXT,
        introduced INTEGER NOT NULL DEFAULT 0,
        -- Projection of progress.correct_answers, kept for display
        correct_answers INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS progress (
        word_id INTEGER PRIMARY KEY,
        interval INTEGER NOT NULL,
        repetitions INTEGER NOT NULL,
        ease_factor REAL NOT NULL,
        next_review_date TEXT,
        correct_answers INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (word_id) REFERENCES words(id)
    );

    CREATE TABLE IF NOT EXISTS response_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word_id INTEGER NOT NULL,
        response_date TEXT NOT NULL,
        correct INTEGER NOT NULL,
        FOREIGN KEY (word_id) REFERENCES words(id)
    );

    CREATE INDEX IF NOT EXISTS idx_words_introduced ON words(introduced);
    CREATE INDEX IF NOT EXISTS idx_response_history_word_id ON response_history(word_id);
"#;

const CANDIDATE_COLUMNS: &str = "w.id, w.source_text, w.target_text, w.level, w.media_ref, \
     w.introduced, p.interval, p.repetitions, p.ease_factor, p.next_review_date, p.correct_answers";

/// Progress row as read, before its date has been validated
struct RawProgress {
    interval: u32,
    repetitions: u32,
    ease_factor: f64,
    next_review_date: StoredDate,
    correct_answers: u32,
}

impl RawProgress {
    fn from_row(row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            interval: row.get(offset)?,
            repetitions: row.get(offset + 1)?,
            ease_factor: row.get(offset + 2)?,
            next_review_date: stored_date(row.get(offset + 3)?),
            correct_answers: row.get(offset + 4)?,
        })
    }

    fn resolve(self, word_id: WordId) -> Result<ProgressRecord> {
        let next_review_date = self
            .next_review_date
            .to_date()
            .map_err(|source| StoreError::MalformedDate { word_id, source })?;

        Ok(ProgressRecord {
            interval: self.interval.max(1),
            repetitions: self.repetitions,
            ease_factor: self.ease_factor,
            next_review_date,
            correct_answers: self.correct_answers,
        })
    }
}

struct CandidateRow {
    word: Word,
    progress: Option<RawProgress>,
}

fn read_word(row: &Row) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        source_text: row.get(1)?,
        target_text: row.get(2)?,
        level: row.get(3)?,
        media_ref: row.get(4)?,
        introduced: row.get(5)?,
    })
}

fn read_candidate_row(row: &Row) -> rusqlite::Result<CandidateRow> {
    let word = read_word(row)?;
    let interval: Option<u32> = row.get(6)?;
    let progress = match interval {
        Some(_) => Some(RawProgress::from_row(row, 6)?),
        None => None,
    };
    Ok(CandidateRow { word, progress })
}

fn stored_date(value: Value) -> StoredDate {
    match value {
        Value::Text(s) => StoredDate::Text(s),
        Value::Integer(i) => StoredDate::Timestamp(i),
        Value::Real(f) => StoredDate::Timestamp(f as i64),
        Value::Null => StoredDate::Other("null"),
        Value::Blob(_) => StoredDate::Other("blob"),
    }
}

/// Build a candidate, or `None` (with a warning) when its progress has an
/// unreadable date
fn usable_candidate(kind: CandidateKind, row: CandidateRow) -> Option<Candidate> {
    let Some(raw) = row.progress else {
        return Some(Candidate::new(kind, row.word, None));
    };
    match raw.resolve(row.word.id) {
        Ok(progress) => Some(Candidate::new(kind, row.word, Some(progress))),
        Err(e) => {
            log::warn!("Skipping word {} as a candidate: {}", row.word.id, e);
            None
        }
    }
}

/// Progress store on a single SQLite database
pub struct SqliteProgressStore {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqliteProgressStore {
    /// Open (or create) the database at the given path
    pub fn open(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        Self::init(conn, Some(db_path))
    }

    /// Open a throwaway database that lives only as long as the store
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, db_path })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run a statement bound to one word id, for tests that corrupt rows
    #[cfg(test)]
    pub(crate) fn raw_execute(&self, sql: &str, word_id: WordId) -> rusqlite::Result<usize> {
        self.conn.execute(sql, params![word_id])
    }

    fn fetch_candidate(&self, filter: &str, kind: CandidateKind) -> Result<Option<Candidate>> {
        let sql = format!(
            "SELECT {} FROM words w LEFT JOIN progress p ON w.id = p.word_id {}",
            CANDIDATE_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_candidate_row)?;

        // Rows are read lazily, so this stops at the first usable one
        for row in rows {
            if let Some(candidate) = usable_candidate(kind, row?) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl ProgressStore for SqliteProgressStore {
    fn fetch_due_words(&self, today: NaiveDate) -> Result<Vec<Candidate>> {
        let sql = format!(
            "SELECT {} FROM words w JOIN progress p ON w.id = p.word_id \
             WHERE w.introduced = 1 ORDER BY w.id",
            CANDIDATE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_candidate_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut due = Vec::new();
        for row in rows {
            let Some(raw) = row.progress else { continue };
            match raw.resolve(row.word.id) {
                Ok(progress) if progress.is_due(today) => {
                    due.push(Candidate::new(CandidateKind::Due, row.word, Some(progress)));
                }
                Ok(_) => {}
                Err(e) => log::warn!("Skipping word {} in due scan: {}", row.word.id, e),
            }
        }

        // Oldest review date first, ties by id
        due.sort_by_key(|c| c.progress.as_ref().map(|p| p.next_review_date));
        Ok(due)
    }

    fn fetch_one_unintroduced_word(&self) -> Result<Option<Candidate>> {
        self.fetch_candidate("WHERE w.introduced = 0 ORDER BY w.id", CandidateKind::New)
    }

    fn mark_introduced(&mut self, word_id: WordId) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE words SET introduced = 1 WHERE id = ?1",
            params![word_id],
        )?;
        if updated == 0 {
            return Err(StoreError::WordNotFound(word_id));
        }
        Ok(())
    }

    fn fetch_any_introduced_word(&self) -> Result<Option<Candidate>> {
        self.fetch_candidate(
            "WHERE w.introduced = 1 ORDER BY RANDOM()",
            CandidateKind::Due,
        )
    }

    fn fetch_any_word_at_all(&self) -> Result<Option<Candidate>> {
        self.fetch_candidate("ORDER BY RANDOM()", CandidateKind::Random)
    }

    fn fetch_progress(&self, word_id: WordId) -> Result<Option<ProgressRecord>> {
        let raw = self
            .conn
            .query_row(
                "SELECT interval, repetitions, ease_factor, next_review_date, correct_answers
                 FROM progress WHERE word_id = ?1",
                params![word_id],
                |row| RawProgress::from_row(row, 0),
            )
            .optional()?;

        raw.map(|raw| raw.resolve(word_id)).transpose()
    }

    fn write_progress(&mut self, word_id: WordId, record: &ProgressRecord) -> Result<()> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE words SET correct_answers = ?1 WHERE id = ?2",
            params![record.correct_answers, word_id],
        )?;
        if updated == 0 {
            return Err(StoreError::WordNotFound(word_id));
        }

        tx.execute(
            "INSERT OR REPLACE INTO progress (
                word_id, interval, repetitions, ease_factor, next_review_date, correct_answers
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                word_id,
                record.interval,
                record.repetitions,
                record.ease_factor,
                format_date(record.next_review_date),
                record.correct_answers,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn append_response_event(&mut self, event: &ResponseEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO response_history (word_id, response_date, correct) VALUES (?1, ?2, ?3)",
            params![event.word_id, format_date(event.date), event.correct],
        )?;
        Ok(())
    }

    fn seed_all_progress(&mut self, today: NaiveDate) -> Result<usize> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO progress (
                word_id, interval, repetitions, ease_factor, next_review_date, correct_answers
            ) SELECT id, 1, 0, ?1, ?2, 0 FROM words",
            params![DEFAULT_EASE_FACTOR, format_date(today)],
        )?;
        Ok(inserted)
    }

    fn insert_word(&mut self, word: NewWord) -> Result<Word> {
        self.conn.execute(
            "INSERT INTO words (source_text, target_text, level, media_ref) VALUES (?1, ?2, ?3, ?4)",
            params![word.source_text, word.target_text, word.level, word.media_ref],
        )?;

        Ok(Word {
            id: self.conn.last_insert_rowid(),
            source_text: word.source_text,
            target_text: word.target_text,
            level: word.level,
            media_ref: word.media_ref,
            introduced: false,
        })
    }

    fn list_words(&self) -> Result<Vec<Word>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_text, target_text, level, media_ref, introduced
             FROM words ORDER BY id",
        )?;
        let words = stmt
            .query_map([], read_word)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(words)
    }

    fn count_words(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM words", [])
    }

    fn count_mastered(&self, threshold: u32) -> Result<usize> {
        self.count(
            "SELECT COUNT(*) FROM progress WHERE correct_answers >= ?1",
            params![threshold],
        )
    }

    fn response_history(&self, word_id: WordId) -> Result<Vec<HistoryPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT response_date,
                    SUM(CASE WHEN correct = 1 THEN 1 ELSE 0 END) AS correct_count,
                    SUM(CASE WHEN correct = 0 THEN 1 ELSE 0 END) AS incorrect_count
             FROM response_history
             WHERE word_id = ?1
             GROUP BY response_date
             ORDER BY response_date",
        )?;
        let rows = stmt
            .query_map(params![word_id], |row| {
                Ok((
                    stored_date(row.get(0)?),
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut history = Vec::with_capacity(rows.len());
        for (date, correct, incorrect) in rows {
            match date.to_date() {
                Ok(date) => history.push(HistoryPoint {
                    date,
                    correct: correct as u32,
                    incorrect: incorrect as u32,
                }),
                Err(e) => log::warn!("Skipping history row of word {}: {}", word_id, e),
            }
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    fn store_with_words(words: &[(&str, &str)]) -> (SqliteProgressStore, Vec<Word>) {
        let mut store = SqliteProgressStore::open_in_memory().unwrap();
        let words = words
            .iter()
            .map(|(s, t)| store.insert_word(NewWord::new(*s, *t)).unwrap())
            .collect();
        (store, words)
    }

    fn introduce_with_date(store: &mut SqliteProgressStore, id: WordId, date: NaiveDate) {
        store.mark_introduced(id).unwrap();
        let mut record = ProgressRecord::new(today());
        record.next_review_date = date;
        store.write_progress(id, &record).unwrap();
    }

    #[test]
    fn test_open_creates_and_persists() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("vocab.db");

        {
            let mut store = SqliteProgressStore::open(db_path.clone()).unwrap();
            store.insert_word(NewWord::new("casa", "house")).unwrap();
            assert_eq!(store.db_path(), Some(db_path.as_path()));
        }

        let store = SqliteProgressStore::open(db_path).unwrap();
        let words = store.list_words().unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].source_text, "casa");
        assert!(!words[0].introduced);
    }

    #[test]
    fn test_unintroduced_lowest_id_first() {
        let (mut store, words) = store_with_words(&[("uno", "one"), ("dos", "two")]);

        let first = store.fetch_one_unintroduced_word().unwrap().unwrap();
        assert_eq!(first.kind, CandidateKind::New);
        assert_eq!(first.word_id(), words[0].id);
        assert_eq!(first.correct_answers, 0);

        store.mark_introduced(words[0].id).unwrap();
        store.mark_introduced(words[0].id).unwrap();
        let second = store.fetch_one_unintroduced_word().unwrap().unwrap();
        assert_eq!(second.word_id(), words[1].id);

        store.mark_introduced(words[1].id).unwrap();
        assert!(store.fetch_one_unintroduced_word().unwrap().is_none());
    }

    #[test]
    fn test_mark_introduced_unknown_word() {
        let (mut store, _) = store_with_words(&[]);
        assert!(matches!(
            store.mark_introduced(42),
            Err(StoreError::WordNotFound(42))
        ));
    }

    #[test]
    fn test_due_words_filtered_and_ordered() {
        let (mut store, words) =
            store_with_words(&[("a", "a"), ("b", "b"), ("c", "c"), ("d", "d")]);
        introduce_with_date(&mut store, words[0].id, today());
        introduce_with_date(&mut store, words[1].id, today() - Duration::days(3));
        introduce_with_date(&mut store, words[2].id, today() + Duration::days(1));
        // words[3] stays unintroduced

        let due = store.fetch_due_words(today()).unwrap();
        let ids: Vec<WordId> = due.iter().map(|c| c.word_id()).collect();
        assert_eq!(ids, vec![words[1].id, words[0].id]);
        assert!(due.iter().all(|c| c.kind == CandidateKind::Due));
    }

    #[test]
    fn test_due_scan_skips_malformed_dates() {
        let (mut store, words) = store_with_words(&[("a", "a"), ("b", "b"), ("c", "c")]);
        for word in &words {
            introduce_with_date(&mut store, word.id, today());
        }

        store
            .conn
            .execute(
                "UPDATE progress SET next_review_date = 'someday' WHERE word_id = ?1",
                params![words[0].id],
            )
            .unwrap();
        let noon = (today() - Duration::days(1))
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp();
        store
            .conn
            .execute(
                "UPDATE progress SET next_review_date = ?1 WHERE word_id = ?2",
                params![noon, words[1].id],
            )
            .unwrap();

        let due = store.fetch_due_words(today()).unwrap();
        let ids: Vec<WordId> = due.iter().map(|c| c.word_id()).collect();
        assert_eq!(ids, vec![words[1].id, words[2].id]);

        assert!(matches!(
            store.fetch_progress(words[0].id),
            Err(StoreError::MalformedDate { .. })
        ));
    }

    #[test]
    fn test_candidate_fetches_skip_malformed_dates() {
        let (mut store, words) = store_with_words(&[("a", "a"), ("b", "b"), ("c", "c")]);
        introduce_with_date(&mut store, words[0].id, today());
        introduce_with_date(&mut store, words[1].id, today());
        // Seeded but never introduced
        store.write_progress(words[2].id, &ProgressRecord::new(today())).unwrap();

        for id in [words[0].id, words[2].id] {
            store
                .conn
                .execute(
                    "UPDATE progress SET next_review_date = 'someday' WHERE word_id = ?1",
                    params![id],
                )
                .unwrap();
        }

        for _ in 0..10 {
            let review = store.fetch_any_introduced_word().unwrap().unwrap();
            assert_eq!(review.word_id(), words[1].id);
            assert!(review.progress.is_some());

            let any = store.fetch_any_word_at_all().unwrap().unwrap();
            assert_eq!(any.word_id(), words[1].id);
        }
        assert!(store.fetch_one_unintroduced_word().unwrap().is_none());

        store
            .conn
            .execute(
                "UPDATE progress SET next_review_date = NULL WHERE word_id = ?1",
                params![words[1].id],
            )
            .unwrap();
        assert!(store.fetch_any_introduced_word().unwrap().is_none());
        assert!(store.fetch_any_word_at_all().unwrap().is_none());
    }

    #[test]
    fn test_write_progress_upserts_and_projects() {
        let (mut store, words) = store_with_words(&[("a", "a")]);
        let id = words[0].id;
        assert!(store.fetch_progress(id).unwrap().is_none());

        let mut record = ProgressRecord::new(today());
        record.correct_answers = 2;
        store.write_progress(id, &record).unwrap();
        assert_eq!(store.fetch_progress(id).unwrap(), Some(record.clone()));

        record.interval = 6;
        record.repetitions = 2;
        record.ease_factor = 2.7;
        record.correct_answers = 3;
        record.next_review_date = today() + Duration::days(6);
        store.write_progress(id, &record).unwrap();
        assert_eq!(store.fetch_progress(id).unwrap(), Some(record));

        let projected: u32 = store
            .conn
            .query_row(
                "SELECT correct_answers FROM words WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(projected, 3);
    }

    #[test]
    fn test_write_progress_unknown_word_rolls_back() {
        let (mut store, _) = store_with_words(&[]);
        let result = store.write_progress(9, &ProgressRecord::new(today()));
        assert!(matches!(result, Err(StoreError::WordNotFound(9))));
        assert!(store.fetch_progress(9).unwrap().is_none());
    }

    #[test]
    fn test_random_fetches() {
        let (mut store, words) = store_with_words(&[("a", "a"), ("b", "b")]);
        assert!(store.fetch_any_introduced_word().unwrap().is_none());

        store.mark_introduced(words[1].id).unwrap();
        for _ in 0..10 {
            let candidate = store.fetch_any_introduced_word().unwrap().unwrap();
            assert_eq!(candidate.word_id(), words[1].id);
            assert_eq!(candidate.kind, CandidateKind::Due);
            assert!(candidate.progress.is_none());
        }

        let any = store.fetch_any_word_at_all().unwrap().unwrap();
        assert_eq!(any.kind, CandidateKind::Random);

        let (empty, _) = store_with_words(&[]);
        assert!(empty.fetch_any_word_at_all().unwrap().is_none());
    }

    #[test]
    fn test_seed_all_progress_keeps_existing() {
        let (mut store, words) = store_with_words(&[("a", "a"), ("b", "b")]);
        store
            .write_progress(words[0].id, &ProgressRecord::known(today()))
            .unwrap();

        assert_eq!(store.seed_all_progress(today()).unwrap(), 1);
        assert_eq!(store.seed_all_progress(today()).unwrap(), 0);

        assert_eq!(
            store.fetch_progress(words[0].id).unwrap().unwrap().interval,
            KNOWN_INTERVAL_DAYS
        );
        assert_eq!(
            store.fetch_progress(words[1].id).unwrap(),
            Some(ProgressRecord::new(today()))
        );
        assert_eq!(store.count_mastered(MASTERY_THRESHOLD).unwrap(), 1);
        assert_eq!(store.count_words().unwrap(), 2);
    }

    #[test]
    fn test_response_history_grouped_by_day() {
        let (mut store, words) = store_with_words(&[("a", "a"), ("b", "b")]);
        let id = words[0].id;
        let yesterday = today() - Duration::days(1);

        for (date, correct) in [
            (yesterday, true),
            (yesterday, false),
            (today(), true),
            (today(), true),
        ] {
            store
                .append_response_event(&ResponseEvent { word_id: id, date, correct })
                .unwrap();
        }
        store
            .append_response_event(&ResponseEvent {
                word_id: words[1].id,
                date: today(),
                correct: false,
            })
            .unwrap();

        let history = store.response_history(id).unwrap();
        assert_eq!(
            history,
            vec![
                HistoryPoint { date: yesterday, correct: 1, incorrect: 1 },
                HistoryPoint { date: today(), correct: 2, incorrect: 0 },
            ]
        );
    }
}
