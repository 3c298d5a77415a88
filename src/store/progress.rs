use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::schema::{
    EXPORT_VERSION, ExportData, ProgressData, ProgressMap, ProgressRecord, StoredProgress,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("progress data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Unsupported export version: {found} (expected {expected})")]
    UnsupportedExport { found: u32, expected: u32 },
}

/// Durable home of the progress map.
pub trait ProgressBackend {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<ProgressData>, StoreError>;
    fn save(&self, data: &ProgressData) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

pub fn decode(raw: &str) -> Result<ProgressData, StoreError> {
    let stored: StoredProgress = serde_json::from_str(raw)?;
    Ok(stored.into())
}

#[derive(Default)]
struct MemoryInner {
    contents: Option<String>,
    saves: usize,
}

/// Backend holding the serialized map in memory. Clones share contents, so a
/// test can keep a handle after giving one to a [`ProgressStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(raw: &str) -> Self {
        let store = Self::new();
        store.inner.borrow_mut().contents = Some(raw.to_string());
        store
    }

    pub fn contents(&self) -> Option<String> {
        self.inner.borrow().contents.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }
}

impl ProgressBackend for MemoryStore {
    fn load(&self) -> Result<Option<ProgressData>, StoreError> {
        match &self.inner.borrow().contents {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, data: &ProgressData) -> Result<(), StoreError> {
        let json = serde_json::to_string(data)?;
        let mut inner = self.inner.borrow_mut();
        inner.contents = Some(json);
        inner.saves += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.borrow_mut().contents = None;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressTotals {
    pub characters: usize,
    pub correct: u32,
    pub incorrect: u32,
}

impl ProgressTotals {
    pub fn accuracy(&self) -> f64 {
        let attempts = self.correct + self.incorrect;
        if attempts == 0 {
            0.0
        } else {
            self.correct as f64 / attempts as f64
        }
    }
}

/// In-memory progress map with write-through persistence.
///
/// The map in memory is authoritative. Failed writes are logged and the quiz
/// carries on.
pub struct ProgressStore {
    data: ProgressData,
    backend: Box<dyn ProgressBackend>,
}

impl ProgressStore {
    pub fn open(backend: Box<dyn ProgressBackend>) -> Self {
        let data = match backend.load() {
            Ok(Some(data)) => data,
            Ok(None) => ProgressData::default(),
            Err(e) => {
                log::warn!("progress data unreadable, starting fresh: {e}");
                ProgressData::default()
            }
        };
        log::debug!("loaded progress for {} characters", data.records.len());
        Self { data, backend }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    pub fn record_answer(&mut self, id: &str, was_correct: bool) {
        self.record_answer_at(id, was_correct, Utc::now());
    }

    pub fn record_answer_at(&mut self, id: &str, was_correct: bool, now: DateTime<Utc>) {
        self.data
            .records
            .entry(id.to_string())
            .or_insert_with(|| ProgressRecord::new(now))
            .record(was_correct, now);
        self.persist();
    }

    pub fn get(&self, id: &str) -> Option<&ProgressRecord> {
        self.data.records.get(id)
    }

    pub fn records(&self) -> &ProgressMap {
        &self.data.records
    }

    pub fn is_empty(&self) -> bool {
        self.data.records.is_empty()
    }

    pub fn reset_all(&mut self) {
        self.data.records.clear();
        if let Err(e) = self.backend.clear() {
            log::warn!("failed to erase saved progress: {e}");
        }
        log::info!("progress reset");
    }

    pub fn totals(&self) -> ProgressTotals {
        self.data.records.values().fold(
            ProgressTotals {
                characters: self.data.records.len(),
                ..ProgressTotals::default()
            },
            |mut acc, r| {
                acc.correct += r.correct;
                acc.incorrect += r.incorrect;
                acc
            },
        )
    }

    /// Attempted characters, lowest accuracy first. More misses break ties.
    pub fn by_weakness(&self) -> Vec<(&str, &ProgressRecord)> {
        let mut rows: Vec<(&str, &ProgressRecord)> = self
            .data
            .records
            .iter()
            .filter(|(_, r)| r.attempts() > 0)
            .map(|(name, r)| (name.as_str(), r))
            .collect();
        rows.sort_by(|a, b| {
            a.1.accuracy()
                .total_cmp(&b.1.accuracy())
                .then(b.1.incorrect.cmp(&a.1.incorrect))
        });
        rows
    }

    pub fn export(&self) -> ExportData {
        ExportData {
            rolecall_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            progress: self.data.clone(),
        }
    }

    /// Replaces all progress with `data`. Unlike answer recording, a failed
    /// write is returned to the caller.
    pub fn import(&mut self, data: ExportData) -> Result<(), StoreError> {
        if data.rolecall_export_version != EXPORT_VERSION {
            return Err(StoreError::UnsupportedExport {
                found: data.rolecall_export_version,
                expected: EXPORT_VERSION,
            });
        }
        self.data = ProgressData::from_records(data.progress.records);
        self.backend.save(&self.data)
    }

    fn persist(&self) {
        if let Err(e) = self.backend.save(&self.data) {
            log::warn!("failed to save progress: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    struct FailingBackend;

    impl ProgressBackend for FailingBackend {
        fn load(&self) -> Result<Option<ProgressData>, StoreError> {
            Ok(None)
        }
        fn save(&self, _: &ProgressData) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn records_are_created_lazily_and_persisted() {
        let backend = MemoryStore::new();
        let mut store = ProgressStore::open(Box::new(backend.clone()));
        assert!(store.get("Imp").is_none());

        store.record_answer_at("Imp", true, at(10));
        store.record_answer_at("Imp", false, at(20));

        let record = store.get("Imp").unwrap();
        assert_eq!((record.correct, record.incorrect), (1, 1));
        assert_eq!(record.last_seen, at(20));
        assert_eq!(backend.save_count(), 2);

        let reopened = ProgressStore::open(Box::new(backend));
        assert_eq!(reopened.get("Imp"), Some(&ProgressRecord {
            correct: 1,
            incorrect: 1,
            last_seen: at(20),
        }));
    }

    #[test]
    fn save_of_load_is_noop() {
        let backend = MemoryStore::new();
        let mut store = ProgressStore::open(Box::new(backend.clone()));
        store.record_answer_at("Chef", true, at(5));

        let loaded = backend.load().unwrap().unwrap();
        backend.save(&loaded).unwrap();
        assert_eq!(backend.load().unwrap().unwrap(), loaded);
    }

    #[test]
    fn corrupt_contents_load_as_empty() {
        let backend = MemoryStore::with_contents("{not json");
        let store = ProgressStore::open(Box::new(backend));
        assert!(store.is_empty());
    }

    #[test]
    fn write_failures_do_not_lose_answers() {
        let mut store = ProgressStore::open(Box::new(FailingBackend));
        store.record_answer("Po", false);
        assert_eq!(store.get("Po").map(|r| r.incorrect), Some(1));
        store.reset_all();
        assert!(store.is_empty());
    }

    #[test]
    fn reset_erases_backend() {
        let backend = MemoryStore::new();
        let mut store = ProgressStore::open(Box::new(backend.clone()));
        store.record_answer("Po", true);
        store.reset_all();
        assert!(store.is_empty());
        assert!(backend.contents().is_none());
    }

    #[test]
    fn totals_and_weakness_order() {
        let mut store = ProgressStore::in_memory();
        store.record_answer_at("Good", true, at(1));
        store.record_answer_at("Good", true, at(2));
        store.record_answer_at("Bad", false, at(3));
        store.record_answer_at("Bad", false, at(4));
        store.record_answer_at("Meh", true, at(5));
        store.record_answer_at("Meh", false, at(6));

        let totals = store.totals();
        assert_eq!(totals.characters, 3);
        assert_eq!((totals.correct, totals.incorrect), (3, 3));
        assert!((totals.accuracy() - 0.5).abs() < f64::EPSILON);

        let order: Vec<&str> = store.by_weakness().iter().map(|(n, _)| *n).collect();
        assert_eq!(order, vec!["Bad", "Meh", "Good"]);
    }

    #[test]
    fn import_rejects_unknown_version() {
        let mut store = ProgressStore::in_memory();
        let mut export = store.export();
        export.rolecall_export_version = 99;
        let err = store.import(export).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn export_import_round_trip() {
        let mut source = ProgressStore::in_memory();
        source.record_answer_at("Imp", true, at(100));
        let export = source.export();

        let backend = MemoryStore::new();
        let mut target = ProgressStore::open(Box::new(backend.clone()));
        target.import(export).unwrap();
        assert_eq!(target.records(), source.records());
        assert_eq!(backend.save_count(), 1);
    }
}
