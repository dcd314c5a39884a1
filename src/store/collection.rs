//! The record store: sole owner of the in-memory collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::observability::metrics;
use crate::store::ids::IdAllocator;
use crate::store::persist::{PersistError, PersistHandle, PersistTicket};
use crate::store::record::{Record, RecordFields, RecordPatch};

/// Error type for store lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no record with id {0:?}")]
    NotFound(String),
}

/// Result of a mutating operation: the in-memory outcome plus its persist ticket.
#[derive(Debug)]
pub struct Mutation<T> {
    pub value: T,
    pub persisted: PersistTicket,
}

struct Collection {
    records: Vec<Record>,
    ids: IdAllocator,
}

/// Ordered, id-unique collection of records mirrored to a JSON file.
pub struct RecordStore {
    inner: RwLock<Collection>,
    persister: PersistHandle,
    path: PathBuf,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("records", &self.len())
            .finish()
    }
}

impl RecordStore {
    /// Load the collection from `path` and start its writer.
    ///
    /// A missing, unreadable or malformed file yields an empty collection.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_records(&path).await;
        Self::with_records(path, records)
    }

    fn with_records(path: PathBuf, records: Vec<Record>) -> Self {
        let ids = IdAllocator::seeded_from(&records);
        let (persister, _writer) = PersistHandle::spawn(path.clone());
        metrics::record_collection_size(records.len());

        Self {
            inner: RwLock::new(Collection { records, ids }),
            persister,
            path,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full collection in insertion order.
    pub fn list_all(&self) -> Vec<Record> {
        self.read().records.clone()
    }

    /// Exact id match.
    pub fn find_by_id(&self, id: &str) -> Option<Record> {
        self.read().records.iter().find(|r| r.id == id).cloned()
    }

    /// All records whose name equals `name` ignoring case, in collection order.
    pub fn find_by_name(&self, name: &str) -> Vec<Record> {
        let needle = name.to_lowercase();
        self.read()
            .records
            .iter()
            .filter(|r| r.name_matches(&needle))
            .cloned()
            .collect()
    }

    /// Append a new record with a freshly allocated id.
    pub fn insert(&self, fields: RecordFields) -> Mutation<Record> {
        let mut inner = self.write();
        let id = inner.ids.allocate();
        let record = Record::from_fields(id, fields);
        inner.records.push(record.clone());

        tracing::debug!(id = %record.id, name = %record.name, "Anime added");
        let persisted = self.persist_locked(&inner);
        Mutation {
            value: record,
            persisted,
        }
    }

    /// Shallow-merge `patch` into the record with `id`. The id itself never changes.
    pub fn replace(&self, id: &str, patch: RecordPatch) -> Result<Mutation<Record>, StoreError> {
        let mut inner = self.write();
        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.apply(patch);
        let record = record.clone();

        tracing::debug!(id = %record.id, "Anime updated");
        let persisted = self.persist_locked(&inner);
        Ok(Mutation {
            value: record,
            persisted,
        })
    }

    /// Remove the record with `id`; later records shift but keep their ids.
    pub fn delete(&self, id: &str) -> Result<Mutation<Record>, StoreError> {
        let mut inner = self.write();
        let index = inner
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let record = inner.records.remove(index);

        tracing::debug!(id = %record.id, "Anime deleted");
        let persisted = self.persist_locked(&inner);
        Ok(Mutation {
            value: record,
            persisted,
        })
    }

    /// Write the current collection and wait for it to land.
    pub async fn flush(&self) -> Result<(), PersistError> {
        let ticket = {
            let inner = self.read();
            self.persister.submit(inner.records.clone())
        };
        ticket.wait().await
    }

    fn persist_locked(&self, inner: &Collection) -> PersistTicket {
        metrics::record_collection_size(inner.records.len());
        self.persister.submit(inner.records.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, Collection> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collection> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load_records(path: &Path) -> Vec<Record> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not read anime data, starting with an empty collection"
            );
            return Vec::new();
        }
    };

    let loaded: Vec<Record> = match serde_json::from_slice(&bytes) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not parse anime data, starting with an empty collection"
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let total = loaded.len();
    let records: Vec<Record> = loaded
        .into_iter()
        .filter(|r| {
            if r.id.is_empty() {
                tracing::warn!(name = %r.name, "Dropping stored anime without an id");
                return false;
            }
            if !seen.insert(r.id.clone()) {
                tracing::warn!(id = %r.id, "Dropping stored anime with a duplicate id");
                return false;
            }
            true
        })
        .collect();

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        dropped = total - records.len(),
        "Anime data loaded"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str) -> RecordFields {
        RecordFields {
            name: name.into(),
            genre: "Action".into(),
            year: 1988,
            author: "Otomo".into(),
        }
    }

    async fn empty_store(dir: &tempfile::TempDir) -> RecordStore {
        RecordStore::open(dir.path().join("anime.json")).await
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = RecordStore::open(&path).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_id_keyed_map_is_not_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        std::fs::write(
            &path,
            br#"{"1": {"id": "1", "name": "Akira", "genre": "Action", "year": 1988, "author": "Otomo"}}"#,
        )
        .unwrap();

        let store = RecordStore::open(&path).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_drops_duplicate_and_empty_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        std::fs::write(
            &path,
            br#"[
                {"id": "1", "name": "Akira", "genre": "Action", "year": 1988, "author": "Otomo"},
                {"id": "1", "name": "Copy", "genre": "Action", "year": 1988, "author": "Otomo"},
                {"id": "", "name": "Blank", "genre": "Action", "year": 1988, "author": "Otomo"},
                {"id": "2", "name": "Paprika", "genre": "Sci-Fi", "year": 2006, "author": "Tsutsui"}
            ]"#,
        )
        .unwrap();

        let store = RecordStore::open(&path).await;
        let ids: Vec<String> = store.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_insert_then_find_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;

        let created = store.insert(fields("Akira")).value;
        let found = store.find_by_id(&created.id).unwrap();

        assert_eq!(found, Record::from_fields(created.id.clone(), fields("Akira")));
    }

    #[tokio::test]
    async fn test_delete_then_insert_keeps_ids_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;

        let a = store.insert(fields("A")).value;
        let b = store.insert(fields("B")).value;
        store.delete(&a.id).unwrap();
        let c = store.insert(fields("C")).value;

        assert_ne!(c.id, b.id);
        assert_ne!(c.id, a.id);

        // Delete the only record, then insert again.
        store.delete(&b.id).unwrap();
        store.delete(&c.id).unwrap();
        let d = store.insert(fields("D")).value;
        let e = store.insert(fields("E")).value;
        assert_ne!(d.id, e.id);

        let ids: HashSet<String> = store.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), store.len());
    }

    #[tokio::test]
    async fn test_replace_merges_and_keeps_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        let created = store.insert(fields("Akira")).value;

        let updated = store
            .replace(
                &created.id,
                RecordPatch {
                    genre: Some("Sci-Fi".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .value;

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.genre, "Sci-Fi");
        assert_eq!(updated.name, "Akira");
        assert_eq!(updated.year, 1988);
        assert_eq!(store.find_by_id(&created.id).unwrap(), updated);
    }

    #[tokio::test]
    async fn test_replace_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;

        let err = store.replace("42", fields("X").into()).unwrap_err();
        assert_eq!(err, StoreError::NotFound("42".into()));
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_collection_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        store.insert(fields("Akira"));

        assert!(store.delete("999").is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_shifts_positions_not_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        store.insert(fields("A"));
        store.insert(fields("B"));
        store.insert(fields("C"));

        let removed = store.delete("2").unwrap().value;
        assert_eq!(removed.name, "B");

        let ids: Vec<String> = store.list_all().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(&dir).await;
        store.insert(fields("Akira"));
        store.insert(fields("Paprika"));
        store.insert(fields("AKIRA"));

        let lower = store.find_by_name("akira");
        let upper = store.find_by_name("AKIRA");
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 2);
        assert!(store.find_by_name("Perfect Blue").is_empty());
    }

    #[tokio::test]
    async fn test_mutations_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        let store = RecordStore::open(&path).await;

        store.insert(fields("Akira")).persisted.wait().await.unwrap();
        store.insert(fields("Paprika"));
        store.delete("1").unwrap().persisted.wait().await.unwrap();

        let reopened = RecordStore::open(&path).await;
        assert_eq!(reopened.list_all(), store.list_all());
        assert_eq!(reopened.insert(fields("Perfect Blue")).value.id, "3");
    }
}
