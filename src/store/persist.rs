//! Single-writer persistence for the backing file.
//!
//! Every mutation enqueues a full snapshot of the collection. One writer task
//! per file drains the queue in order, coalesces snapshots that piled up while
//! a write was in flight, and replaces the file atomically (`<file>.tmp` then
//! rename). Callers get a [`PersistTicket`] they can await or drop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::store::record::Record;

/// Failure to make a snapshot durable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize collection: {0}")]
    Serialize(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("persistence writer is no longer running")]
    WriterClosed,
}

struct PersistJob {
    snapshot: Vec<Record>,
    done: oneshot::Sender<Result<(), PersistError>>,
}

/// Completion signal for one enqueued snapshot.
#[derive(Debug)]
pub struct PersistTicket {
    rx: oneshot::Receiver<Result<(), PersistError>>,
}

impl PersistTicket {
    /// Wait until the snapshot (or a newer one that superseded it) is on disk.
    pub async fn wait(self) -> Result<(), PersistError> {
        self.rx.await.unwrap_or(Err(PersistError::WriterClosed))
    }

    fn closed() -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(PersistError::WriterClosed));
        Self { rx }
    }
}

/// Sending half of the writer queue.
#[derive(Debug, Clone)]
pub struct PersistHandle {
    tx: mpsc::UnboundedSender<PersistJob>,
}

impl std::fmt::Debug for PersistJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistJob")
            .field("records", &self.snapshot.len())
            .finish()
    }
}

impl PersistHandle {
    /// Spawn the writer task for `path`. Must be called inside a Tokio runtime.
    pub fn spawn(path: PathBuf) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(path, rx));
        (Self { tx }, task)
    }

    /// Enqueue a snapshot. Never blocks.
    pub fn submit(&self, snapshot: Vec<Record>) -> PersistTicket {
        let (done, rx) = oneshot::channel();
        match self.tx.send(PersistJob { snapshot, done }) {
            Ok(()) => PersistTicket { rx },
            Err(_) => {
                tracing::error!("Persistence writer has stopped; snapshot dropped");
                PersistTicket::closed()
            }
        }
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<PersistJob>) {
    tracing::debug!(path = %path.display(), "Persistence writer started");

    while let Some(first) = rx.recv().await {
        let mut waiters = vec![first.done];
        let mut latest = first.snapshot;

        // Only the newest queued snapshot needs to reach the disk.
        while let Ok(job) = rx.try_recv() {
            waiters.push(job.done);
            latest = job.snapshot;
        }

        let start = Instant::now();
        let result = write_snapshot(&path, &latest).await;
        match &result {
            Ok(()) => {
                tracing::debug!(
                    path = %path.display(),
                    records = latest.len(),
                    coalesced = waiters.len(),
                    "Anime data saved"
                );
                metrics::record_persist("ok", start);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error saving anime data");
                metrics::record_persist("error", start);
            }
        }

        for done in waiters {
            let _ = done.send(result.clone());
        }
    }

    tracing::debug!(path = %path.display(), "Persistence writer stopped");
}

/// Serialize `records` as a JSON array and atomically replace `path`.
pub async fn write_snapshot(path: &Path, records: &[Record]) -> Result<(), PersistError> {
    let bytes =
        serde_json::to_vec_pretty(records).map_err(|e| PersistError::Serialize(e.to_string()))?;

    let write_err = |source: std::io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str) -> Record {
        Record {
            id: id.into(),
            name: name.into(),
            genre: "Action".into(),
            year: 1988,
            author: "Otomo".into(),
        }
    }

    #[tokio::test]
    async fn test_ticket_resolves_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        let (handle, _task) = PersistHandle::spawn(path.clone());

        handle.submit(vec![record("1", "Akira")]).wait().await.unwrap();

        let on_disk: Vec<Record> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![record("1", "Akira")]);
    }

    #[tokio::test]
    async fn test_last_snapshot_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anime.json");
        let (handle, _task) = PersistHandle::spawn(path.clone());

        let first = handle.submit(vec![record("1", "Akira")]);
        let second = handle.submit(vec![record("1", "Akira"), record("2", "Paprika")]);
        let third = handle.submit(vec![record("2", "Paprika")]);

        first.wait().await.unwrap();
        second.wait().await.unwrap();
        third.wait().await.unwrap();

        let on_disk: Vec<Record> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec![record("2", "Paprika")]);
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("anime.json");

        write_snapshot(&path, &[record("1", "Akira")]).await.unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested/data/anime.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_to_ticket() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the rename cannot succeed.
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let (handle, _task) = PersistHandle::spawn(path);
        let err = handle.submit(vec![record("1", "Akira")]).wait().await.unwrap_err();
        assert!(matches!(err, PersistError::Write { .. }));
    }
}
