//! Debounced snapshot writes.
//!
//! Each collection owns one background writer with a single pending-write
//! slot. A new snapshot replaces the pending one and restarts the debounce
//! window, so a burst of mutations produces one write of the latest state.
//! Nothing is queued: only the newest snapshot is ever written.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::Storage;

/// A write waiting in the debounce slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// Store this serialized snapshot.
    Put(String),
    /// Remove the key.
    Delete,
}

enum Command {
    Write(PendingWrite),
    Flush(oneshot::Sender<()>),
}

/// Handle to a background debounced writer for one storage key.
///
/// Dropping the handle flushes any pending write and stops the writer.
#[derive(Debug)]
pub struct DebouncedWriter {
    tx: mpsc::UnboundedSender<Command>,
}

impl DebouncedWriter {
    /// Spawn a writer for `key`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(storage: Storage, key: &'static str, delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(storage, key, delay, rx));
        Self { tx }
    }

    /// Put `write` in the pending slot, superseding whatever was there.
    pub fn schedule(&self, write: PendingWrite) {
        if self.tx.send(Command::Write(write)).is_err() {
            warn!("Snapshot writer stopped, dropping write");
        }
    }

    /// Write the pending snapshot now and wait for it to complete.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run(
    storage: Storage,
    key: &'static str,
    delay: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<PendingWrite> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    if let Some(write) = pending.take() {
                        apply(&storage, key, write).await;
                    }
                    continue;
                }
                command = rx.recv() => command,
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Write(write)) => pending = Some(write),
            Some(Command::Flush(ack)) => {
                if let Some(write) = pending.take() {
                    apply(&storage, key, write).await;
                }
                let _ = ack.send(());
            }
            None => {
                if let Some(write) = pending.take() {
                    apply(&storage, key, write).await;
                }
                debug!(key, "Snapshot writer stopped");
                return;
            }
        }
    }
}

async fn apply(storage: &Storage, key: &str, write: PendingWrite) {
    let result = match write {
        PendingWrite::Put(value) => storage.set(key, value).await,
        PendingWrite::Delete => storage.delete(key).await,
    };
    match result {
        Ok(()) => debug!(key, "Snapshot persisted"),
        Err(e) => warn!(key, error = %e, "Failed to persist snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::persistence::MemoryStore;

    fn writer() -> (Arc<MemoryStore>, DebouncedWriter) {
        let medium = Arc::new(MemoryStore::new());
        let storage = Storage::from_arc(medium.clone());
        let writer = DebouncedWriter::spawn(storage, "cart", Duration::from_millis(300));
        (medium, writer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_write() {
        let (medium, writer) = writer();
        for n in 0..5 {
            writer.schedule(PendingWrite::Put(format!("v{n}")));
        }

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(medium.writes(), 1);
        assert_eq!(medium.peek("cart").as_deref(), Some("v4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_write_restarts_window() {
        let (medium, writer) = writer();
        writer.schedule(PendingWrite::Put("a".into()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        writer.schedule(PendingWrite::Put("b".into()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(medium.writes(), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(medium.writes(), 1);
        assert_eq!(medium.peek("cart").as_deref(), Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let (medium, writer) = writer();
        writer.schedule(PendingWrite::Put("now".into()));
        writer.flush().await;
        assert_eq!(medium.peek("cart").as_deref(), Some("now"));

        // Nothing left pending.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(medium.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_write_removes_key() {
        let (medium, writer) = writer();
        medium.seed("cart", "old");
        writer.schedule(PendingWrite::Delete);
        writer.flush().await;
        assert_eq!(medium.peek("cart"), None);
    }
}
