//! Watch manager: keeps the index consistent as watched trees change.
//!
//! One debounced recursive watcher per registered directory. Each
//! debounced batch is coalesced per path (last event wins, except a delete
//! always wins over a pending create/modify), converted to typed
//! [`FileEvent`]s and pushed onto a bounded channel consumed by a
//! dispatcher task that drives the indexer's single-file operations.

use notify_debouncer_full::notify::event::{CreateKind, RemoveKind};
use notify_debouncer_full::notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache,
};
use semdex_core::{Error, FileEvent, Result};
use semdex_extract::ParserRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::indexer::Indexer;

/// Manages one watcher per registered directory and the dispatcher that
/// applies their events to the index.
pub struct WatchManager {
    parsers: Arc<ParserRegistry>,
    debounce: Duration,
    event_tx: mpsc::Sender<FileEvent>,
    watchers: Mutex<HashMap<PathBuf, Debouncer<RecommendedWatcher, RecommendedCache>>>,
}

impl WatchManager {
    /// Create the manager and spawn its dispatcher task.
    #[must_use]
    pub fn new(indexer: Arc<Indexer>, debounce_ms: u64) -> Arc<Self> {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let parsers = Arc::clone(indexer.parsers());

        let manager = Arc::new(Self {
            parsers,
            debounce: Duration::from_millis(debounce_ms),
            event_tx,
            watchers: Mutex::new(HashMap::new()),
        });

        tokio::spawn(dispatch_events(indexer, event_rx));
        manager
    }

    /// Start watching a directory subtree. Idempotent.
    pub async fn watch(&self, dir: &Path) -> Result<()> {
        let mut watchers = self.watchers.lock().await;
        if watchers.contains_key(dir) {
            debug!(dir = %dir.display(), "already watching");
            return Ok(());
        }

        let event_tx = self.event_tx.clone();
        let parsers = Arc::clone(&self.parsers);
        let mut debouncer = new_debouncer(self.debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in coalesce_events(&events, &parsers) {
                        // Callback runs on the notify thread, blocking send
                        // is the right tool. A full channel applies
                        // backpressure to the watcher, not the runtime.
                        if event_tx.blocking_send(event).is_err() {
                            warn!("watch event channel closed");
                            break;
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("watch error: {e}");
                    }
                }
            }
        })
        .map_err(|e| Error::Other(format!("failed to create watcher: {e}")))?;

        debouncer
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| Error::Other(format!("failed to watch {}: {e}", dir.display())))?;

        info!(dir = %dir.display(), "watching");
        watchers.insert(dir.to_path_buf(), debouncer);
        Ok(())
    }

    /// Stop watching a directory. Idempotent.
    pub async fn unwatch(&self, dir: &Path) -> Result<()> {
        let mut watchers = self.watchers.lock().await;
        if watchers.remove(dir).is_some() {
            info!(dir = %dir.display(), "stopped watching");
        }
        Ok(())
    }

    /// Paths currently being watched.
    pub async fn watched(&self) -> Vec<PathBuf> {
        self.watchers.lock().await.keys().cloned().collect()
    }
}

/// Dispatcher: applies events to the indexer, one at a time per arrival
/// order. Failures are logged and dropped; the watcher must never die.
async fn dispatch_events(indexer: Arc<Indexer>, mut event_rx: mpsc::Receiver<FileEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!(?event, "dispatching file event");
        let result = match &event {
            FileEvent::Created(path) => indexer.index_file(path).await.map(|_| ()),
            FileEvent::Modified(path) => indexer.reindex_file(path).await.map(|_| ()),
            FileEvent::Deleted(path) => indexer.remove_file(path).await.map(|_| ()),
        };

        if let Err(e) = result {
            match e {
                // The path vanished between the event and now; the next
                // delete event (or nothing) settles it.
                Error::NotFound(path) => {
                    debug!(path = %path.display(), "event path no longer exists, dropped");
                }
                other => warn!(path = %event.path().display(), "event handling failed: {other}"),
            }
        }
    }
}

/// Collapse one debounced batch into at most one action per path.
///
/// Later events supersede earlier ones, except that a delete is sticky:
/// once a path is deleted within the window, a trailing create/modify
/// burst does not resurrect intermediate states (the create itself will
/// re-arrive in a later batch if the file truly exists).
fn coalesce_events(events: &[DebouncedEvent], parsers: &ParserRegistry) -> Vec<FileEvent> {
    let mut per_path: HashMap<PathBuf, FileEvent> = HashMap::new();

    for event in events {
        let Some(path) = event.paths.first() else {
            continue;
        };

        // Hidden files are not index material.
        if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        {
            continue;
        }
        if !parsers.is_supported(path) {
            continue;
        }

        // Directory events are dropped by kind; the extension filter alone
        // would let a folder named like a document through.
        let converted = match &event.kind {
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
                continue;
            }
            EventKind::Create(_) => FileEvent::Created(path.clone()),
            EventKind::Modify(_) => FileEvent::Modified(path.clone()),
            EventKind::Remove(_) => FileEvent::Deleted(path.clone()),
            _ => continue,
        };

        match per_path.get(path) {
            Some(FileEvent::Deleted(_)) => {} // delete wins
            _ => {
                per_path.insert(path.clone(), converted);
            }
        }
    }

    per_path.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::noop_ocr;
    use notify_debouncer_full::notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use notify_debouncer_full::notify::Event;
    use std::time::Instant;

    fn parsers() -> ParserRegistry {
        ParserRegistry::with_defaults(noop_ocr())
    }

    fn event(kind: EventKind, path: &str) -> DebouncedEvent {
        DebouncedEvent {
            event: Event {
                kind,
                paths: vec![PathBuf::from(path)],
                attrs: Default::default(),
            },
            time: Instant::now(),
        }
    }

    fn create(path: &str) -> DebouncedEvent {
        event(EventKind::Create(CreateKind::File), path)
    }

    fn modify(path: &str) -> DebouncedEvent {
        event(EventKind::Modify(ModifyKind::Data(DataChange::Any)), path)
    }

    fn remove(path: &str) -> DebouncedEvent {
        event(EventKind::Remove(RemoveKind::File), path)
    }

    #[test]
    fn test_last_event_wins() {
        let parsers = parsers();
        let out = coalesce_events(&[create("/w/a.txt"), modify("/w/a.txt")], &parsers);

        assert_eq!(out, vec![FileEvent::Modified(PathBuf::from("/w/a.txt"))]);
    }

    #[test]
    fn test_delete_wins_over_pending_events() {
        let parsers = parsers();
        let out = coalesce_events(
            &[create("/w/a.txt"), remove("/w/a.txt"), modify("/w/a.txt")],
            &parsers,
        );

        assert_eq!(out, vec![FileEvent::Deleted(PathBuf::from("/w/a.txt"))]);
    }

    #[test]
    fn test_paths_coalesced_independently() {
        let parsers = parsers();
        let mut out = coalesce_events(
            &[create("/w/a.txt"), create("/w/b.txt"), remove("/w/a.txt")],
            &parsers,
        );
        out.sort_by_key(|e| e.path().to_path_buf());

        assert_eq!(
            out,
            vec![
                FileEvent::Deleted(PathBuf::from("/w/a.txt")),
                FileEvent::Created(PathBuf::from("/w/b.txt")),
            ]
        );
    }

    #[test]
    fn test_unsupported_extensions_ignored() {
        let parsers = parsers();
        let out = coalesce_events(&[create("/w/a.exe"), create("/w/noext")], &parsers);
        assert!(out.is_empty());
    }

    #[test]
    fn test_hidden_files_ignored() {
        let parsers = parsers();
        let out = coalesce_events(&[create("/w/.hidden.txt")], &parsers);
        assert!(out.is_empty());
    }

    #[test]
    fn test_folder_events_dropped_by_kind() {
        let parsers = parsers();
        // A folder named like a document passes the extension filter; its
        // event kind must still exclude it.
        let out = coalesce_events(
            &[
                event(EventKind::Create(CreateKind::Folder), "/w/archive.pdf"),
                event(EventKind::Remove(RemoveKind::Folder), "/w/old.txt"),
            ],
            &parsers,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_other_event_kinds_ignored() {
        let parsers = parsers();
        let out = coalesce_events(&[event(EventKind::Other, "/w/a.txt")], &parsers);
        assert!(out.is_empty());
    }
}
