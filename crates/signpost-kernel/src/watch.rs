//! Hot reload: invalidate cached resource files when they change on disk.
//!
//! ```text
//!   notify (own thread)  ──try_send──►  mpsc  ──►  tokio task  ──►  cache.invalidate()
//! ```
//!
//! Only `*.toml` files under the loader root are considered. Invalidation is
//! idempotent, so duplicate events from editors are harmless. The next
//! navigation into an invalidated file reloads it. If the channel fills up,
//! the dropped change is recorded and the task clears the whole cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use signpost_types::FileId;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::cache::ResourceCache;
use crate::loader::LocalLoader;

/// Failure to start watching.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone)]
struct FileChange {
    file: FileId,
    kind: ChangeKind,
}

/// Handle to a running watcher. Dropping it stops the watcher.
pub struct CacheWatcher {
    /// Keeps the OS watch alive.
    _watcher: RecommendedWatcher,
    shutdown_tx: oneshot::Sender<()>,
}

impl std::fmt::Debug for CacheWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWatcher").finish_non_exhaustive()
    }
}

impl CacheWatcher {
    /// Watch `loader`'s root and invalidate entries of `cache`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(loader: &LocalLoader, cache: Arc<ResourceCache>) -> Result<Self, WatchError> {
        let (tx, mut rx) = mpsc::channel::<FileChange>(256);
        let mapper = loader.clone();
        let overflowed = Arc::new(AtomicBool::new(false));
        let dropped = Arc::clone(&overflowed);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "file watcher reported an error");
                        return;
                    }
                };
                let kind = match event.kind {
                    EventKind::Create(_) => ChangeKind::Created,
                    EventKind::Modify(_) => ChangeKind::Modified,
                    EventKind::Remove(_) => ChangeKind::Removed,
                    _ => return,
                };
                for path in &event.paths {
                    if let Some(file) = mapper.file_id_for(path) {
                        forward(&tx, FileChange { file, kind }, &dropped);
                    }
                }
            },
            notify::Config::default().with_poll_interval(Duration::from_millis(500)),
        )?;
        watcher.watch(loader.root(), RecursiveMode::Recursive)?;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        tracing::info!("resource watcher shutting down");
                        break;
                    }
                    Some(change) = rx.recv() => apply(&cache, &change, &overflowed),
                    else => break,
                }
            }
        });

        tracing::info!(root = %loader.root().display(), "resource watcher started");

        Ok(Self {
            _watcher: watcher,
            shutdown_tx,
        })
    }

    /// Stop watching.
    pub fn stop(self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Queue a change; a full channel marks the cache for a full clear.
fn forward(tx: &mpsc::Sender<FileChange>, change: FileChange, overflowed: &AtomicBool) {
    if let Err(TrySendError::Full(change)) = tx.try_send(change) {
        tracing::warn!(file = %change.file, "watch channel full, cache will be cleared");
        overflowed.store(true, Ordering::Release);
    }
}

fn apply(cache: &ResourceCache, change: &FileChange, overflowed: &AtomicBool) {
    let span = tracing::debug_span!("watch.change", file = %change.file, kind = %change.kind);
    span.in_scope(|| {
        if cache.invalidate(&change.file) {
            tracing::info!("reloading changed resource file on next visit");
        }
        if overflowed.swap(false, Ordering::AcqRel) {
            cache.clear();
            tracing::warn!("dropped file changes, cleared the resource cache");
        }
    });
}
