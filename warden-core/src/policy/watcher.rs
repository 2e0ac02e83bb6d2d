//! Hot reload of the policy file.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

#[cfg(feature = "watch")]
pub use file::FileWatcher;

/// Default window in which change notifications collapse into one reload.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Something that keeps a [`PolicyStore`](super::PolicyStore) in sync with
/// its backing file.
///
/// `start` and `stop` are idempotent.
pub trait PolicyWatcher: Send {
    /// Begin watching. Returns false when watching is unavailable, in which
    /// case the store keeps its current document until reloaded by hand.
    fn start(&mut self) -> bool;

    /// Stop watching. A reload already running finishes; none is scheduled
    /// afterwards.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// A watcher that never watches.
///
/// Used where file notifications are unavailable or unwanted.
#[derive(Debug, Default)]
pub struct NoopWatcher;

impl PolicyWatcher for NoopWatcher {
    fn start(&mut self) -> bool {
        tracing::info!("policy file watching disabled; use a manual reload to apply changes");
        false
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Changed,
    Shutdown,
}

/// Collapse bursts of `Changed` signals into single calls to `on_settled`.
///
/// After a change, waits until `window` passes with no further change, then
/// fires once. Returns on `Shutdown` or when every sender is gone, dropping
/// any change still waiting to settle.
fn debounce_loop(rx: Receiver<Signal>, window: Duration, mut on_settled: impl FnMut()) {
    loop {
        match rx.recv() {
            Ok(Signal::Changed) => {}
            Ok(Signal::Shutdown) | Err(_) => return,
        }

        loop {
            match rx.recv_timeout(window) {
                Ok(Signal::Changed) => continue,
                Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        on_settled();
    }
}

#[cfg(feature = "watch")]
mod file {
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{self, Sender};
    use std::sync::Arc;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

    use super::{debounce_loop, PolicyWatcher, Signal, DEFAULT_DEBOUNCE};
    use crate::policy::PolicyStore;

    /// Watches the policy file with the platform's native notification API
    /// and reloads the store after changes settle.
    ///
    /// The parent directory is watched and events are filtered by file name,
    /// so editors that replace the file via rename are still picked up.
    pub struct FileWatcher {
        store: Arc<PolicyStore>,
        debounce: Duration,
        running: Option<Running>,
    }

    struct Running {
        // Dropping the watcher unregisters it
        watcher: RecommendedWatcher,
        signals: Sender<Signal>,
        worker: JoinHandle<()>,
    }

    impl FileWatcher {
        pub fn new(store: Arc<PolicyStore>) -> Self {
            Self {
                store,
                debounce: DEFAULT_DEBOUNCE,
                running: None,
            }
        }

        pub fn with_debounce(mut self, debounce: Duration) -> Self {
            self.debounce = debounce;
            self
        }

        fn spawn(&self, path: &Path) -> Result<Running, String> {
            let file_name: OsString = path
                .file_name()
                .ok_or_else(|| format!("policy path {} has no file name", path.display()))?
                .to_os_string();
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };

            let (tx, rx) = mpsc::channel();
            let events = tx.clone();
            let mut watcher =
                notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
                    let event = match result {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::warn!(error = %err, "policy watcher error");
                            return;
                        }
                    };
                    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                        return;
                    }
                    let touches_policy = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                    if touches_policy {
                        let _ = events.send(Signal::Changed);
                    }
                })
                .map_err(|e| e.to_string())?;

            watcher
                .watch(&directory, RecursiveMode::NonRecursive)
                .map_err(|e| e.to_string())?;

            let store = Arc::clone(&self.store);
            let worker = std::thread::Builder::new()
                .name("policy-reload".to_string())
                .spawn({
                    let debounce = self.debounce;
                    move || {
                        debounce_loop(rx, debounce, || {
                            tracing::info!("policy file changed; reloading");
                            store.reload();
                        })
                    }
                })
                .map_err(|e| e.to_string())?;

            Ok(Running {
                watcher,
                signals: tx,
                worker,
            })
        }
    }

    impl PolicyWatcher for FileWatcher {
        fn start(&mut self) -> bool {
            if self.running.is_some() {
                return true;
            }
            let Some(path) = self.store.path().map(Path::to_path_buf) else {
                tracing::warn!("policy store has no backing file; hot reload unavailable");
                return false;
            };

            match self.spawn(&path) {
                Ok(running) => {
                    tracing::info!(
                        path = %path.display(),
                        debounce_ms = self.debounce.as_millis() as u64,
                        "watching policy file"
                    );
                    self.running = Some(running);
                    true
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "file watching unavailable; hot reload disabled"
                    );
                    false
                }
            }
        }

        fn stop(&mut self) {
            let Some(running) = self.running.take() else {
                return;
            };
            let Running {
                watcher,
                signals,
                worker,
            } = running;
            // Unregister first so no new change can arrive after shutdown
            drop(watcher);
            let _ = signals.send(Signal::Shutdown);
            drop(signals);
            if worker.join().is_err() {
                tracing::error!("policy reload worker panicked");
            }
            tracing::info!("stopped watching policy file");
        }

        fn is_running(&self) -> bool {
            self.running.is_some()
        }
    }

    impl Drop for FileWatcher {
        fn drop(&mut self) {
            self.stop();
        }
    }
}
