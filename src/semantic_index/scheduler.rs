//! The per-document debounce scheduler (§5): a single background thread
//! coalesces a burst of edits to the same document into one re-analysis,
//! firing only after 200ms of quiet on that document. Grounded on the same
//! "debounce map of last-seen times, polled on a timeout tick" shape the
//! pack's file-watcher infrastructure uses, adapted from a filesystem-event
//! channel to an edit-notification one and from a leading-edge debounce to a
//! trailing one (re-analysis needs the edit to have settled, not just
//! started).

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Msg {
    Edited { uri: String, version: u64 },
    Closed { uri: String },
    Shutdown,
}

/// Debounces edit notifications per document URI and invokes `on_settle`
/// once a document has gone 200ms without a further edit. `on_settle` runs
/// on the scheduler's own background thread, not the caller's, so it must be
/// `Send + 'static` and should hand off actual re-analysis work quickly
/// (e.g. by dispatching to the worker pool) rather than block this thread.
pub struct DebounceScheduler {
    tx: Sender<Msg>,
    handle: Option<JoinHandle<()>>,
}

impl DebounceScheduler {
    pub fn start<F>(on_settle: F) -> Self
    where
        F: Fn(String, u64) + Send + 'static,
    {
        let (tx, rx) = bounded::<Msg>(1024);
        let handle = thread::spawn(move || run(rx, Arc::new(on_settle)));
        DebounceScheduler { tx, handle: Some(handle) }
    }

    /// Records an edit to `uri` at `version`, resetting its debounce timer.
    /// A later, higher `version` for the same URI replaces any still-pending
    /// one; an out-of-order lower version is ignored.
    pub fn notify_edit(&self, uri: String, version: u64) {
        let _ = self.tx.send(Msg::Edited { uri, version });
    }

    /// Drops any pending debounce for `uri` so a closed document can't fire
    /// a stale re-analysis after it's gone (§4.4 close semantics).
    pub fn notify_close(&self, uri: String) {
        let _ = self.tx.send(Msg::Closed { uri });
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<F>(rx: Receiver<Msg>, on_settle: Arc<F>)
where
    F: Fn(String, u64) + Send + 'static,
{
    let mut pending: HashMap<String, (u64, Instant)> = HashMap::new();
    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Msg::Edited { uri, version }) => {
                match pending.get(&uri) {
                    Some((existing, _)) if *existing > version => {}
                    _ => {
                        pending.insert(uri, (version, Instant::now()));
                    }
                }
            }
            Ok(Msg::Closed { uri }) => {
                pending.remove(&uri);
            }
            Ok(Msg::Shutdown) => return,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return,
        }

        let now = Instant::now();
        let settled: Vec<String> =
            pending.iter().filter(|(_, (_, last_edit))| now.duration_since(*last_edit) >= DEBOUNCE_WINDOW).map(|(uri, _)| uri.clone()).collect();
        for uri in settled {
            if let Some((version, _)) = pending.remove(&uri) {
                crate::index_log!("debounce settled for {uri} v{version}");
                on_settle(uri, version);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[test]
    fn coalesces_rapid_edits_into_one_settle() {
        let fired: Arc<Mutex<Vec<(String, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let fired_clone = fired.clone();
        let scheduler = DebounceScheduler::start(move |uri, version| {
            fired_clone.lock().unwrap().push((uri, version));
        });

        for v in 1..=5 {
            scheduler.notify_edit("a.nv".to_string(), v);
            thread::sleep(Duration::from_millis(10));
        }

        thread::sleep(Duration::from_millis(400));
        let calls = fired.lock().unwrap().clone();
        assert_eq!(calls, vec![("a.nv".to_string(), 5)]);
    }

    #[test]
    fn closed_document_never_settles() {
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();
        let scheduler = DebounceScheduler::start(move |_, _| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.notify_edit("b.nv".to_string(), 1);
        scheduler.notify_close("b.nv".to_string());
        thread::sleep(Duration::from_millis(400));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
