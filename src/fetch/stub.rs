//! Deterministic sessions for tests that must not touch the network.
//!
//! [`StubSession`] replays scripted outcomes synchronously from `resume`.
//! [`ManualSession`] parks every handler until the test completes it, which
//! makes ordering and threading observable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use reqwest::Url;

use super::session::{CompletionHandler, NetworkSession, NetworkTask, RawOutcome};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Hands out tasks that complete with the next scripted outcome as soon as
/// they are resumed. Once the script runs out, tasks complete with an empty
/// outcome.
#[derive(Default)]
pub struct StubSession {
    outcomes: Mutex<VecDeque<RawOutcome>>,
    requested: Mutex<Vec<Url>>,
    resumes: Arc<AtomicUsize>,
}

impl StubSession {
    pub fn new(outcomes: impl IntoIterator<Item = RawOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// URLs passed to `data_task`, in call order.
    pub fn requested_urls(&self) -> Vec<Url> {
        lock(&self.requested).clone()
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl NetworkSession for StubSession {
    fn data_task(&self, url: &Url, handler: CompletionHandler) -> Box<dyn NetworkTask> {
        lock(&self.requested).push(url.clone());
        let outcome = lock(&self.outcomes).pop_front().unwrap_or_default();
        Box::new(StubTask {
            pending: Mutex::new(Some((handler, outcome))),
            resumes: self.resumes.clone(),
        })
    }
}

struct StubTask {
    pending: Mutex<Option<(CompletionHandler, RawOutcome)>>,
    resumes: Arc<AtomicUsize>,
}

impl NetworkTask for StubTask {
    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        let pending = lock(&self.pending).take();
        if let Some((handler, outcome)) = pending {
            handler(outcome);
        }
    }
}

struct Parked {
    handler: Option<CompletionHandler>,
    started: Arc<AtomicUsize>,
}

/// Parks handlers until [`ManualSession::complete`] is called, possibly from
/// another thread.
#[derive(Default)]
pub struct ManualSession {
    parked: Mutex<Vec<Parked>>,
    resumes: Arc<AtomicUsize>,
}

impl ManualSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    /// Number of handlers that have not been completed yet.
    pub fn pending(&self) -> usize {
        lock(&self.parked)
            .iter()
            .filter(|p| p.handler.is_some())
            .count()
    }

    /// Fires the handler of the `index`-th task created by this session.
    ///
    /// Returns `false` if there is no such task, it was never resumed, or it
    /// has already completed.
    pub fn complete(&self, index: usize, outcome: RawOutcome) -> bool {
        let handler = {
            let mut parked = lock(&self.parked);
            match parked.get_mut(index) {
                Some(p) if p.started.load(Ordering::SeqCst) > 0 => p.handler.take(),
                _ => None,
            }
        };

        match handler {
            Some(handler) => {
                handler(outcome);
                true
            }
            None => false,
        }
    }
}

impl NetworkSession for ManualSession {
    fn data_task(&self, _url: &Url, handler: CompletionHandler) -> Box<dyn NetworkTask> {
        let started = Arc::new(AtomicUsize::new(0));
        lock(&self.parked).push(Parked {
            handler: Some(handler),
            started: started.clone(),
        });
        Box::new(ManualTask {
            started,
            resumes: self.resumes.clone(),
        })
    }
}

struct ManualTask {
    started: Arc<AtomicUsize>,
    resumes: Arc<AtomicUsize>,
}

impl NetworkTask for ManualTask {
    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
    }
}
