use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

type Action<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

struct Scheduled {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

/// Collapses bursts of calls into one call issued after a quiet period.
///
/// Each `call` cancels the previously scheduled call if its timer has not
/// fired yet, then schedules the action after `delay`. Calls are
/// fire-and-forget: the action reports through shared state. Tearing the gate
/// down (or dropping it) aborts the pending timer and any action still running.
///
/// `call` must be made from within a tokio runtime.
pub struct DebounceGate<T> {
    delay: Duration,
    action: Action<T>,
    pending: Mutex<Option<Scheduled>>,
    running: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl<T: Send + 'static> DebounceGate<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            action: Arc::new(move |arg: T| action(arg).boxed()),
            pending: Mutex::new(None),
            running: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Re-arm the gate with `arg`.
    pub fn call(&self, arg: T) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            self.retire(previous);
        }

        let fired = Arc::new(AtomicBool::new(false));
        let fired_flag = fired.clone();
        let action = self.action.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fired_flag.store(true, Ordering::SeqCst);
            action(arg).await;
        });

        *pending = Some(Scheduled { handle, fired });
    }

    /// Drop the scheduled call if its timer is still pending.
    /// Returns whether a call was cancelled.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock();
        match pending.take() {
            Some(scheduled) if !scheduled.fired.load(Ordering::SeqCst) => {
                scheduled.handle.abort();
                trace!("debounced call cancelled");
                true
            }
            Some(scheduled) => {
                self.retire(scheduled);
                false
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|s| !s.fired.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Permanently disarm the gate: no scheduled or running action survives.
    pub fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(scheduled) = self.pending.lock().take() {
            scheduled.handle.abort();
        }
        for handle in self.running.lock().drain(..) {
            handle.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // A superseded call either never fired (abort it) or is mid-action
    // (keep its handle so teardown can still abort it).
    fn retire(&self, scheduled: Scheduled) {
        if scheduled.fired.load(Ordering::SeqCst) {
            let mut running = self.running.lock();
            running.retain(|h| !h.is_finished());
            running.push(scheduled.handle);
        } else {
            scheduled.handle.abort();
            trace!("debounced call superseded");
        }
    }
}

impl<T> Drop for DebounceGate<T> {
    fn drop(&mut self) {
        if let Some(scheduled) = self.pending.get_mut().take() {
            scheduled.handle.abort();
        }
        for handle in self.running.get_mut().drain(..) {
            handle.abort();
        }
    }
}
