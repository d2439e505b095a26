//! Scheduled-fetch channel.
//!
//! A [`PollingChannel`] repeatedly invokes a read operation on a fixed
//! interval and publishes the latest successful value through a tokio watch
//! channel, so every consumer of one data stream shares a single poller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, trace};

use crate::api::FetchError;
use crate::data::Validate;

/// Boxed future returned by a channel's read operation.
pub type ReadFuture<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;

type ReadFn<T> = Arc<dyn Fn() -> ReadFuture<T> + Send + Sync>;

/// Observable state of a polling channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState<T> {
    /// Last successfully read value, or the initial default.
    pub latest: T,
    /// Most recent failure, cleared by the next success.
    pub last_error: Option<String>,
    /// True until the first successful read of the current run.
    pub loading: bool,
    /// Failed reads since the last success.
    pub consecutive_failures: u32,
    /// When the last successful value was stored.
    pub updated_at: Option<Instant>,
}

impl<T> ChannelState<T> {
    fn initial(latest: T) -> Self {
        Self {
            latest,
            last_error: None,
            loading: true,
            consecutive_failures: 0,
            updated_at: None,
        }
    }

    /// Project the value while keeping the channel bookkeeping.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> ChannelState<U> {
        ChannelState {
            latest: f(&self.latest),
            last_error: self.last_error.clone(),
            loading: self.loading,
            consecutive_failures: self.consecutive_failures,
            updated_at: self.updated_at,
        }
    }

    /// Time since the last successful read.
    pub fn age(&self) -> Option<Duration> {
        self.updated_at.map(|at| at.elapsed())
    }
}

/// Publishing side shared between the channel handle and its tick task.
///
/// `run` holds the generation of the task allowed to publish; stopping sets
/// it to `None` under the same lock a publish takes, so nothing published
/// after `stop()` returns is ever observed.
struct Shared<T> {
    state: watch::Sender<ChannelState<T>>,
    run: Mutex<Option<u64>>,
}

impl<T> Shared<T> {
    fn publish(&self, generation: u64, outcome: Result<T, FetchError>, name: &str) {
        let run = self.run.lock();
        if *run != Some(generation) {
            trace!(channel = name, "discarding completion from stopped run");
            return;
        }

        match outcome {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.latest = value;
                    state.last_error = None;
                    state.loading = false;
                    state.consecutive_failures = 0;
                    state.updated_at = Some(Instant::now());
                });
            }
            Err(err) => {
                debug!(channel = name, error = %err, "read failed, keeping previous value");
                self.record_failure(err.to_string());
            }
        }
    }

    fn record_failure(&self, reason: String) {
        self.state.send_modify(|state| {
            state.last_error = Some(reason);
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        });
    }
}

/// Owned by the tick task. The loop never returns, so dropping this while
/// its generation still holds the gate means the task died (a panicking
/// read or validation) rather than being stopped.
struct ExitGuard<T> {
    shared: Arc<Shared<T>>,
    generation: u64,
    name: String,
}

impl<T> Drop for ExitGuard<T> {
    fn drop(&mut self) {
        let run = self.shared.run.lock();
        if *run != Some(self.generation) {
            return;
        }
        error!(channel = %self.name, "polling task exited unexpectedly");
        self.shared
            .record_failure("Polling task exited unexpectedly".to_string());
    }
}

/// Repeatedly reads a remote value on a fixed interval.
///
/// - The first read fires immediately on [`start`](Self::start).
/// - Reads never overlap: a tick that comes due while a read is outstanding
///   is skipped, not queued.
/// - Every read is bounded by `timeout`; a timeout counts as a failure.
/// - A failure keeps the previous value and records the error.
/// - [`stop`](Self::stop) guarantees no further state changes, including
///   from a read that is already in flight.
pub struct PollingChannel<T> {
    name: String,
    interval: Duration,
    timeout: Duration,
    initial: T,
    read: ReadFn<T>,
    shared: Arc<Shared<T>>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl<T> fmt::Debug for PollingChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingChannel")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field(
                "running",
                &self.task.as_ref().is_some_and(|task| !task.is_finished()),
            )
            .finish()
    }
}

impl<T> PollingChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a stopped channel.
    ///
    /// `initial` is what [`latest`](Self::latest) returns until the first
    /// successful read.
    pub fn new<F, Fut>(name: &str, interval: Duration, timeout: Duration, initial: T, read: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let (state, _) = watch::channel(ChannelState::initial(initial.clone()));
        let read: ReadFn<T> = Arc::new(move || Box::pin(read()) as ReadFuture<T>);
        Self {
            name: name.to_string(),
            interval,
            timeout,
            initial,
            read,
            shared: Arc::new(Shared {
                state,
                run: Mutex::new(None),
            }),
            task: None,
            generation: 0,
        }
    }

    /// Begin polling. Resets the channel to its initial, loading state.
    ///
    /// Calling `start` on a running channel does nothing. A channel whose
    /// task has died is not running, so `start` revives it.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        {
            let mut run = self.shared.run.lock();
            self.shared.state.send_replace(ChannelState::initial(self.initial.clone()));
            *run = Some(generation);
        }

        let shared = self.shared.clone();
        let read = self.read.clone();
        let name = self.name.clone();
        let period = self.interval;
        let timeout = self.timeout;

        debug!(channel = %name, ?period, "starting channel");
        self.task = Some(tokio::spawn(async move {
            let _guard = ExitGuard {
                shared: shared.clone(),
                generation,
                name: name.clone(),
            };
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let outcome = match tokio::time::timeout(timeout, read()).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout),
                };
                shared.publish(generation, outcome, &name);
            }
        }));
    }

    /// Stop polling. Safe to call at any time; idempotent.
    pub fn stop(&mut self) {
        *self.shared.run.lock() = None;
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(channel = %self.name, "stopped channel");
        }
    }

    /// True while the tick task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Last successful value, or the initial default.
    pub fn latest(&self) -> T {
        self.shared.state.borrow().latest.clone()
    }

    /// Most recent failure reason, cleared on the next success.
    pub fn last_error(&self) -> Option<String> {
        self.shared.state.borrow().last_error.clone()
    }

    /// True only before the first successful response of the current run.
    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.state.borrow().consecutive_failures
    }

    /// Full state snapshot.
    pub fn state(&self) -> ChannelState<T> {
        self.shared.state.borrow().clone()
    }

    /// Subscribe to state changes. All subscribers share this channel's poller.
    pub fn subscribe(&self) -> watch::Receiver<ChannelState<T>> {
        self.shared.state.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<T> PollingChannel<T>
where
    T: Clone + Send + Sync + Validate + 'static,
{
    /// Like [`new`](Self::new), but decoded values that violate a data
    /// invariant are turned into [`FetchError::Invalid`] failures.
    pub fn validated<F, Fut>(name: &str, interval: Duration, timeout: Duration, initial: T, read: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        Self::new(name, interval, timeout, initial, move || {
            let fut = read();
            async move {
                let value = fut.await?;
                value.validate().map_err(FetchError::Invalid)?;
                Ok(value)
            }
        })
    }
}

impl<T> Drop for PollingChannel<T> {
    fn drop(&mut self) {
        *self.shared.run.lock() = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
