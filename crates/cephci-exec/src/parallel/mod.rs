//! Scoped fan-out of blocking work onto a bounded set of OS threads.
//!
//! A [`Parallel`] runner accepts any number of tasks while open, runs them on worker
//! threads, and hands results back in completion order. The first task failure is
//! delivered exactly once, either from iteration or from [`Parallel::close`]; queued
//! tasks that have not started by then are abandoned, in-flight ones run to the end.
//!
//! ```no_run
//! use cephci_exec::parallel::{self, ParallelConfig};
//!
//! let hosts = vec!["mon-1".to_string(), "osd-1".to_string()];
//! let seen: Vec<String> = parallel::scope(ParallelConfig::default(), |p| {
//!     for host in hosts {
//!         p.spawn(move || Ok(host))?;
//!     }
//!     p.by_ref().collect::<Result<Vec<_>, _>>()
//! })?;
//! # Ok::<(), cephci_exec::parallel::ParallelError>(())
//! ```
mod error;
pub use error::ParallelError;

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, trace, warn};

/// Worker pool settings for a [`Parallel`] scope.
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Upper bound on worker threads. `None` starts one worker per spawned task.
    pub max_workers: Option<usize>,
    /// Prefix for worker thread names (`<prefix>-<n>`).
    pub thread_name: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            thread_name: "cephci-parallel".to_string(),
        }
    }
}

impl ParallelConfig {
    pub fn with_max_workers(max_workers: usize) -> Self {
        Self {
            max_workers: Some(max_workers.max(1)),
            ..Self::default()
        }
    }

    fn worker_limit(&self) -> usize {
        self.max_workers.unwrap_or(usize::MAX).max(1)
    }
}

type Job<T> = Box<dyn FnOnce() -> anyhow::Result<T> + Send + 'static>;

struct Task<T> {
    name: String,
    job: Job<T>,
}

enum Outcome<T> {
    Done(T),
    Failed(ParallelError),
    /// Dequeued after a failure and never started.
    Abandoned,
}

struct Completion<T> {
    task: String,
    outcome: Outcome<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeState {
    Open,
    /// A failure has been handed to the caller through iteration.
    Failed,
    Closed,
}

/// Open parallel scope.
///
/// Iterating yields `Ok(value)` per finished task in completion order. The first
/// failure is yielded as `Err` and ends the iteration. Dropping the runner closes it.
pub struct Parallel<T: Send + 'static> {
    cfg: ParallelConfig,
    queue: Option<Sender<Task<T>>>,
    queue_rx: Receiver<Task<T>>,
    done_tx: Option<Sender<Completion<T>>>,
    done_rx: Receiver<Completion<T>>,
    workers: Vec<JoinHandle<()>>,
    abort: Arc<AtomicBool>,
    submitted: usize,
    pending: usize,
    state: ScopeState,
    /// Worker index from which thread creation fails.
    #[cfg(test)]
    refuse_workers_from: Option<usize>,
}

impl<T: Send + 'static> Default for Parallel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Parallel<T> {
    /// Opens a scope with one worker per spawned task.
    pub fn new() -> Self {
        Self::with_config(ParallelConfig::default())
    }

    pub fn with_config(cfg: ParallelConfig) -> Self {
        let (queue, queue_rx) = channel::unbounded();
        let (done_tx, done_rx) = channel::unbounded();
        Self {
            cfg,
            queue: Some(queue),
            queue_rx,
            done_tx: Some(done_tx),
            done_rx,
            workers: Vec::new(),
            abort: Arc::new(AtomicBool::new(false)),
            submitted: 0,
            pending: 0,
            state: ScopeState::Open,
            #[cfg(test)]
            refuse_workers_from: None,
        }
    }

    /// Queues `f` under the name `task-<n>`.
    pub fn spawn<F>(&mut self, f: F) -> Result<(), ParallelError>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        let name = format!("task-{}", self.submitted);
        self.spawn_named(name, f)
    }

    /// Queues `f`; returns without waiting for it to start.
    ///
    /// Fails with [`ParallelError::ScopeClosed`] once the scope is closed and with
    /// [`ParallelError::Aborted`] once a failure has been yielded to the caller.
    pub fn spawn_named<F>(&mut self, name: impl Into<String>, f: F) -> Result<(), ParallelError>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    {
        match self.state {
            ScopeState::Closed => return Err(ParallelError::ScopeClosed),
            ScopeState::Failed => return Err(ParallelError::Aborted),
            ScopeState::Open => {}
        }
        let name = name.into();

        if self.workers.len() < self.cfg.worker_limit() {
            match self.start_worker() {
                Ok(()) => {}
                Err(e) if self.workers.is_empty() => return Err(e),
                Err(e) => {
                    warn!(
                        target: "cephci.exec.parallel",
                        workers = self.workers.len(),
                        error = %e,
                        "could not grow pool; queueing on live workers"
                    );
                }
            }
        }

        let queue = self.queue.as_ref().ok_or(ParallelError::ScopeClosed)?;
        trace!(target: "cephci.exec.parallel", task = %name, "spawn");
        queue
            .send(Task {
                name,
                job: Box::new(f),
            })
            .map_err(|_| ParallelError::ScopeClosed)?;

        self.submitted += 1;
        self.pending += 1;
        Ok(())
    }

    /// Tasks queued or running whose outcome has not been observed yet.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Live worker threads. Zero once the scope is closed.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state == ScopeState::Closed
    }

    /// Collects every remaining result, then closes the scope.
    pub fn join(mut self) -> Result<Vec<T>, ParallelError> {
        let mut out = Vec::with_capacity(self.pending);
        for item in self.by_ref() {
            out.push(item?);
        }
        self.close()?;
        Ok(out)
    }

    /// Waits for outstanding tasks, joins every worker and closes the scope.
    ///
    /// Returns the first task failure unless iteration already yielded one. Results
    /// nobody iterated over are dropped. Calling `close` again is a no-op.
    pub fn close(&mut self) -> Result<(), ParallelError> {
        if self.state == ScopeState::Closed {
            return Ok(());
        }
        let surfaced = self.state == ScopeState::Failed;

        // Workers exit once the queue is drained; the completion channel then disconnects.
        self.queue.take();
        self.done_tx.take();

        let mut first = None;
        let (mut dropped, mut abandoned) = (0usize, 0usize);
        for Completion { task, outcome } in self.done_rx.iter() {
            self.pending = self.pending.saturating_sub(1);
            match outcome {
                Outcome::Done(_) => dropped += 1,
                Outcome::Abandoned => abandoned += 1,
                Outcome::Failed(e) => {
                    self.abort.store(true, Ordering::Release);
                    if surfaced || first.is_some() {
                        debug!(target: "cephci.exec.parallel", task, error = %e, "suppressed failure after the first");
                    } else {
                        first = Some(e);
                    }
                }
            }
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!(target: "cephci.exec.parallel", "worker thread panicked outside a task");
            }
        }
        self.state = ScopeState::Closed;

        debug!(
            target: "cephci.exec.parallel",
            submitted = self.submitted,
            dropped,
            abandoned,
            "scope closed"
        );
        first.map_or(Ok(()), Err)
    }

    fn start_worker(&mut self) -> Result<(), ParallelError> {
        let id = self.workers.len();
        let jobs = self.queue_rx.clone();
        let done = self.done_tx.clone().ok_or(ParallelError::ScopeClosed)?;
        let abort = Arc::clone(&self.abort);

        #[cfg(test)]
        if self.refuse_workers_from.is_some_and(|n| id >= n) {
            return Err(std::io::Error::other("thread limit reached").into());
        }

        let handle = thread::Builder::new()
            .name(format!("{}-{id}", self.cfg.thread_name))
            .spawn(move || worker_loop(id, jobs, done, abort))?;
        self.workers.push(handle);
        Ok(())
    }
}

impl<T: Send + 'static> Iterator for Parallel<T> {
    type Item = Result<T, ParallelError>;

    /// Blocks until the next task finishes.
    fn next(&mut self) -> Option<Self::Item> {
        while self.state == ScopeState::Open && self.pending > 0 {
            // The runner keeps a completion sender while open, so this only fails if
            // every worker is gone.
            let Completion { task, outcome } = self.done_rx.recv().ok()?;
            self.pending -= 1;
            match outcome {
                Outcome::Done(value) => return Some(Ok(value)),
                Outcome::Failed(e) => {
                    self.state = ScopeState::Failed;
                    self.abort.store(true, Ordering::Release);
                    return Some(Err(e));
                }
                Outcome::Abandoned => {
                    trace!(target: "cephci.exec.parallel", task, "abandoned");
                }
            }
        }
        None
    }
}

impl<T: Send + 'static> Drop for Parallel<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(target: "cephci.exec.parallel", error = %e, "scope dropped with an unobserved task failure");
        }
    }
}

/// Runs `body` against a fresh scope and always closes it afterwards.
///
/// The body's own error wins; otherwise a failure still pending at close is returned.
pub fn scope<T, R, E, F>(cfg: ParallelConfig, body: F) -> Result<R, E>
where
    T: Send + 'static,
    F: FnOnce(&mut Parallel<T>) -> Result<R, E>,
    E: From<ParallelError>,
{
    let mut runner = Parallel::with_config(cfg);
    let out = body(&mut runner);
    let closed = runner.close();

    match (out, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(superseded)) => {
            debug!(target: "cephci.exec.parallel", error = %superseded, "task failure superseded by scope error");
            Err(e)
        }
    }
}

fn worker_loop<T>(
    id: usize,
    jobs: Receiver<Task<T>>,
    done: Sender<Completion<T>>,
    abort: Arc<AtomicBool>,
) {
    trace!(target: "cephci.exec.parallel", worker = id, "worker started");
    for Task { name, job } in jobs.iter() {
        let outcome = if abort.load(Ordering::Acquire) {
            Outcome::Abandoned
        } else {
            run_job(&name, job, &abort)
        };
        if done
            .send(Completion {
                task: name,
                outcome,
            })
            .is_err()
        {
            break;
        }
    }
    trace!(target: "cephci.exec.parallel", worker = id, "worker stopped");
}

fn run_job<T>(name: &str, job: Job<T>, abort: &AtomicBool) -> Outcome<T> {
    let failure = match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(value)) => return Outcome::Done(value),
        Ok(Err(cause)) => ParallelError::Task {
            task: name.to_string(),
            cause,
        },
        Err(payload) => ParallelError::Panicked {
            task: name.to_string(),
            message: panic_message(payload.as_ref()),
        },
    };
    abort.store(true, Ordering::Release);
    Outcome::Failed(failure)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
