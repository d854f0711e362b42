//! Deferred remote operations over a bounded worker pool.
//!
//! Every remote call returns an [`Operation`]: a unit of work that runs on a
//! background worker, delivers its outcome to registered continuations in
//! registration order, and can be blocked on with [`Operation::join`].

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, mpsc};
use std::thread;

use crate::error::StoreError;

type Job = Box<dyn FnOnce() + Send + 'static>;
type Work<T> = Box<dyn FnOnce() -> Result<T, StoreError> + Send + 'static>;
type SuccessFn<T> = Box<dyn FnOnce(&T) + Send + 'static>;
type FailureFn = Box<dyn FnOnce(&StoreError) + Send + 'static>;

/// Fixed-size worker pool. Submitting more work than there are workers queues
/// it; nothing spawns per-operation threads.
pub struct Executor {
    tx: Option<mpsc::Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl Executor {
    pub fn new(workers: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                thread::spawn(move || {
                    loop {
                        let job = match rx.lock() {
                            Ok(guard) => guard.recv(),
                            Err(_) => break,
                        };
                        match job {
                            Ok(job) => job(),
                            Err(_) => break,
                        }
                    }
                })
            })
            .collect();
        Self {
            tx: Some(tx),
            workers,
        }
    }

    fn submit(&self, job: Job) {
        if let Some(tx) = &self.tx {
            // Send only fails once the pool is shutting down; queued work is
            // dropped with it.
            let _ = tx.send(job);
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

enum Phase<T> {
    Pending,
    Running,
    Succeeded(Arc<T>),
    Failed(Arc<StoreError>),
}

struct State<T> {
    phase: Phase<T>,
    work: Option<Work<T>>,
    on_success: VecDeque<SuccessFn<T>>,
    on_failure: VecDeque<FailureFn>,
    // True while the completing worker is still draining continuations.
    delivering: bool,
}

struct Inner<T> {
    state: Mutex<State<T>>,
    done: Condvar,
}

/// A deferred, possibly-failing remote computation.
///
/// The terminal state is reached at most once and every registered
/// continuation fires exactly once. Failures never cross the async boundary
/// by throwing: they are observable only through [`Operation::on_failure`] or
/// the result of [`Operation::join`].
#[must_use = "a dropped operation loses its failure; register on_failure or join it"]
pub struct Operation<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Operation<T> {
    /// Wraps `work` without running it. Continuations registered on a
    /// never-executed operation are never invoked.
    pub fn new(work: impl FnOnce() -> Result<T, StoreError> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    phase: Phase::Pending,
                    work: Some(Box::new(work)),
                    on_success: VecDeque::new(),
                    on_failure: VecDeque::new(),
                    delivering: false,
                }),
                done: Condvar::new(),
            }),
        }
    }

    /// Submits the work to the pool and returns immediately. Idempotent; a
    /// second call is a no-op.
    pub fn execute(&self, exec: &Executor) {
        let work = {
            let mut st = self.lock();
            if !matches!(st.phase, Phase::Pending) {
                return;
            }
            let Some(work) = st.work.take() else {
                return;
            };
            st.phase = Phase::Running;
            work
        };

        let inner = Arc::clone(&self.inner);
        exec.submit(Box::new(move || {
            let result = work();
            Self::complete(&inner, result);
        }));
    }

    /// Registers a success continuation. Before completion it is queued to run
    /// on the worker thread, in registration order; after completion it runs
    /// immediately on the calling thread. Returns the operation for chaining.
    pub fn on_success(self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        let mut f = Some(f);
        let run_now = {
            let mut guard = self.lock();
            let st = &mut *guard;
            match &st.phase {
                Phase::Pending | Phase::Running => {
                    if let Some(f) = f.take() {
                        st.on_success.push_back(Box::new(f));
                    }
                    None
                }
                Phase::Succeeded(v) => {
                    if st.delivering {
                        if let Some(f) = f.take() {
                            st.on_success.push_back(Box::new(f));
                        }
                        None
                    } else {
                        Some(Arc::clone(v))
                    }
                }
                Phase::Failed(_) => None,
            }
        };
        if let (Some(v), Some(f)) = (run_now, f.take()) {
            f(&v);
        }
        self
    }

    /// Registers a failure continuation; delivery rules mirror
    /// [`Operation::on_success`].
    pub fn on_failure(self, f: impl FnOnce(&StoreError) + Send + 'static) -> Self {
        let mut f = Some(f);
        let run_now = {
            let mut guard = self.lock();
            let st = &mut *guard;
            match &st.phase {
                Phase::Pending | Phase::Running => {
                    if let Some(f) = f.take() {
                        st.on_failure.push_back(Box::new(f));
                    }
                    None
                }
                Phase::Failed(e) => {
                    if st.delivering {
                        if let Some(f) = f.take() {
                            st.on_failure.push_back(Box::new(f));
                        }
                        None
                    } else {
                        Some(Arc::clone(e))
                    }
                }
                Phase::Succeeded(_) => None,
            }
        };
        if let (Some(e), Some(f)) = (run_now, f.take()) {
            f(&e);
        }
        self
    }

    /// Blocks until the operation reaches a terminal state and all queued
    /// continuations have been delivered. Idempotent: once terminal, returns
    /// immediately.
    pub fn join(&self) -> Result<T, StoreError>
    where
        T: Clone,
    {
        let mut st = self.lock();
        if matches!(st.phase, Phase::Pending) {
            return Err(StoreError::LocalIo(
                "operation was never started".to_string(),
            ));
        }
        while matches!(st.phase, Phase::Running) || st.delivering {
            st = match self.inner.done.wait(st) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        match &st.phase {
            Phase::Succeeded(v) => Ok((**v).clone()),
            Phase::Failed(e) => Err((**e).clone()),
            Phase::Pending | Phase::Running => Err(StoreError::LocalIo(
                "operation state lost before completion".to_string(),
            )),
        }
    }

    fn complete(inner: &Arc<Inner<T>>, result: Result<T, StoreError>) {
        let mut st = match inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        st.phase = match result {
            Ok(v) => Phase::Succeeded(Arc::new(v)),
            Err(e) => Phase::Failed(Arc::new(e)),
        };
        st.delivering = true;

        // Drain continuations one at a time without holding the lock, so a
        // continuation may register further continuations on this operation.
        loop {
            enum Next<T> {
                Run(SuccessFn<T>, Arc<T>),
                Fail(FailureFn, Arc<StoreError>),
                Done,
            }
            let next = {
                let state = &mut *st;
                match &state.phase {
                    Phase::Succeeded(v) => {
                        state.on_failure.clear();
                        match state.on_success.pop_front() {
                            Some(cb) => Next::Run(cb, Arc::clone(v)),
                            None => Next::Done,
                        }
                    }
                    Phase::Failed(e) => {
                        state.on_success.clear();
                        match state.on_failure.pop_front() {
                            Some(cb) => Next::Fail(cb, Arc::clone(e)),
                            None => Next::Done,
                        }
                    }
                    Phase::Pending | Phase::Running => Next::Done,
                }
            };
            match next {
                Next::Done => break,
                Next::Run(cb, v) => {
                    drop(st);
                    cb(&v);
                }
                Next::Fail(cb, e) => {
                    drop(st);
                    cb(&e);
                }
            }
            st = match inner.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }

        st.delivering = false;
        drop(st);
        inner.done.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
#[path = "tests/exec/operation_tests.rs"]
mod tests;
