//! Cancellable periodic worker thread
//!
//! A `PeriodicTask` runs one `Periodic` implementation on a named thread:
//! `reload` once at start and whenever a reload is requested, `run` after
//! every wake-up, `finish` once when stopping. The thread sleeps on a
//! condition variable between runs and wakes on its interval, on an explicit
//! [`TaskControl::wake`], or on any status change.
//!
//! Status transitions:
//!
//! ```text
//!   NeedReload ──> Work ──> NeedReload (cyclic)
//!   Work | NeedReload ──> NeedStop ──> Stop (terminal)
//! ```

use crate::error::{Result, TaspError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle status of a periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Work,
    NeedReload,
    NeedStop,
    Stop,
}

impl TaskStatus {
    /// Whether `self -> to` is a legal transition
    pub fn can_transition(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Work, NeedReload)
                | (Work, NeedStop)
                | (NeedReload, Work)
                | (NeedReload, NeedReload)
                | (NeedReload, NeedStop)
                | (NeedStop, Stop)
        )
    }
}

#[derive(Debug)]
struct ControlState {
    status: TaskStatus,
    wake: bool,
}

/// Status and wake-up channel shared between a task and its handles
#[derive(Debug)]
pub struct TaskControl {
    state: Mutex<ControlState>,
    signal: Condvar,
}

impl TaskControl {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ControlState {
                status: TaskStatus::NeedReload,
                wake: false,
            }),
            signal: Condvar::new(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.state.lock().status
    }

    /// Request a transition; refused transitions leave the status untouched
    pub fn change(&self, to: TaskStatus) -> bool {
        let mut state = self.state.lock();
        if !state.status.can_transition(to) {
            return false;
        }
        state.status = to;
        self.signal.notify_all();
        true
    }

    /// Wake the worker without changing status
    pub fn wake(&self) {
        self.state.lock().wake = true;
        self.signal.notify_all();
    }

    pub fn stop_requested(&self) -> bool {
        matches!(self.status(), TaskStatus::NeedStop | TaskStatus::Stop)
    }

    /// Sleep until `timeout`, a wake-up or a pending status change
    fn wait(&self, timeout: Duration) {
        let mut state = self.state.lock();
        self.signal.wait_while_for(
            &mut state,
            |s| s.status == TaskStatus::Work && !s.wake,
            timeout,
        );
        state.wake = false;
    }

    /// Consume a pending reload request
    fn take_reload(&self) -> bool {
        let mut state = self.state.lock();
        if state.status != TaskStatus::NeedReload {
            return false;
        }
        state.status = TaskStatus::Work;
        true
    }
}

/// Work driven by a [`PeriodicTask`]
pub trait Periodic: Send + 'static {
    /// Called on the worker thread before anything else
    fn started(&mut self) {}

    /// (Re)build state, at start and on every reload request
    fn reload(&mut self);

    /// One unit of work after each wake-up
    fn run(&mut self);

    /// Final unit of work once stop is requested
    fn finish(&mut self) {
        self.run();
    }

    /// Longest sleep between two runs
    fn interval(&self) -> Duration;
}

/// Owner of a periodic worker thread; stops and joins it on drop
pub struct PeriodicTask {
    control: Arc<TaskControl>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Start `work` on a thread called `name`
    pub fn spawn<P: Periodic>(name: &str, work: P) -> Result<Self> {
        let control = Arc::new(TaskControl::new());
        let worker = Arc::clone(&control);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_loop(&worker, work))
            .map_err(|source| TaspError::ThreadSpawn {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    pub fn control(&self) -> &Arc<TaskControl> {
        &self.control
    }

    pub fn status(&self) -> TaskStatus {
        self.control.status()
    }

    /// Run the work now instead of at the end of the interval
    pub fn notify(&self) {
        self.control.wake();
    }

    pub fn reload(&self) -> bool {
        self.control.change(TaskStatus::NeedReload)
    }

    /// Request stop and wait for the final run
    pub fn stop(&mut self) {
        self.control.change(TaskStatus::NeedStop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<P: Periodic>(control: &TaskControl, mut work: P) {
    work.started();

    // The first reload runs even when stop was requested before the thread got here.
    control.take_reload();
    work.reload();

    while !control.stop_requested() {
        control.wait(work.interval());
        if control.take_reload() {
            work.reload();
        }
        work.run();
    }

    work.finish();
    control.change(TaskStatus::Stop);
}
