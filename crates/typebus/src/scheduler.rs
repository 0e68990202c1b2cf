//! Execution contexts for routed subscriptions.
//!
//! A [`Scheduler`] has a single job: run a callback somewhere. The bus never
//! owns one; callers pass a scheduler when subscribing with
//! [`EventBus::on_receive_on`](crate::EventBus::on_receive_on) and every
//! delivery to that subscription is handed to it.
//!
//! | Scheduler | Where the callback runs |
//! |-----------|-------------------------|
//! | [`Immediate`] | inline, on the thread that scheduled it |
//! | [`tokio::runtime::Handle`] | a task on that runtime (`runtime` feature) |
//! | [`SerialScheduler`] | one dedicated thread, FIFO (`runtime` feature) |

use std::sync::Arc;

/// A unit of work handed to a scheduler.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that can run callbacks.
pub trait Scheduler: Send + Sync + 'static {
    /// Run `job` on this context.
    ///
    /// Must not block waiting for the job to finish unless the context is
    /// the calling thread itself.
    fn schedule(&self, job: Job);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<S: Scheduler> Scheduler for Arc<S> {
    fn schedule(&self, job: Job) {
        (**self).schedule(job);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Runs every job inline on the scheduling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Scheduler for Immediate {
    fn schedule(&self, job: Job) {
        job();
    }

    fn name(&self) -> &str {
        "immediate"
    }
}

#[cfg(feature = "runtime")]
pub use self::runtime::{SerialScheduler, runtime_handle};

#[cfg(feature = "runtime")]
mod runtime {
    use std::panic::AssertUnwindSafe;
    use std::thread::{JoinHandle, ThreadId};

    use tokio::runtime::Handle;
    use tokio::sync::mpsc;
    use tracing::{debug, warn};

    use super::{Job, Scheduler};
    use crate::error::{SchedulerError, SchedulerResult};

    /// Handle of the tokio runtime driving the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] outside of a runtime context.
    pub fn runtime_handle() -> SchedulerResult<Handle> {
        Handle::try_current().map_err(|_| SchedulerError::NoRuntime)
    }

    impl Scheduler for Handle {
        fn schedule(&self, job: Job) {
            self.spawn(async move { job() });
        }

        fn name(&self) -> &str {
            "tokio"
        }
    }

    /// A single dedicated worker thread running jobs in FIFO order.
    ///
    /// This is the equivalent of a UI or main-thread queue: every routed
    /// callback lands on the same OS thread, one at a time. Dropping the
    /// scheduler closes its queue and returns at once; the worker drains the
    /// jobs already queued and then exits on its own. Use
    /// [`shutdown`](Self::shutdown) to wait for that.
    pub struct SerialScheduler {
        name: String,
        tx: Option<mpsc::UnboundedSender<Job>>,
        worker: Option<JoinHandle<()>>,
        thread_id: ThreadId,
    }

    impl SerialScheduler {
        /// Spawn the worker thread, named `name`.
        ///
        /// # Errors
        ///
        /// Returns [`SchedulerError::Spawn`] if the OS refuses to create the thread.
        pub fn new(name: impl Into<String>) -> SchedulerResult<Self> {
            let name = name.into();
            let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
            let worker_name = name.clone();

            let worker = std::thread::Builder::new()
                .name(name.clone())
                .spawn(move || {
                    while let Some(job) = rx.blocking_recv() {
                        if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            warn!(scheduler = %worker_name, "Scheduled job panicked");
                        }
                    }
                    debug!(scheduler = %worker_name, "Serial scheduler drained");
                })?;

            let thread_id = worker.thread().id();
            debug!(scheduler = %name, "Serial scheduler started");

            Ok(Self {
                name,
                tx: Some(tx),
                worker: Some(worker),
                thread_id,
            })
        }

        /// Id of the worker thread.
        #[must_use]
        pub fn thread_id(&self) -> ThreadId {
            self.thread_id
        }

        /// Close the queue and wait until the worker has run every queued job.
        ///
        /// Called from the worker thread itself (from inside a job) this only
        /// closes the queue.
        pub fn shutdown(mut self) {
            drop(self.tx.take());

            let Some(worker) = self.worker.take() else {
                return;
            };
            if std::thread::current().id() == self.thread_id {
                return;
            }
            if worker.join().is_err() {
                warn!(scheduler = %self.name, "Serial scheduler worker panicked");
            }
        }
    }

    impl Scheduler for SerialScheduler {
        fn schedule(&self, job: Job) {
            let Some(tx) = &self.tx else {
                return;
            };
            if tx.send(job).is_err() {
                warn!(scheduler = %self.name, "Serial scheduler closed, job dropped");
            }
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    impl std::fmt::Debug for SerialScheduler {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SerialScheduler")
                .field("name", &self.name)
                .field("thread_id", &self.thread_id)
                .finish_non_exhaustive()
        }
    }

    impl Drop for SerialScheduler {
        fn drop(&mut self) {
            // Never joins: the last owner may be a slot released mid-dispatch.
            // The worker handle detaches and the thread exits once drained.
            if self.tx.take().is_some() {
                debug!(scheduler = %self.name, "Serial scheduler closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_immediate_runs_inline() {
        let ran_on = Arc::new(std::sync::Mutex::new(None));
        let ran_on_clone = Arc::clone(&ran_on);

        Immediate.schedule(Box::new(move || {
            *ran_on_clone.lock().unwrap() = Some(std::thread::current().id());
        }));

        assert_eq!(*ran_on.lock().unwrap(), Some(std::thread::current().id()));
        assert_eq!(Immediate.name(), "immediate");
    }

    #[test]
    fn test_arc_scheduler_delegates() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let scheduler = Arc::new(Immediate);

        scheduler.schedule(Box::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.name(), "immediate");
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_serial_scheduler_runs_on_worker_in_order() {
        let scheduler = SerialScheduler::new("test-serial").unwrap();
        let worker = scheduler.thread_id();
        assert_ne!(worker, std::thread::current().id());

        let (tx, rx) = std::sync::mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            scheduler.schedule(Box::new(move || {
                tx.send((i, std::thread::current().id())).unwrap();
            }));
        }

        let received: Vec<_> = (0..5)
            .map(|_| rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(
            received.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!(received.iter().all(|(_, thread)| *thread == worker));
        assert_eq!(scheduler.name(), "test-serial");
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_serial_scheduler_survives_panicking_job() {
        let scheduler = SerialScheduler::new("test-panic").unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        scheduler.schedule(Box::new(|| panic!("boom")));
        scheduler.schedule(Box::new(move || tx.send(()).unwrap()));

        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_serial_scheduler_shutdown_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = SerialScheduler::new("test-drain").unwrap();

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            scheduler.schedule(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        scheduler.shutdown();

        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_serial_scheduler_drop_does_not_wait() {
        let scheduler = SerialScheduler::new("test-drop").unwrap();
        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        scheduler.schedule(Box::new(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv();
        }));
        scheduler.schedule(Box::new(move || done_tx.send(()).unwrap()));
        started_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();

        // The first job is blocked until released; a joining drop would hang here.
        drop(scheduler);
        release_tx.send(()).unwrap();

        // Queued jobs still run after the drop.
        assert!(
            done_rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .is_ok()
        );
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_runtime_handle_outside_runtime() {
        assert!(matches!(
            runtime_handle(),
            Err(crate::error::SchedulerError::NoRuntime)
        ));
    }

    #[cfg(feature = "runtime")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tokio_handle_schedules_job() {
        let handle = runtime_handle().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();

        handle.schedule(Box::new(move || {
            let _ = tx.send(42);
        }));

        assert_eq!(rx.await.unwrap(), 42);
    }
}
