//! Mock schedulers and callback recorders.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use typebus::{Job, Scheduler};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scheduler that queues jobs until the test runs them.
///
/// Clones share the queue, so a test can hand one clone to a subscription
/// and keep another to crank it.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

impl ManualScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued jobs.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Run the oldest queued job on the calling thread.
    ///
    /// Returns `false` if the queue was empty.
    pub fn run_one(&self) -> bool {
        let job = lock(&self.queue).pop_front();
        match job {
            Some(job) => {
                job();
                true
            },
            None => false,
        }
    }

    /// Run queued jobs until the queue is empty, including jobs queued by
    /// the jobs themselves. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran: usize = 0;
        while self.run_one() {
            ran = ran.saturating_add(1);
        }
        ran
    }

    /// Drop every queued job without running it.
    pub fn discard_pending(&self) -> usize {
        let mut queue = lock(&self.queue);
        let discarded = queue.len();
        queue.clear();
        discarded
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, job: Job) {
        lock(&self.queue).push_back(job);
    }

    fn name(&self) -> &str {
        "manual"
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Captures every value handed to a callback, with the thread it ran on.
#[derive(Debug)]
pub struct Recorder<T> {
    entries: Arc<Mutex<Vec<(T, ThreadId)>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Send + 'static> Recorder<T> {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` as delivered on the current thread.
    pub fn record(&self, value: T) {
        lock(&self.entries).push((value, thread::current().id()));
    }

    /// Callback that records `map(event)`.
    pub fn mapping<E, F>(&self, map: F) -> impl Fn(&E) + Send + Sync + use<T, E, F>
    where
        E: 'static,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        let recorder = self.clone();
        move |event: &E| recorder.record(map(event))
    }

    /// Number of recorded values.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Threads the values were recorded on, in delivery order.
    #[must_use]
    pub fn threads(&self) -> Vec<ThreadId> {
        lock(&self.entries).iter().map(|(_, id)| *id).collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Poll until at least `count` values are recorded or `timeout` passes.
    ///
    /// For deliveries that land on another thread. Returns whether the
    /// count was reached.
    #[must_use]
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let started = Instant::now();
        while self.len() < count {
            if started.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Callback that records a clone of every event.
    pub fn cloning(&self) -> impl Fn(&T) + Send + Sync + use<T> {
        let recorder = self.clone();
        move |event: &T| recorder.record(event.clone())
    }

    /// Recorded values, in delivery order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        lock(&self.entries)
            .iter()
            .map(|(value, _)| value.clone())
            .collect()
    }

    /// Most recently recorded value.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        lock(&self.entries).last().map(|(value, _)| value.clone())
    }
}

/// Counts callback invocations.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    count: Arc<AtomicUsize>,
}

impl Counter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one invocation.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Callback that counts every event, whatever its type.
    pub fn handler<E: ?Sized + 'static>(&self) -> impl Fn(&E) + Send + Sync + use<E> {
        let counter = self.clone();
        move |_: &E| counter.increment()
    }

    /// Current count.
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_scheduler_queues_until_run() {
        let scheduler = ManualScheduler::new();
        let counter = Counter::new();

        let c = counter.clone();
        scheduler.schedule(Box::new(move || c.increment()));
        let c = counter.clone();
        scheduler.schedule(Box::new(move || c.increment()));

        assert_eq!(scheduler.pending(), 2);
        assert_eq!(counter.get(), 0);

        assert_eq!(scheduler.run_pending(), 2);
        assert_eq!(counter.get(), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_manual_scheduler_runs_jobs_queued_by_jobs() {
        let scheduler = ManualScheduler::new();
        let counter = Counter::new();

        let inner = scheduler.clone();
        let c = counter.clone();
        scheduler.schedule(Box::new(move || {
            let c = c.clone();
            inner.schedule(Box::new(move || c.increment()));
        }));

        assert_eq!(scheduler.run_pending(), 2);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_manual_scheduler_discard() {
        let scheduler = ManualScheduler::new();
        scheduler.schedule(Box::new(|| panic!("discarded job ran")));

        assert_eq!(scheduler.discard_pending(), 1);
        assert!(!scheduler.run_one());
    }

    #[test]
    fn test_recorder_captures_values_and_threads() {
        let recorder: Recorder<i64> = Recorder::new();
        let record = recorder.cloning();

        record(&1_i64);
        record(&2_i64);

        assert_eq!(recorder.values(), vec![1, 2]);
        assert_eq!(recorder.last(), Some(2));
        assert_eq!(recorder.threads(), vec![thread::current().id(); 2]);

        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_recorder_mapping() {
        let recorder: Recorder<usize> = Recorder::new();
        let record = recorder.mapping(|s: &String| s.len());

        record(&"hello".to_string());
        assert_eq!(recorder.values(), vec![5]);
    }

    #[test]
    fn test_recorder_wait_for_other_thread() {
        let recorder: Recorder<&'static str> = Recorder::new();
        let remote = recorder.clone();

        let handle = thread::spawn(move || remote.record("done"));
        assert!(recorder.wait_for(1, Duration::from_secs(5)));
        handle.join().unwrap();

        assert_ne!(recorder.threads()[0], thread::current().id());
    }

    #[test]
    fn test_recorder_wait_for_times_out() {
        let recorder: Recorder<u8> = Recorder::new();
        assert!(!recorder.wait_for(1, Duration::from_millis(10)));
    }
}
