//! # Debounce Scheduler
//!
//! Coalesces bursts of work per key into one invocation after a quiet
//! period. Scheduling a key that is already pending replaces both its work
//! and its deadline, so only the last request of a burst is ever handed out.
//!
//! The scheduler owns no tasks. Deadlines live in a table and are awaited by
//! whoever calls [`Debouncer::next_expired`]; dropping the debouncer drops
//! every pending deadline with it.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Quiet period used by the preview pipeline
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug)]
struct Pending<W> {
    deadline: Instant,
    work: W,
}

#[derive(Debug)]
pub struct Debouncer<K, W> {
    delay: Duration,
    pending: HashMap<K, Pending<W>>,
}

impl<K, W> Default for Debouncer<K, W>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl<K, W> Debouncer<K, W>
where
    K: Eq + Hash + Clone,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm `key` to fire `delay` from now with `work`
    ///
    /// Returns true when an earlier pending request was replaced.
    pub fn schedule(&mut self, key: K, work: W, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        self.pending
            .insert(key, Pending { deadline, work })
            .is_some()
    }

    pub fn schedule_default(&mut self, key: K, work: W) -> bool {
        self.schedule(key, work, self.delay)
    }

    pub fn cancel(&mut self, key: &K) -> Option<W> {
        self.pending.remove(key).map(|pending| pending.work)
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.pending.get(key).map(|pending| pending.deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Wait for the earliest deadline and hand out its work
    ///
    /// Cancel-safe: nothing is removed until the deadline has passed. With
    /// nothing pending the future never resolves, which lets it sit in a
    /// `tokio::select!` next to other events.
    pub async fn next_expired(&mut self) -> (K, W) {
        loop {
            let Some((key, deadline)) = self.earliest() else {
                return std::future::pending().await;
            };

            tokio::time::sleep_until(deadline).await;

            if let Some(pending) = self.pending.remove(&key) {
                return (key, pending.work);
            }
        }
    }

    fn earliest(&self) -> Option<(K, Instant)> {
        self.pending
            .iter()
            .min_by_key(|(_, pending)| pending.deadline)
            .map(|(key, pending)| (key.clone(), pending.deadline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_millis(2000));
        let start = Instant::now();
        debouncer.schedule_default("js", 1);

        let (key, work) = debouncer.next_expired().await;
        assert_eq!((key, work), ("js", 1));
        assert!(start.elapsed() >= Duration::from_millis(2000));
        assert!(debouncer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_work_and_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(2000));
        let start = Instant::now();

        assert!(!debouncer.schedule_default("js", 1));
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(debouncer.schedule_default("js", 2));

        let (_, work) = debouncer.next_expired().await;
        assert_eq!(work, 2);
        assert!(start.elapsed() >= Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earliest_key_first() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule("slow", "b", Duration::from_millis(300));
        debouncer.schedule("fast", "a", Duration::from_millis(100));

        assert_eq!(debouncer.next_expired().await, ("fast", "a"));
        assert_eq!(debouncer.next_expired().await, ("slow", "b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_work_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.schedule_default("js", 1);
        assert_eq!(debouncer.cancel(&"js"), Some(1));
        assert!(!debouncer.is_pending(&"js"));

        let fired = tokio::time::timeout(Duration::from_secs(60), debouncer.next_expired()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_keeps_work() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        debouncer.schedule_default("js", 7);

        let early = tokio::time::timeout(Duration::from_millis(10), debouncer.next_expired()).await;
        assert!(early.is_err());
        assert!(debouncer.is_pending(&"js"));

        assert_eq!(debouncer.next_expired().await, ("js", 7));
    }

    #[test]
    fn test_cancel_all() {
        let mut debouncer: Debouncer<&str, u8> = Debouncer::default();
        assert_eq!(debouncer.delay(), DEFAULT_DELAY);
        // Instant::now() needs no runtime with a real clock
        debouncer.schedule_default("a", 1);
        debouncer.schedule_default("b", 2);
        assert_eq!(debouncer.len(), 2);
        debouncer.cancel_all();
        assert!(debouncer.is_empty());
    }
}
