//! Bounded FIFO of classified labels awaiting the drop point.
//!
//! In pipelined mode, detection (upstream color sensor) and action
//! (downstream drop sensor) are decoupled by physical transport time.
//! [`PendingColorQueue`] carries the labels across that gap in strict
//! detection order.

use heapless::Deque;
use tracing::warn;

/// Queue capacity in the reference station configuration.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// What to do when a label arrives while the queue is full.
///
/// Both policies drop the new label; the queue never displaces older
/// entries and never errors. They differ only in whether the drop is
/// logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Log a warning for every dropped label.
    #[default]
    Warn,
    /// Drop quietly, counting only.
    Silent,
}

/// Bounded FIFO of pending color labels.
///
/// Push order is detection order; pop order is arrival order at the drop
/// point. Length never exceeds `N`; overflow drops the newest label and
/// counts it.
///
/// # Example
///
/// ```rust
/// use rs_sortz::queue::PendingColorQueue;
///
/// let mut queue: PendingColorQueue<3> = PendingColorQueue::new();
/// assert!(queue.push("R".into()));
/// assert!(queue.push("G".into()));
/// assert_eq!(queue.pop().as_deref(), Some("R"));
/// assert_eq!(queue.pop().as_deref(), Some("G"));
/// assert_eq!(queue.pop(), None);
/// ```
#[derive(Debug, Default)]
pub struct PendingColorQueue<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    labels: Deque<String, N>,
    policy: OverflowPolicy,
    overflow_count: u32,
}

impl<const N: usize> PendingColorQueue<N> {
    /// Creates an empty queue with the default overflow policy.
    pub fn new() -> Self {
        Self {
            labels: Deque::new(),
            policy: OverflowPolicy::default(),
            overflow_count: 0,
        }
    }

    /// Sets the overflow policy.
    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Appends a label, returning false if the queue was full.
    ///
    /// On overflow the label is dropped and counted; with
    /// [`OverflowPolicy::Warn`] a warning is logged as well.
    pub fn push(&mut self, label: String) -> bool {
        match self.labels.push_back(label) {
            Ok(()) => true,
            Err(label) => {
                self.overflow_count += 1;
                if self.policy == OverflowPolicy::Warn {
                    warn!(
                        label = %label,
                        capacity = N,
                        dropped_so_far = self.overflow_count,
                        "pending queue full; label dropped"
                    );
                }
                false
            }
        }
    }

    /// Removes and returns the oldest label.
    pub fn pop(&mut self) -> Option<String> {
        self.labels.pop_front()
    }

    /// Number of labels waiting.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns true if the queue is at capacity.
    pub fn is_full(&self) -> bool {
        self.labels.is_full()
    }

    /// The fixed capacity `N`.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Labels dropped to overflow since construction.
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    /// Iterates the waiting labels oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved() {
        let mut q: PendingColorQueue<10> = PendingColorQueue::new();
        for label in ["A", "B", "C"] {
            assert!(q.push(label.into()));
        }
        assert_eq!(q.pop().as_deref(), Some("A"));
        assert_eq!(q.pop().as_deref(), Some("B"));
        assert_eq!(q.pop().as_deref(), Some("C"));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn overflow_drops_newest_and_counts() {
        let mut q: PendingColorQueue<2> = PendingColorQueue::new();
        assert!(q.push("A".into()));
        assert!(q.push("B".into()));
        assert!(!q.push("C".into()));

        assert_eq!(q.len(), 2);
        assert_eq!(q.overflow_count(), 1);
        // The survivors are the two oldest.
        assert_eq!(q.pop().as_deref(), Some("A"));
        assert_eq!(q.pop().as_deref(), Some("B"));
    }

    #[test]
    fn capacity_plus_one_push_leaves_length_unchanged() {
        let mut q: PendingColorQueue<10> = PendingColorQueue::new();
        for i in 0..10 {
            assert!(q.push(format!("L{i}")));
        }
        assert!(q.is_full());
        assert!(!q.push("extra".into()));
        assert_eq!(q.len(), 10);
    }

    #[test]
    fn silent_policy_still_counts() {
        let mut q: PendingColorQueue<1> = PendingColorQueue::new().with_policy(OverflowPolicy::Silent);
        assert!(q.push("A".into()));
        assert!(!q.push("B".into()));
        assert_eq!(q.overflow_count(), 1);
    }

    #[test]
    fn iter_is_oldest_first() {
        let mut q: PendingColorQueue<4> = PendingColorQueue::new();
        q.push("A".into());
        q.push("B".into());
        let seen: Vec<&str> = q.iter().collect();
        assert_eq!(seen, vec!["A", "B"]);
    }

    #[test]
    fn default_capacity_is_ten() {
        let q: PendingColorQueue = PendingColorQueue::new();
        assert_eq!(q.capacity(), 10);
    }
}
