//! # Task queue
//!
//! A FIFO of time-bounded tasks paced by a wall-clock countdown. At most one
//! task is current at a time. A task becomes current when it is started with
//! the duration its actions need, and is handed back for finishing exactly
//! once, either straight away (for zero duration tasks) or when the countdown
//! expires.
//!
//! The queue doesn't know how to execute or finish a task, the owner does
//! that with the items it pops and gets back.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A queued unit of work with a human readable description.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskItem<T> {
    pub task: T,
    pub description: String,
}

/// Queue of pending tasks plus the current task and its countdown.
#[derive(Debug, Clone)]
pub struct TaskQueue<T> {
    queue: VecDeque<TaskItem<T>>,
    current: Option<TaskItem<T>>,
    time_left_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> TaskItem<T> {
    pub fn new<S: Into<String>>(task: T, description: S) -> Self {
        Self {
            task,
            description: description.into(),
        }
    }
}

impl<T> fmt::Display for TaskItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            time_left_s: 0.0,
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task to the back of the queue.
    pub fn push(&mut self, item: TaskItem<T>) {
        self.queue.push_back(item);
    }

    /// Number of tasks waiting to be started, not counting the current task.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// True while the current task's countdown is running.
    pub fn is_running(&self) -> bool {
        self.current.is_some() && self.time_left_s > 0.0
    }

    /// True if there is nothing queued and nothing running.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }

    /// The task whose countdown is running, if any.
    pub fn current(&self) -> Option<&TaskItem<T>> {
        self.current.as_ref()
    }

    /// Time left on the current task's countdown.
    ///
    /// Units: seconds
    pub fn time_left_s(&self) -> f64 {
        self.time_left_s
    }

    /// Iterate over the waiting tasks from front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TaskItem<T>> {
        self.queue.iter()
    }

    /// Take the next task off the front of the queue.
    ///
    /// Returns `None` while a task is running, so that queued tasks never
    /// start before the current one is finished.
    pub fn pop_next(&mut self) -> Option<TaskItem<T>> {
        if self.current.is_some() {
            return None;
        }

        self.queue.pop_front()
    }

    /// Make `item` the current task with the given duration.
    ///
    /// If the duration is not positive the task is returned immediately for
    /// finishing and nothing becomes current.
    pub fn start(&mut self, item: TaskItem<T>, duration_s: f64) -> Option<TaskItem<T>> {
        if duration_s > 0.0 {
            self.current = Some(item);
            self.time_left_s = duration_s;
            None
        } else {
            self.time_left_s = 0.0;
            Some(item)
        }
    }

    /// Advance the countdown by the elapsed time.
    ///
    /// When the countdown expires the current task is returned for finishing.
    pub fn countdown(&mut self, elapsed_s: f64) -> Option<TaskItem<T>> {
        if self.current.is_none() {
            return None;
        }

        self.time_left_s -= elapsed_s;

        if self.time_left_s <= 0.0 {
            self.time_left_s = 0.0;
            self.current.take()
        } else {
            None
        }
    }

    /// Drop every task, including the current one, without finishing them.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.current = None;
        self.time_left_s = 0.0;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = TaskQueue::new();
        q.push(TaskItem::new(1, "one"));
        q.push(TaskItem::new(2, "two"));
        q.push(TaskItem::new(3, "three"));

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop_next().map(|i| i.task), Some(1));
        assert_eq!(q.pop_next().map(|i| i.task), Some(2));
        assert_eq!(q.iter().next_back().map(|i| i.task), Some(3));
    }

    #[test]
    fn test_countdown() {
        let mut q = TaskQueue::new();
        q.push(TaskItem::new('a', "a"));
        q.push(TaskItem::new('b', "b"));

        let a = q.pop_next().unwrap();
        assert!(q.start(a, 1.0).is_none());
        assert!(q.is_running());
        assert_eq!(q.current().map(|i| i.task), Some('a'));

        // Queued tasks wait for the current one
        assert!(q.pop_next().is_none());

        assert!(q.countdown(0.4).is_none());
        assert!((q.time_left_s() - 0.6).abs() < 1e-9);

        // Uneven ticks overshooting the end finish the task once
        let done = q.countdown(0.7);
        assert_eq!(done.map(|i| i.task), Some('a'));
        assert_eq!(q.time_left_s(), 0.0);
        assert!(q.countdown(0.1).is_none());

        // Zero duration tasks finish immediately
        let b = q.pop_next().unwrap();
        assert_eq!(q.start(b, 0.0).map(|i| i.task), Some('b'));
        assert!(q.is_idle());
    }

    #[test]
    fn test_exact_expiry() {
        let mut q = TaskQueue::new();
        assert!(q.start(TaskItem::new((), "x"), 0.5).is_none());
        assert!(q.countdown(0.25).is_none());
        assert!(q.countdown(0.25).is_some());
        assert!(!q.is_running());
    }

    #[test]
    fn test_clear() {
        let mut q = TaskQueue::new();
        q.push(TaskItem::new(1, "one"));
        q.push(TaskItem::new(2, "two"));
        let one = q.pop_next().unwrap();
        q.start(one, 5.0);

        q.clear();
        assert!(q.is_idle());
        assert!(!q.is_running());
        assert_eq!(q.time_left_s(), 0.0);
        assert!(q.countdown(10.0).is_none());
    }
}
