//! Blocking iterator over registry change notifications
//!
//! - Blocking: `recv()`, `for change in iter`
//! - Non-blocking: `try_recv()`, `try_iter()`
//! - Timeout: `recv_timeout()`, `timeout_iter()`

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crate::model::StateChange;

/// Blocking iterator over [`StateChange`] notifications
///
/// All handles share one receiver, so each change is delivered to exactly
/// one consumer. The iterator ends when the connection worker exits and
/// drops its sender.
///
/// ```rust,ignore
/// for change in system.iter() {
///     if let StateChange::PlayerUpdated { snapshot } = change {
///         println!("{} is at volume {}", snapshot.name, snapshot.volume);
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ChangeIterator {
    rx: Arc<Mutex<mpsc::Receiver<StateChange>>>,
}

impl ChangeIterator {
    /// Wrap a shared receiver
    pub fn new(rx: Arc<Mutex<mpsc::Receiver<StateChange>>>) -> Self {
        Self { rx }
    }

    /// Create a sender and an iterator over what it sends
    pub fn channel() -> (mpsc::Sender<StateChange>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(Arc::new(Mutex::new(rx))))
    }

    /// Block until the next change
    ///
    /// Returns `None` once the sender is gone.
    pub fn recv(&self) -> Option<StateChange> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Block until the next change or the timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StateChange> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Take a change if one is queued
    pub fn try_recv(&self) -> Option<StateChange> {
        self.rx.lock().ok()?.try_recv().ok()
    }

    /// Drain everything currently queued without blocking
    pub fn try_iter(&self) -> TryIter<'_> {
        TryIter { inner: self }
    }

    /// Iterate until no change arrives within `timeout`
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for ChangeIterator {
    type Item = StateChange;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking iterator over queued changes
pub struct TryIter<'a> {
    inner: &'a ChangeIterator,
}

impl Iterator for TryIter<'_> {
    type Item = StateChange;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Blocking iterator that stops after a quiet period
pub struct TimeoutIter<'a> {
    inner: &'a ChangeIterator,
    timeout: Duration,
}

impl Iterator for TimeoutIter<'_> {
    type Item = StateChange;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    fn reset(expected: usize) -> StateChange {
        StateChange::PlayersReset { expected }
    }

    #[test]
    fn test_try_recv_empty() {
        let (_tx, iter) = ChangeIterator::channel();
        assert!(iter.try_recv().is_none());
    }

    #[test]
    fn test_try_iter_drains_in_order() {
        let (tx, iter) = ChangeIterator::channel();
        for n in 0..3 {
            tx.send(reset(n)).unwrap();
        }

        let drained: Vec<_> = iter.try_iter().collect();
        assert_eq!(drained, vec![reset(0), reset(1), reset(2)]);
        assert!(iter.try_recv().is_none());
    }

    #[test]
    fn test_recv_timeout_expires() {
        let (_tx, iter) = ChangeIterator::channel();
        let start = Instant::now();
        assert!(iter.recv_timeout(Duration::from_millis(50)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_recv_timeout_with_change() {
        let (tx, iter) = ChangeIterator::channel();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            tx.send(reset(1)).unwrap();
        });

        assert_eq!(
            iter.recv_timeout(Duration::from_millis(500)),
            Some(reset(1))
        );
    }

    #[test]
    fn test_iterator_ends_when_sender_dropped() {
        let (tx, iter) = ChangeIterator::channel();
        tx.send(reset(4)).unwrap();
        drop(tx);

        let all: Vec<_> = iter.collect();
        assert_eq!(all, vec![reset(4)]);
    }

    #[test]
    fn test_timeout_iter_stops_when_quiet() {
        let (tx, iter) = ChangeIterator::channel();
        tx.send(reset(1)).unwrap();
        tx.send(reset(2)).unwrap();

        let seen: Vec<_> = iter.timeout_iter(Duration::from_millis(20)).collect();
        assert_eq!(seen.len(), 2);
        drop(tx);
    }
}
