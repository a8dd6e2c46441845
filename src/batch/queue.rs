//! Work queue of pending descriptor indices.

use std::collections::VecDeque;

/// Ordered pending work: FIFO on the first pass, retried items jump to the front.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    items: VecDeque<usize>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every index in `0..len`, in input order.
    pub fn with_len(len: usize) -> Self {
        Self {
            items: (0..len).collect(),
        }
    }

    pub fn take_front(&mut self) -> Option<usize> {
        self.items.pop_front()
    }

    pub fn push_front(&mut self, index: usize) {
        debug_assert!(
            !self.items.contains(&index),
            "descriptor {} queued twice",
            index
        );
        self.items.push_front(index);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_pass_is_fifo() {
        let mut queue = WorkQueue::with_len(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.take_front(), Some(0));
        assert_eq!(queue.take_front(), Some(1));
        assert_eq!(queue.take_front(), Some(2));
        assert_eq!(queue.take_front(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_retry_goes_to_front() {
        let mut queue = WorkQueue::with_len(4);
        let a = queue.take_front().unwrap();
        let b = queue.take_front().unwrap();
        queue.push_front(a);
        queue.push_front(b);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = WorkQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.take_front(), None);
    }
}
