//! Bounded binary-heap priority queues keyed by distance.
//!
//! [`MaxQueue`] keeps the current best-k with the worst on top, so it can be
//! evicted in O(log n). [`MinQueue`] pops the smallest distance first and
//! backs both branch queues and the best-first ordering of the final result.
//!
//! Entries with equal distances pop in insertion order for [`MinQueue`] and
//! in reverse insertion order for [`MaxQueue`], so ties are deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::QueueError;
use crate::node::NodeIndex;

/// Min-queue of tree branches keyed by a DTW distance or an LB_Keogh bound.
pub type BranchQueue = MinQueue<NodeIndex>;

#[derive(Debug, Clone)]
struct Entry<P> {
    distance: f64,
    seq: u64,
    payload: P,
}

impl<P> PartialEq for Entry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<P> Eq for Entry<P> {}

impl<P> PartialOrd for Entry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for Entry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Bounded max-heap: the largest distance is on top.
#[derive(Debug, Clone)]
pub struct MaxQueue<P> {
    heap: BinaryHeap<Entry<P>>,
    capacity: usize,
    next_seq: u64,
}

impl<P> MaxQueue<P> {
    /// Create an empty queue holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Insert an entry.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`QueueError::Full`] | The queue already holds `capacity` entries |
    pub fn insert(&mut self, distance: f64, payload: P) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        // Later insertions rank above earlier ones at equal distance.
        self.heap.push(Entry {
            distance,
            seq: self.next_seq,
            payload,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// Remove and return the entry with the largest distance.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`QueueError::Empty`] | The queue is empty |
    pub fn pop(&mut self) -> Result<(f64, P), QueueError> {
        self.heap
            .pop()
            .map(|e| (e.distance, e.payload))
            .ok_or(QueueError::Empty)
    }

    /// Keep the best `capacity` entries seen so far.
    ///
    /// Inserts while there is room. Once full, the current worst is evicted
    /// only if `distance` is strictly smaller. Returns whether the entry was kept.
    pub fn offer(&mut self, distance: f64, payload: P) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() {
            if distance.total_cmp(&self.first_distance()) != Ordering::Less {
                return false;
            }
            self.heap.pop();
        }
        self.heap.push(Entry {
            distance,
            seq: self.next_seq,
            payload,
        });
        self.next_seq += 1;
        true
    }

    /// Largest distance held, or `+inf` when empty.
    #[must_use]
    pub fn first_distance(&self) -> f64 {
        self.heap.peek().map_or(f64::INFINITY, |e| e.distance)
    }

    /// Payload of the largest-distance entry, if any.
    #[must_use]
    pub fn first_payload(&self) -> Option<&P> {
        self.heap.peek().map(|e| &e.payload)
    }

    /// Return the number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Return true if the queue holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Return true if the queue holds `capacity` entries.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Return the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Bounded min-heap: the smallest distance is on top.
#[derive(Debug, Clone)]
pub struct MinQueue<P> {
    heap: BinaryHeap<Reverse<Entry<P>>>,
    capacity: usize,
    next_seq: u64,
}

impl<P> MinQueue<P> {
    /// Create an empty queue holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            capacity,
            next_seq: 0,
        }
    }

    /// Insert an entry.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`QueueError::Full`] | The queue already holds `capacity` entries |
    pub fn insert(&mut self, distance: f64, payload: P) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        self.heap.push(Reverse(Entry {
            distance,
            seq: self.next_seq,
            payload,
        }));
        self.next_seq += 1;
        Ok(())
    }

    /// Remove and return the entry with the smallest distance.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`QueueError::Empty`] | The queue is empty |
    pub fn pop(&mut self) -> Result<(f64, P), QueueError> {
        self.heap
            .pop()
            .map(|Reverse(e)| (e.distance, e.payload))
            .ok_or(QueueError::Empty)
    }

    /// Smallest distance held, or `+inf` when empty.
    #[must_use]
    pub fn first_distance(&self) -> f64 {
        self.heap.peek().map_or(f64::INFINITY, |Reverse(e)| e.distance)
    }

    /// Return the number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Return true if the queue holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Return true if the queue holds `capacity` entries.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Return the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
