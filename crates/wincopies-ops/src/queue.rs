//! Doubly-linked process queues with size tracking and filtered drains.

use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use wincopies_core::{ErrorKind, PendingAction, ProcessErrorItem, ProcessPath};

/// An item that can be stored in a [`ProcessQueue`].
pub trait QueueItem {
    /// The path the item refers to.
    fn process_path(&self) -> &ProcessPath;
}

impl QueueItem for ProcessPath {
    fn process_path(&self) -> &ProcessPath {
        self
    }
}

impl QueueItem for ProcessErrorItem {
    fn process_path(&self) -> &ProcessPath {
        &self.path
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// FIFO queue over an index-based doubly-linked list.
///
/// `total_size` always equals the summed size of the enqueued non-directory
/// items; it is adjusted on every insert and removal.
#[derive(Debug, Clone)]
pub struct ProcessQueue<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    total_size: u64,
}

impl<T> Default for ProcessQueue<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            total_size: 0,
        }
    }
}

impl<T: QueueItem> ProcessQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Summed size of the queued non-directory items.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Append an item at the tail.
    pub fn enqueue(&mut self, item: T) {
        let idx = self.allocate(item, self.tail, None);
        match self.tail {
            Some(tail) => self.link_mut(tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    /// Insert an item at the head, so it is dequeued next.
    pub fn enqueue_front(&mut self, item: T) {
        let idx = self.allocate(item, None, self.head);
        match self.head {
            Some(head) => self.link_mut(head).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    /// The item at the head, if any.
    pub fn peek(&self) -> Option<&T> {
        self.head.and_then(|idx| self.node(idx)).map(|n| &n.item)
    }

    /// Remove and return the item at the head.
    pub fn dequeue(&mut self) -> Option<T> {
        let head = self.head?;
        self.unlink(head)
    }

    /// Alias of [`dequeue`](Self::dequeue), for callers polling the queue.
    pub fn try_dequeue(&mut self) -> Option<T> {
        self.dequeue()
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// First item satisfying the predicate, mutably.
    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.node(idx)?;
            if predicate(&node.item) {
                return self.nodes.get_mut(idx)?.as_mut().map(|n| &mut n.item);
            }
            cursor = node.next;
        }
        None
    }

    /// Remove and yield every item satisfying the predicate, in queue order.
    pub fn drain_matching<F>(&mut self, predicate: F) -> DrainMatching<'_, T, F>
    where
        F: FnMut(&T) -> bool,
    {
        DrainMatching {
            cursor: self.head,
            queue: self,
            predicate,
            finished: false,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    /// Mutable access to a node known to be linked.
    fn link_mut(&mut self, idx: usize) -> &mut Node<T> {
        match self.nodes.get_mut(idx).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("linked index {idx} refers to a free slot"),
        }
    }

    fn allocate(&mut self, item: T, prev: Option<usize>, next: Option<usize>) -> usize {
        self.total_size += item.process_path().accounted_size();
        self.len += 1;

        let node = Some(Node { item, prev, next });
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn unlink(&mut self, idx: usize) -> Option<T> {
        let node = self.nodes.get_mut(idx)?.take()?;

        match node.prev {
            Some(prev) => self.link_mut(prev).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.link_mut(next).prev = node.prev,
            None => self.tail = node.prev,
        }

        self.free.push(idx);
        self.len -= 1;
        self.total_size -= node.item.process_path().accounted_size();
        Some(node.item)
    }
}

impl<T: QueueItem + Clone> ProcessQueue<T> {
    /// Clone the queued items into a vector, head first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: QueueItem> Extend<T> for ProcessQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.enqueue(item);
        }
    }
}

impl<T: QueueItem> FromIterator<T> for ProcessQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut queue = Self::new();
        queue.extend(iter);
        queue
    }
}

impl ProcessQueue<ProcessErrorItem> {
    /// Record a decision on the first error item for `path`.
    ///
    /// Returns whether such an item was queued.
    pub fn set_pending_action(&mut self, path: &Path, action: PendingAction) -> bool {
        match self.find_mut(|item| item.path.path == path) {
            Some(item) => {
                item.pending_action = action;
                true
            }
            None => false,
        }
    }

    /// Remove and yield every item in the same class as `anchor`.
    pub fn drain_anchor<'a>(
        &'a mut self,
        anchor: &'a ErrorAnchor,
    ) -> DrainMatching<'a, ProcessErrorItem, impl FnMut(&ProcessErrorItem) -> bool + 'a> {
        self.drain_matching(move |item| anchor.matches(item))
    }
}

/// Borrowing iterator over a [`ProcessQueue`].
pub struct Iter<'a, T> {
    queue: &'a ProcessQueue<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T: QueueItem> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: QueueItem> ExactSizeIterator for Iter<'_, T> {}

impl<T: QueueItem> FusedIterator for Iter<'_, T> {}

/// Cursor removing the matching items of a queue in one pass.
///
/// The successor of a match is captured before the match is unlinked.
/// Once no further match exists the drain is finished: [`peek`](Self::peek)
/// and `next` return `None` from then on. Dropping a drain early leaves the
/// unvisited items queued.
pub struct DrainMatching<'a, T, F> {
    queue: &'a mut ProcessQueue<T>,
    cursor: Option<usize>,
    predicate: F,
    finished: bool,
}

impl<T: QueueItem, F: FnMut(&T) -> bool> DrainMatching<'_, T, F> {
    /// The next matching item, without removing it.
    pub fn peek(&mut self) -> Option<&T> {
        let idx = self.seek()?;
        self.queue.node(idx).map(|n| &n.item)
    }

    /// Whether the drain has run out of matches.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Position the cursor on the next match.
    fn seek(&mut self) -> Option<usize> {
        if self.finished {
            return None;
        }

        while let Some(idx) = self.cursor {
            let Some(node) = self.queue.node(idx) else {
                break;
            };
            if (self.predicate)(&node.item) {
                return Some(idx);
            }
            self.cursor = node.next;
        }

        self.finished = true;
        self.cursor = None;
        None
    }
}

impl<T: QueueItem, F: FnMut(&T) -> bool> Iterator for DrainMatching<'_, T, F> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.seek()?;
        self.cursor = self.queue.node(idx).and_then(|n| n.next);
        self.queue.unlink(idx)
    }
}

impl<T: QueueItem, F: FnMut(&T) -> bool> FusedIterator for DrainMatching<'_, T, F> {}

/// Class of error items resolved together with an anchor item.
///
/// Items match when they failed with the anchor's [`ErrorKind`] and, when a
/// prefix is set, lie under the anchor's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAnchor {
    /// Error kind to match.
    pub kind: ErrorKind,
    /// Directory the matching items must lie under.
    pub prefix: Option<PathBuf>,
}

impl ErrorAnchor {
    /// Anchor on an error item.
    pub fn from_item(item: &ProcessErrorItem, match_path_prefix: bool) -> Self {
        Self {
            kind: item.kind,
            prefix: match_path_prefix.then(|| item.path.anchor_dir().to_path_buf()),
        }
    }

    /// Whether an error item belongs to this class.
    pub fn matches(&self, item: &ProcessErrorItem) -> bool {
        item.kind == self.kind
            && self
                .prefix
                .as_deref()
                .is_none_or(|prefix| item.path.path.starts_with(prefix))
    }
}
