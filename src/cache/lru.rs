//! LRU List Module
//!
//! Recency-ordered doubly linked list backed by a slab of nodes, giving O(1)
//! push, move-to-front and removal through stable slot indices.

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node<T> {
    key: String,
    value: T,
    prev: usize,
    next: usize,
}

// == LRU List ==
/// Doubly linked list of keyed values ordered by recency.
///
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Slots of removed nodes are recycled, so an index handed out by
/// `push_front` stays valid until that node is removed.
#[derive(Debug)]
pub struct LruList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> Default for LruList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LruList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a node at the front and returns its slot index.
    pub fn push_front(&mut self, key: String, value: T) -> usize {
        let node = Node {
            key,
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the node at `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Remove ==
    /// Removes the node at `idx`, returning its key and value.
    pub fn remove(&mut self, idx: usize) -> Option<(String, T)> {
        self.slots.get(idx)?.as_ref()?;
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        self.len -= 1;
        Some((node.key, node.value))
    }

    // == Pop Back ==
    /// Removes and returns the least recently used node.
    pub fn pop_back(&mut self) -> Option<(String, T)> {
        if self.tail == NIL {
            return None;
        }
        self.remove(self.tail)
    }

    // == Peek Back ==
    /// Returns the least recently used key without removing it.
    pub fn peek_back(&self) -> Option<&str> {
        self.node(self.tail).map(|n| n.key.as_str())
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.node(idx).map(|n| &n.value)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots
            .get_mut(idx)
            .and_then(|slot| slot.as_mut())
            .map(|n| &mut n.value)
    }

    // == Length ==
    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(node) = self.node(cursor) {
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.slots.get(idx).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = NIL;
            node.next = old_head;
        }
        if let Some(head) = self.node_mut(old_head) {
            head.prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node(idx) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match self.node_mut(prev) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match self.node_mut(next) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(idx) {
            node.prev = NIL;
            node.next = NIL;
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn filled(keys: &[&str]) -> (LruList<u32>, Vec<usize>) {
        let mut list = LruList::new();
        let idx = keys
            .iter()
            .enumerate()
            .map(|(i, k)| list.push_front(k.to_string(), i as u32))
            .collect();
        (list, idx)
    }

    #[test]
    fn test_lru_new() {
        let list: LruList<u32> = LruList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.peek_back(), None);
    }

    #[test]
    fn test_push_front_order() {
        let (list, _) = filled(&["key1", "key2", "key3"]);

        assert_eq!(list.len(), 3);
        assert_eq!(list.keys(), vec!["key3", "key2", "key1"]);
        // key1 is oldest (added first)
        assert_eq!(list.peek_back(), Some("key1"));
    }

    #[test]
    fn test_move_to_front() {
        let (mut list, idx) = filled(&["key1", "key2", "key3"]);

        list.move_to_front(idx[0]);

        assert_eq!(list.keys(), vec!["key1", "key3", "key2"]);
        assert_eq!(list.peek_back(), Some("key2"));
    }

    #[test]
    fn test_move_head_is_noop() {
        let (mut list, idx) = filled(&["a", "b"]);
        list.move_to_front(idx[1]);
        assert_eq!(list.keys(), vec!["b", "a"]);
    }

    #[test]
    fn test_pop_back_order() {
        let (mut list, _) = filled(&["key1", "key2", "key3"]);

        assert_eq!(list.pop_back(), Some(("key1".to_string(), 0)));
        assert_eq!(list.pop_back(), Some(("key2".to_string(), 1)));
        assert_eq!(list.len(), 1);
        assert_eq!(list.pop_back(), Some(("key3".to_string(), 2)));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_middle() {
        let (mut list, idx) = filled(&["a", "b", "c"]);

        assert_eq!(list.remove(idx[1]), Some(("b".to_string(), 1)));
        assert_eq!(list.keys(), vec!["c", "a"]);
        // Removing twice is harmless
        assert_eq!(list.remove(idx[1]), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_slots_are_reused() {
        let (mut list, idx) = filled(&["a", "b"]);
        list.remove(idx[0]);

        let reused = list.push_front("c".to_string(), 9);
        assert_eq!(reused, idx[0]);
        assert_eq!(list.get(reused), Some(&9));
        assert_eq!(list.keys(), vec!["c", "b"]);
    }

    #[test]
    fn test_get_mut_updates_value() {
        let (mut list, idx) = filled(&["a"]);
        if let Some(v) = list.get_mut(idx[0]) {
            *v = 42;
        }
        assert_eq!(list.get(idx[0]), Some(&42));
    }

    #[test]
    fn test_order_after_multiple_touches() {
        let (mut list, idx) = filled(&["a", "b", "c"]);

        // touch a, c, b -> front=[b, c, a]=back
        list.move_to_front(idx[0]);
        list.move_to_front(idx[2]);
        list.move_to_front(idx[1]);

        assert_eq!(list.pop_back().map(|(k, _)| k), Some("a".to_string()));
        assert_eq!(list.pop_back().map(|(k, _)| k), Some("c".to_string()));
        assert_eq!(list.pop_back().map(|(k, _)| k), Some("b".to_string()));
    }
}
