use std::cmp::Ordering;

use thiserror::Error;

const FIRST_ELEMENT_INDEX: usize = 1;

/// Contraction priority, ordered with [`f64::total_cmp`]
#[derive(Copy, Clone, Debug, Default)]
pub struct Priority(pub f64);

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Min-heap of node ids with updatable priorities
pub struct PriorityQueue<P>
where
    P: Ord,
{
    heap: Vec<(usize, P)>,
    positions: Vec<Option<usize>>,
    size: usize,
    max: usize,
}

#[derive(Error, Debug)]
pub enum PriorityQueueError {
    #[error("Priority queue is full")]
    Full,
    #[error("Element already exists in the priority queue")]
    ElementAlreadyExists,
}

impl<P> PriorityQueue<P>
where
    P: Ord + Copy + Default,
{
    pub fn new(max: usize) -> Self {
        let mut heap = Vec::with_capacity(max + 1);
        heap.push((max + 1, P::default()));
        Self {
            heap,
            positions: vec![None; max + 1],
            size: 0,
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, id: usize) -> bool {
        self.positions[id].is_some()
    }

    pub fn push(&mut self, id: usize, priority: P) -> Result<usize, PriorityQueueError> {
        if id >= self.max {
            panic!("ID {} out of bounds, max: {}", id, self.max)
        }

        if self.size == self.max {
            return Err(PriorityQueueError::Full);
        }

        if self.contains(id) {
            return Err(PriorityQueueError::ElementAlreadyExists);
        }

        self.size += 1;
        self.heap.push((id, priority));
        self.positions[id] = Some(self.size);
        self.sift_up(self.size);

        Ok(id)
    }

    pub fn peek(&self) -> Option<&(usize, P)> {
        self.heap.get(FIRST_ELEMENT_INDEX)
    }

    pub fn pop(&mut self) -> Option<(usize, P)> {
        if self.size == 0 {
            return None;
        }

        let (id, priority) = self.heap.swap_remove(FIRST_ELEMENT_INDEX);
        self.size -= 1;
        self.positions[id] = None;

        if self.size > 0 {
            // The last element becomes the first one
            self.positions[self.heap[FIRST_ELEMENT_INDEX].0] = Some(FIRST_ELEMENT_INDEX);
            self.sift_down(FIRST_ELEMENT_INDEX);
        }

        Some((id, priority))
    }

    /// Pushes `id` or moves it to its new place
    pub fn upsert(&mut self, id: usize, priority: P) {
        if self.contains(id) {
            self.update_priority(id, priority);
        } else {
            // Cannot be full, every id has a slot
            let _ = self.push(id, priority);
        }
    }

    pub fn update_priority(&mut self, id: usize, priority: P) {
        if let Some(position) = self.positions[id] {
            let current_priority = self.heap[position].1;
            self.heap[position] = (id, priority);

            match priority.cmp(&current_priority) {
                Ordering::Greater => self.sift_down(position),
                Ordering::Less => self.sift_up(position),
                Ordering::Equal => {}
            }
        }
    }

    pub fn clear(&mut self) {
        self.positions.fill(None);
        self.heap.clear();
        self.heap.push((self.max + 1, P::default()));
        self.size = 0;
    }

    fn sift_up(&mut self, element_index: usize) {
        if element_index == FIRST_ELEMENT_INDEX {
            return;
        }

        let mut index = element_index;
        let priority = self.heap[index].1;
        while index >> 1 > 0 && priority < self.heap[index >> 1].1 {
            let parent_index = index >> 1;
            self.heap.swap(index, parent_index);
            self.positions[self.heap[index].0] = Some(index);
            index = parent_index;
        }

        self.positions[self.heap[index].0] = Some(index);
    }

    fn sift_down(&mut self, element_index: usize) {
        if self.size == 0 {
            return;
        }

        let mut index = element_index;
        let priority = self.heap[index].1;

        while index << 1 <= self.size {
            let left_child_index = index << 1;
            let right_child_index = left_child_index + 1;

            let mut child_index = left_child_index;
            if right_child_index <= self.size
                && self.heap[right_child_index].1 < self.heap[left_child_index].1
            {
                child_index = right_child_index;
            }

            if priority <= self.heap[child_index].1 {
                break;
            }

            self.heap.swap(index, child_index);
            self.positions[self.heap[index].0] = Some(index);
            index = child_index;
        }

        self.positions[self.heap[index].0] = Some(index);
    }
}
