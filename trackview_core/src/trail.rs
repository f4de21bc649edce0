//! Bounded, spacing-gated history of visited agent positions.

use crate::math::flatten;
use nalgebra::Vector3;

/// Maximum number of trail entries kept.
pub const TRAIL_CAPACITY: usize = 2000;

/// New entries must be farther than this from the newest one.
pub const TRAIL_MIN_SPACING: f64 = 0.05;

/// Fixed-capacity FIFO ring of positions.
///
/// Storage is allocated once; when full, each append overwrites the oldest
/// entry in O(1).
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    /// Backing storage, grows up to `capacity` then stays fixed
    slots: Vec<Vector3<f64>>,

    /// Index of the oldest entry
    head: usize,

    /// Number of live entries
    len: usize,

    capacity: usize,
    min_spacing: f64,
}

impl TrailBuffer {
    /// Creates a trail with the default capacity and spacing.
    pub fn new() -> Self {
        Self::with_limits(TRAIL_CAPACITY, TRAIL_MIN_SPACING)
    }

    /// Creates a trail with custom limits. A zero capacity is raised to one.
    pub fn with_limits(capacity: usize, min_spacing: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
            min_spacing,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently appended position.
    pub fn last(&self) -> Option<Vector3<f64>> {
        if self.len == 0 {
            return None;
        }
        Some(self.slots[(self.head + self.len - 1) % self.capacity])
    }

    /// Appends `position` if the trail is empty or the position is farther
    /// than the minimum spacing from the newest entry. Evicts the oldest
    /// entry when full. Returns whether the position was recorded.
    pub fn record(&mut self, position: Vector3<f64>) -> bool {
        if let Some(last) = self.last() {
            if (position - last).norm() <= self.min_spacing {
                return false;
            }
        }
        self.push(position);
        true
    }

    fn push(&mut self, position: Vector3<f64>) {
        if self.slots.len() < self.capacity {
            // Still filling, so head is 0 and slots are contiguous
            self.slots.push(position);
            self.len += 1;
        } else {
            self.slots[self.head] = position;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.slots.clear();
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % self.capacity])
    }

    /// Trail as a flat `xyz` vertex array, oldest first.
    pub fn vertices(&self) -> Vec<f32> {
        flatten(self.iter())
    }
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64) -> Vector3<f64> {
        Vector3::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_first_entry_always_recorded() {
        let mut trail = TrailBuffer::new();
        assert!(trail.record(at(0.0)));
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.last(), Some(at(0.0)));
    }

    #[test]
    fn test_spacing_gate() {
        let mut trail = TrailBuffer::new();
        trail.record(at(0.0));
        assert!(!trail.record(at(0.03)));
        assert!(!trail.record(at(0.05)));
        assert!(trail.record(at(0.06)));
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut trail = TrailBuffer::with_limits(3, 0.05);
        for i in 0..5 {
            trail.record(at(i as f64));
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f64> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trail.last(), Some(at(4.0)));
    }

    #[test]
    fn test_default_bound() {
        let mut trail = TrailBuffer::new();
        for i in 0..(TRAIL_CAPACITY + 500) {
            trail.record(at(i as f64 * 0.1));
        }
        assert_eq!(trail.len(), TRAIL_CAPACITY);
        assert_eq!(trail.iter().next(), Some(at(500.0 * 0.1)));
    }

    #[test]
    fn test_clear_then_refill() {
        let mut trail = TrailBuffer::with_limits(2, 0.05);
        for i in 0..4 {
            trail.record(at(i as f64));
        }
        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.last(), None);

        trail.record(at(10.0));
        trail.record(at(11.0));
        trail.record(at(12.0));
        let xs: Vec<f64> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![11.0, 12.0]);
    }

    #[test]
    fn test_vertices_oldest_first() {
        let mut trail = TrailBuffer::with_limits(2, 0.05);
        trail.record(at(1.0));
        trail.record(at(2.0));
        trail.record(at(3.0));
        assert_eq!(trail.vertices(), vec![2.0, 0.0, 0.0, 3.0, 0.0, 0.0]);
    }
}
