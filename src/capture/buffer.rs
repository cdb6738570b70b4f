//! Bounded point buffer with tail retention
//!
//! A `VecDeque` ring keeps points in arrival order. When a push would exceed
//! the capacity, the oldest `capacity - retain` points are dropped first, so
//! recency is the only retention criterion and order is never changed.

use super::types::TrackingPoint;
use std::collections::VecDeque;

/// Initial allocation; the ring grows to `capacity` on demand
const INITIAL_ALLOCATION: usize = 4_096;

#[derive(Debug, Clone)]
pub struct PointBuffer {
    points: VecDeque<TrackingPoint>,
    capacity: usize,
    retain: usize,
    evicted: u64,
}

impl PointBuffer {
    /// # Panics
    /// Panics if `retain` is zero or not smaller than `capacity`
    pub fn new(capacity: usize, retain: usize) -> Self {
        assert!(
            retain > 0 && retain < capacity,
            "retain must be between 1 and capacity - 1"
        );
        Self {
            points: VecDeque::with_capacity(capacity.min(INITIAL_ALLOCATION)),
            capacity,
            retain,
            evicted: 0,
        }
    }

    /// Append a point, trimming the oldest entries first if the buffer is full.
    /// Returns how many points were evicted.
    pub fn push(&mut self, point: TrackingPoint) -> usize {
        let mut dropped = 0;
        if self.points.len() >= self.capacity {
            dropped = self.points.len() - self.retain;
            self.points.drain(..dropped);
            self.evicted += dropped as u64;
        }
        self.points.push_back(point);
        dropped
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total points dropped by eviction since the last clear
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackingPoint> {
        self.points.iter()
    }

    /// Point-in-time copy in arrival order
    pub fn snapshot(&self) -> Vec<TrackingPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.evicted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{PageSnapshot, PointKind};

    fn make_point(i: usize) -> TrackingPoint {
        TrackingPoint::new(i as f64, 0.0, i as i64, PointKind::Gaze, &PageSnapshot::default())
    }

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        let mut buffer = PointBuffer::new(10, 8);
        for i in 0..10 {
            assert_eq!(buffer.push(make_point(i)), 0);
        }
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.evicted(), 0);
    }

    #[test]
    fn test_push_over_capacity_trims_oldest() {
        let mut buffer = PointBuffer::new(10, 8);
        for i in 0..10 {
            buffer.push(make_point(i));
        }

        assert_eq!(buffer.push(make_point(10)), 2);
        assert_eq!(buffer.len(), 9);

        let timestamps: Vec<i64> = buffer.iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, (2..=10).collect::<Vec<i64>>());
    }

    #[test]
    fn test_full_size_eviction_leaves_40001_in_order() {
        let mut buffer = PointBuffer::new(50_000, 40_000);
        for i in 0..50_000 {
            buffer.push(make_point(i));
        }
        assert_eq!(buffer.len(), 50_000);

        let dropped = buffer.push(make_point(50_000));

        assert_eq!(dropped, 10_000);
        assert_eq!(buffer.len(), 40_001);
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.first().map(|p| p.timestamp), Some(10_000));
        assert_eq!(snapshot.last().map(|p| p.timestamp), Some(50_000));
        assert!(snapshot.windows(2).all(|w| w[0].timestamp + 1 == w[1].timestamp));
    }

    #[test]
    fn test_clear_resets_eviction_count() {
        let mut buffer = PointBuffer::new(3, 1);
        for i in 0..5 {
            buffer.push(make_point(i));
        }
        assert!(buffer.evicted() > 0);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.evicted(), 0);
    }

    #[test]
    #[should_panic]
    fn test_retain_must_be_below_capacity() {
        PointBuffer::new(10, 10);
    }
}
