//! Release velocity estimation.

use super::{PointerAction, Sample};
use crate::geometry::Point;
use crate::scheduler::Timestamp;
use std::collections::VecDeque;

const MAX_SAMPLES: usize = 64;

/// Tracks recent primary-contact positions of one stream.
///
/// Velocity is the net displacement across a trailing time window divided by
/// the time it spans.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(Timestamp, Point)>,
}

impl VelocityTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every recorded position.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Records a sample. A down sample starts a new stream.
    pub fn add(&mut self, sample: &Sample) {
        if sample.action == PointerAction::Down {
            self.samples.clear();
        }
        if sample.pointers.is_empty() {
            return;
        }
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((sample.time, sample.position()));
    }

    /// Velocity in px/s over the last `window_millis`, each axis clamped to
    /// `±max`.
    pub fn velocity(&self, window_millis: u64, max: f32) -> Point {
        let Some(&(end, last)) = self.samples.back() else {
            return Point::default();
        };
        let start = self
            .samples
            .iter()
            .find(|(time, _)| end.since(*time) <= window_millis)
            .copied();
        let Some((start, first)) = start else {
            return Point::default();
        };

        let elapsed = end.since(start);
        if elapsed == 0 {
            return Point::default();
        }
        let per_second = 1000.0 / elapsed as f32;
        Point::new(
            ((last.x - first.x) * per_second).clamp(-max, max),
            ((last.y - first.y) * per_second).clamp(-max, max),
        )
    }
}
