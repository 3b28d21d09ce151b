//! Swipe Gesture Interpreter
//!
//! Turns a horizontal displacement stream into a discrete intent at
//! release. Touch and mouse input both feed the same tracker.

use serde::{Deserialize, Serialize};

/// Fraction of the viewport a release must exceed to count
pub const SWIPE_THRESHOLD_RATIO: f64 = 0.2;
/// Fraction of the viewport the card may travel while dragging
pub const SWIPE_CLAMP_RATIO: f64 = 0.4;
/// Horizontal travel after which vertical scrolling is suppressed
pub const SCROLL_LOCK_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeIntent {
    ToggleComplete,
    Delete,
    None,
}

/// Which items may be deleted by swipe or trash button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Any item
    Always,
    /// Only items already marked complete
    #[default]
    CompletedOnly,
}

impl DeletePolicy {
    pub fn allows(self, is_completed: bool) -> bool {
        match self {
            DeletePolicy::Always => true,
            DeletePolicy::CompletedOnly => is_completed,
        }
    }
}

/// Clamp a raw delta to the allowed travel
pub fn clamp_offset(delta: f64, viewport_width: f64) -> f64 {
    let max = viewport_width.max(0.0) * SWIPE_CLAMP_RATIO;
    delta.clamp(-max, max)
}

/// Classify a net displacement. The threshold itself is a dead-zone value.
pub fn classify_swipe(delta: f64, viewport_width: f64) -> SwipeIntent {
    let threshold = viewport_width.max(0.0) * SWIPE_THRESHOLD_RATIO;
    if delta > threshold {
        SwipeIntent::ToggleComplete
    } else if delta < -threshold {
        SwipeIntent::Delete
    } else {
        SwipeIntent::None
    }
}

/// Apply the item's delete policy to a raw intent
pub fn resolve_intent(intent: SwipeIntent, is_completed: bool, policy: DeletePolicy) -> SwipeIntent {
    match intent {
        SwipeIntent::Delete if !policy.allows(is_completed) => SwipeIntent::None,
        other => other,
    }
}

/// Tracks one gesture from press to release
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_x: Option<f64>,
    last_x: f64,
    viewport_width: f64,
    offset: f64,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, x: f64, viewport_width: f64) {
        self.start_x = Some(x);
        self.last_x = x;
        self.viewport_width = viewport_width;
        self.offset = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.start_x.is_some()
    }

    /// Current visual offset
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Raw displacement since `begin`
    pub fn delta(&self) -> f64 {
        match self.start_x {
            Some(start) => self.last_x - start,
            None => 0.0,
        }
    }

    /// Feed a new pointer position; returns the clamped offset
    pub fn update(&mut self, x: f64) -> f64 {
        if self.start_x.is_none() {
            return 0.0;
        }
        self.last_x = x;
        self.offset = clamp_offset(self.delta(), self.viewport_width);
        self.offset
    }

    /// Vertical scroll should be suppressed for this gesture
    pub fn locks_scroll(&self) -> bool {
        self.delta().abs() > SCROLL_LOCK_PX
    }

    /// Finish the gesture and reset the offset to zero
    pub fn release(&mut self) -> SwipeIntent {
        if self.start_x.is_none() {
            return SwipeIntent::None;
        }
        let intent = classify_swipe(self.delta(), self.viewport_width);
        self.reset();
        intent
    }

    /// Drop the gesture without an intent (item went away mid-swipe)
    pub fn abort(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.start_x = None;
        self.last_x = 0.0;
        self.offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f64 = 500.0;

    fn swipe(from: f64, to: f64) -> (SwipeIntent, f64) {
        let mut tracker = SwipeTracker::new();
        tracker.begin(from, WIDTH);
        tracker.update(to);
        let intent = tracker.release();
        (intent, tracker.offset())
    }

    #[test]
    fn test_right_swipe_past_threshold_toggles() {
        assert_eq!(swipe(10.0, 120.0).0, SwipeIntent::ToggleComplete);
    }

    #[test]
    fn test_left_swipe_past_threshold_deletes() {
        assert_eq!(swipe(300.0, 190.0).0, SwipeIntent::Delete);
    }

    #[test]
    fn test_exact_threshold_is_dead_zone() {
        // 0.2 * 500 = 100
        assert_eq!(swipe(0.0, 100.0), (SwipeIntent::None, 0.0));
        assert_eq!(swipe(200.0, 100.0), (SwipeIntent::None, 0.0));
        assert_eq!(classify_swipe(100.0001, WIDTH), SwipeIntent::ToggleComplete);
    }

    #[test]
    fn test_dead_zone_release_resets_offset() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(50.0, WIDTH);
        assert_eq!(tracker.update(90.0), 40.0);
        assert_eq!(tracker.release(), SwipeIntent::None);
        assert_eq!(tracker.offset(), 0.0);
        assert!(!tracker.is_active());
    }

    #[test]
    fn test_offset_is_clamped_but_release_uses_raw_delta() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(0.0, WIDTH);
        assert_eq!(tracker.update(450.0), 200.0);
        assert_eq!(tracker.update(-450.0), -200.0);
        assert_eq!(tracker.release(), SwipeIntent::Delete);
    }

    #[test]
    fn test_tap_without_move_is_none() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(240.0, WIDTH);
        assert_eq!(tracker.release(), SwipeIntent::None);
    }

    #[test]
    fn test_abort_discards_gesture() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(0.0, WIDTH);
        tracker.update(300.0);
        tracker.abort();
        assert_eq!(tracker.release(), SwipeIntent::None);
        assert_eq!(tracker.update(10.0), 0.0);
    }

    #[test]
    fn test_scroll_lock_after_ten_pixels() {
        let mut tracker = SwipeTracker::new();
        tracker.begin(0.0, WIDTH);
        tracker.update(10.0);
        assert!(!tracker.locks_scroll());
        tracker.update(-11.0);
        assert!(tracker.locks_scroll());
    }

    #[test]
    fn test_delete_policy_gates_active_items() {
        let policy = DeletePolicy::CompletedOnly;
        assert_eq!(resolve_intent(SwipeIntent::Delete, false, policy), SwipeIntent::None);
        assert_eq!(resolve_intent(SwipeIntent::Delete, true, policy), SwipeIntent::Delete);
        assert_eq!(resolve_intent(SwipeIntent::ToggleComplete, false, policy), SwipeIntent::ToggleComplete);
        assert_eq!(resolve_intent(SwipeIntent::Delete, false, DeletePolicy::Always), SwipeIntent::Delete);
    }
}
