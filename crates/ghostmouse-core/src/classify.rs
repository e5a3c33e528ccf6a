//! Gesture classification: raw down/up pairs into semantic steps.

use crate::{ActionStep, GestureKind, Point};
use time::OffsetDateTime;

/// Maximum travel, per axis, for a press/release pair to still count as a
/// click. Strictly greater than this on either axis classifies as a drag.
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Classify a down/up pair into a step.
///
/// `down`/`up` are client-space points; the timestamps come from the
/// session's monotonic clock (milliseconds since arm). `prev_end_ms` is the
/// up timestamp of the previous step, or the arm time for the first one.
///
/// Pure except for stamping the wall-clock capture time, which is
/// informational only.
pub fn classify(
    down: Point,
    up: Point,
    down_ms: u64,
    up_ms: u64,
    prev_end_ms: u64,
) -> ActionStep {
    let is_drag = (down.x - up.x).abs() > DRAG_THRESHOLD_PX
        || (down.y - up.y).abs() > DRAG_THRESHOLD_PX;

    // A click's travel is below the threshold and cosmetic; pin its end to
    // the down point so persisted clicks are self-consistent.
    let end = if is_drag { up } else { down };

    ActionStep {
        kind: if is_drag {
            GestureKind::Drag
        } else {
            GestureKind::Click
        },
        start_x: down.x,
        start_y: down.y,
        end_x: end.x,
        end_y: end.y,
        duration_ms: up_ms.saturating_sub(down_ms),
        delay_ms: down_ms.saturating_sub(prev_end_ms),
        description: if is_drag { "drag" } else { "click" }.into(),
        timestamp: Some(OffsetDateTime::now_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn travel_at_threshold_is_a_click() {
        // Exactly 5px on either axis stays a click; the comparison is strict.
        let step = classify(p(100, 100), p(105, 100), 0, 40, 0);
        assert_eq!(step.kind, GestureKind::Click);

        let step = classify(p(100, 100), p(100, 105), 0, 40, 0);
        assert_eq!(step.kind, GestureKind::Click);

        let step = classify(p(100, 100), p(95, 95), 0, 40, 0);
        assert_eq!(step.kind, GestureKind::Click);
    }

    #[test]
    fn travel_past_threshold_on_either_axis_is_a_drag() {
        let step = classify(p(100, 100), p(106, 100), 0, 40, 0);
        assert_eq!(step.kind, GestureKind::Drag);

        let step = classify(p(100, 100), p(100, 94), 0, 40, 0);
        assert_eq!(step.kind, GestureKind::Drag);
    }

    #[test]
    fn click_end_coords_equal_the_down_point() {
        let step = classify(p(100, 100), p(103, 98), 0, 30, 0);
        assert_eq!(step.kind, GestureKind::Click);
        assert_eq!((step.end_x, step.end_y), (100, 100));
    }

    #[test]
    fn drag_keeps_distinct_end_coords() {
        let step = classify(p(10, 10), p(50, 50), 100, 220, 0);
        assert_eq!(step.kind, GestureKind::Drag);
        assert_eq!((step.start_x, step.start_y), (10, 10));
        assert_eq!((step.end_x, step.end_y), (50, 50));
        assert_eq!(step.duration_ms, 120);
    }

    #[test]
    fn delay_is_the_gap_since_the_previous_step_end() {
        let step = classify(p(0, 0), p(0, 0), 700, 750, 500);
        assert_eq!(step.delay_ms, 200);
        assert_eq!(step.duration_ms, 50);
    }

    #[test]
    fn out_of_order_timestamps_clamp_to_zero() {
        // Clock skew must never panic or go negative.
        let step = classify(p(0, 0), p(0, 0), 100, 90, 400);
        assert_eq!(step.delay_ms, 0);
        assert_eq!(step.duration_ms, 0);
    }

    #[test]
    fn descriptions_are_fixed_labels() {
        assert_eq!(classify(p(0, 0), p(0, 0), 0, 0, 0).description, "click");
        assert_eq!(classify(p(0, 0), p(60, 0), 0, 0, 0).description, "drag");
    }
}
