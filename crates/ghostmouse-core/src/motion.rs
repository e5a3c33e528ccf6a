//! Drag motion planning: straight-line waypoints and per-segment pacing.

use crate::Point;

/// Number of interpolated move events per drag. Fixed regardless of distance
/// or duration; long drags get visibly coarser motion rather than more
/// segments.
pub const DRAG_SEGMENTS: u32 = 12;

/// Floor for the pause between interpolated moves.
pub const MIN_SEGMENT_DELAY_MS: u64 = 5;

/// Straight-line waypoints from `from` to `to`, integer truncation:
/// `x_k = x0 + (x1 - x0) * k / n` for `k = 1..=n`. Exactly `segments`
/// points; the last one is exactly `to`.
pub fn drag_waypoints(from: Point, to: Point, segments: u32) -> Vec<Point> {
    let n = segments.max(1) as i64;
    let (dx, dy) = ((to.x - from.x) as i64, (to.y - from.y) as i64);

    (1..=n)
        .map(|k| {
            Point::new(
                (from.x as i64 + dx * k / n) as i32,
                (from.y as i64 + dy * k / n) as i32,
            )
        })
        .collect()
}

/// Pause between interpolated moves: the total motion duration spread over
/// the segments, floored at `min_ms`.
pub fn segment_delay_ms(total_duration_ms: u64, segments: u32, min_ms: u64) -> u64 {
    (total_duration_ms / segments.max(1) as u64).max(min_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn waypoint_count_and_endpoint_are_exact() {
        let path = drag_waypoints(p(10, 10), p(50, 50), DRAG_SEGMENTS);
        assert_eq!(path.len(), DRAG_SEGMENTS as usize);
        assert_eq!(*path.last().unwrap(), p(50, 50));
    }

    #[test]
    fn waypoints_are_monotonic_along_both_axes() {
        let path = drag_waypoints(p(100, 200), p(20, 450), DRAG_SEGMENTS);
        let mut prev = p(100, 200);
        for wp in path {
            assert!(wp.x <= prev.x, "x must be non-increasing toward the end");
            assert!(wp.y >= prev.y, "y must be non-decreasing toward the end");
            prev = wp;
        }
        assert_eq!(prev, p(20, 450));
    }

    #[test]
    fn interpolation_truncates_toward_zero() {
        // 0..10 over 12 segments: 10 * 1 / 12 == 0 for the first waypoint.
        let path = drag_waypoints(p(0, 0), p(10, 0), 12);
        assert_eq!(path[0], p(0, 0));
        assert_eq!(path[11], p(10, 0));
    }

    #[test]
    fn zero_length_drag_stays_put() {
        let path = drag_waypoints(p(30, 40), p(30, 40), DRAG_SEGMENTS);
        assert!(path.iter().all(|wp| *wp == p(30, 40)));
    }

    #[test]
    fn segment_delay_spreads_duration_with_a_floor() {
        assert_eq!(segment_delay_ms(120, 12, 5), 10);
        assert_eq!(segment_delay_ms(12, 12, 5), 5);
        assert_eq!(segment_delay_ms(0, 12, 5), 5);
    }
}
