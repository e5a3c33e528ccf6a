//! ghostmouse-core: domain model + capture/replay engines.
//!
//! Design goal: keep this crate UI-agnostic and platform-agnostic.
//! Platform specific I/O (hook/post-message) lives in `ghostmouse-platform`.

mod cancel;
mod classify;
mod motion;
mod replay;
mod session;
mod storage;

pub use cancel::CancelToken;
pub use classify::{classify, DRAG_THRESHOLD_PX};
pub use motion::{drag_waypoints, segment_delay_ms, DRAG_SEGMENTS, MIN_SEGMENT_DELAY_MS};
pub use replay::{
    GestureEmitter, Repeat, ReplayError, ReplayEvent, ReplayHandle, ReplayOptions, Replayer,
};
pub use session::{
    CaptureEvent, CaptureSession, PointMapper, RawMouseEvent, RawMouseKind, SessionState,
};
pub use storage::{
    delete_task, ensure_tasks_dir, get_app_data_dir, get_tasks_dir, list_tasks, load_task,
    load_task_from, save_task, save_task_to, StorageError, StorageResult,
};

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use tracing::warn;

/// A point in either screen or client coordinates, depending on context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Kind of a recorded gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    /// Press and release without meaningful travel.
    Click,
    /// Press, move past the travel threshold, release.
    Drag,
}

impl Default for GestureKind {
    fn default() -> Self {
        Self::Click
    }
}

/// One recorded or replayable gesture.
///
/// Coordinates are client-space, relative to the input window the step was
/// recorded against. For a `Click` the end coordinates always equal the
/// start; only `Drag` steps use them meaningfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionStep {
    #[serde(rename = "type", default)]
    pub kind: GestureKind,
    #[serde(default)]
    pub start_x: i32,
    #[serde(default)]
    pub start_y: i32,
    #[serde(default)]
    pub end_x: i32,
    #[serde(default)]
    pub end_y: i32,
    /// Time spent performing the motion itself. Zero for an instantaneous
    /// click press/release, positive for drag interpolation.
    #[serde(default = "default_duration_ms", deserialize_with = "clamped_ms")]
    pub duration_ms: u64,
    /// Wait before this step begins, measured from the end of the previous
    /// step (or session arm for the first one).
    #[serde(default = "default_delay_ms", deserialize_with = "clamped_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_description")]
    pub description: String,
    /// Wall-clock time of the original capture. Informational only, never
    /// used to drive replay.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

fn default_duration_ms() -> u64 {
    50
}

fn default_delay_ms() -> u64 {
    500
}

fn default_description() -> String {
    "unlabeled".into()
}

/// Accepts signed input so a hand-edited task file with a negative timing
/// value loads clamped to zero instead of failing the whole file.
fn clamped_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    if raw < 0 {
        warn!(raw, "negative timing value in task file, clamping to 0");
        Ok(0)
    } else {
        Ok(raw as u64)
    }
}

impl ActionStep {
    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }
}

/// A named, ordered sequence of steps. Insertion order is execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationTask {
    #[serde(default = "default_task_name")]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<ActionStep>,
}

fn default_task_name() -> String {
    "Untitled Task".into()
}

impl Default for AutomationTask {
    fn default() -> Self {
        Self {
            name: default_task_name(),
            steps: Vec::new(),
        }
    }
}

impl AutomationTask {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Drop all recorded steps, keeping the name.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Replace the whole step list (used by load).
    pub fn replace_with(&mut self, other: AutomationTask) {
        *self = other;
    }
}
