//! Task persistence: pretty JSON, round-trips losslessly.

use crate::AutomationTask;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Get the app data directory for ghostmouse.
pub fn get_app_data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("ghostmouse")
}

/// Get the saved tasks directory.
pub fn get_tasks_dir() -> PathBuf {
    get_app_data_dir().join("tasks")
}

/// Ensure the tasks directory exists.
pub fn ensure_tasks_dir() -> StorageResult<PathBuf> {
    let dir = get_tasks_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        info!(?dir, "created tasks directory");
    }
    Ok(dir)
}

/// Save a task to an explicit path.
pub fn save_task_to(path: &Path, task: &AutomationTask) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(task)?;
    fs::write(path, json)?;
    info!(?path, steps = task.len(), "saved task");
    Ok(())
}

/// Load a task from an explicit path.
///
/// Returns an error on unreadable or malformed input without touching any
/// in-memory state; the caller decides whether to replace its current task.
pub fn load_task_from(path: &Path) -> StorageResult<AutomationTask> {
    let json = fs::read_to_string(path)?;
    let task: AutomationTask = serde_json::from_str(&json)?;
    debug!(?path, steps = task.len(), "loaded task");
    Ok(task)
}

/// Save a task into the tasks directory under its own name.
pub fn save_task(task: &AutomationTask) -> StorageResult<PathBuf> {
    let dir = ensure_tasks_dir()?;
    let path = dir.join(format!("{}.json", sanitize_filename(&task.name)));
    save_task_to(&path, task)?;
    Ok(path)
}

/// Load a task from the tasks directory by name.
pub fn load_task(name: &str) -> StorageResult<AutomationTask> {
    let path = get_tasks_dir().join(format!("{}.json", sanitize_filename(name)));
    if !path.exists() {
        return Err(StorageError::NotFound(name.to_string()));
    }
    load_task_from(&path)
}

/// Delete a saved task by name.
pub fn delete_task(name: &str) -> StorageResult<()> {
    let path = get_tasks_dir().join(format!("{}.json", sanitize_filename(name)));
    if !path.exists() {
        return Err(StorageError::NotFound(name.to_string()));
    }
    fs::remove_file(&path)?;
    info!(?path, "deleted task");
    Ok(())
}

/// List all saved task names.
pub fn list_tasks() -> StorageResult<Vec<String>> {
    let dir = get_tasks_dir();
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut tasks = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(name) = path.file_stem() {
                tasks.push(name.to_string_lossy().to_string());
            }
        }
    }

    tasks.sort();
    Ok(tasks)
}

/// Sanitize a task name to be a valid filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
