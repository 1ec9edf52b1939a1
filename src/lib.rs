//! Task timer backend: an ordered list of countdown tasks with per-second
//! ticking, autoplay hand-off, Pomodoro expansion and SQLite persistence.
//!
//! The functions at the crate root are the command surface a front end calls.
//! Each maps failures to a display string through [`AppState::command_error`].

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{AppState, PreferencesResponse, TaskView, GENERIC_FAILURE_NOTICE};
pub use domain::ids::TaskId;
pub use domain::models::{PomodoroSegment, PomodoroSettings, Task, TaskMode};
pub use domain::time_format::format_time;
pub use infrastructure::error::InfraError;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    add_task_impl, clear_all_tasks_impl, expand_pomodoro_impl, get_preferences_impl,
    list_tasks_impl, remove_task_impl, reorder_tasks_impl, reset_all_tasks_impl, reset_task_impl,
    set_autoplay_impl, start_timer_impl, stop_timer_impl, toggle_dark_mode_impl,
    toggle_task_impl,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub workspace_root: String,
    pub database_path: String,
}

pub fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

pub async fn list_tasks(state: &AppState) -> Result<Vec<TaskView>, String> {
    list_tasks_impl(state)
        .await
        .map_err(|error| state.command_error("list_tasks", &error))
}

pub async fn add_task(
    state: &AppState,
    name: String,
    minutes: Option<String>,
) -> Result<Vec<TaskView>, String> {
    add_task_impl(state, name, minutes)
        .await
        .map_err(|error| state.command_error("add_task", &error))
}

pub async fn remove_task(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, String> {
    remove_task_impl(state, task_id)
        .await
        .map_err(|error| state.command_error("remove_task", &error))
}

pub async fn toggle_task(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, String> {
    toggle_task_impl(state, task_id)
        .await
        .map_err(|error| state.command_error("toggle_task", &error))
}

pub async fn reset_task(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, String> {
    reset_task_impl(state, task_id)
        .await
        .map_err(|error| state.command_error("reset_task", &error))
}

pub async fn reset_all_tasks(state: &AppState) -> Result<Vec<TaskView>, String> {
    reset_all_tasks_impl(state)
        .await
        .map_err(|error| state.command_error("reset_all_tasks", &error))
}

pub async fn clear_all_tasks(state: &AppState, confirmed: bool) -> Result<Vec<TaskView>, String> {
    clear_all_tasks_impl(state, confirmed)
        .await
        .map_err(|error| state.command_error("clear_all_tasks", &error))
}

pub async fn reorder_tasks(
    state: &AppState,
    active_id: u64,
    over_id: u64,
) -> Result<Vec<TaskView>, String> {
    reorder_tasks_impl(state, active_id, over_id)
        .await
        .map_err(|error| state.command_error("reorder_tasks", &error))
}

pub async fn expand_pomodoro(
    state: &AppState,
    work_minutes: Option<u32>,
    break_minutes: Option<u32>,
) -> Result<Vec<TaskView>, String> {
    expand_pomodoro_impl(state, work_minutes, break_minutes)
        .await
        .map_err(|error| state.command_error("expand_pomodoro", &error))
}

pub async fn set_autoplay(state: &AppState, enabled: bool) -> Result<PreferencesResponse, String> {
    set_autoplay_impl(state, enabled)
        .await
        .map_err(|error| state.command_error("set_autoplay", &error))
}

pub fn toggle_dark_mode(state: &AppState) -> Result<PreferencesResponse, String> {
    toggle_dark_mode_impl(state).map_err(|error| state.command_error("toggle_dark_mode", &error))
}

pub fn get_preferences(state: &AppState) -> Result<PreferencesResponse, String> {
    get_preferences_impl(state).map_err(|error| state.command_error("get_preferences", &error))
}

pub fn start_timer(state: &AppState) -> Result<bool, String> {
    start_timer_impl(state).map_err(|error| state.command_error("start_timer", &error))
}

pub fn stop_timer(state: &AppState) -> Result<bool, String> {
    stop_timer_impl(state).map_err(|error| state.command_error("stop_timer", &error))
}
