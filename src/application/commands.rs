use crate::application::board::TaskBoard;
use crate::application::bootstrap::bootstrap_workspace;
use crate::application::engine::{parse_minutes_input, TaskSnapshot};
use crate::application::queue::{spawn_board, BoardHandle};
use crate::application::scheduler::TickScheduler;
use crate::domain::ids::TaskId;
use crate::domain::models::{PomodoroSegment, PomodoroSettings, Task};
use crate::domain::time_format::format_time;
use crate::infrastructure::blob_store::SqliteBlobStore;
use crate::infrastructure::config::{load_configs, save_pomodoro_settings, update_app_config};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::task_store::TaskStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{error, info};

pub const GENERIC_FAILURE_NOTICE: &str = "Something went wrong. Please try again.";

pub struct AppState {
    config_dir: PathBuf,
    board: BoardHandle,
    scheduler: Mutex<Option<TickScheduler>>,
    tick_period: Duration,
}

impl AppState {
    /// Prepares the workspace, loads the saved tasks and starts ticking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        init_logging(&bootstrap.logs_dir)?;

        let app = &bootstrap.configs.app;
        let blobs = Arc::new(SqliteBlobStore::new(&bootstrap.database_path));
        let board = TaskBoard::open(TaskStore::new(blobs, app.storage_key.clone()), app.autoplay)?;
        let (board, _worker) = spawn_board(board);

        let tick_period = Duration::from_millis(app.tick_interval_ms);
        let scheduler = TickScheduler::start(board.clone(), tick_period);
        info!(
            workspace = %bootstrap.workspace_root.display(),
            app_name = %app.app_name,
            "task timer ready"
        );

        Ok(Self {
            config_dir: bootstrap.config_dir,
            board,
            scheduler: Mutex::new(Some(scheduler)),
            tick_period,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    /// Logs a failed command and returns the text to show the user.
    ///
    /// Only input errors are shown verbatim; every other fault collapses into
    /// the generic notice.
    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        error!(command, %error, "command failed");
        if error.is_user_facing() {
            error.to_string()
        } else {
            GENERIC_FAILURE_NOTICE.to_string()
        }
    }

    fn lock_scheduler(&self) -> Result<MutexGuard<'_, Option<TickScheduler>>, InfraError> {
        self.scheduler
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("scheduler lock poisoned: {error}")))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskView {
    pub id: u64,
    pub name: String,
    pub minutes: u32,
    pub time_left: u64,
    pub display_time: String,
    pub running: bool,
    pub completed: bool,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<PomodoroSegment>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.value(),
            name: task.name.clone(),
            minutes: task.minutes,
            time_left: task.time_left,
            display_time: format_time(task.time_left),
            running: task.running,
            completed: task.completed,
            mode: task.mode.as_str().to_string(),
            segment: task.segment.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PreferencesResponse {
    pub autoplay: bool,
    pub dark_mode: bool,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub timer_running: bool,
}

fn to_views(snapshot: &TaskSnapshot) -> Vec<TaskView> {
    snapshot.iter().map(TaskView::from).collect()
}

pub async fn list_tasks_impl(state: &AppState) -> Result<Vec<TaskView>, InfraError> {
    Ok(to_views(&state.board.list().await?))
}

pub async fn add_task_impl(
    state: &AppState,
    name: String,
    minutes: Option<String>,
) -> Result<Vec<TaskView>, InfraError> {
    let minutes = minutes.as_deref().and_then(parse_minutes_input);
    Ok(to_views(&state.board.add_task(name, minutes).await?))
}

pub async fn remove_task_impl(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, InfraError> {
    Ok(to_views(&state.board.remove_task(TaskId::new(task_id)).await?))
}

pub async fn toggle_task_impl(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, InfraError> {
    Ok(to_views(
        &state.board.toggle_running(TaskId::new(task_id)).await?,
    ))
}

pub async fn reset_task_impl(state: &AppState, task_id: u64) -> Result<Vec<TaskView>, InfraError> {
    Ok(to_views(&state.board.reset_task(TaskId::new(task_id)).await?))
}

pub async fn reset_all_tasks_impl(state: &AppState) -> Result<Vec<TaskView>, InfraError> {
    Ok(to_views(&state.board.reset_all().await?))
}

/// `confirmed` is the user's answer to the clear-all prompt.
pub async fn clear_all_tasks_impl(
    state: &AppState,
    confirmed: bool,
) -> Result<Vec<TaskView>, InfraError> {
    let snapshot = state
        .board
        .clear_all(move |_: &str| confirmed)
        .await?;
    Ok(to_views(&snapshot))
}

pub async fn reorder_tasks_impl(
    state: &AppState,
    active_id: u64,
    over_id: u64,
) -> Result<Vec<TaskView>, InfraError> {
    let snapshot = state
        .board
        .reorder(TaskId::new(active_id), TaskId::new(over_id))
        .await?;
    Ok(to_views(&snapshot))
}

/// Expands the list into Pomodoro sessions. Missing durations fall back to
/// the saved defaults; the durations used become the new defaults.
pub async fn expand_pomodoro_impl(
    state: &AppState,
    work_minutes: Option<u32>,
    break_minutes: Option<u32>,
) -> Result<Vec<TaskView>, InfraError> {
    let defaults = load_configs(&state.config_dir)?.pomodoro.settings();
    let settings = PomodoroSettings {
        work_minutes: work_minutes.unwrap_or(defaults.work_minutes),
        break_minutes: break_minutes.unwrap_or(defaults.break_minutes),
    };
    settings.validate().map_err(InfraError::InvalidInput)?;

    let snapshot = state.board.expand_pomodoro(settings).await?;
    save_pomodoro_settings(&state.config_dir, &settings)?;
    Ok(to_views(&snapshot))
}

pub async fn set_autoplay_impl(
    state: &AppState,
    enabled: bool,
) -> Result<PreferencesResponse, InfraError> {
    update_app_config(&state.config_dir, |app| app.autoplay = enabled)?;
    state.board.set_autoplay(enabled).await?;
    get_preferences_impl(state)
}

/// Cosmetic only; the task list is untouched.
pub fn toggle_dark_mode_impl(state: &AppState) -> Result<PreferencesResponse, InfraError> {
    let app = update_app_config(&state.config_dir, |app| app.dark_mode = !app.dark_mode)?;
    info!(dark_mode = app.dark_mode, "toggled dark mode");
    get_preferences_impl(state)
}

pub fn get_preferences_impl(state: &AppState) -> Result<PreferencesResponse, InfraError> {
    let configs = load_configs(&state.config_dir)?;
    let timer_running = state.lock_scheduler()?.is_some();
    Ok(PreferencesResponse {
        autoplay: configs.app.autoplay,
        dark_mode: configs.app.dark_mode,
        work_minutes: configs.pomodoro.work_minutes,
        break_minutes: configs.pomodoro.break_minutes,
        timer_running,
    })
}

/// Starts the tick scheduler; returns `false` if it was already running.
pub fn start_timer_impl(state: &AppState) -> Result<bool, InfraError> {
    let mut scheduler = state.lock_scheduler()?;
    if scheduler.is_some() {
        return Ok(false);
    }
    *scheduler = Some(TickScheduler::start(state.board.clone(), state.tick_period));
    Ok(true)
}

/// Stops the tick scheduler; returns `false` if it was not running.
pub fn stop_timer_impl(state: &AppState) -> Result<bool, InfraError> {
    let stopped = state.lock_scheduler()?.take();
    Ok(stopped.is_some())
}
