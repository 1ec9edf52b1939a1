use crate::application::engine::{Confirm, TaskListEngine, TaskSnapshot, TickOutcome};
use crate::domain::ids::TaskId;
use crate::domain::models::PomodoroSettings;
use crate::infrastructure::blob_store::BlobStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::task_store::TaskStore;
use tracing::{debug, error, info};

/// The task list together with its persistence and the autoplay flag.
///
/// Every operation that changes the list writes the new snapshot through to
/// the store before returning it.
pub struct TaskBoard<S: BlobStore> {
    engine: TaskListEngine,
    store: TaskStore<S>,
    autoplay: bool,
}

impl<S: BlobStore> TaskBoard<S> {
    pub fn open(store: TaskStore<S>, autoplay: bool) -> Result<Self, InfraError> {
        let mut engine = TaskListEngine::default();
        let tasks = store.load(engine.ids_mut())?;
        let count = tasks.len();
        engine.replace_all(tasks);
        info!(key = store.key(), count, autoplay, "opened task board");
        Ok(Self {
            engine,
            store,
            autoplay,
        })
    }

    pub fn tasks(&self) -> TaskSnapshot {
        self.engine.snapshot()
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn set_autoplay(&mut self, enabled: bool) -> TaskSnapshot {
        self.autoplay = enabled;
        info!(autoplay = enabled, "updated autoplay");
        self.tasks()
    }

    fn commit(&self, changed: bool) -> Result<TaskSnapshot, InfraError> {
        let snapshot = self.engine.snapshot();
        if changed {
            self.store.save(&snapshot)?;
        }
        Ok(snapshot)
    }

    pub fn add_task(
        &mut self,
        name: &str,
        minutes: Option<i64>,
    ) -> Result<TaskSnapshot, InfraError> {
        let added = self.engine.add_task(name, minutes);
        match added {
            Some(id) => info!(task_id = %id, "added task"),
            None => debug!("ignored task with blank name"),
        }
        self.commit(added.is_some())
    }

    pub fn remove_task(&mut self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        let removed = self.engine.remove_task(id);
        if removed {
            info!(task_id = %id, "removed task");
        }
        self.commit(removed)
    }

    pub fn toggle_running(&mut self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        let toggled = self.engine.toggle_running(id);
        if toggled {
            info!(task_id = %id, "toggled task");
        }
        self.commit(toggled)
    }

    pub fn reset_task(&mut self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        let reset = self.engine.reset_task(id);
        if reset {
            info!(task_id = %id, "reset task");
        }
        self.commit(reset)
    }

    pub fn reset_all(&mut self) -> Result<TaskSnapshot, InfraError> {
        let reset = self.engine.reset_all();
        if reset {
            info!("reset all tasks");
        }
        self.commit(reset)
    }

    pub fn clear_all<C: Confirm + ?Sized>(
        &mut self,
        confirm: &C,
    ) -> Result<TaskSnapshot, InfraError> {
        let cleared = self.engine.clear_all(confirm);
        if cleared {
            info!("cleared all tasks");
        }
        self.commit(cleared)
    }

    pub fn reorder(&mut self, active: TaskId, over: TaskId) -> Result<TaskSnapshot, InfraError> {
        let moved = self.engine.reorder(active, over);
        if moved {
            info!(active = %active, over = %over, "reordered tasks");
        }
        self.commit(moved)
    }

    pub fn expand_pomodoro(
        &mut self,
        settings: &PomodoroSettings,
    ) -> Result<TaskSnapshot, InfraError> {
        let expanded = self
            .engine
            .expand_pomodoro(settings)
            .map_err(InfraError::InvalidInput)?;
        if expanded {
            info!(
                work_minutes = settings.work_minutes,
                break_minutes = settings.break_minutes,
                count = self.engine.snapshot().len(),
                "expanded tasks into pomodoro sessions"
            );
        }
        self.commit(expanded)
    }

    /// Runs one tick. A failed save is logged, not returned; the in-memory
    /// list stays authoritative and the next change writes it again.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.engine.tick(self.autoplay);
        if !outcome.changed {
            return outcome;
        }

        debug!(completed = outcome.completed.len(), "applied tick");
        for id in &outcome.completed {
            info!(task_id = %id, "task completed");
        }
        if let Some(handoff) = outcome.handoff {
            info!(
                finished = %handoff.finished,
                started = ?handoff.started.map(TaskId::value),
                "autoplay hand-off"
            );
        }
        if let Err(error) = self.store.save(&self.engine.snapshot()) {
            error!(%error, "failed to save tasks after tick");
        }
        outcome
    }
}
