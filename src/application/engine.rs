use crate::domain::ids::{IdGenerator, TaskId};
use crate::domain::models::{PomodoroSettings, Task, DEFAULT_TASK_MINUTES};
use crate::domain::pomodoro::expand_tasks;
use std::sync::Arc;

/// Immutable view of the task list; every mutation publishes a new one.
pub type TaskSnapshot = Arc<[Task]>;

/// Yes/no gate in front of destructive operations.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub const CLEAR_ALL_PROMPT: &str = "Are you sure you want to delete all tasks?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub finished: TaskId,
    pub started: Option<TaskId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub changed: bool,
    pub completed: Vec<TaskId>,
    pub handoff: Option<Handoff>,
}

/// Converts raw form input into a minute count; anything non-numeric is `None`.
pub fn parse_minutes_input(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(whole) = trimmed.parse::<i64>() {
        return Some(whole);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
}

#[derive(Debug, Clone)]
pub struct TaskListEngine {
    tasks: TaskSnapshot,
    ids: IdGenerator,
}

impl Default for TaskListEngine {
    fn default() -> Self {
        Self::new(IdGenerator::new())
    }
}

impl TaskListEngine {
    pub fn new(ids: IdGenerator) -> Self {
        Self {
            tasks: Arc::from(Vec::new()),
            ids,
        }
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        Arc::clone(&self.tasks)
    }

    pub fn ids_mut(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        for task in &tasks {
            self.ids.observe(task.id);
        }
        self.publish(tasks);
    }

    fn publish(&mut self, tasks: Vec<Task>) {
        self.tasks = Arc::from(tasks);
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    /// Copies the list, applies `change` to the task with `id` and publishes.
    fn update_task<F>(&mut self, id: TaskId, change: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        let Some(index) = self.position(id) else {
            return false;
        };
        let mut next = self.tasks.to_vec();
        change(&mut next[index]);
        self.publish(next);
        true
    }

    /// Appends a countdown task. Blank names are ignored; missing or
    /// non-positive minutes fall back to an hour.
    pub fn add_task(&mut self, name: &str, minutes_input: Option<i64>) -> Option<TaskId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let minutes = minutes_input
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| u32::try_from(minutes).ok())
            .unwrap_or(DEFAULT_TASK_MINUTES);

        let id = self.ids.next_id();
        let mut next = self.tasks.to_vec();
        next.push(Task::countdown(id, name, minutes));
        self.publish(next);
        Some(id)
    }

    pub fn remove_task(&mut self, id: TaskId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        let next = self
            .tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect();
        self.publish(next);
        true
    }

    /// Starts or pauses one task. Other tasks keep their state.
    pub fn toggle_running(&mut self, id: TaskId) -> bool {
        self.update_task(id, |task| task.running = !task.running)
    }

    pub fn reset_task(&mut self, id: TaskId) -> bool {
        self.update_task(id, Task::reset)
    }

    pub fn reset_all(&mut self) -> bool {
        if self.tasks.is_empty() {
            return false;
        }
        let mut next = self.tasks.to_vec();
        next.iter_mut().for_each(Task::reset);
        self.publish(next);
        true
    }

    /// Empties the list once `confirm` agrees. An empty list is left alone
    /// without asking.
    pub fn clear_all<C: Confirm + ?Sized>(&mut self, confirm: &C) -> bool {
        if self.tasks.is_empty() || !confirm.confirm(CLEAR_ALL_PROMPT) {
            return false;
        }
        self.publish(Vec::new());
        true
    }

    /// Moves the task `active` into the slot currently held by `over`.
    pub fn reorder(&mut self, active: TaskId, over: TaskId) -> bool {
        if active == over {
            return false;
        }
        match (self.position(active), self.position(over)) {
            (Some(from), Some(to)) => self.move_task(from, to),
            _ => false,
        }
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.tasks.len() || to >= self.tasks.len() {
            return false;
        }
        let mut next = self.tasks.to_vec();
        let moved = next.remove(from);
        next.insert(to, moved);
        self.publish(next);
        true
    }

    /// Advances every running task by one second.
    ///
    /// With `autoplay`, the first task that finished this tick is stopped and
    /// the task right after it is started if it still has time left.
    pub fn tick(&mut self, autoplay: bool) -> TickOutcome {
        if !self.tasks.iter().any(Task::is_active) {
            return TickOutcome::default();
        }

        let mut next = self.tasks.to_vec();
        let mut completed = Vec::new();
        let mut first_finished = None;
        for (index, task) in next.iter_mut().enumerate() {
            if !task.is_active() {
                continue;
            }
            task.time_left -= 1;
            if task.time_left == 0 {
                task.completed = true;
                completed.push(task.id);
                if first_finished.is_none() {
                    first_finished = Some(index);
                }
            }
        }

        let handoff = match first_finished {
            Some(index) if autoplay => {
                next[index].running = false;
                let started = next
                    .get_mut(index + 1)
                    .filter(|candidate| candidate.time_left > 0)
                    .map(|candidate| {
                        candidate.running = true;
                        candidate.id
                    });
                Some(Handoff {
                    finished: next[index].id,
                    started,
                })
            }
            _ => None,
        };

        self.publish(next);
        TickOutcome {
            changed: true,
            completed,
            handoff,
        }
    }

    /// Replaces the whole list with its Pomodoro expansion.
    pub fn expand_pomodoro(&mut self, settings: &PomodoroSettings) -> Result<bool, String> {
        if self.tasks.is_empty() {
            settings.validate()?;
            return Ok(false);
        }
        let expanded = expand_tasks(&self.tasks, settings, &mut self.ids)?;
        self.publish(expanded);
        Ok(true)
    }
}
