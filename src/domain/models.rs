use crate::domain::ids::TaskId;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TASK_MINUTES: u32 = 60;
pub const DEFAULT_WORK_MINUTES: u32 = 45;
pub const DEFAULT_BREAK_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    #[default]
    Countdown,
}

impl TaskMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Countdown => "countdown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "countdown" => Some(Self::Countdown),
            _ => None,
        }
    }
}

/// Role of a task produced by Pomodoro expansion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PomodoroSegment {
    Work {
        original_name: String,
        part_number: u32,
        total_parts: u32,
    },
    Break,
    TaskBreak,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub minutes: u32,
    pub time_left: u64,
    pub running: bool,
    pub completed: bool,
    pub mode: TaskMode,
    pub segment: Option<PomodoroSegment>,
}

impl Task {
    pub fn countdown(id: TaskId, name: impl Into<String>, minutes: u32) -> Self {
        Self {
            id,
            name: name.into(),
            minutes,
            time_left: full_seconds(minutes),
            running: false,
            completed: false,
            mode: TaskMode::Countdown,
            segment: None,
        }
    }

    pub fn with_segment(mut self, segment: PomodoroSegment) -> Self {
        self.segment = Some(segment);
        self
    }

    pub fn full_duration(&self) -> u64 {
        full_seconds(self.minutes)
    }

    pub fn is_active(&self) -> bool {
        self.running && self.time_left > 0
    }

    pub fn reset(&mut self) {
        self.time_left = self.full_duration();
        self.running = false;
        self.completed = false;
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.name, "task.name")?;
        if self.minutes == 0 {
            return Err("task.minutes must be > 0".to_string());
        }
        if self.time_left > self.full_duration() {
            return Err("task.time_left must be <= task.minutes * 60".to_string());
        }
        if self.completed && self.time_left > 0 {
            return Err("task.completed requires task.time_left == 0".to_string());
        }
        if let Some(PomodoroSegment::Work {
            part_number,
            total_parts,
            ..
        }) = &self.segment
        {
            if *part_number == 0 || part_number > total_parts {
                return Err("task.part_number must be within 1..=total_parts".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

impl PomodoroSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_minutes == 0 {
            return Err("pomodoro.work_minutes must be > 0".to_string());
        }
        if self.break_minutes == 0 {
            return Err("pomodoro.break_minutes must be > 0".to_string());
        }
        Ok(())
    }
}

pub fn full_seconds(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_task() -> Task {
        Task::countdown(TaskId::new(1), "Write tests", 25)
    }

    #[test]
    fn countdown_task_starts_full_and_idle() {
        let task = sample_task();
        assert_eq!(task.time_left, 1500);
        assert!(!task.running);
        assert!(!task.completed);
        assert_eq!(task.mode, TaskMode::Countdown);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn task_validate_rejects_empty_name() {
        let mut task = sample_task();
        task.name = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn task_validate_rejects_overfull_time_left() {
        let mut task = sample_task();
        task.time_left = task.full_duration() + 1;
        assert!(task.validate().is_err());
    }

    #[test]
    fn task_validate_rejects_part_out_of_range() {
        let task = sample_task().with_segment(PomodoroSegment::Work {
            original_name: "Write tests".to_string(),
            part_number: 3,
            total_parts: 2,
        });
        assert!(task.validate().is_err());
    }

    #[test]
    fn pomodoro_settings_reject_zero_durations() {
        assert!(PomodoroSettings::default().validate().is_ok());
        let zero_work = PomodoroSettings {
            work_minutes: 0,
            break_minutes: 5,
        };
        let zero_break = PomodoroSettings {
            work_minutes: 25,
            break_minutes: 0,
        };
        assert!(zero_work.validate().is_err());
        assert!(zero_break.validate().is_err());
    }

    #[test]
    fn mode_parses_only_countdown() {
        assert_eq!(TaskMode::parse("countdown"), Some(TaskMode::Countdown));
        assert_eq!(TaskMode::parse("stopwatch"), None);
        assert_eq!(TaskMode::Countdown.as_str(), "countdown");
    }

    proptest! {
        #[test]
        fn reset_restores_full_duration(
            minutes in 1u32..600u32,
            elapsed in 0u64..36_000u64,
            running in any::<bool>()
        ) {
            let mut task = Task::countdown(TaskId::new(7), "Study", minutes);
            task.time_left = task.full_duration().saturating_sub(elapsed);
            task.completed = task.time_left == 0;
            task.running = running;

            task.reset();

            prop_assert_eq!(task.time_left, u64::from(minutes) * 60);
            prop_assert!(!task.running);
            prop_assert!(!task.completed);
        }
    }
}
