use crate::domain::ids::IdGenerator;
use crate::domain::models::{PomodoroSegment, PomodoroSettings, Task};

/// Upper bound on the number of tasks a single expansion may produce.
pub const MAX_EXPANDED_TASKS: u64 = 10_000;

/// Replaces every task with alternating work and break sub-tasks.
///
/// Work sessions are at most `work_minutes` long; a break follows every session
/// except the last one of a task, and a task break separates consecutive
/// original tasks. Ids come from `ids` in creation order.
pub fn expand_tasks(
    tasks: &[Task],
    settings: &PomodoroSettings,
    ids: &mut IdGenerator,
) -> Result<Vec<Task>, String> {
    settings.validate()?;
    let work = settings.work_minutes;
    let pause = settings.break_minutes;

    let count = expanded_len(tasks, work);
    if count > MAX_EXPANDED_TASKS {
        return Err(format!(
            "pomodoro expansion would create {count} sessions (limit {MAX_EXPANDED_TASKS})"
        ));
    }

    let mut expanded = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    for (index, task) in tasks.iter().enumerate() {
        let total_parts = task.minutes.div_ceil(work);
        let mut remaining = task.minutes;
        let mut part_number = 0;

        while remaining > 0 {
            part_number += 1;
            let session = work.min(remaining);
            remaining -= session;

            expanded.push(
                Task::countdown(
                    ids.next_id(),
                    format!("{} - Part {part_number} (🍅 {session}min)", task.name),
                    session,
                )
                .with_segment(PomodoroSegment::Work {
                    original_name: task.name.clone(),
                    part_number,
                    total_parts,
                }),
            );

            if remaining > 0 {
                expanded.push(
                    Task::countdown(
                        ids.next_id(),
                        format!("☕ Break {part_number} ({pause}min)"),
                        pause,
                    )
                    .with_segment(PomodoroSegment::Break),
                );
            }
        }

        if index + 1 < tasks.len() {
            expanded.push(
                Task::countdown(ids.next_id(), format!("☕ Task Break ({pause}min)"), pause)
                    .with_segment(PomodoroSegment::TaskBreak),
            );
        }
    }

    Ok(expanded)
}

/// Work parts and breaks for every task, plus one task break between tasks.
fn expanded_len(tasks: &[Task], work: u32) -> u64 {
    let sessions: u64 = tasks
        .iter()
        .map(|task| 2 * u64::from(task.minutes.div_ceil(work)) - 1)
        .sum();
    let task_breaks = u64::try_from(tasks.len().saturating_sub(1)).unwrap_or(u64::MAX);
    sessions.saturating_add(task_breaks)
}
