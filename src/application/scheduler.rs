use crate::application::queue::BoardHandle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Feeds one tick per period into the board queue until stopped.
///
/// Each scheduler owns a tick generation. Stopping it (or dropping it)
/// retires that generation, so ticks it already queued are discarded by the
/// board instead of firing late.
pub struct TickScheduler {
    board: BoardHandle,
    generation: u64,
    worker: JoinHandle<()>,
}

impl TickScheduler {
    pub fn start(board: BoardHandle, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let generation = board.begin_ticks();
        let sender = board.clone();

        let worker = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !sender.send_tick(generation).await {
                    debug!(generation, "board closed, stopping tick scheduler");
                    break;
                }
            }
        });

        info!(
            generation,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "tick scheduler started"
        );
        Self {
            board,
            generation,
            worker,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.worker.abort();
        self.board.retire_ticks(self.generation);
        info!(generation = self.generation, "tick scheduler stopped");
    }
}
