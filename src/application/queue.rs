use crate::application::board::TaskBoard;
use crate::application::engine::{Confirm, TaskSnapshot};
use crate::domain::ids::TaskId;
use crate::domain::models::PomodoroSettings;
use crate::infrastructure::blob_store::BlobStore;
use crate::infrastructure::error::InfraError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const COMMAND_QUEUE_CAPACITY: usize = 64;

pub enum BoardCommand {
    List,
    Add { name: String, minutes: Option<i64> },
    Remove(TaskId),
    Toggle(TaskId),
    Reset(TaskId),
    ResetAll,
    ClearAll(Box<dyn Confirm + Send>),
    Reorder { active: TaskId, over: TaskId },
    ExpandPomodoro(PomodoroSettings),
    SetAutoplay(bool),
}

impl BoardCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Add { .. } => "add",
            Self::Remove(_) => "remove",
            Self::Toggle(_) => "toggle",
            Self::Reset(_) => "reset",
            Self::ResetAll => "reset_all",
            Self::ClearAll(_) => "clear_all",
            Self::Reorder { .. } => "reorder",
            Self::ExpandPomodoro(_) => "expand_pomodoro",
            Self::SetAutoplay(_) => "set_autoplay",
        }
    }
}

enum Envelope {
    Request {
        command: BoardCommand,
        reply: oneshot::Sender<Result<TaskSnapshot, InfraError>>,
    },
    Tick {
        generation: u64,
    },
}

/// Cloneable sender side of the board's command queue.
///
/// The board task is the only writer of the task list; user commands and
/// scheduler ticks are applied one at a time in arrival order.
#[derive(Clone)]
pub struct BoardHandle {
    sender: mpsc::Sender<Envelope>,
    tick_generation: Arc<AtomicU64>,
}

pub fn spawn_board<S>(board: TaskBoard<S>) -> (BoardHandle, JoinHandle<()>)
where
    S: BlobStore + 'static,
{
    let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let tick_generation = Arc::new(AtomicU64::new(0));
    let worker = tokio::spawn(run_board(board, receiver, Arc::clone(&tick_generation)));
    (
        BoardHandle {
            sender,
            tick_generation,
        },
        worker,
    )
}

async fn run_board<S: BlobStore>(
    mut board: TaskBoard<S>,
    mut receiver: mpsc::Receiver<Envelope>,
    tick_generation: Arc<AtomicU64>,
) {
    while let Some(envelope) = receiver.recv().await {
        match envelope {
            Envelope::Tick { generation } => {
                if generation != tick_generation.load(Ordering::Acquire) {
                    trace!(generation, "dropping tick from stopped scheduler");
                    continue;
                }
                board.tick();
            }
            Envelope::Request { command, reply } => {
                trace!(command = command.name(), "applying board command");
                let result = apply(&mut board, command);
                let _ = reply.send(result);
            }
        }
    }
    debug!("board queue closed");
}

fn apply<S: BlobStore>(
    board: &mut TaskBoard<S>,
    command: BoardCommand,
) -> Result<TaskSnapshot, InfraError> {
    match command {
        BoardCommand::List => Ok(board.tasks()),
        BoardCommand::Add { name, minutes } => board.add_task(&name, minutes),
        BoardCommand::Remove(id) => board.remove_task(id),
        BoardCommand::Toggle(id) => board.toggle_running(id),
        BoardCommand::Reset(id) => board.reset_task(id),
        BoardCommand::ResetAll => board.reset_all(),
        BoardCommand::ClearAll(confirm) => board.clear_all(confirm.as_ref()),
        BoardCommand::Reorder { active, over } => board.reorder(active, over),
        BoardCommand::ExpandPomodoro(settings) => board.expand_pomodoro(&settings),
        BoardCommand::SetAutoplay(enabled) => Ok(board.set_autoplay(enabled)),
    }
}

impl BoardHandle {
    pub async fn request(&self, command: BoardCommand) -> Result<TaskSnapshot, InfraError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope::Request { command, reply })
            .await
            .map_err(|_| InfraError::BoardUnavailable)?;
        response.await.map_err(|_| InfraError::BoardUnavailable)?
    }

    pub async fn list(&self) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::List).await
    }

    pub async fn add_task(
        &self,
        name: impl Into<String>,
        minutes: Option<i64>,
    ) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::Add {
            name: name.into(),
            minutes,
        })
        .await
    }

    pub async fn remove_task(&self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::Remove(id)).await
    }

    pub async fn toggle_running(&self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::Toggle(id)).await
    }

    pub async fn reset_task(&self, id: TaskId) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::Reset(id)).await
    }

    pub async fn reset_all(&self) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::ResetAll).await
    }

    pub async fn clear_all<C>(&self, confirm: C) -> Result<TaskSnapshot, InfraError>
    where
        C: Confirm + Send + 'static,
    {
        self.request(BoardCommand::ClearAll(Box::new(confirm))).await
    }

    pub async fn reorder(&self, active: TaskId, over: TaskId) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::Reorder { active, over }).await
    }

    pub async fn expand_pomodoro(
        &self,
        settings: PomodoroSettings,
    ) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::ExpandPomodoro(settings)).await
    }

    pub async fn set_autoplay(&self, enabled: bool) -> Result<TaskSnapshot, InfraError> {
        self.request(BoardCommand::SetAutoplay(enabled)).await
    }

    /// Opens a new tick generation; ticks from earlier generations are dropped.
    pub(crate) fn begin_ticks(&self) -> u64 {
        self.tick_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Closes `generation` if it is still the active one.
    pub(crate) fn retire_ticks(&self, generation: u64) {
        let _ = self.tick_generation.compare_exchange(
            generation,
            generation + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Queues a tick; `false` once the board has shut down.
    pub(crate) async fn send_tick(&self, generation: u64) -> bool {
        self.sender
            .send(Envelope::Tick { generation })
            .await
            .is_ok()
    }
}
