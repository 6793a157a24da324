//! The worker <-> coordinator message protocol.
//!
//! `Channel<T>` is a thin pair of `tokio::sync::mpsc` halves with a
//! `Default` impl. An ordinary actor handle only needs to return the sender
//! half to the owner and keep the receiver inside the spawned task; here
//! both directions matter (the coordinator sends `Reset`/`SendState` down
//! and workers send `Report`/a state snapshot back up), so `WorkerHandle`
//! keeps one sender and one receiver per worker.

use tokio::sync::mpsc;

use crate::worker::state::WorkerState;

/// Sent from the coordinator down to a worker.
#[derive(Debug, Clone)]
pub enum Command {
    /// Ask the worker to report its current state back up the `Report`
    /// reply, without interrupting its search.
    Report,
    /// Ask the worker to send its full state for a prospective `exploit`
    /// copy.
    SendState,
    /// Overwrite the worker's hyperparameters and solution with the given
    /// template, drawn from a better-performing sibling.
    Reset(WorkerState),
}

/// Reply to `Command::Report`: the worker's step count and its full rolling
/// value history, the two ingredients the Welch and velocity selection
/// policies need.
#[derive(Debug, Clone)]
pub struct Report {
    pub steps: u64,
    pub value_history: Vec<crate::Value>,
}

/// Sent from a worker back up to the coordinator, in reply to a `Command`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Acknowledges `Command::Report`.
    Reported(Report),
    /// Acknowledges `Command::SendState`.
    State(WorkerState),
}

/// A bidirectional pair of `tokio::sync::mpsc` channel halves.
/// `Channel<Command>` carries coordinator -> worker traffic, `Channel<Reply>`
/// the reverse.
pub struct Channel<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl<T> Channel<T> {
    pub fn tx(&self) -> mpsc::UnboundedSender<T> {
        self.tx.clone()
    }

    pub fn split(self) -> (mpsc::UnboundedSender<T>, mpsc::UnboundedReceiver<T>) {
        (self.tx, self.rx)
    }
}

/// The coordinator's handle onto one worker: a sender for `Command`s and a
/// receiver for `Reply`s. The worker itself owns the opposite halves.
pub struct WorkerHandle {
    pub index: usize,
    pub commands: mpsc::UnboundedSender<Command>,
    pub replies: mpsc::UnboundedReceiver<Reply>,
}

/// The worker's own end of the protocol: a receiver for incoming
/// `Command`s and a sender for `Reply`s.
pub struct WorkerEnd {
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub replies: mpsc::UnboundedSender<Reply>,
}

/// Builds one coordinator-facing handle and one worker-facing end sharing a
/// pair of channels.
pub fn worker_link(index: usize) -> (WorkerHandle, WorkerEnd) {
    let down: Channel<Command> = Channel::default();
    let up: Channel<Reply> = Channel::default();
    let (command_tx, command_rx) = down.split();
    let (reply_tx, reply_rx) = up.split();
    (
        WorkerHandle {
            index,
            commands: command_tx,
            replies: reply_rx,
        },
        WorkerEnd {
            commands: command_rx,
            replies: reply_tx,
        },
    )
}

impl WorkerEnd {
    /// Drains every pending command without blocking, applying each in
    /// order. A worker polls between SA steps and must never block waiting
    /// on the coordinator, but also must not miss a command because only
    /// one was read per step.
    pub fn drain<'a>(&'a mut self) -> impl Iterator<Item = Command> + 'a {
        std::iter::from_fn(move || self.commands.try_recv().ok())
    }
}
