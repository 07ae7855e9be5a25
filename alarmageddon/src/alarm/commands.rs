//! Command types sent from [`AlarmHandle`] to the state machine task.
//!
//! Each command carries a oneshot reply channel so the caller can await
//! the outcome of the transition it asked for.

use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot, watch};

use super::schedule::AlarmTime;
use super::session::AlarmSnapshot;
use crate::error::{Error, Result};

#[derive(Debug)]
pub(super) enum AlarmCommand {
    /// Arm the alarm for the next occurrence of `time`.
    Schedule {
        time: AlarmTime,
        reply: oneshot::Sender<Result<OffsetDateTime>>,
    },

    /// Disarm a scheduled alarm before it fires.
    Cancel { reply: oneshot::Sender<Result<()>> },
}

/// Cloneable front end to a running [`AlarmStateMachine`](super::AlarmStateMachine).
#[derive(Debug, Clone)]
pub struct AlarmHandle {
    command_tx: mpsc::Sender<AlarmCommand>,
    snapshot_rx: watch::Receiver<AlarmSnapshot>,
}

impl AlarmHandle {
    pub(super) fn new(
        command_tx: mpsc::Sender<AlarmCommand>,
        snapshot_rx: watch::Receiver<AlarmSnapshot>,
    ) -> Self {
        Self {
            command_tx,
            snapshot_rx,
        }
    }

    /// Schedule the alarm. Returns the instant it will ring.
    ///
    /// Fails with `InvalidPhase` if an alarm is already scheduled or
    /// ringing, and with `LocationUnavailable` if no origin fix could be
    /// taken.
    pub async fn schedule(&self, time: AlarmTime) -> Result<OffsetDateTime> {
        let (reply, rx) = oneshot::channel();
        self.send(AlarmCommand::Schedule { time, reply }).await?;
        rx.await.map_err(|_| Error::Stopped)?
    }

    /// Cancel a scheduled alarm. Only valid before it fires.
    pub async fn cancel(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(AlarmCommand::Cancel { reply }).await?;
        rx.await.map_err(|_| Error::Stopped)?
    }

    /// Current state for rendering.
    pub fn state(&self) -> AlarmSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AlarmSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, command: AlarmCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| Error::Stopped)
    }
}
