//! Commit-gated delivery of board events.
//!
//! # Responsibility
//! - Fan events out to per-board subscriber channels.
//! - End units of work: commit then flush, or roll back then discard.
//!
//! # Invariants
//! - A unit of work ends in exactly one of `Flushed` or `Discarded`.
//! - Delivery happens only after `COMMIT` returned success.
//! - A board without subscribers drops events silently.

use super::event::BoardEvent;
use crate::error::CoreResult;
use crate::model::BoardId;
use crate::uow::UnitOfWork;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use uuid::Uuid;

/// Default per-board channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle of one unit of work.
///
/// `Active -> Committed -> Flushed` or `Active -> Aborted -> Discarded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Active,
    Committed,
    Flushed,
    Aborted,
    Discarded,
}

impl UnitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Committed => "committed",
            Self::Flushed => "flushed",
            Self::Aborted => "aborted",
            Self::Discarded => "discarded",
        }
    }
}

/// How a unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitOutcome {
    pub correlation_id: Uuid,
    pub state: UnitState,
    /// Events the unit had staged.
    pub staged: usize,
    /// Receiver deliveries summed over the staged events.
    pub delivered: usize,
}

/// Per-board broadcast topics shared by every worker.
pub struct BoardEventHub {
    capacity: usize,
    topics: Mutex<HashMap<BoardId, broadcast::Sender<BoardEvent>>>,
}

impl BoardEventHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Starts receiving events published for `board_id` from now on.
    ///
    /// Topics whose subscribers have all gone are swept first.
    pub fn subscribe(&self, board_id: BoardId) -> BoardSubscription {
        let mut topics = self.topics();
        topics.retain(|_, sender| sender.receiver_count() > 0);
        let receiver = topics
            .entry(board_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();
        BoardSubscription { board_id, receiver }
    }

    /// Sends one event to the board's current subscribers.
    ///
    /// Returns how many receivers got it. Topics nobody listens to are
    /// dropped.
    pub fn publish(&self, event: BoardEvent) -> usize {
        let mut topics = self.topics();
        let Some(sender) = topics.get(&event.board_id) else {
            return 0;
        };
        let board_id = event.board_id;
        match sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                topics.remove(&board_id);
                0
            }
        }
    }

    /// Live receivers for the board. A topic found empty is removed.
    pub fn subscriber_count(&self, board_id: BoardId) -> usize {
        let mut topics = self.topics();
        let count = topics
            .get(&board_id)
            .map_or(0, broadcast::Sender::receiver_count);
        if count == 0 {
            topics.remove(&board_id);
        }
        count
    }

    /// Boards that currently hold a topic.
    pub fn topic_count(&self) -> usize {
        self.topics().len()
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<BoardId, broadcast::Sender<BoardEvent>>> {
        // Topics stay consistent across a panicking holder; recover the guard.
        self.topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for BoardEventHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Receiving end for one board.
pub struct BoardSubscription {
    board_id: BoardId,
    receiver: broadcast::Receiver<BoardEvent>,
}

impl BoardSubscription {
    pub fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Next buffered event, skipping over anything lost to lag.
    pub fn try_next(&mut self) -> Option<BoardEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => self.log_lag(skipped),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every event buffered right now.
    pub fn drain(&mut self) -> Vec<BoardEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Waits for the next event. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<BoardEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => self.log_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn log_lag(&self, skipped: u64) {
        warn!(
            "event=subscriber_lag module=realtime status=error board_id={} skipped={}",
            self.board_id, skipped
        );
    }
}

/// Ends units of work and delivers what committed ones staged.
#[derive(Clone)]
pub struct CommitGatedPublisher {
    hub: Arc<BoardEventHub>,
}

impl CommitGatedPublisher {
    pub fn new(hub: Arc<BoardEventHub>) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &Arc<BoardEventHub> {
        &self.hub
    }

    pub fn begin<'conn>(&self, conn: &'conn Connection) -> CoreResult<UnitOfWork<'conn>> {
        UnitOfWork::begin(conn)
    }

    /// Commits the unit, then delivers its events in staging order.
    ///
    /// A failed commit rolls back and discards; the error is returned.
    pub fn complete(&self, mut uow: UnitOfWork<'_>) -> CoreResult<UnitOutcome> {
        let correlation_id = uow.correlation_id();
        let staged_count = uow.staged().len();

        if let Err(err) = uow.commit() {
            uow.discard();
            error!(
                "event=uow_commit module=realtime status=error correlation_id={} state={} error={}",
                correlation_id,
                uow.state().as_str(),
                err
            );
            return Err(err);
        }
        debug!(
            "event=uow_commit module=realtime status=ok correlation_id={} state={}",
            correlation_id,
            uow.state().as_str()
        );

        let delivered: usize = uow
            .flush()
            .into_iter()
            .map(|event| self.hub.publish(event))
            .sum();
        info!(
            "event=uow_flush module=realtime status=ok correlation_id={} state={} staged={} delivered={}",
            correlation_id,
            uow.state().as_str(),
            staged_count,
            delivered
        );
        Ok(UnitOutcome {
            correlation_id,
            state: uow.state(),
            staged: staged_count,
            delivered,
        })
    }

    /// Rolls the unit back and discards its staged events.
    pub fn abort(&self, mut uow: UnitOfWork<'_>) -> UnitOutcome {
        let correlation_id = uow.correlation_id();

        if let Err(err) = uow.rollback() {
            warn!(
                "event=uow_rollback module=realtime status=error correlation_id={} error={}",
                correlation_id, err
            );
        }
        let staged_count = uow.discard();
        info!(
            "event=uow_abort module=realtime status=ok correlation_id={} state={} discarded={}",
            correlation_id,
            uow.state().as_str(),
            staged_count
        );
        UnitOutcome {
            correlation_id,
            state: uow.state(),
            staged: staged_count,
            delivered: 0,
        }
    }

    /// Runs `work` in a fresh unit of work and ends it by its result.
    pub fn run<T, F>(&self, conn: &Connection, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> CoreResult<T>,
    {
        let mut uow = self.begin(conn)?;
        match work(&mut uow) {
            Ok(value) => {
                self.complete(uow)?;
                Ok(value)
            }
            Err(err) => {
                if err.is_internal() {
                    error!(
                        "event=uow_run module=realtime status=error correlation_id={} code={} cause={:?}",
                        uow.correlation_id(),
                        err.code(),
                        std::error::Error::source(&err).map(|cause| cause.to_string())
                    );
                }
                self.abort(uow);
                Err(err)
            }
        }
    }
}
