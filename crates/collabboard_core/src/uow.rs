//! Unit of work: one write transaction plus the events it staged.
//!
//! # Invariants
//! - The transaction is `BEGIN IMMEDIATE`; the write lock is held from the
//!   first statement, so guard checks and the writes they admit are atomic.
//! - State only moves `Active -> Committed -> Flushed` or
//!   `Active -> Aborted -> Discarded`.
//! - Staged events never outlive the transaction; see
//!   [`crate::realtime::CommitGatedPublisher`] for how a unit ends.

use crate::error::CoreResult;
use crate::realtime::{BoardEvent, EventStagingBuffer, UnitState};
use crate::repo::ensure_schema_ready;
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use uuid::Uuid;

pub struct UnitOfWork<'conn> {
    conn: &'conn Connection,
    /// `Some` while active.
    tx: Option<Transaction<'conn>>,
    staged: EventStagingBuffer,
    state: UnitState,
}

impl<'conn> UnitOfWork<'conn> {
    /// Opens an immediate transaction on a migrated connection.
    pub fn begin(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_schema_ready(conn)?;
        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let staged = EventStagingBuffer::new();
        debug!(
            "event=uow_begin module=uow status=ok correlation_id={}",
            staged.correlation_id()
        );
        Ok(Self {
            conn,
            tx: Some(tx),
            staged,
            state: UnitState::Active,
        })
    }

    /// Connection bound to this unit's transaction.
    pub fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn correlation_id(&self) -> Uuid {
        self.staged.correlation_id()
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Stages `event` for delivery after commit.
    pub fn stage(&mut self, event: BoardEvent) {
        self.staged.stage(event);
    }

    pub fn staged(&self) -> &[BoardEvent] {
        self.staged.events()
    }

    /// Commits the transaction. A failed commit rolls back and leaves the
    /// unit `Aborted`.
    pub(crate) fn commit(&mut self) -> CoreResult<()> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        match tx.commit() {
            Ok(()) => {
                self.state = UnitState::Committed;
                Ok(())
            }
            Err(err) => {
                self.state = UnitState::Aborted;
                Err(err.into())
            }
        }
    }

    pub(crate) fn rollback(&mut self) -> CoreResult<()> {
        self.state = UnitState::Aborted;
        match self.tx.take() {
            Some(tx) => Ok(tx.rollback()?),
            None => Ok(()),
        }
    }

    /// Hands out the staged events of a committed unit.
    pub(crate) fn flush(&mut self) -> Vec<BoardEvent> {
        if self.state != UnitState::Committed {
            return Vec::new();
        }
        self.state = UnitState::Flushed;
        self.staged.drain()
    }

    /// Drops the staged events of an aborted unit. Returns how many were dropped.
    pub(crate) fn discard(&mut self) -> usize {
        let dropped = self.staged.len();
        self.staged.clear();
        self.state = UnitState::Discarded;
        dropped
    }
}
