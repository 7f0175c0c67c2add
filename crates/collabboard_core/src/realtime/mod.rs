//! Live board updates.
//!
//! # Responsibility
//! - Define the event envelope subscribers receive.
//! - Stage events per unit of work and deliver them only after commit.
//!
//! # Invariants
//! - Nothing staged by an aborted unit of work is ever delivered.
//! - Events of one unit of work reach a subscriber in staging order.
//! - Delivery is at-most-once; there is no replay.

pub mod event;
pub mod publisher;
pub mod staging;

pub use event::{BoardEvent, BoardEventType, EventData};
pub use publisher::{
    BoardEventHub, BoardSubscription, CommitGatedPublisher, UnitOutcome, UnitState,
};
pub use staging::EventStagingBuffer;
