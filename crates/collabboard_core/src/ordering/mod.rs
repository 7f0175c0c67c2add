//! Dense ordering of cards within lists and lists within boards.

pub mod ledger;

pub use ledger::{is_dense, MovePlan, PositionLedger, Scope, PARK_POSITION, SHIFT_OFFSET};
