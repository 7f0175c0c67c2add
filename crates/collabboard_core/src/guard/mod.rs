//! Pre-write checks every mutation passes through.
//!
//! # Responsibility
//! - Authorize the acting user against the board that owns a resource.
//! - Reject stale client versions and build the conflict payload.
//! - Admit or refuse inserts into capacity-limited lists.
//!
//! # Invariants
//! - Guards run inside the caller's unit of work and never commit.
//! - A refusal leaves storage untouched; the caller aborts the unit.

pub mod access;
pub mod concurrency;
pub mod wip;

pub use access::{AccessControl, MembershipAccess, Resource};
pub use concurrency::ConcurrencyGuard;
pub use wip::WipLimiter;
