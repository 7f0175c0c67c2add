//! Board domain model.
//!
//! # Responsibility
//! - Define the records shared by ordering, guards, services and events.
//! - Keep identifiers and timestamps in one shape across layers.
//!
//! # Invariants
//! - Every entity is identified by a stable v4 UUID.
//! - Timestamps are Unix epoch milliseconds.
//! - Positions are dense per owner: `{0, .., count - 1}`.

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod board;
pub mod card;
pub mod list;

pub type BoardId = Uuid;
pub type ListId = Uuid;
pub type CardId = Uuid;
pub type UserId = Uuid;

/// Current wall clock as epoch milliseconds.
pub fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn normalize_required_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
