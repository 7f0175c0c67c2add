//! Board use-case services.
//!
//! # Responsibility
//! - Run each use case inside the caller's unit of work: authorize, load,
//!   guard, reindex, write, stage the event.
//! - Map missing rows to `NotFound` and guard refusals to typed errors.
//!
//! # Invariants
//! - Services never commit; the publisher ends the unit of work.
//! - Events are staged only after every write of the use case succeeded.

use crate::error::{CoreError, CoreResult};
use crate::ordering::SHIFT_OFFSET;

pub mod board_service;
pub mod card_service;
pub mod list_service;

pub use board_service::BoardService;
pub use card_service::CardService;
pub use list_service::ListService;

/// Rejects a new member when its scope has no room left below the shift band.
pub(crate) fn ensure_room(next_position: i64, what: &str) -> CoreResult<()> {
    if next_position >= SHIFT_OFFSET {
        return Err(CoreError::bad_request(format!(
            "{what} cannot hold more than {SHIFT_OFFSET} entries"
        )));
    }
    Ok(())
}
