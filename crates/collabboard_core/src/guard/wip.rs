//! Work-in-progress admission for lists.

use crate::error::{CoreError, CoreResult, Missing};
use crate::model::list::BoardList;
use crate::model::ListId;
use crate::ordering::{PositionLedger, Scope};
use crate::repo::SqliteListRepository;
use log::info;
use rusqlite::Connection;

pub struct WipLimiter;

impl WipLimiter {
    /// Holds `list_id` for the rest of the transaction and admits one more card.
    ///
    /// The hold is taken before counting, so a concurrent writer targeting the
    /// same list waits on the database lock instead of reading a stale count.
    pub fn admit(conn: &Connection, list_id: ListId) -> CoreResult<BoardList> {
        let list = SqliteListRepository::new(conn)
            .hold(list_id)?
            .ok_or(CoreError::NotFound(Missing::List(list_id)))?;

        let Some(limit) = list.wip_limit else {
            return Ok(list);
        };
        let current = PositionLedger::new(conn).count(Scope::Cards(list_id))?;
        if list.admits(current) {
            return Ok(list);
        }

        info!(
            "event=wip_admit module=guard status=rejected list_id={} limit={} current={}",
            list_id, limit, current
        );
        Err(CoreError::WipLimitExceeded { limit })
    }
}
