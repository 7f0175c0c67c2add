//! Board list model.

use super::{BoardId, ListId};
use serde::{Deserialize, Serialize};

/// Ordered column of cards on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    pub id: ListId,
    pub board_id: BoardId,
    pub name: String,
    /// Dense per board, same invariant as card positions.
    pub position: i64,
    /// Maximum member count. `None` means unbounded.
    pub wip_limit: Option<i64>,
}

impl BoardList {
    /// Returns whether a list holding `current` cards can take one more.
    pub fn admits(&self, current: i64) -> bool {
        self.wip_limit.map_or(true, |limit| current < limit)
    }
}
