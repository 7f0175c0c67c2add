//! Dense position ledger.
//!
//! # Responsibility
//! - Assign insert positions and reindex members on move and removal.
//! - Keep every intermediate state free of two members sharing a position.
//!
//! # Invariants
//! - Between completed units of work, positions in a scope are exactly
//!   `{0, .., count - 1}`.
//! - Live positions are `< SHIFT_OFFSET`; lifted spans sit in
//!   `[SHIFT_OFFSET, 2 * SHIFT_OFFSET)`; a parked member sits at
//!   `PARK_POSITION`. The three bands never overlap.
//! - Only the moved member's row is written with a new version; shifted
//!   members keep theirs.

use crate::model::{BoardId, CardId, ListId};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection};
use uuid::Uuid;

/// Band offset for lifted spans. Must exceed any real member count.
pub const SHIFT_OFFSET: i64 = 1_000_000;

/// Parking slot for a member in flight. Above every lifted span.
pub const PARK_POSITION: i64 = 1_000_000_000;

/// One ordered collection: the cards of a list or the lists of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cards(ListId),
    Lists(BoardId),
}

impl Scope {
    fn table(self) -> &'static str {
        match self {
            Self::Cards(_) => "cards",
            Self::Lists(_) => "lists",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Cards(_) => "list_uuid",
            Self::Lists(_) => "board_uuid",
        }
    }

    fn member_column(self) -> &'static str {
        match self {
            Self::Cards(_) => "card_uuid",
            Self::Lists(_) => "list_uuid",
        }
    }

    fn owner(self) -> Uuid {
        match self {
            Self::Cards(id) | Self::Lists(id) => id,
        }
    }
}

/// Resolved move after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Target equals the current slot; nothing changes.
    Stay { list_id: ListId, position: i64 },
    WithinList { list_id: ListId, from: i64, to: i64 },
    AcrossLists {
        from_list: ListId,
        from: i64,
        to_list: ListId,
        to: i64,
    },
}

impl MovePlan {
    /// Computes the plan for moving a card.
    ///
    /// `destination_count` is the destination's member count before the card
    /// leaves its source. The request is clamped to `[0, destination_count]`;
    /// within one list it is further capped at the last real slot.
    pub fn resolve(
        from_list: ListId,
        from: i64,
        to_list: ListId,
        requested: i64,
        destination_count: i64,
    ) -> Self {
        let to = requested.clamp(0, destination_count.max(0));
        if from_list != to_list {
            return Self::AcrossLists {
                from_list,
                from,
                to_list,
                to,
            };
        }

        let to = to.min((destination_count - 1).max(0));
        if to == from {
            Self::Stay {
                list_id: from_list,
                position: from,
            }
        } else {
            Self::WithinList {
                list_id: from_list,
                from,
                to,
            }
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Stay { .. })
    }

    pub fn target_list(&self) -> ListId {
        match *self {
            Self::Stay { list_id, .. } | Self::WithinList { list_id, .. } => list_id,
            Self::AcrossLists { to_list, .. } => to_list,
        }
    }

    pub fn target_position(&self) -> i64 {
        match *self {
            Self::Stay { position, .. } => position,
            Self::WithinList { to, .. } | Self::AcrossLists { to, .. } => to,
        }
    }
}

/// Position bookkeeping over one transaction's connection.
pub struct PositionLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PositionLedger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Next free slot at the end of the scope.
    pub fn next_position(&self, scope: Scope) -> RepoResult<i64> {
        let next = self.conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(position), -1) + 1
                 FROM {table}
                 WHERE {owner} = ?1
                   AND position < ?2;",
                table = scope.table(),
                owner = scope.owner_column(),
            ),
            params![scope.owner().to_string(), SHIFT_OFFSET],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Number of members in the scope.
    pub fn count(&self, scope: Scope) -> RepoResult<i64> {
        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {table} WHERE {owner} = ?1;",
                table = scope.table(),
                owner = scope.owner_column(),
            ),
            [scope.owner().to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Stored positions in ascending order.
    pub fn positions(&self, scope: Scope) -> RepoResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT position FROM {table} WHERE {owner} = ?1 ORDER BY position ASC;",
            table = scope.table(),
            owner = scope.owner_column(),
        ))?;
        let mut rows = stmt.query([scope.owner().to_string()])?;
        let mut positions = Vec::new();
        while let Some(row) = rows.next()? {
            positions.push(row.get(0)?);
        }
        Ok(positions)
    }

    /// Moves one member to the parking slot, vacating its position.
    pub fn park(&self, scope: Scope, member: Uuid) -> RepoResult<()> {
        self.conn.execute(
            &format!(
                "UPDATE {table} SET position = ?3 WHERE {member_col} = ?1 AND {owner} = ?2;",
                table = scope.table(),
                member_col = scope.member_column(),
                owner = scope.owner_column(),
            ),
            params![member.to_string(), scope.owner().to_string(), PARK_POSITION],
        )?;
        Ok(())
    }

    /// Decrements every position above the vacated slot.
    pub fn close_gap(&self, scope: Scope, vacated: i64) -> RepoResult<()> {
        self.shift_span(scope, vacated + 1, None, -1)
    }

    /// Increments every position at or above `slot`, leaving `slot` free.
    pub fn open_slot(&self, scope: Scope, slot: i64) -> RepoResult<()> {
        self.shift_span(scope, slot, None, 1)
    }

    /// Moves every live member in `[start, end]` by `delta`.
    ///
    /// Phase 1 lifts the span into the offset band, phase 2 drops it back
    /// with `delta` applied. Each statement only writes into slots nobody
    /// occupies, so per-row uniqueness holds whatever order rows are visited.
    /// `end = None` means "to the end of the scope".
    pub fn shift_span(
        &self,
        scope: Scope,
        start: i64,
        end: Option<i64>,
        delta: i64,
    ) -> RepoResult<()> {
        let end = end.unwrap_or(SHIFT_OFFSET - 1).min(SHIFT_OFFSET - 1);
        if start > end || delta == 0 {
            return Ok(());
        }
        let owner = scope.owner().to_string();

        let lifted = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET position = position + ?4
                 WHERE {owner_col} = ?1
                   AND position >= ?2
                   AND position <= ?3;",
                table = scope.table(),
                owner_col = scope.owner_column(),
            ),
            params![owner, start, end, SHIFT_OFFSET],
        )?;
        if lifted == 0 {
            return Ok(());
        }

        self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET position = position - ?4 + ?5
                 WHERE {owner_col} = ?1
                   AND position >= ?2 + ?4
                   AND position <= ?3 + ?4;",
                table = scope.table(),
                owner_col = scope.owner_column(),
            ),
            params![owner, start, end, SHIFT_OFFSET, delta],
        )?;

        debug!(
            "event=ledger_shift module=ordering status=ok table={} start={} end={} delta={} rows={}",
            scope.table(),
            start,
            end,
            delta,
            lifted
        );
        Ok(())
    }

    /// Reindexes neighbours for a card move and leaves the card parked.
    ///
    /// The caller writes the card into `plan.target_position()` afterwards,
    /// together with its version bump.
    pub fn prepare_move(&self, card_id: CardId, plan: &MovePlan) -> RepoResult<()> {
        match *plan {
            MovePlan::Stay { .. } => Ok(()),
            MovePlan::WithinList { list_id, from, to } => {
                let scope = Scope::Cards(list_id);
                self.park(scope, card_id)?;
                if to > from {
                    self.shift_span(scope, from + 1, Some(to), -1)
                } else {
                    self.shift_span(scope, to, Some(from - 1), 1)
                }
            }
            MovePlan::AcrossLists {
                from_list,
                from,
                to_list,
                to,
            } => {
                let source = Scope::Cards(from_list);
                self.park(source, card_id)?;
                self.close_gap(source, from)?;
                self.open_slot(Scope::Cards(to_list), to)
            }
        }
    }
}

/// Returns true when `positions` (ascending) is exactly `0..len`.
pub fn is_dense(positions: &[i64]) -> bool {
    positions
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i64)
}

#[cfg(test)]
mod tests {
    use super::{is_dense, MovePlan};
    use uuid::Uuid;

    #[test]
    fn same_slot_is_a_noop() {
        let list = Uuid::new_v4();
        let plan = MovePlan::resolve(list, 1, list, 1, 3);
        assert!(plan.is_noop());
    }

    #[test]
    fn request_is_clamped_into_range() {
        let list = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(
            MovePlan::resolve(list, 2, list, -5, 3),
            MovePlan::WithinList {
                list_id: list,
                from: 2,
                to: 0
            }
        );
        // Within one list the end slot is the last real position.
        assert_eq!(
            MovePlan::resolve(list, 0, list, 99, 3),
            MovePlan::WithinList {
                list_id: list,
                from: 0,
                to: 2
            }
        );
        // Across lists the end slot is one past the last card.
        assert_eq!(
            MovePlan::resolve(list, 0, other, 99, 3).target_position(),
            3
        );
        assert_eq!(
            MovePlan::resolve(list, 0, other, 7, 0).target_position(),
            0
        );
    }

    #[test]
    fn moving_the_last_card_past_the_end_is_a_noop() {
        let list = Uuid::new_v4();
        assert!(MovePlan::resolve(list, 2, list, 3, 3).is_noop());
    }

    #[test]
    fn density_check_detects_gaps_and_duplicates() {
        assert!(is_dense(&[]));
        assert!(is_dense(&[0, 1, 2]));
        assert!(!is_dense(&[0, 2]));
        assert!(!is_dense(&[0, 0, 1]));
        assert!(!is_dense(&[1, 2]));
    }
}
