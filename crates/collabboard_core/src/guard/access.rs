//! Board access capability.

use crate::error::{CoreError, CoreResult, Denial, Missing};
use crate::model::board::BoardRole;
use crate::model::{BoardId, CardId, ListId, UserId};
use crate::repo::{SqliteBoardRepository, SqliteCardRepository, SqliteListRepository};
use log::info;
use rusqlite::Connection;

/// Resource a request targets. Each one resolves to exactly one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Board(BoardId),
    List(ListId),
    Card(CardId),
}

/// Authorization capability injected into services.
///
/// Each check resolves the owning board, returning `NotFound` for an unknown
/// resource and `Forbidden` when the user lacks the role.
pub trait AccessControl {
    fn require_read(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId>;

    fn require_write(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId>;

    fn require_owner(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId>;
}

/// Capability backed by the `board_members` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MembershipAccess;

impl MembershipAccess {
    fn check(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
        allowed: fn(BoardRole) -> bool,
        denial: Denial,
    ) -> CoreResult<BoardId> {
        let board_id = resolve_board(conn, resource)?;
        let role = SqliteBoardRepository::new(conn).role_of(board_id, user)?;
        match role {
            None => {
                info!(
                    "event=access_check module=guard status=rejected board_id={} user_id={} reason=not_a_member",
                    board_id, user
                );
                Err(CoreError::Forbidden(Denial::NotAMember))
            }
            Some(role) if !allowed(role) => {
                info!(
                    "event=access_check module=guard status=rejected board_id={} user_id={} role={}",
                    board_id,
                    user,
                    role.as_str()
                );
                Err(CoreError::Forbidden(denial))
            }
            Some(_) => Ok(board_id),
        }
    }
}

impl AccessControl for MembershipAccess {
    fn require_read(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId> {
        self.check(conn, resource, user, |_| true, Denial::NotAMember)
    }

    fn require_write(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId> {
        self.check(
            conn,
            resource,
            user,
            BoardRole::can_write,
            Denial::InsufficientRole,
        )
    }

    fn require_owner(
        &self,
        conn: &Connection,
        resource: Resource,
        user: UserId,
    ) -> CoreResult<BoardId> {
        self.check(
            conn,
            resource,
            user,
            |role| role == BoardRole::Owner,
            Denial::OwnerRequired,
        )
    }
}

/// Maps a resource to the id of the board that owns it.
pub fn resolve_board(conn: &Connection, resource: Resource) -> CoreResult<BoardId> {
    match resource {
        Resource::Board(id) => {
            if SqliteBoardRepository::new(conn).board_exists(id)? {
                Ok(id)
            } else {
                Err(CoreError::NotFound(Missing::Board(id)))
            }
        }
        Resource::List(id) => SqliteListRepository::new(conn)
            .get(id)?
            .map(|list| list.board_id)
            .ok_or(CoreError::NotFound(Missing::List(id))),
        Resource::Card(id) => SqliteCardRepository::new(conn)
            .board_of(id)?
            .ok_or(CoreError::NotFound(Missing::Card(id))),
    }
}
