//! List use cases.

use super::ensure_room;
use crate::error::{CoreError, CoreResult, Missing};
use crate::guard::{AccessControl, Resource};
use crate::model::list::BoardList;
use crate::model::{normalize_required_text, BoardId, ListId, UserId};
use crate::ordering::{PositionLedger, Scope};
use crate::realtime::BoardEvent;
use crate::repo::SqliteListRepository;
use crate::uow::UnitOfWork;
use log::info;
use uuid::Uuid;

pub struct ListService<A: AccessControl> {
    access: A,
}

impl<A: AccessControl> ListService<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    /// Appends a list to the board.
    pub fn create_list(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        board_id: BoardId,
        name: &str,
        wip_limit: Option<i64>,
    ) -> CoreResult<BoardList> {
        let conn = uow.conn();
        self.access
            .require_write(conn, Resource::Board(board_id), actor)?;
        let name = normalize_required_text(name)
            .ok_or_else(|| CoreError::bad_request("list name cannot be blank"))?;
        validate_wip_limit(wip_limit)?;

        let position = PositionLedger::new(conn).next_position(Scope::Lists(board_id))?;
        ensure_room(position, "a board")?;

        let list = BoardList {
            id: Uuid::new_v4(),
            board_id,
            name,
            position,
            wip_limit,
        };
        SqliteListRepository::new(conn).insert(&list)?;

        info!(
            "event=list_create module=service status=ok list_id={} board_id={} position={}",
            list.id, board_id, position
        );
        uow.stage(BoardEvent::list_created(list.clone()));
        Ok(list)
    }

    /// Deletes a list with its cards and closes the board's list gap.
    pub fn delete_list(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        list_id: ListId,
    ) -> CoreResult<()> {
        let conn = uow.conn();
        let board_id = self
            .access
            .require_write(conn, Resource::List(list_id), actor)?;
        let repo = SqliteListRepository::new(conn);
        let list = repo
            .get(list_id)?
            .ok_or(CoreError::NotFound(Missing::List(list_id)))?;

        if !repo.delete(list_id)? {
            return Err(CoreError::NotFound(Missing::List(list_id)));
        }
        PositionLedger::new(conn).close_gap(Scope::Lists(board_id), list.position)?;

        info!(
            "event=list_delete module=service status=ok list_id={} board_id={} position={}",
            list_id, board_id, list.position
        );
        uow.stage(BoardEvent::list_deleted(board_id, list_id, list.position));
        Ok(())
    }

    /// Replaces the list's cap. Existing cards above a lowered cap stay.
    pub fn set_wip_limit(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        list_id: ListId,
        wip_limit: Option<i64>,
    ) -> CoreResult<BoardList> {
        let conn = uow.conn();
        self.access
            .require_write(conn, Resource::List(list_id), actor)?;
        validate_wip_limit(wip_limit)?;

        let repo = SqliteListRepository::new(conn);
        if !repo.set_wip_limit(list_id, wip_limit)? {
            return Err(CoreError::NotFound(Missing::List(list_id)));
        }
        info!(
            "event=list_wip_limit module=service status=ok list_id={} limit={:?}",
            list_id, wip_limit
        );
        repo.get(list_id)?
            .ok_or(CoreError::NotFound(Missing::List(list_id)))
    }
}

fn validate_wip_limit(wip_limit: Option<i64>) -> CoreResult<()> {
    match wip_limit {
        Some(limit) if limit <= 0 => Err(CoreError::bad_request(
            "wip limit must be a positive integer",
        )),
        _ => Ok(()),
    }
}
