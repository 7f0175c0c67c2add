//! Board, user and membership use cases.
//!
//! # Responsibility
//! - Register users and create boards with their owner membership.
//! - Build the board snapshot read model and a user's board listing.
//! - Manage members: only owners change membership; the owner row is fixed.
//!
//! # Invariants
//! - Each board has exactly one owner, the user who created it.
//! - None of these use cases stage events; membership changes are not
//!   part of the live event stream.

use crate::error::{ConflictKind, CoreError, CoreResult, Denial, Missing};
use crate::guard::{AccessControl, Resource};
use crate::model::board::{Board, BoardMember, BoardRole, BoardSnapshot, BoardSummary, User};
use crate::model::card::Card;
use crate::model::{epoch_ms_now, normalize_required_text, BoardId, ListId, UserId};
use crate::realtime::{BoardEventHub, BoardSubscription};
use crate::repo::{SqliteBoardRepository, SqliteCardRepository, SqliteListRepository};
use crate::uow::UnitOfWork;
use log::info;
use rusqlite::Connection;
use std::collections::BTreeMap;
use uuid::Uuid;

pub struct BoardService<A: AccessControl> {
    access: A,
}

impl<A: AccessControl> BoardService<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    /// Registers a user. Emails are unique, compared after trim and lowercase.
    pub fn register_user(
        &self,
        uow: &mut UnitOfWork<'_>,
        email: &str,
        display_name: Option<&str>,
    ) -> CoreResult<User> {
        let email = normalize_required_text(email)
            .map(|value| value.to_ascii_lowercase())
            .filter(|value| value.contains('@'))
            .ok_or_else(|| CoreError::bad_request("email must be a non-empty address"))?;
        let user = User {
            id: Uuid::new_v4(),
            email,
            display_name: display_name.and_then(normalize_required_text),
        };
        SqliteBoardRepository::new(uow.conn()).insert_user(&user)?;

        info!(
            "event=user_register module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    /// Creates a board owned by `actor`.
    pub fn create_board(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        name: &str,
    ) -> CoreResult<Board> {
        let name = normalize_required_text(name)
            .ok_or_else(|| CoreError::bad_request("board name cannot be blank"))?;
        let repo = SqliteBoardRepository::new(uow.conn());
        if !repo.user_exists(actor)? {
            return Err(CoreError::NotFound(Missing::User(actor)));
        }

        let board = Board {
            id: Uuid::new_v4(),
            name,
            created_at: epoch_ms_now(),
        };
        repo.insert_board(&board)?;
        repo.insert_member(board.id, actor, BoardRole::Owner)?;

        info!(
            "event=board_create module=service status=ok board_id={} owner_id={}",
            board.id, actor
        );
        Ok(board)
    }

    /// Board, lists in order and every list's cards in order.
    pub fn snapshot(
        &self,
        conn: &Connection,
        actor: UserId,
        board_id: BoardId,
    ) -> CoreResult<BoardSnapshot> {
        self.access
            .require_read(conn, Resource::Board(board_id), actor)?;
        let boards = SqliteBoardRepository::new(conn);
        let board = boards
            .get_board(board_id)?
            .ok_or(CoreError::NotFound(Missing::Board(board_id)))?;
        let owner = boards
            .list_members(board_id)?
            .into_iter()
            .find(|member| member.role == BoardRole::Owner)
            .map(|member| member.label().to_string());

        let lists = SqliteListRepository::new(conn).list_on_board(board_id)?;
        let mut cards_by_list: BTreeMap<ListId, Vec<Card>> =
            lists.iter().map(|list| (list.id, Vec::new())).collect();
        for card in SqliteCardRepository::new(conn).list_on_board(board_id)? {
            cards_by_list.entry(card.list_id).or_default().push(card);
        }

        Ok(BoardSnapshot {
            board,
            owner,
            lists,
            cards_by_list,
        })
    }

    /// Every board `actor` belongs to, newest first, with its owner label.
    pub fn list_boards(&self, conn: &Connection, actor: UserId) -> CoreResult<Vec<BoardSummary>> {
        let repo = SqliteBoardRepository::new(conn);
        if !repo.user_exists(actor)? {
            return Err(CoreError::NotFound(Missing::User(actor)));
        }
        Ok(repo.boards_for_user(actor)?)
    }

    /// The role `actor` holds on the board.
    pub fn role_of(
        &self,
        conn: &Connection,
        actor: UserId,
        board_id: BoardId,
    ) -> CoreResult<BoardRole> {
        self.access
            .require_read(conn, Resource::Board(board_id), actor)?;
        SqliteBoardRepository::new(conn)
            .role_of(board_id, actor)?
            .ok_or(CoreError::Forbidden(Denial::NotAMember))
    }

    pub fn list_members(
        &self,
        conn: &Connection,
        actor: UserId,
        board_id: BoardId,
    ) -> CoreResult<Vec<BoardMember>> {
        self.access
            .require_read(conn, Resource::Board(board_id), actor)?;
        Ok(SqliteBoardRepository::new(conn).list_members(board_id)?)
    }

    /// Adds `user_id` as editor or viewer.
    pub fn add_member(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
    ) -> CoreResult<()> {
        let conn = uow.conn();
        self.access
            .require_owner(conn, Resource::Board(board_id), actor)?;
        reject_owner_grant(role)?;

        let repo = SqliteBoardRepository::new(conn);
        if !repo.user_exists(user_id)? {
            return Err(CoreError::NotFound(Missing::User(user_id)));
        }
        if repo.role_of(board_id, user_id)?.is_some() {
            return Err(CoreError::Conflict(ConflictKind::Duplicate));
        }
        repo.insert_member(board_id, user_id, role)?;

        info!(
            "event=member_add module=service status=ok board_id={} user_id={} role={}",
            board_id,
            user_id,
            role.as_str()
        );
        Ok(())
    }

    pub fn update_member_role(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        board_id: BoardId,
        member_id: UserId,
        role: BoardRole,
    ) -> CoreResult<()> {
        reject_self_change(actor, member_id)?;
        let conn = uow.conn();
        self.access
            .require_owner(conn, Resource::Board(board_id), actor)?;
        reject_owner_grant(role)?;

        let repo = SqliteBoardRepository::new(conn);
        match repo.role_of(board_id, member_id)? {
            None => {
                return Err(CoreError::NotFound(Missing::Member {
                    board_id,
                    user_id: member_id,
                }))
            }
            Some(BoardRole::Owner) => {
                return Err(CoreError::bad_request("the board owner's role cannot change"))
            }
            Some(_) => {}
        }
        repo.update_role(board_id, member_id, role)?;

        info!(
            "event=member_role module=service status=ok board_id={} user_id={} role={}",
            board_id,
            member_id,
            role.as_str()
        );
        Ok(())
    }

    pub fn remove_member(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        board_id: BoardId,
        member_id: UserId,
    ) -> CoreResult<()> {
        reject_self_change(actor, member_id)?;
        let conn = uow.conn();
        self.access
            .require_owner(conn, Resource::Board(board_id), actor)?;

        let repo = SqliteBoardRepository::new(conn);
        match repo.role_of(board_id, member_id)? {
            None => {
                return Err(CoreError::NotFound(Missing::Member {
                    board_id,
                    user_id: member_id,
                }))
            }
            Some(BoardRole::Owner) => {
                return Err(CoreError::bad_request("the board owner cannot be removed"))
            }
            Some(_) => {}
        }
        repo.delete_member(board_id, member_id)?;

        info!(
            "event=member_remove module=service status=ok board_id={} user_id={}",
            board_id, member_id
        );
        Ok(())
    }

    /// Deletes the board with its lists, cards and memberships.
    pub fn delete_board(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        board_id: BoardId,
    ) -> CoreResult<()> {
        let conn = uow.conn();
        self.access
            .require_owner(conn, Resource::Board(board_id), actor)?;
        if !SqliteBoardRepository::new(conn).delete_board(board_id)? {
            return Err(CoreError::NotFound(Missing::Board(board_id)));
        }
        info!(
            "event=board_delete module=service status=ok board_id={}",
            board_id
        );
        Ok(())
    }

    /// Subscribes `actor` to the board's live events.
    pub fn subscribe(
        &self,
        conn: &Connection,
        hub: &BoardEventHub,
        actor: UserId,
        board_id: BoardId,
    ) -> CoreResult<BoardSubscription> {
        self.access
            .require_read(conn, Resource::Board(board_id), actor)?;
        Ok(hub.subscribe(board_id))
    }
}

fn reject_self_change(actor: UserId, member_id: UserId) -> CoreResult<()> {
    if actor == member_id {
        return Err(CoreError::bad_request(
            "owners cannot change or remove their own membership",
        ));
    }
    Ok(())
}

fn reject_owner_grant(role: BoardRole) -> CoreResult<()> {
    if role == BoardRole::Owner {
        return Err(CoreError::bad_request("the owner role cannot be granted"));
    }
    Ok(())
}
