//! Card use cases: create, patch, move, delete.
//!
//! # Invariants
//! - Check order is authorize, load, version, capacity, reindex, write.
//!   The first failing check decides the error and nothing is written.
//! - A no-op move returns the stored card unchanged and stages nothing.

use super::ensure_room;
use crate::error::{CoreError, CoreResult, Missing};
use crate::guard::{AccessControl, ConcurrencyGuard, Resource, WipLimiter};
use crate::model::card::{normalize_title, Card, CardPatch, CreateCard};
use crate::model::{epoch_ms_now, CardId, ListId, UserId};
use crate::ordering::{MovePlan, PositionLedger, Scope};
use crate::realtime::BoardEvent;
use crate::repo::{SqliteBoardRepository, SqliteCardRepository};
use crate::uow::UnitOfWork;
use log::{debug, info};
use rusqlite::Connection;
use uuid::Uuid;

pub struct CardService<A: AccessControl> {
    access: A,
}

impl<A: AccessControl> CardService<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    /// Appends a new card at the end of `list_id`.
    pub fn create_card(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        list_id: ListId,
        input: CreateCard,
    ) -> CoreResult<Card> {
        let conn = uow.conn();
        let board_id = self
            .access
            .require_write(conn, Resource::List(list_id), actor)?;
        let title = normalize_title(&input.title)?;

        WipLimiter::admit(conn, list_id)?;
        if let Some(assignee) = input.assignee {
            ensure_user(conn, assignee)?;
        }

        let position = PositionLedger::new(conn).next_position(Scope::Cards(list_id))?;
        ensure_room(position, "a list")?;

        let now = epoch_ms_now();
        let card = Card {
            id: Uuid::new_v4(),
            list_id,
            title,
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            position,
            version: 1,
            priority: input.priority.unwrap_or_default(),
            due_at: input.due_at,
            created_by: actor,
            assignee: input.assignee,
            created_at: now,
            updated_at: now,
        };
        SqliteCardRepository::new(conn).insert(&card)?;

        info!(
            "event=card_create module=service status=ok card_id={} list_id={} position={}",
            card.id, list_id, position
        );
        uow.stage(BoardEvent::card_created(board_id, card.clone()));
        Ok(card)
    }

    /// Applies a partial edit if `expected_version` is current.
    pub fn patch_card(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        card_id: CardId,
        patch: &CardPatch,
        expected_version: i64,
    ) -> CoreResult<Card> {
        let conn = uow.conn();
        let board_id = self
            .access
            .require_write(conn, Resource::Card(card_id), actor)?;
        let repo = SqliteCardRepository::new(conn);
        let current = load_card(&repo, card_id)?;
        ConcurrencyGuard::check(&current, expected_version)?;

        if let Some(assignee) = patch.assignee.introduced() {
            ensure_user(conn, assignee)?;
        }
        let next = ConcurrencyGuard::bump(&current, current.patched(patch)?);
        ConcurrencyGuard::write_if_current(&repo, &next, expected_version)?;

        info!(
            "event=card_patch module=service status=ok card_id={} version={}",
            card_id, next.version
        );
        uow.stage(BoardEvent::card_updated(board_id, next.clone()));
        Ok(next)
    }

    /// Moves a card to `to_position` in `to_list_id`, same board only.
    ///
    /// The position is clamped into the destination's valid range.
    pub fn move_card(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        card_id: CardId,
        to_list_id: ListId,
        to_position: i64,
        expected_version: i64,
    ) -> CoreResult<Card> {
        let conn = uow.conn();
        let from_board = self
            .access
            .require_write(conn, Resource::Card(card_id), actor)?;
        let to_board = self
            .access
            .require_write(conn, Resource::List(to_list_id), actor)?;
        if from_board != to_board {
            return Err(CoreError::bad_request(
                "cannot move a card to a list on another board",
            ));
        }

        let repo = SqliteCardRepository::new(conn);
        let current = load_card(&repo, card_id)?;
        ConcurrencyGuard::check(&current, expected_version)?;

        let ledger = PositionLedger::new(conn);
        if to_list_id != current.list_id {
            WipLimiter::admit(conn, to_list_id)?;
        }
        let destination_count = ledger.count(Scope::Cards(to_list_id))?;
        let plan = MovePlan::resolve(
            current.list_id,
            current.position,
            to_list_id,
            to_position,
            destination_count,
        );
        if plan.is_noop() {
            debug!(
                "event=card_move module=service status=ok card_id={} noop=true",
                card_id
            );
            return Ok(current);
        }
        if matches!(plan, MovePlan::AcrossLists { .. }) {
            ensure_room(destination_count, "a list")?;
        }

        ledger.prepare_move(card_id, &plan)?;
        let (version, updated_at) = ConcurrencyGuard::next_stamp(&current);
        repo.place(
            card_id,
            plan.target_list(),
            plan.target_position(),
            version,
            updated_at,
        )?;

        let moved = Card {
            list_id: plan.target_list(),
            position: plan.target_position(),
            version,
            updated_at,
            ..current.clone()
        };
        info!(
            "event=card_move module=service status=ok card_id={} from_list={} from_position={} to_list={} to_position={} version={}",
            card_id, current.list_id, current.position, moved.list_id, moved.position, version
        );
        uow.stage(BoardEvent::card_moved(
            from_board,
            moved.clone(),
            current.list_id,
            current.position,
        ));
        Ok(moved)
    }

    /// Deletes a card and closes the gap it leaves.
    pub fn delete_card(
        &self,
        uow: &mut UnitOfWork<'_>,
        actor: UserId,
        card_id: CardId,
        expected_version: i64,
    ) -> CoreResult<()> {
        let conn = uow.conn();
        let board_id = self
            .access
            .require_write(conn, Resource::Card(card_id), actor)?;
        let repo = SqliteCardRepository::new(conn);
        let current = load_card(&repo, card_id)?;
        ConcurrencyGuard::check(&current, expected_version)?;

        if !repo.delete(card_id)? {
            return Err(CoreError::NotFound(Missing::Card(card_id)));
        }
        PositionLedger::new(conn).close_gap(Scope::Cards(current.list_id), current.position)?;

        info!(
            "event=card_delete module=service status=ok card_id={} list_id={} position={}",
            card_id, current.list_id, current.position
        );
        uow.stage(BoardEvent::card_deleted(
            board_id,
            card_id,
            current.list_id,
            current.position,
        ));
        Ok(())
    }

    /// Reads one card after checking read access.
    pub fn get_card(
        &self,
        conn: &Connection,
        actor: UserId,
        card_id: CardId,
    ) -> CoreResult<Card> {
        self.access
            .require_read(conn, Resource::Card(card_id), actor)?;
        load_card(&SqliteCardRepository::new(conn), card_id)
    }
}

fn load_card(repo: &SqliteCardRepository<'_>, card_id: CardId) -> CoreResult<Card> {
    repo.get(card_id)?
        .ok_or(CoreError::NotFound(Missing::Card(card_id)))
}

fn ensure_user(conn: &Connection, user_id: UserId) -> CoreResult<()> {
    if SqliteBoardRepository::new(conn).user_exists(user_id)? {
        return Ok(());
    }
    Err(CoreError::NotFound(Missing::User(user_id)))
}
