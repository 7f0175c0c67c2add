//! Card row persistence.
//!
//! # Responsibility
//! - CRUD over `cards` plus the version compare-and-swap write.
//! - Final placement of a moved card (list, position, version) in one write.
//!
//! # Invariants
//! - Bulk position shifts live in the ordering ledger, not here.
//! - Listing is deterministic: `position ASC`.

use super::{parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::model::card::{Card, CardPriority};
use crate::model::{BoardId, CardId, ListId};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CARD_SELECT_SQL: &str = "SELECT
    card_uuid,
    list_uuid,
    title,
    description,
    position,
    version,
    priority,
    due_at,
    created_by,
    assignee_uuid,
    created_at,
    updated_at
FROM cards";

/// SQLite-backed card rows.
pub struct SqliteCardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts a fully formed card row.
    pub fn insert(&self, card: &Card) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO cards (
                card_uuid,
                list_uuid,
                title,
                description,
                position,
                version,
                priority,
                due_at,
                created_by,
                assignee_uuid,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                card.id.to_string(),
                card.list_id.to_string(),
                card.title.as_str(),
                card.description.as_str(),
                card.position,
                card.version,
                card.priority.as_str(),
                card.due_at,
                card.created_by.to_string(),
                card.assignee.map(|value| value.to_string()),
                card.created_at,
                card.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Loads one card by id.
    pub fn get(&self, id: CardId) -> RepoResult<Option<Card>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CARD_SELECT_SQL} WHERE card_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_card_row(row)?));
        }
        Ok(None)
    }

    /// Lists cards of one list ordered by position.
    pub fn list_in(&self, list_id: ListId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CARD_SELECT_SQL} WHERE list_uuid = ?1 ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    /// Lists every card on a board ordered by list then position.
    pub fn list_on_board(&self, board_id: BoardId) -> RepoResult<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                c.card_uuid AS card_uuid,
                c.list_uuid AS list_uuid,
                c.title AS title,
                c.description AS description,
                c.position AS position,
                c.version AS version,
                c.priority AS priority,
                c.due_at AS due_at,
                c.created_by AS created_by,
                c.assignee_uuid AS assignee_uuid,
                c.created_at AS created_at,
                c.updated_at AS updated_at
             FROM cards c
             INNER JOIN lists l ON l.list_uuid = c.list_uuid
             WHERE l.board_uuid = ?1
             ORDER BY l.position ASC, c.position ASC;",
        )?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            cards.push(parse_card_row(row)?);
        }
        Ok(cards)
    }

    /// Writes edited fields only if the stored version still equals
    /// `expected_version`. Returns `false` when the swap lost.
    pub fn update_if_version(&self, card: &Card, expected_version: i64) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET title = ?3,
                 description = ?4,
                 priority = ?5,
                 due_at = ?6,
                 assignee_uuid = ?7,
                 version = ?8,
                 updated_at = ?9
             WHERE card_uuid = ?1
               AND version = ?2;",
            params![
                card.id.to_string(),
                expected_version,
                card.title.as_str(),
                card.description.as_str(),
                card.priority.as_str(),
                card.due_at,
                card.assignee.map(|value| value.to_string()),
                card.version,
                card.updated_at,
            ],
        )?;
        Ok(changed == 1)
    }

    /// Writes a moved card into its final slot.
    pub fn place(
        &self,
        id: CardId,
        list_id: ListId,
        position: i64,
        version: i64,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE cards
             SET list_uuid = ?2,
                 position = ?3,
                 version = ?4,
                 updated_at = ?5
             WHERE card_uuid = ?1;",
            params![
                id.to_string(),
                list_id.to_string(),
                position,
                version,
                updated_at
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::InvalidData(format!(
                "moved card {id} vanished before placement"
            )));
        }
        Ok(())
    }

    /// Removes one card row. Returns whether a row was deleted.
    pub fn delete(&self, id: CardId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM cards WHERE card_uuid = ?1;", [id.to_string()])?;
        Ok(changed == 1)
    }

    /// Resolves the board that owns a card.
    pub fn board_of(&self, id: CardId) -> RepoResult<Option<BoardId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT l.board_uuid
                 FROM cards c
                 INNER JOIN lists l ON l.list_uuid = c.list_uuid
                 WHERE c.card_uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|value| parse_uuid(&value, "lists.board_uuid"))
            .transpose()
    }
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let id_text: String = row.get("card_uuid")?;
    let list_text: String = row.get("list_uuid")?;
    let creator_text: String = row.get("created_by")?;

    let priority_text: String = row.get("priority")?;
    let priority = CardPriority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in cards.priority"
        ))
    })?;

    let version: i64 = row.get("version")?;
    if version < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid version `{version}` in cards.version"
        )));
    }

    Ok(Card {
        id: parse_uuid(&id_text, "cards.card_uuid")?,
        list_id: parse_uuid(&list_text, "cards.list_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        position: row.get("position")?,
        version,
        priority,
        due_at: row.get("due_at")?,
        created_by: parse_uuid(&creator_text, "cards.created_by")?,
        assignee: parse_optional_uuid(row.get("assignee_uuid")?, "cards.assignee_uuid")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
