//! List row persistence.

use super::{parse_uuid, RepoError, RepoResult};
use crate::model::list::BoardList;
use crate::model::{BoardId, ListId};
use rusqlite::{params, Connection, Row};

const LIST_SELECT_SQL: &str = "SELECT
    list_uuid,
    board_uuid,
    name,
    position,
    wip_limit
FROM lists";

/// SQLite-backed list rows.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, list: &BoardList) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO lists (list_uuid, board_uuid, name, position, wip_limit)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                list.id.to_string(),
                list.board_id.to_string(),
                list.name.as_str(),
                list.position,
                list.wip_limit,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: ListId) -> RepoResult<Option<BoardList>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LIST_SELECT_SQL} WHERE list_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }
        Ok(None)
    }

    /// Takes the write hold on one list row and returns the held row.
    ///
    /// The no-op write claims the row for the rest of the enclosing
    /// transaction, so check-then-insert on its member count cannot
    /// interleave with another writer.
    pub fn hold(&self, id: ListId) -> RepoResult<Option<BoardList>> {
        let changed = self.conn.execute(
            "UPDATE lists SET wip_limit = wip_limit WHERE list_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get(id)
    }

    /// Lists the board's lists ordered by position.
    pub fn list_on_board(&self, board_id: BoardId) -> RepoResult<Vec<BoardList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL} WHERE board_uuid = ?1 ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }
        Ok(lists)
    }

    pub fn set_wip_limit(&self, id: ListId, wip_limit: Option<i64>) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE lists SET wip_limit = ?2 WHERE list_uuid = ?1;",
            params![id.to_string(), wip_limit],
        )?;
        Ok(changed == 1)
    }

    /// Deletes one list; its cards go with it through the foreign key.
    pub fn delete(&self, id: ListId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM lists WHERE list_uuid = ?1;", [id.to_string()])?;
        Ok(changed == 1)
    }
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<BoardList> {
    let id_text: String = row.get("list_uuid")?;
    let board_text: String = row.get("board_uuid")?;
    let wip_limit: Option<i64> = row.get("wip_limit")?;
    if let Some(limit) = wip_limit.filter(|limit| *limit <= 0) {
        return Err(RepoError::InvalidData(format!(
            "invalid wip limit `{limit}` in lists.wip_limit"
        )));
    }

    Ok(BoardList {
        id: parse_uuid(&id_text, "lists.list_uuid")?,
        board_id: parse_uuid(&board_text, "lists.board_uuid")?,
        name: row.get("name")?,
        position: row.get("position")?,
        wip_limit,
    })
}
