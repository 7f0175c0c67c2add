//! Board, user and membership persistence.

use super::{parse_uuid, RepoError, RepoResult};
use crate::model::board::{Board, BoardMember, BoardRole, BoardSummary, User};
use crate::model::{BoardId, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// SQLite-backed boards, users and board memberships.
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert_user(&self, user: &User) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (user_uuid, email, display_name) VALUES (?1, ?2, ?3);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.display_name.as_deref()
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row: Option<(String, String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT user_uuid, email, display_name FROM users WHERE user_uuid = ?1;",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(|(id_text, email, display_name)| {
            Ok(User {
                id: parse_uuid(&id_text, "users.user_uuid")?,
                email,
                display_name,
            })
        })
        .transpose()
    }

    pub fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    pub fn insert_board(&self, board: &Board) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO boards (board_uuid, name, created_at) VALUES (?1, ?2, ?3);",
            params![board.id.to_string(), board.name.as_str(), board.created_at],
        )?;
        Ok(())
    }

    pub fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let row: Option<(String, String, i64)> = self
            .conn
            .query_row(
                "SELECT board_uuid, name, created_at FROM boards WHERE board_uuid = ?1;",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(|(id_text, name, created_at)| {
            Ok(Board {
                id: parse_uuid(&id_text, "boards.board_uuid")?,
                name,
                created_at,
            })
        })
        .transpose()
    }

    pub fn board_exists(&self, id: BoardId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE board_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Deletes a board; lists, cards and memberships cascade.
    pub fn delete_board(&self, id: BoardId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM boards WHERE board_uuid = ?1;", [id.to_string()])?;
        Ok(changed == 1)
    }

    pub fn insert_member(
        &self,
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO board_members (board_uuid, user_uuid, role) VALUES (?1, ?2, ?3);",
            params![board_id.to_string(), user_id.to_string(), role.as_str()],
        )?;
        Ok(())
    }

    pub fn role_of(&self, board_id: BoardId, user_id: UserId) -> RepoResult<Option<BoardRole>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT role FROM board_members WHERE board_uuid = ?1 AND user_uuid = ?2;",
                params![board_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        value.map(|value| parse_role(&value)).transpose()
    }

    pub fn update_role(
        &self,
        board_id: BoardId,
        user_id: UserId,
        role: BoardRole,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE board_members SET role = ?3 WHERE board_uuid = ?1 AND user_uuid = ?2;",
            params![board_id.to_string(), user_id.to_string(), role.as_str()],
        )?;
        Ok(changed == 1)
    }

    pub fn delete_member(&self, board_id: BoardId, user_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM board_members WHERE board_uuid = ?1 AND user_uuid = ?2;",
            params![board_id.to_string(), user_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    /// Lists members with identity, owners first then by email.
    pub fn list_members(&self, board_id: BoardId) -> RepoResult<Vec<BoardMember>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.user_uuid AS user_uuid,
                    u.email AS email,
                    u.display_name AS display_name,
                    m.role AS role
             FROM board_members m
             INNER JOIN users u ON u.user_uuid = m.user_uuid
             WHERE m.board_uuid = ?1
             ORDER BY CASE m.role WHEN 'owner' THEN 0 WHEN 'editor' THEN 1 ELSE 2 END,
                      u.email ASC;",
        )?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    /// Boards `user_id` belongs to with the owner label and the user's role,
    /// newest first.
    pub fn boards_for_user(&self, user_id: UserId) -> RepoResult<Vec<BoardSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT b.board_uuid AS board_uuid,
                    b.name AS name,
                    b.created_at AS created_at,
                    m.role AS role,
                    COALESCE(NULLIF(TRIM(ou.display_name), ''), ou.email) AS owner_label
             FROM board_members m
             INNER JOIN boards b ON b.board_uuid = m.board_uuid
             LEFT JOIN board_members om
                    ON om.board_uuid = m.board_uuid AND om.role = 'owner'
             LEFT JOIN users ou ON ou.user_uuid = om.user_uuid
             WHERE m.user_uuid = ?1
             ORDER BY b.created_at DESC, b.name ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut boards = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("board_uuid")?;
            let role_text: String = row.get("role")?;
            boards.push(BoardSummary {
                board: Board {
                    id: parse_uuid(&id_text, "boards.board_uuid")?,
                    name: row.get("name")?,
                    created_at: row.get("created_at")?,
                },
                owner: row.get("owner_label")?,
                role: parse_role(&role_text)?,
            });
        }
        Ok(boards)
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<BoardMember> {
    let user_text: String = row.get("user_uuid")?;
    let role_text: String = row.get("role")?;
    Ok(BoardMember {
        user_id: parse_uuid(&user_text, "board_members.user_uuid")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role: parse_role(&role_text)?,
    })
}

fn parse_role(value: &str) -> RepoResult<BoardRole> {
    BoardRole::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{value}` in board_members.role"))
    })
}
