//! Board, user and membership records.

use super::card::Card;
use super::list::BoardList;
use super::{BoardId, ListId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Board header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub created_at: i64,
}

/// Registered user that can own, join or be assigned on boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Member role on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardRole {
    Owner,
    Editor,
    Viewer,
}

impl BoardRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// Whether this role may mutate board content.
    pub fn can_write(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}

/// Membership row joined with user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMember {
    pub user_id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: BoardRole,
}

impl BoardMember {
    /// Display name when set, email otherwise.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.as_str(),
        }
    }
}

/// One entry of a user's board listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub board: Board,
    /// Owner label, `None` when the board has no owner row.
    pub owner: Option<String>,
    /// The listing user's role on this board.
    pub role: BoardRole,
}

/// Full read model of one board: lists in order, cards grouped per list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub board: Board,
    /// Owner label, `None` when the board has no owner row.
    pub owner: Option<String>,
    pub lists: Vec<BoardList>,
    /// Every list id is present, empty lists map to an empty vector.
    pub cards_by_list: BTreeMap<ListId, Vec<Card>>,
}
