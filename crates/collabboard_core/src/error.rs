//! Use-case outcome taxonomy.
//!
//! # Responsibility
//! - Give callers one tagged error type to pattern-match on.
//! - Keep storage detail out of caller-facing messages.
//!
//! # Invariants
//! - Every variant is terminal for the current unit of work.
//! - `Internal` displays a generic message; the cause is only reachable via
//!   `Error::source` and logs.

use crate::db::DbError;
use crate::model::card::{Card, CardFieldError};
use crate::model::{BoardId, CardId, ListId, UserId};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Referenced entity that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Board(BoardId),
    List(ListId),
    Card(CardId),
    User(UserId),
    Member { board_id: BoardId, user_id: UserId },
}

/// Why the authorization capability refused the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAMember,
    InsufficientRole,
    OwnerRequired,
}

/// Conflict flavours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Client-declared version is not the stored one.
    StaleVersion { latest: Box<Card> },
    /// A uniqueness rule rejected the write (e.g. duplicate email or member).
    Duplicate,
}

/// Outcome of a failed core operation.
#[derive(Debug)]
pub enum CoreError {
    NotFound(Missing),
    Conflict(ConflictKind),
    Forbidden(Denial),
    WipLimitExceeded { limit: i64 },
    BadRequest(String),
    Internal(RepoError),
}

impl CoreError {
    /// Builds the stale-version conflict carrying the stored card.
    pub fn stale(latest: Card) -> Self {
        Self::Conflict(ConflictKind::StaleVersion {
            latest: Box::new(latest),
        })
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Latest persisted card when this is a version conflict.
    pub fn latest(&self) -> Option<&Card> {
        match self {
            Self::Conflict(ConflictKind::StaleVersion { latest }) => Some(latest),
            _ => None,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(Missing::Board(_)) => "BOARD_NOT_FOUND",
            Self::NotFound(Missing::List(_)) => "LIST_NOT_FOUND",
            Self::NotFound(Missing::Card(_)) => "CARD_NOT_FOUND",
            Self::NotFound(Missing::User(_)) => "USER_NOT_FOUND",
            Self::NotFound(Missing::Member { .. }) => "MEMBERSHIP_NOT_FOUND",
            Self::Conflict(ConflictKind::StaleVersion { .. }) => "CARD_VERSION_CONFLICT",
            Self::Conflict(ConflictKind::Duplicate) => "DUPLICATE",
            Self::Forbidden(Denial::NotAMember) => "NOT_A_MEMBER",
            Self::Forbidden(Denial::InsufficientRole) => "INSUFFICIENT_ROLE",
            Self::Forbidden(Denial::OwnerRequired) => "OWNER_REQUIRED",
            Self::WipLimitExceeded { .. } => "WIP_LIMIT_EXCEEDED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this outcome is a storage failure rather than a domain answer.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(Missing::Board(id)) => write!(f, "board not found: {id}"),
            Self::NotFound(Missing::List(id)) => write!(f, "list not found: {id}"),
            Self::NotFound(Missing::Card(id)) => write!(f, "card not found: {id}"),
            Self::NotFound(Missing::User(id)) => write!(f, "user not found: {id}"),
            Self::NotFound(Missing::Member { board_id, user_id }) => {
                write!(f, "user {user_id} is not a member of board {board_id}")
            }
            Self::Conflict(ConflictKind::StaleVersion { latest }) => write!(
                f,
                "card {} was updated elsewhere; latest version is {}",
                latest.id, latest.version
            ),
            Self::Conflict(ConflictKind::Duplicate) => write!(f, "resource already exists"),
            Self::Forbidden(Denial::NotAMember) => write!(f, "not a member of this board"),
            Self::Forbidden(Denial::InsufficientRole) => {
                write!(f, "no permission to modify this board")
            }
            Self::Forbidden(Denial::OwnerRequired) => {
                write!(f, "only board owners can perform this action")
            }
            Self::WipLimitExceeded { limit } => write!(f, "list WIP limit of {limit} reached"),
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::Internal(_) => write!(f, "internal error"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(ref err) if err.is_unique_violation() => {
                Self::Conflict(ConflictKind::Duplicate)
            }
            other => Self::Internal(other),
        }
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        RepoError::Db(value).into()
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

impl From<CardFieldError> for CoreError {
    fn from(value: CardFieldError) -> Self {
        match value {
            CardFieldError::BlankTitle => Self::bad_request("title cannot be blank"),
        }
    }
}
