//! Card domain model.
//!
//! # Invariants
//! - `version` starts at 1 and grows by exactly 1 per successful mutation.
//! - `position` is only changed by the ordering ledger.
//! - `title` is never blank after trim.

use super::{normalize_required_text, CardId, ListId, UserId};
use serde::{Deserialize, Serialize};

/// Card priority shown on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl CardPriority {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses the storage value written by [`CardPriority::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Persisted card snapshot.
///
/// This is also the wire shape embedded in board events and conflict
/// payloads, so it serializes with camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    pub description: String,
    pub position: i64,
    pub version: i64,
    pub priority: CardPriority,
    pub due_at: Option<i64>,
    pub created_by: UserId,
    pub assignee: Option<UserId>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a card at the end of a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCard {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<CardPriority>,
    pub due_at: Option<i64>,
    pub assignee: Option<UserId>,
}

impl CreateCard {
    /// Convenience constructor for a title-only card.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Three-way field update used for clearable patch fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    /// Replace the stored value.
    Set(T),
    /// Reset the stored value to absent.
    Clear,
}

impl<T: Copy> FieldUpdate<T> {
    /// Applies this update on top of `current`.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Set(value) => Some(value),
            Self::Clear => None,
        }
    }

    /// Returns the value this update introduces, if any.
    pub fn introduced(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

/// Partial card edit. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<CardPriority>,
    pub due_at: FieldUpdate<i64>,
    pub assignee: FieldUpdate<UserId>,
}

/// Card patch failure detected before touching storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFieldError {
    BlankTitle,
}

impl Card {
    /// Applies `patch` in memory and returns the edited copy.
    ///
    /// Version and `updated_at` are left for the concurrency guard.
    pub fn patched(&self, patch: &CardPatch) -> Result<Card, CardFieldError> {
        let mut next = self.clone();
        if let Some(title) = patch.title.as_deref() {
            next.title = normalize_title(title)?;
        }
        if let Some(description) = patch.description.as_deref() {
            next.description = description.trim().to_string();
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        next.due_at = patch.due_at.apply(self.due_at);
        next.assignee = patch.assignee.apply(self.assignee);
        Ok(next)
    }
}

/// Trims a card title and rejects blank values.
pub fn normalize_title(value: &str) -> Result<String, CardFieldError> {
    normalize_required_text(value).ok_or(CardFieldError::BlankTitle)
}
