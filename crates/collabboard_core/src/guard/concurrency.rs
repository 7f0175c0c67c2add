//! Optimistic version protocol for cards.
//!
//! # Invariants
//! - A successful mutation advances `version` by exactly one.
//! - `updated_at` never moves backwards, even if the wall clock does.
//! - A lost compare-and-swap is reported like a stale client version.

use crate::error::{CoreError, CoreResult, Missing};
use crate::model::card::Card;
use crate::model::epoch_ms_now;
use crate::repo::SqliteCardRepository;
use log::info;

pub struct ConcurrencyGuard;

impl ConcurrencyGuard {
    /// Fails with the stored card when the client version is stale.
    pub fn check(current: &Card, expected_version: i64) -> CoreResult<()> {
        if current.version == expected_version {
            return Ok(());
        }
        info!(
            "event=version_check module=guard status=rejected card_id={} expected={} actual={}",
            current.id, expected_version, current.version
        );
        Err(CoreError::stale(current.clone()))
    }

    /// Version and timestamp the next write of `card` carries.
    pub fn next_stamp(card: &Card) -> (i64, i64) {
        (card.version + 1, epoch_ms_now().max(card.updated_at))
    }

    /// Returns `next` with its version bumped past `previous`.
    pub fn bump(previous: &Card, mut next: Card) -> Card {
        let (version, updated_at) = Self::next_stamp(previous);
        next.version = version;
        next.updated_at = updated_at;
        next
    }

    /// Writes `next` only if the row still holds `expected_version`.
    ///
    /// When the swap loses, the row is re-read and returned in the conflict.
    pub fn write_if_current(
        repo: &SqliteCardRepository<'_>,
        next: &Card,
        expected_version: i64,
    ) -> CoreResult<()> {
        if repo.update_if_version(next, expected_version)? {
            return Ok(());
        }
        match repo.get(next.id)? {
            Some(latest) => Err(CoreError::stale(latest)),
            None => Err(CoreError::NotFound(Missing::Card(next.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConcurrencyGuard;
    use crate::model::card::{Card, CardPriority};
    use uuid::Uuid;

    fn card(version: i64) -> Card {
        Card {
            id: Uuid::new_v4(),
            list_id: Uuid::new_v4(),
            title: "Fix login".to_string(),
            description: String::new(),
            position: 0,
            version,
            priority: CardPriority::High,
            due_at: None,
            created_by: Uuid::new_v4(),
            assignee: None,
            created_at: 10,
            updated_at: i64::MAX - 1,
        }
    }

    #[test]
    fn stale_version_carries_latest() {
        let current = card(4);
        let err = ConcurrencyGuard::check(&current, 3).unwrap_err();
        assert_eq!(err.latest().map(|latest| latest.version), Some(4));
        assert!(ConcurrencyGuard::check(&current, 4).is_ok());
    }

    #[test]
    fn bump_advances_by_one_and_keeps_time_monotonic() {
        let current = card(7);
        let next = ConcurrencyGuard::bump(&current, current.clone());
        assert_eq!(next.version, 8);
        assert!(next.updated_at >= current.updated_at);
    }
}
