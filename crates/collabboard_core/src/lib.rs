//! Core of the collaborative card board.
//!
//! Card ordering, optimistic versioning, WIP admission and commit-gated
//! live events over SQLite. Hosts open a connection with [`db::open_db`],
//! run use cases through [`CommitGatedPublisher::run`] and hand
//! [`BoardSubscription`]s to clients.

pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod realtime;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbOptions};
pub use error::{ConflictKind, CoreError, CoreResult, Denial, Missing};
pub use guard::{AccessControl, MembershipAccess, Resource};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardMember, BoardRole, BoardSnapshot, BoardSummary, User};
pub use model::card::{Card, CardPatch, CardPriority, CreateCard, FieldUpdate};
pub use model::list::BoardList;
pub use model::{BoardId, CardId, ListId, UserId};
pub use realtime::{
    BoardEvent, BoardEventHub, BoardEventType, BoardSubscription, CommitGatedPublisher, EventData,
    UnitOutcome, UnitState,
};
pub use repo::{RepoError, RepoResult};
pub use service::{BoardService, CardService, ListService};
pub use uow::UnitOfWork;

/// Minimal health-check API for hosts.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
