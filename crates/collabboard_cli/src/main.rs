//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `collabboard_core` linkage and print its version.
//! - Run a short board session against the configured database and print
//!   delivered events as JSON.

use collabboard_core::{
    init_from_config, BoardEventHub, BoardService, CardService, CommitGatedPublisher, CoreConfig,
    CreateCard, ListService, MembershipAccess,
};
use log::info;
use std::error::Error;
use std::sync::Arc;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_from_config(&config)?;

    println!("collabboard_core ping={}", collabboard_core::ping());
    println!("collabboard_core version={}", collabboard_core::core_version());

    let conn = config.open_db()?;
    let hub = Arc::new(BoardEventHub::new(config.event_channel_capacity));
    let publisher = CommitGatedPublisher::new(Arc::clone(&hub));
    let boards = BoardService::new(MembershipAccess);
    let lists = ListService::new(MembershipAccess);
    let cards = CardService::new(MembershipAccess);

    // Emails are unique per database file.
    let email = format!("owner+{}@example.com", Uuid::new_v4().simple());
    let owner = publisher.run(&conn, |uow| boards.register_user(uow, &email, Some("Owner")))?;
    let board = publisher.run(&conn, |uow| boards.create_board(uow, owner.id, "Demo"))?;
    let mut subscription = boards.subscribe(&conn, &hub, owner.id, board.id)?;

    let todo = publisher.run(&conn, |uow| {
        lists.create_list(uow, owner.id, board.id, "Todo", None)
    })?;
    let doing = publisher.run(&conn, |uow| {
        lists.create_list(uow, owner.id, board.id, "Doing", Some(2))
    })?;

    let mut created = Vec::new();
    for title in ["Write schema", "Wire events", "Ship it"] {
        let card = publisher.run(&conn, |uow| {
            cards.create_card(uow, owner.id, todo.id, CreateCard::titled(title))
        })?;
        created.push(card);
    }
    if let Some(last) = created.last() {
        publisher.run(&conn, |uow| {
            cards.move_card(uow, owner.id, last.id, doing.id, 0, last.version)
        })?;
    }

    let events = subscription.drain();
    info!(
        "event=cli_demo module=cli status=ok board_id={} events={}",
        board.id,
        events.len()
    );
    for event in events {
        println!("{}", event.to_json()?);
    }
    Ok(())
}
