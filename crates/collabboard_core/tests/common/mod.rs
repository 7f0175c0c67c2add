#![allow(dead_code)]

use collabboard_core::ordering::{PositionLedger, Scope};
use collabboard_core::{
    open_db_in_memory, Board, BoardEventHub, BoardList, BoardRole, BoardService,
    BoardSubscription, Card, CardService, CommitGatedPublisher, CreateCard, ListId, ListService,
    MembershipAccess, User,
};
use rusqlite::Connection;
use std::sync::Arc;

/// One board owned by `owner`, with services wired to an in-memory database.
pub struct Fixture {
    pub conn: Connection,
    pub hub: Arc<BoardEventHub>,
    pub publisher: CommitGatedPublisher,
    pub boards: BoardService<MembershipAccess>,
    pub lists: ListService<MembershipAccess>,
    pub cards: CardService<MembershipAccess>,
    pub owner: User,
    pub board: Board,
}

pub fn setup() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let hub = Arc::new(BoardEventHub::new(64));
    let publisher = CommitGatedPublisher::new(Arc::clone(&hub));
    let boards = BoardService::new(MembershipAccess);
    let owner = publisher
        .run(&conn, |uow| {
            boards.register_user(uow, "owner@example.com", Some("Olive Owner"))
        })
        .unwrap();
    let board = publisher
        .run(&conn, |uow| boards.create_board(uow, owner.id, "Release"))
        .unwrap();

    Fixture {
        conn,
        hub,
        publisher,
        boards,
        lists: ListService::new(MembershipAccess),
        cards: CardService::new(MembershipAccess),
        owner,
        board,
    }
}

impl Fixture {
    pub fn list(&self, name: &str, wip_limit: Option<i64>) -> BoardList {
        self.publisher
            .run(&self.conn, |uow| {
                self.lists
                    .create_list(uow, self.owner.id, self.board.id, name, wip_limit)
            })
            .unwrap()
    }

    pub fn card(&self, list_id: ListId, title: &str) -> Card {
        self.publisher
            .run(&self.conn, |uow| {
                self.cards
                    .create_card(uow, self.owner.id, list_id, CreateCard::titled(title))
            })
            .unwrap()
    }

    pub fn user(&self, email: &str) -> User {
        self.publisher
            .run(&self.conn, |uow| self.boards.register_user(uow, email, None))
            .unwrap()
    }

    /// Registers a user and adds them to the board with `role`.
    pub fn member(&self, email: &str, role: BoardRole) -> User {
        let user = self.user(email);
        self.publisher
            .run(&self.conn, |uow| {
                self.boards
                    .add_member(uow, self.owner.id, self.board.id, user.id, role)
            })
            .unwrap();
        user
    }

    pub fn subscribe(&self) -> BoardSubscription {
        self.boards
            .subscribe(&self.conn, &self.hub, self.owner.id, self.board.id)
            .unwrap()
    }

    pub fn get(&self, card: &Card) -> Card {
        self.cards
            .get_card(&self.conn, self.owner.id, card.id)
            .unwrap()
    }

    pub fn positions(&self, list_id: ListId) -> Vec<i64> {
        PositionLedger::new(&self.conn)
            .positions(Scope::Cards(list_id))
            .unwrap()
    }

    /// Card titles of a list in position order.
    pub fn titles(&self, list_id: ListId) -> Vec<String> {
        self.boards
            .snapshot(&self.conn, self.owner.id, self.board.id)
            .unwrap()
            .cards_by_list
            .remove(&list_id)
            .unwrap_or_default()
            .into_iter()
            .map(|card| card.title)
            .collect()
    }
}
