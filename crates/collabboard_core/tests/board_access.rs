mod common;

use collabboard_core::{
    BoardRole, CardPatch, ConflictKind, CoreError, CreateCard, Denial, Missing,
};
use common::setup;
use uuid::Uuid;

#[test]
fn viewers_read_but_cannot_write() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let card = fx.card(todo.id, "Visible");
    let viewer = fx.member("viewer@example.com", BoardRole::Viewer);

    let snapshot = fx
        .boards
        .snapshot(&fx.conn, viewer.id, fx.board.id)
        .unwrap();
    assert_eq!(snapshot.cards_by_list[&todo.id].len(), 1);

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .create_card(uow, viewer.id, todo.id, CreateCard::titled("Nope"))
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(Denial::InsufficientRole)));

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .patch_card(uow, viewer.id, card.id, &CardPatch::default(), 1)
        })
        .unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_ROLE");
    assert_eq!(fx.get(&card).version, 1);
}

#[test]
fn editors_write_but_cannot_manage_members() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let editor = fx.member("editor@example.com", BoardRole::Editor);
    let newcomer = fx.user("new@example.com");

    fx.publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .create_card(uow, editor.id, todo.id, CreateCard::titled("By editor"))
        })
        .unwrap();

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards
                .add_member(uow, editor.id, fx.board.id, newcomer.id, BoardRole::Viewer)
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(Denial::OwnerRequired)));
}

#[test]
fn outsiders_are_not_members() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let outsider = fx.user("outsider@example.com");

    let err = fx
        .boards
        .snapshot(&fx.conn, outsider.id, fx.board.id)
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(Denial::NotAMember)));

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.lists.delete_list(uow, outsider.id, todo.id)
        })
        .unwrap_err();
    assert_eq!(err.code(), "NOT_A_MEMBER");
}

#[test]
fn unknown_resources_are_not_found() {
    let fx = setup();
    let ghost = Uuid::new_v4();

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .create_card(uow, fx.owner.id, ghost, CreateCard::titled("Lost"))
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::List(id)) if id == ghost));

    let err = fx
        .publisher
        .run(&fx.conn, |uow| fx.cards.delete_card(uow, fx.owner.id, ghost, 1))
        .unwrap_err();
    assert_eq!(err.code(), "CARD_NOT_FOUND");

    let err = fx
        .boards
        .snapshot(&fx.conn, fx.owner.id, ghost)
        .unwrap_err();
    assert_eq!(err.code(), "BOARD_NOT_FOUND");
}

#[test]
fn moving_across_boards_is_rejected() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let card = fx.card(todo.id, "Stay home");
    let other_board = fx
        .publisher
        .run(&fx.conn, |uow| fx.boards.create_board(uow, fx.owner.id, "Other"))
        .unwrap();
    let foreign = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.lists
                .create_list(uow, fx.owner.id, other_board.id, "Elsewhere", None)
        })
        .unwrap();
    let mut subscription = fx.subscribe();

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.move_card(uow, fx.owner.id, card.id, foreign.id, 0, 1)
        })
        .unwrap_err();

    assert!(matches!(err, CoreError::BadRequest(_)));
    assert_eq!(fx.get(&card), card);
    assert!(subscription.drain().is_empty());
}

#[test]
fn snapshot_groups_cards_per_list() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let empty = fx.list("Empty", Some(4));
    fx.card(todo.id, "A");
    fx.card(todo.id, "B");

    let snapshot = fx
        .boards
        .snapshot(&fx.conn, fx.owner.id, fx.board.id)
        .unwrap();

    assert_eq!(snapshot.board.name, "Release");
    assert_eq!(snapshot.owner.as_deref(), Some("Olive Owner"));
    assert_eq!(snapshot.lists.len(), 2);
    assert_eq!(snapshot.lists[1].wip_limit, Some(4));
    assert!(snapshot.cards_by_list[&empty.id].is_empty());
    let titles: Vec<_> = snapshot.cards_by_list[&todo.id]
        .iter()
        .map(|card| card.title.as_str())
        .collect();
    assert_eq!(titles, vec!["A", "B"]);
}

#[test]
fn membership_rules_protect_the_owner() {
    let fx = setup();
    let editor = fx.member("editor@example.com", BoardRole::Editor);

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards.update_member_role(
                uow,
                fx.owner.id,
                fx.board.id,
                fx.owner.id,
                BoardRole::Viewer,
            )
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::BadRequest(_)));

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards.update_member_role(
                uow,
                fx.owner.id,
                fx.board.id,
                editor.id,
                BoardRole::Owner,
            )
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::BadRequest(_)));

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards
                .add_member(uow, fx.owner.id, fx.board.id, editor.id, BoardRole::Viewer)
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::Duplicate)));

    fx.publisher
        .run(&fx.conn, |uow| {
            fx.boards.update_member_role(
                uow,
                fx.owner.id,
                fx.board.id,
                editor.id,
                BoardRole::Viewer,
            )
        })
        .unwrap();
    let members = fx
        .boards
        .list_members(&fx.conn, editor.id, fx.board.id)
        .unwrap();
    let roles: Vec<_> = members
        .iter()
        .map(|member| (member.email.as_str(), member.role))
        .collect();
    assert_eq!(
        roles,
        vec![
            ("owner@example.com", BoardRole::Owner),
            ("editor@example.com", BoardRole::Viewer)
        ]
    );

    fx.publisher
        .run(&fx.conn, |uow| {
            fx.boards
                .remove_member(uow, fx.owner.id, fx.board.id, editor.id)
        })
        .unwrap();
    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards
                .remove_member(uow, fx.owner.id, fx.board.id, editor.id)
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Member { .. })));
}

#[test]
fn duplicate_emails_conflict() {
    let fx = setup();
    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.boards.register_user(uow, " OWNER@example.com ", None)
        })
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::Duplicate)));
}

#[test]
fn deleting_a_board_cascades() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let card = fx.card(todo.id, "Gone soon");
    let editor = fx.member("editor@example.com", BoardRole::Editor);

    let err = fx
        .publisher
        .run(&fx.conn, |uow| fx.boards.delete_board(uow, editor.id, fx.board.id))
        .unwrap_err();
    assert_eq!(err.code(), "OWNER_REQUIRED");

    fx.publisher
        .run(&fx.conn, |uow| fx.boards.delete_board(uow, fx.owner.id, fx.board.id))
        .unwrap();

    let err = fx
        .cards
        .get_card(&fx.conn, fx.owner.id, card.id)
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Card(_))));
    let remaining: i64 = fx
        .conn
        .query_row("SELECT COUNT(*) FROM board_members;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn board_listing_covers_memberships_with_owner_label() {
    let fx = setup();
    let editor = fx.member("editor@example.com", BoardRole::Editor);
    let own_board = fx
        .publisher
        .run(&fx.conn, |uow| fx.boards.create_board(uow, editor.id, "Side project"))
        .unwrap();
    let outsider = fx.user("outsider@example.com");

    let mut listed = fx.boards.list_boards(&fx.conn, editor.id).unwrap();
    listed.sort_by(|a, b| a.board.name.cmp(&b.board.name));
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].board.id, fx.board.id);
    assert_eq!(listed[0].owner.as_deref(), Some("Olive Owner"));
    assert_eq!(listed[0].role, BoardRole::Editor);
    assert_eq!(listed[1].board.id, own_board.id);
    assert_eq!(listed[1].owner.as_deref(), Some("editor@example.com"));
    assert_eq!(listed[1].role, BoardRole::Owner);

    assert!(fx.boards.list_boards(&fx.conn, outsider.id).unwrap().is_empty());
    let err = fx
        .boards
        .list_boards(&fx.conn, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::User(_))));
}

#[test]
fn role_lookup_reports_the_callers_role() {
    let fx = setup();
    let viewer = fx.member("viewer@example.com", BoardRole::Viewer);
    let outsider = fx.user("outsider@example.com");

    assert_eq!(
        fx.boards.role_of(&fx.conn, fx.owner.id, fx.board.id).unwrap(),
        BoardRole::Owner
    );
    assert_eq!(
        fx.boards.role_of(&fx.conn, viewer.id, fx.board.id).unwrap(),
        BoardRole::Viewer
    );

    let err = fx
        .boards
        .role_of(&fx.conn, outsider.id, fx.board.id)
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(Denial::NotAMember)));
    let err = fx
        .boards
        .role_of(&fx.conn, fx.owner.id, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(Missing::Board(_))));
}
