mod common;

use collabboard_core::{
    CardPatch, CardPriority, ConflictKind, CoreError, CreateCard, FieldUpdate, Missing,
};
use common::setup;
use uuid::Uuid;

fn retitle(title: &str) -> CardPatch {
    CardPatch {
        title: Some(title.to_string()),
        ..CardPatch::default()
    }
}

#[test]
fn stale_patch_returns_latest_card() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let card = fx.card(todo.id, "Draft");
    for (expected, title) in [(1, "v2"), (2, "v3"), (3, "v4")] {
        fx.publisher
            .run(&fx.conn, |uow| {
                fx.cards
                    .patch_card(uow, fx.owner.id, card.id, &retitle(title), expected)
            })
            .unwrap();
    }

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .patch_card(uow, fx.owner.id, card.id, &retitle("late"), 3)
        })
        .unwrap_err();

    assert_eq!(err.code(), "CARD_VERSION_CONFLICT");
    match err {
        CoreError::Conflict(ConflictKind::StaleVersion { latest }) => {
            assert_eq!(latest.version, 4);
            assert_eq!(latest.title, "v4");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.get(&card).title, "v4");
}

#[test]
fn patch_is_partial_and_bumps_once() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let assignee = fx.user("dev@example.com");
    let card = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.create_card(
                uow,
                fx.owner.id,
                todo.id,
                CreateCard {
                    title: "Ship".to_string(),
                    description: Some("  notes  ".to_string()),
                    priority: Some(CardPriority::High),
                    due_at: Some(5_000),
                    assignee: Some(assignee.id),
                },
            )
        })
        .unwrap();
    assert_eq!(card.description, "notes");

    let patch = CardPatch {
        due_at: FieldUpdate::Clear,
        ..CardPatch::default()
    };
    let patched = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.patch_card(uow, fx.owner.id, card.id, &patch, 1)
        })
        .unwrap();

    assert_eq!(patched.version, 2);
    assert_eq!(patched.due_at, None);
    assert_eq!(patched.title, "Ship");
    assert_eq!(patched.priority, CardPriority::High);
    assert_eq!(patched.assignee, Some(assignee.id));
    assert!(patched.updated_at >= card.updated_at);
    assert_eq!(fx.get(&card), patched);
}

#[test]
fn failed_mutations_leave_version_untouched() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let card = fx.card(todo.id, "Stable");

    let blank = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .patch_card(uow, fx.owner.id, card.id, &retitle("  "), 1)
        })
        .unwrap_err();
    assert!(matches!(blank, CoreError::BadRequest(_)));

    let ghost = Uuid::new_v4();
    let unknown_assignee = CardPatch {
        assignee: FieldUpdate::Set(ghost),
        ..CardPatch::default()
    };
    let missing = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .patch_card(uow, fx.owner.id, card.id, &unknown_assignee, 1)
        })
        .unwrap_err();
    assert!(matches!(missing, CoreError::NotFound(Missing::User(id)) if id == ghost));

    let stale_move = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.move_card(uow, fx.owner.id, card.id, todo.id, 0, 7)
        })
        .unwrap_err();
    assert!(stale_move.latest().is_some());

    let stale_delete = fx
        .publisher
        .run(&fx.conn, |uow| fx.cards.delete_card(uow, fx.owner.id, card.id, 2))
        .unwrap_err();
    assert_eq!(stale_delete.code(), "CARD_VERSION_CONFLICT");

    assert_eq!(fx.get(&card), card);
}

#[test]
fn versions_grow_by_one_per_mutation() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let doing = fx.list("Doing", None);
    let card = fx.card(todo.id, "Walk");
    fx.card(todo.id, "Other");

    let patched = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .patch_card(uow, fx.owner.id, card.id, &retitle("Run"), 1)
        })
        .unwrap();
    let moved = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.move_card(uow, fx.owner.id, card.id, doing.id, 0, 2)
        })
        .unwrap();
    let back = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards.move_card(uow, fx.owner.id, card.id, todo.id, 0, 3)
        })
        .unwrap();

    assert_eq!(
        [card.version, patched.version, moved.version, back.version],
        [1, 2, 3, 4]
    );
}

#[test]
fn shifted_neighbours_keep_their_version() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let first = fx.card(todo.id, "First");
    let second = fx.card(todo.id, "Second");
    let third = fx.card(todo.id, "Third");

    fx.publisher
        .run(&fx.conn, |uow| {
            fx.cards.move_card(uow, fx.owner.id, third.id, todo.id, 0, 1)
        })
        .unwrap();
    fx.publisher
        .run(&fx.conn, |uow| fx.cards.delete_card(uow, fx.owner.id, third.id, 2))
        .unwrap();

    assert_eq!(fx.get(&first).version, 1);
    assert_eq!(fx.get(&second).version, 1);
    assert_eq!(fx.get(&first).position, 0);
    assert_eq!(fx.get(&second).position, 1);
}
