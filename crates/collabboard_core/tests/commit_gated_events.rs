mod common;

use collabboard_core::{BoardEventType, CoreError, CreateCard, UnitState};
use common::setup;
use serde_json::Value;

#[test]
fn failure_after_staging_delivers_nothing() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let mut subscription = fx.subscribe();

    let err = fx
        .publisher
        .run(&fx.conn, |uow| {
            fx.cards
                .create_card(uow, fx.owner.id, todo.id, CreateCard::titled("Doomed"))?;
            assert_eq!(uow.staged().len(), 1);
            assert_eq!(uow.state(), UnitState::Active);
            Err::<(), _>(CoreError::bad_request("forced abort"))
        })
        .unwrap_err();

    assert!(matches!(err, CoreError::BadRequest(_)));
    assert!(subscription.drain().is_empty());
    assert!(fx.positions(todo.id).is_empty());
}

#[test]
fn explicit_abort_discards_staged_events() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let mut subscription = fx.subscribe();

    let mut uow = fx.publisher.begin(&fx.conn).unwrap();
    fx.cards
        .create_card(&mut uow, fx.owner.id, todo.id, CreateCard::titled("Draft"))
        .unwrap();
    let correlation_id = uow.correlation_id();
    let outcome = fx.publisher.abort(uow);

    assert_eq!(outcome.correlation_id, correlation_id);
    assert_eq!(outcome.state, UnitState::Discarded);
    assert_eq!(outcome.staged, 1);
    assert_eq!(outcome.delivered, 0);
    assert!(subscription.try_next().is_none());
    assert!(fx.positions(todo.id).is_empty());
}

#[test]
fn committed_unit_flushes_in_staging_order() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let mut subscription = fx.subscribe();

    let mut uow = fx.publisher.begin(&fx.conn).unwrap();
    let first = fx
        .cards
        .create_card(&mut uow, fx.owner.id, todo.id, CreateCard::titled("First"))
        .unwrap();
    let second = fx
        .cards
        .create_card(&mut uow, fx.owner.id, todo.id, CreateCard::titled("Second"))
        .unwrap();
    fx.cards
        .move_card(&mut uow, fx.owner.id, second.id, todo.id, 0, 1)
        .unwrap();
    assert!(subscription.try_next().is_none());

    let outcome = fx.publisher.complete(uow).unwrap();
    assert_eq!(outcome.state, UnitState::Flushed);
    assert_eq!(outcome.staged, 3);
    assert_eq!(outcome.delivered, 3);

    let kinds: Vec<_> = subscription.drain().into_iter().map(|event| event.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BoardEventType::CardCreated,
            BoardEventType::CardCreated,
            BoardEventType::CardMoved
        ]
    );
    assert_eq!(fx.get(&first).position, 1);
}

#[test]
fn events_serialize_with_camel_case_envelope() {
    let fx = setup();
    let todo = fx.list("Todo", None);
    let mut subscription = fx.subscribe();
    let card = fx.card(todo.id, "Wire");
    fx.publisher
        .run(&fx.conn, |uow| fx.cards.delete_card(uow, fx.owner.id, card.id, 1))
        .unwrap();
    fx.publisher
        .run(&fx.conn, |uow| fx.lists.delete_list(uow, fx.owner.id, todo.id))
        .unwrap();

    let events: Vec<Value> = subscription
        .drain()
        .iter()
        .map(|event| serde_json::from_str(&event.to_json().unwrap()).unwrap())
        .collect();
    assert_eq!(events.len(), 3);

    assert_eq!(events[0]["type"], "CARD_CREATED");
    assert_eq!(events[0]["boardId"], fx.board.id.to_string());
    assert_eq!(events[0]["data"]["card"]["title"], "Wire");
    assert_eq!(events[0]["data"]["card"]["version"], 1);

    assert_eq!(events[1]["type"], "CARD_DELETED");
    assert_eq!(events[1]["data"]["cardId"], card.id.to_string());
    assert_eq!(events[1]["data"]["position"], 0);

    assert_eq!(events[2]["type"], "LIST_DELETED");
    assert_eq!(events[2]["data"]["listId"], todo.id.to_string());
    assert_ne!(events[0]["eventId"], events[1]["eventId"]);
}

#[test]
fn subscribing_requires_membership() {
    let fx = setup();
    let outsider = fx.user("outsider@example.com");

    let err = fx
        .boards
        .subscribe(&fx.conn, &fx.hub, outsider.id, fx.board.id)
        .err()
        .unwrap();
    assert_eq!(err.code(), "NOT_A_MEMBER");
}

#[tokio::test]
async fn subscriber_awaits_committed_events() {
    let fx = setup();
    let mut subscription = fx.subscribe();
    let todo = fx.list("Todo", None);

    let event = subscription.recv().await.unwrap();
    assert_eq!(event.kind, BoardEventType::ListCreated);
    assert_eq!(event.board_id, fx.board.id);
    assert_eq!(subscription.board_id(), fx.board.id);
    assert!(matches!(
        event.data,
        collabboard_core::EventData::List { ref list } if list.id == todo.id
    ));
}
