//! Board event envelope.

use crate::model::card::Card;
use crate::model::list::BoardList;
use crate::model::{epoch_ms_now, BoardId, CardId, ListId};
use serde::Serialize;
use uuid::Uuid;

/// Event type tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardEventType {
    CardCreated,
    CardUpdated,
    CardMoved,
    CardDeleted,
    ListCreated,
    ListDeleted,
}

/// Event payload. Serialized without a tag; the envelope's `type` names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    #[serde(rename_all = "camelCase")]
    CardMoved {
        card: Card,
        from_list_id: ListId,
        from_position: i64,
        to_list_id: ListId,
        to_position: i64,
    },
    Card {
        card: Card,
    },
    #[serde(rename_all = "camelCase")]
    CardDeleted {
        card_id: CardId,
        list_id: ListId,
        position: i64,
    },
    List {
        list: BoardList,
    },
    #[serde(rename_all = "camelCase")]
    ListDeleted { list_id: ListId, position: i64 },
}

/// One change on a board, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEvent {
    pub event_id: Uuid,
    pub timestamp: i64,
    pub board_id: BoardId,
    #[serde(rename = "type")]
    pub kind: BoardEventType,
    pub data: EventData,
}

impl BoardEvent {
    fn new(board_id: BoardId, kind: BoardEventType, data: EventData) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: epoch_ms_now(),
            board_id,
            kind,
            data,
        }
    }

    pub fn card_created(board_id: BoardId, card: Card) -> Self {
        Self::new(board_id, BoardEventType::CardCreated, EventData::Card { card })
    }

    pub fn card_updated(board_id: BoardId, card: Card) -> Self {
        Self::new(board_id, BoardEventType::CardUpdated, EventData::Card { card })
    }

    /// `card` is the persisted state after the move.
    pub fn card_moved(
        board_id: BoardId,
        card: Card,
        from_list_id: ListId,
        from_position: i64,
    ) -> Self {
        let to_list_id = card.list_id;
        let to_position = card.position;
        Self::new(
            board_id,
            BoardEventType::CardMoved,
            EventData::CardMoved {
                card,
                from_list_id,
                from_position,
                to_list_id,
                to_position,
            },
        )
    }

    pub fn card_deleted(
        board_id: BoardId,
        card_id: CardId,
        list_id: ListId,
        position: i64,
    ) -> Self {
        Self::new(
            board_id,
            BoardEventType::CardDeleted,
            EventData::CardDeleted {
                card_id,
                list_id,
                position,
            },
        )
    }

    pub fn list_created(list: BoardList) -> Self {
        Self::new(list.board_id, BoardEventType::ListCreated, EventData::List { list })
    }

    pub fn list_deleted(board_id: BoardId, list_id: ListId, position: i64) -> Self {
        Self::new(
            board_id,
            BoardEventType::ListDeleted,
            EventData::ListDeleted { list_id, position },
        )
    }

    /// Wire form sent to clients.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
