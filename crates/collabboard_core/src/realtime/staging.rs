//! Per-unit-of-work event buffer.

use super::event::BoardEvent;
use uuid::Uuid;

/// Events staged by one unit of work, in staging order.
#[derive(Debug)]
pub struct EventStagingBuffer {
    correlation_id: Uuid,
    events: Vec<BoardEvent>,
}

impl EventStagingBuffer {
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            events: Vec::new(),
        }
    }

    /// Id shared by every event of this unit of work in logs.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn stage(&mut self, event: BoardEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    /// Takes the staged events, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventStagingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
