use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::StoreResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub description: String,
}

pub trait Calendar: Send + Sync {
    fn create_event(&self, event: CalendarEvent) -> StoreResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: Mutex<Vec<CalendarEvent>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Calendar for InMemoryCalendar {
    fn create_event(&self, event: CalendarEvent) -> StoreResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
