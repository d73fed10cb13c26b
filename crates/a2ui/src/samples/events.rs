use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use super::{Handlers, UiPromptContext};
use crate::agent::{Agent, AgentConfig};
use crate::errors::AgentResult;
use crate::extract::A2UI_JSON_DELIMITER;
use crate::models::tool::Tool;
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::stores::calendar::{Calendar, CalendarEvent};
use crate::stores::spreadsheet::{display_cell, Spreadsheet};
use crate::stores::Stores;
use crate::toolbox::{optional_str, Toolbox};

/// Sheet holding `[date, title, description, start, end]` rows
pub const EVENTS_SHEET: &str = "data";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Full details of an event, as carried by a checkbox in the event list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
}

impl EventDetails {
    fn to_calendar_event(&self) -> Option<CalendarEvent> {
        let date = parse_date(&self.date)?;
        let start = NaiveTime::parse_from_str(self.start_time.trim(), "%H:%M").ok()?;
        let end = NaiveTime::parse_from_str(self.end_time.trim(), "%H:%M").ok()?;
        Some(CalendarEvent {
            title: self.title.clone(),
            start: NaiveDateTime::new(date, start),
            end: NaiveDateTime::new(date, end),
            description: self.description.clone(),
        })
    }
}

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "get_events",
            "Search for events in the database based on date or keywords.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "startDate": {"type": "STRING", "description": "Start date in YYYY-MM-DD format."},
                    "endDate": {"type": "STRING", "description": "End date in YYYY-MM-DD format."},
                    "keyword": {"type": "STRING", "description": "Keyword to filter event titles."}
                },
                "required": ["startDate"]
            }),
        ),
        Tool::new(
            "add_events_to_calendar",
            "Add a list of specific events to the Google Calendar.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "eventsJson": {
                        "type": "STRING",
                        "description": "A JSON string array of event objects to add."
                    }
                },
                "required": ["eventsJson"]
            }),
        ),
    ]
}

pub fn toolbox(sheets: Arc<dyn Spreadsheet>, calendar: Arc<dyn Calendar>) -> AgentResult<Toolbox> {
    let handlers = Handlers::default()
        .with("get_events", move |args| Ok(get_events(&*sheets, args)))
        .with("add_events_to_calendar", move |args| {
            add_to_calendar(&*calendar, args)
        });
    Toolbox::new(tools(), handlers.into_inner())
}

pub fn agent(provider: Arc<dyn Provider>, stores: &Stores) -> AgentResult<Agent> {
    let prompt = system_prompt("events.md", &UiPromptContext::new(A2UI_JSON_DELIMITER)?)?;
    Ok(Agent::new(
        provider,
        toolbox(stores.sheets.clone(), stores.calendar.clone())?,
        prompt,
        AgentConfig::single_shot(0.1, A2UI_JSON_DELIMITER),
    ))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Rows of the events sheet within the inclusive date range whose title or
/// description mentions `keyword`; rows without a readable date never match
fn get_events(sheets: &dyn Spreadsheet, args: &Value) -> Value {
    let Ok(rows) = sheets.rows(EVENTS_SHEET) else {
        return json!([]);
    };

    let start = optional_str(args, "startDate").and_then(parse_date);
    let end = optional_str(args, "endDate").and_then(parse_date);
    let keyword = optional_str(args, "keyword").map(str::to_lowercase);

    rows.iter()
        .skip(1)
        .filter_map(|row| {
            let cell = |i: usize| row.get(i).map(display_cell).unwrap_or_default();
            let date = parse_date(&cell(0))?;

            if start.is_some_and(|start| date < start) || end.is_some_and(|end| date > end) {
                return None;
            }
            let (title, description) = (cell(1), cell(2));
            if let Some(keyword) = &keyword {
                let haystack = format!("{} {}", title, description).to_lowercase();
                if !haystack.contains(keyword.as_str()) {
                    return None;
                }
            }

            let details = EventDetails {
                date: date.format("%Y-%m-%d").to_string(),
                title,
                description,
                start_time: cell(3),
                end_time: cell(4),
            };
            let json_value = serde_json::to_string(&details).ok()?;
            Some(json!({
                "date": date.format("%m/%d").to_string(),
                "timeRange": format!("{} - {}", details.start_time, details.end_time),
                "title": details.title,
                "description": details.description,
                "jsonValue": json_value,
            }))
        })
        .collect()
}

/// The model sends the selection either as a JSON string or as an array
fn selected_events(args: &Value) -> Vec<Value> {
    match args.get("eventsJson") {
        Some(Value::String(raw)) => serde_json::from_str::<Vec<Value>>(raw).unwrap_or_default(),
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn add_to_calendar(calendar: &dyn Calendar, args: &Value) -> anyhow::Result<Value> {
    let events = selected_events(args);
    if events.is_empty() {
        return Ok(json!({ "status": "No events selected.", "addedCount": 0 }));
    }

    let mut added = 0;
    for event in events {
        // a checkbox value arrives as the stringified details
        let event = match event {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::Null),
            other => other,
        };
        let Some(calendar_event) = serde_json::from_value::<EventDetails>(event.clone())
            .ok()
            .and_then(|details| details.to_calendar_event())
        else {
            warn!("Skipping unreadable event {}", event);
            continue;
        };
        calendar.create_event(calendar_event)?;
        added += 1;
    }

    Ok(json!({
        "status": format!("Successfully added {} events to your calendar.", added),
        "addedCount": added,
    }))
}
