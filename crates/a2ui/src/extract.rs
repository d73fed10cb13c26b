//! Splitting a model reply into conversational text and a structured UI payload.
//!
//! The reply grammar is
//!
//! ```text
//! reply   := conversation [ DELIMITER payload [ DELIMITER ... ] ]
//! payload := ws* [ "```json" | "```" ] json-document [ "```" ] ws*
//! ```
//!
//! Only the segment between the first and the second delimiter is parsed.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::envelope::ResponseEnvelope;

/// Delimiter used by the drive task agent
pub const UI_JSON_DELIMITER: &str = "---UI_JSON---";
/// Delimiter used by the A2UI samples
pub const A2UI_JSON_DELIMITER: &str = "---a2ui_JSON---";

pub const JSON_PARSE_ERROR: &str = "JSON Parse Error";

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap();
}

/// Split `raw` on `delimiter` and parse the trailing payload.
///
/// Never fails: a malformed payload yields an envelope with `ui_json: None` and
/// `error` set.
pub fn extract_payload(raw: &str, delimiter: &str) -> ResponseEnvelope {
    let mut segments = raw.split(delimiter);
    let conversation = segments.next().unwrap_or_default().trim();

    let Some(payload) = segments.next() else {
        return ResponseEnvelope::text(raw.trim());
    };

    match serde_json::from_str::<Value>(strip_fences(payload)) {
        Ok(ui_json) => ResponseEnvelope::text(conversation).with_ui_json(ui_json),
        Err(e) => {
            tracing::debug!("UI payload did not parse: {}", e);
            ResponseEnvelope::text(conversation).with_error(JSON_PARSE_ERROR)
        }
    }
}

/// Remove an optional leading ```` ```json ```` (or bare ```` ``` ````) fence and an
/// optional trailing ```` ``` ```` fence
pub fn strip_fences(payload: &str) -> &str {
    let trimmed = payload.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

/// A ```` ```json {...} ``` ```` block found inside free text
#[derive(Debug, Clone, PartialEq)]
pub struct FencedJson<'a> {
    /// The whole block including the fences
    pub block: &'a str,
    /// The object between the fences
    pub json: &'a str,
}

impl<'a> FencedJson<'a> {
    pub fn parse(&self) -> serde_json::Result<Value> {
        serde_json::from_str(self.json)
    }

    /// The surrounding text with this block cut out
    pub fn remove_from(&self, text: &str) -> String {
        text.replacen(self.block, "", 1).trim().to_string()
    }
}

/// Find the first fenced JSON object in `text`.
///
/// A block ends at the first `}` followed by a closing fence, so backticks inside
/// JSON strings are fine. With `type_tag`, prefer a block whose `"type"` is that tag.
pub fn find_fenced_json<'a>(text: &'a str, type_tag: Option<&str>) -> Option<FencedJson<'a>> {
    let mut blocks = FENCED_JSON.captures_iter(text).filter_map(|captures| {
        Some(FencedJson {
            block: captures.get(0)?.as_str(),
            json: captures.get(1)?.as_str(),
        })
    });
    let Some(tag) = type_tag else {
        return blocks.next();
    };

    let tagged = Regex::new(&format!(r#""type"\s*:\s*"{}""#, regex::escape(tag))).ok();
    let mut first = None;
    for block in blocks {
        if tagged.as_ref().is_some_and(|re| re.is_match(block.json)) {
            return Some(block);
        }
        first.get_or_insert(block);
    }
    first
}
