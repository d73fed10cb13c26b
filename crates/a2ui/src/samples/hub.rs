//! A router in front of the restaurant, events and quiz samples
//!
//! Messages produced by UI controls are recognised by their prefix and go straight
//! to the app that rendered the control. Anything else is put to the model with one
//! tool per app; the tool it calls decides which app answers.

use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, info};

use super::quiz::{QuizApp, QUIZ_COMPLETED_PREFIX};
use super::{events, restaurant, App, Reply};
use crate::agent::{Agent, NO_RESPONSE};
use crate::errors::{AgentError, AgentResult};
use crate::models::envelope::ResponseEnvelope;
use crate::models::message::{conversation, HistoryTurn, Part};
use crate::models::tool::Tool;
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::stores::Stores;

/// Sent by the restaurant list's "Book Now" button
pub const DETAILS_PREFIX: &str = "DETAILS_JSON:";
/// Sent by the booking form's submit button
pub const BOOKING_SUBMIT_PREFIX: &str = "BOOKING_SUBMIT_JSON:";

const GREETING: &str = "How can I help you today?";
const ROUTER_TEMPERATURE: f64 = 0.1;

/// The apps the router can hand a message to; the name is the router's tool name
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum Route {
    RestaurantFinder,
    EventFinder,
    QuizGenerator,
}

impl Route {
    pub fn description(&self) -> &'static str {
        match self {
            Route::RestaurantFinder => "App for restaurant search and reservations.",
            Route::EventFinder => "App for company events and calendar management.",
            Route::QuizGenerator => {
                "App for generating educational quizzes and tracking learning progress."
            }
        }
    }

    /// When the router should pick this app
    fn when(&self) -> &'static str {
        match self {
            Route::RestaurantFinder => {
                "If the user wants to find restaurants, check food details, or make a reservation"
            }
            Route::EventFinder => {
                "If the user wants to find schedule events, check calendar availability, or add events"
            }
            Route::QuizGenerator => {
                "If the user wants to learn something, take a quiz, study a topic, or review past learning performance"
            }
        }
    }

    fn tool(&self) -> Tool {
        Tool::new(
            self.as_ref(),
            self.description(),
            json!({"type": "OBJECT", "properties": {}, "required": []}),
        )
    }
}

#[derive(Serialize)]
struct RouteEntry {
    name: String,
    when: &'static str,
}

/// The booking form as submitted by the UI
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingSubmission {
    #[serde(default)]
    restaurant_name: Value,
    #[serde(default)]
    party_size: Value,
    #[serde(default)]
    reservation_time: Value,
    #[serde(default)]
    dietary: Value,
    #[serde(default)]
    image_url: Value,
}

impl BookingSubmission {
    /// Phrase the form as a request the restaurant agent answers with `submit_booking`
    fn as_request(&self) -> String {
        format!(
            "Submit a booking for {} for {} people at {}. Dietary: {}. ImageUrl: {}",
            field(&self.restaurant_name),
            field(&self.party_size),
            field(&self.reservation_time),
            field(&self.dietary),
            field(&self.image_url),
        )
    }
}

fn field(value: &Value) -> String {
    match value {
        Value::Null => "undefined".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct Hub {
    provider: Arc<dyn Provider>,
    router_prompt: String,
    restaurants: Agent,
    events: Agent,
    quiz: QuizApp,
}

impl Hub {
    pub fn new(provider: Arc<dyn Provider>, stores: &Stores) -> AgentResult<Self> {
        let apps: Vec<RouteEntry> = Route::iter()
            .map(|route| RouteEntry {
                name: route.to_string(),
                when: route.when(),
            })
            .collect();
        let router_prompt = system_prompt("router.md", &json!({ "apps": apps }))?;

        Ok(Self {
            restaurants: restaurant::agent(provider.clone(), stores)?,
            events: events::agent(provider.clone(), stores)?,
            quiz: QuizApp::new(provider.clone(), stores)?,
            provider,
            router_prompt,
        })
    }

    /// Ask the model which app should answer, or for a chat reply
    fn route(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Result<Route, String>> {
        let tools: Vec<Tool> = Route::iter().map(|route| route.tool()).collect();
        let completion = self.provider.complete(
            &self.router_prompt,
            &conversation(history, user_message),
            &tools,
            Some(ROUTER_TEMPERATURE),
        )?;
        if completion.retries > 0 {
            debug!("Router request retried {} time(s)", completion.retries);
        }

        let Some(message) = completion.message else {
            return Ok(Err(NO_RESPONSE.to_string()));
        };
        match message.first_part() {
            Some(Part::FunctionCall(call)) => Route::from_str(&call.name)
                .map(Ok)
                .map_err(|_| AgentError::UnknownTool(call.name.clone())),
            Some(Part::Text(text)) if !text.is_empty() => Ok(Err(text.clone())),
            _ => Ok(Err(GREETING.to_string())),
        }
    }
}

impl App for Hub {
    fn process(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Reply> {
        if let Some(payload) = user_message.strip_prefix(QUIZ_COMPLETED_PREFIX) {
            return self.quiz.complete(payload).map(Reply::Summary);
        }
        if user_message.starts_with(DETAILS_PREFIX) {
            return self.restaurants.process(user_message, history);
        }
        if let Some(payload) = user_message.strip_prefix(BOOKING_SUBMIT_PREFIX) {
            let booking: BookingSubmission = serde_json::from_str(payload.trim())
                .map_err(|e| AgentError::InvalidParameters(format!("booking form: {}", e)))?;
            return self.restaurants.process(&booking.as_request(), history);
        }

        match self.route(user_message, history)? {
            Ok(route) => {
                info!("Routing to {}", route);
                match route {
                    Route::RestaurantFinder => self.restaurants.process(user_message, history),
                    Route::EventFinder => self.events.process(user_message, history),
                    Route::QuizGenerator => self.quiz.process(user_message, history),
                }
            }
            Err(text) => Ok(Reply::from(ResponseEnvelope::text(text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::providers::mock::MockProvider;

    fn hub(responses: Vec<Message>) -> (Hub, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::new(responses));
        let hub = Hub::new(provider.clone(), &Stores::in_memory()).unwrap();
        (hub, provider)
    }

    #[test]
    fn test_route_names() {
        assert_eq!(Route::RestaurantFinder.to_string(), "restaurantFinder");
        assert_eq!(Route::from_str("quizGenerator").unwrap(), Route::QuizGenerator);
        assert!(Route::from_str("weatherApp").is_err());
    }

    #[test]
    fn test_router_prompt_lists_every_app() {
        let (hub, _) = hub(vec![]);
        for route in Route::iter() {
            assert!(hub.router_prompt.contains(&format!("call `{}`", route)));
        }
    }

    #[test]
    fn test_general_chat_is_answered_by_router() {
        let (hub, provider) = hub(vec![Message::model().with_text("Hello! I can help with food, events or quizzes.")]);
        let reply = hub.process("hi there", &[]).unwrap();
        assert_eq!(reply.text(), Some("Hello! I can help with food, events or quizzes."));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools.len(), 3);
        assert_eq!(requests[0].temperature, Some(0.1));
    }

    #[test]
    fn test_empty_router_text_greets() {
        let (hub, _) = hub(vec![Message::model().with_text("")]);
        let reply = hub.process("...", &[]).unwrap();
        assert_eq!(reply.text(), Some(GREETING));
    }

    #[test]
    fn test_routes_to_event_finder() {
        let (hub, provider) = hub(vec![
            Message::model().with_function_call("eventFinder", json!({})),
            Message::model().with_text("Here are this week's events."),
        ]);
        let reply = hub.process("What events are on this week?", &[]).unwrap();
        assert_eq!(reply.text(), Some("Here are this week's events."));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].tools.iter().any(|tool| tool.name == "get_events"));
        assert_eq!(requests[1].messages[0].text(), "What events are on this week?");
    }

    #[test]
    fn test_unknown_route() {
        let (hub, _) = hub(vec![Message::model().with_function_call("weatherApp", json!({}))]);
        assert_eq!(
            hub.process("weather?", &[]).unwrap_err(),
            AgentError::UnknownTool("weatherApp".to_string())
        );
    }

    #[test]
    fn test_booking_submission_bypasses_router() {
        let (hub, provider) = hub(vec![Message::model().with_text("Booked!")]);
        let form = json!({
            "restaurantName": "Han Dynasty",
            "partySize": 2,
            "reservationTime": "2026-01-07T19:00",
            "imageUrl": "https://example.com/han.jpeg"
        });

        let reply = hub
            .process(&format!("{}{}", BOOKING_SUBMIT_PREFIX, form), &[])
            .unwrap();
        assert_eq!(reply.text(), Some("Booked!"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.iter().any(|tool| tool.name == "submit_booking"));
        assert_eq!(
            requests[0].messages[0].text(),
            "Submit a booking for Han Dynasty for 2 people at 2026-01-07T19:00. Dietary: undefined. ImageUrl: https://example.com/han.jpeg"
        );
    }

    #[test]
    fn test_invalid_booking_submission() {
        let (hub, provider) = hub(vec![]);
        let err = hub
            .process(&format!("{}{{oops", BOOKING_SUBMIT_PREFIX), &[])
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn test_details_go_to_restaurant_app() {
        let (hub, provider) = hub(vec![Message::model().with_text("Fill in the form.")]);
        let message = r#"DETAILS_JSON:{"name": "Han Dynasty"}"#;
        hub.process(message, &[]).unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].text(), message);
    }

    #[test]
    fn test_quiz_completion_bypasses_router() {
        let (hub, provider) = hub(vec![Message::model().with_text("Well done.")]);
        let reply = hub
            .process(
                &format!("{}{}", QUIZ_COMPLETED_PREFIX, json!({"results": []})),
                &[],
            )
            .unwrap();
        assert_eq!(reply.text(), Some("Well done."));
        assert_eq!(
            provider.requests()[0].messages[0].text(),
            "Analyze my quiz performance."
        );
    }
}
