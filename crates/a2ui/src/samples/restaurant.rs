use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{Handlers, UiPromptContext};
use crate::agent::{Agent, AgentConfig};
use crate::errors::AgentResult;
use crate::extract::A2UI_JSON_DELIMITER;
use crate::models::tool::Tool;
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::stores::restaurants::RestaurantDirectory;
use crate::stores::Stores;
use crate::toolbox::{optional_str, Toolbox};

const DEFAULT_COUNT: usize = 5;

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "get_restaurants",
            "Get a list of restaurants based on cuisine and location.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "location": {"type": "STRING", "description": "The location (e.g., New York)."},
                    "cuisine": {"type": "STRING", "description": "The type of cuisine."},
                    "count": {"type": "INTEGER", "description": "Number of restaurants to return."}
                },
                "required": ["location", "cuisine"]
            }),
        ),
        Tool::new(
            "submit_booking",
            "Submit a restaurant reservation booking with details.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "restaurantName": {"type": "STRING", "description": "Name of the restaurant."},
                    "partySize": {"type": "STRING", "description": "Number of people."},
                    "reservationTime": {"type": "STRING", "description": "Date and time of reservation."},
                    "dietary": {"type": "STRING", "description": "Dietary requirements if any."},
                    "imageUrl": {"type": "STRING", "description": "Image URL of the restaurant."}
                },
                "required": ["restaurantName", "partySize", "reservationTime"]
            }),
        ),
    ]
}

pub fn toolbox(directory: Arc<dyn RestaurantDirectory>) -> AgentResult<Toolbox> {
    let handlers = Handlers::default()
        .with("get_restaurants", move |args| get_restaurants(&*directory, args))
        .with("submit_booking", |args| {
            info!("Booking submitted: {}", args);
            Ok(json!({ "status": "Reservation completed" }))
        });
    Toolbox::new(tools(), handlers.into_inner())
}

pub fn agent(provider: Arc<dyn Provider>, stores: &Stores) -> AgentResult<Agent> {
    let prompt = system_prompt("restaurant.md", &UiPromptContext::new(A2UI_JSON_DELIMITER)?)?;
    Ok(Agent::new(
        provider,
        toolbox(stores.restaurants.clone())?,
        prompt,
        AgentConfig::single_shot(0.1, A2UI_JSON_DELIMITER),
    ))
}

/// Accepts the count as a number or a numeric string; zero or missing means the default
fn requested_count(args: &Value) -> usize {
    let count = match args.get("count") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    count.filter(|&n| n > 0).unwrap_or(DEFAULT_COUNT)
}

fn get_restaurants(directory: &dyn RestaurantDirectory, args: &Value) -> anyhow::Result<Value> {
    let count = requested_count(args);
    info!(
        "Searching for {} in {}, limit {}",
        optional_str(args, "cuisine").unwrap_or("any cuisine"),
        optional_str(args, "location").unwrap_or("anywhere"),
        count
    );

    let restaurants: Vec<_> = directory.restaurants().into_iter().take(count).collect();
    Ok(serde_json::to_value(restaurants)?)
}
