use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::{number, Handlers, UiPromptContext};
use crate::agent::{Agent, AgentConfig};
use crate::errors::AgentResult;
use crate::extract::A2UI_JSON_DELIMITER;
use crate::models::tool::Tool;
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::stores::spreadsheet::{display_cell, numeric_cell, Spreadsheet};
use crate::stores::Stores;
use crate::toolbox::{required_str, Toolbox};

/// Sheet holding the `[date, category, amount, note]` expense log
pub const BUDGET_SHEET: &str = "Sheet1";

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "get_monthly_data",
            "Retrieve current month's expense data from the spreadsheet.",
            json!({"type": "OBJECT", "properties": {}, "required": []}),
        ),
        Tool::new(
            "update_budget_sheet",
            "Update the spreadsheet with the approved budget plan.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "changes_summary": {
                        "type": "STRING",
                        "description": "A summary of changes made (e.g., 'Reduced Dining Out by 5000')."
                    },
                    "new_savings_amount": {
                        "type": "NUMBER",
                        "description": "The new calculated savings amount."
                    }
                },
                "required": ["changes_summary", "new_savings_amount"]
            }),
        ),
    ]
}

pub fn toolbox(sheets: Arc<dyn Spreadsheet>) -> AgentResult<Toolbox> {
    let reader = sheets.clone();
    let handlers = Handlers::default()
        .with("get_monthly_data", move |_| {
            Ok(json!({ "current_expenses": monthly_expenses(&*reader) }))
        })
        .with("update_budget_sheet", move |args| {
            Ok(json!({ "status": update_budget(&*sheets, args)? }))
        });
    Toolbox::new(tools(), handlers.into_inner())
}

pub fn agent(provider: Arc<dyn Provider>, stores: &Stores) -> AgentResult<Agent> {
    let prompt = system_prompt("budget.md", &UiPromptContext::new(A2UI_JSON_DELIMITER)?)?;
    Ok(Agent::new(
        provider,
        toolbox(stores.sheets.clone())?,
        prompt,
        AgentConfig::single_shot(0.2, A2UI_JSON_DELIMITER),
    ))
}

/// Sum the expense log by category, in order of first appearance
fn monthly_expenses(sheets: &dyn Spreadsheet) -> Value {
    info!("Fetching monthly data...");

    let rows = match sheets.rows(BUDGET_SHEET) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Could not read {}: {}", BUDGET_SHEET, e);
            return json!([{ "category": "Error", "amount": 0, "note": "Could not read sheet" }]);
        }
    };

    let mut totals: Vec<(String, f64)> = Vec::new();
    for row in rows.iter().skip(1) {
        let category = row.get(1).map(display_cell).unwrap_or_default();
        let Some(amount) = row.get(2).and_then(numeric_cell) else {
            continue;
        };
        if category.is_empty() {
            continue;
        }
        match totals.iter_mut().find(|(name, _)| *name == category) {
            Some((_, total)) => *total += amount,
            None => totals.push((category, amount)),
        }
    }

    totals
        .into_iter()
        .map(|(category, amount)| json!({ "category": category, "amount": number(amount) }))
        .collect()
}

fn update_budget(sheets: &dyn Spreadsheet, args: &Value) -> anyhow::Result<&'static str> {
    info!("Updating sheet with: {}", args);
    let summary = required_str(args, "changes_summary")?;
    let amount = args
        .get("new_savings_amount")
        .cloned()
        .unwrap_or(Value::Null);

    let row = vec![
        json!(Utc::now().format("%Y-%m-%d").to_string()),
        json!("Budget Adjustment"),
        amount,
        json!(format!("Plan update: {}", summary)),
    ];
    match sheets.append_rows(BUDGET_SHEET, vec![row]) {
        Ok(()) => Ok("Success: Budget updated in Sheet."),
        Err(e) => {
            warn!("Budget update failed: {}", e);
            Ok("Error: Failed to update sheet.")
        }
    }
}
