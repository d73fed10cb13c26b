use serde_json::{json, Value};
use std::sync::Arc;

use a2ui::models::message::HistoryTurn;
use a2ui::providers::configs::GeminiProviderConfig;
use a2ui::providers::gemini::GeminiProvider;
use a2ui::providers::retry::RecordingSleeper;
use a2ui::samples::{build_app, Sample, SampleOptions};
use a2ui::stores::spreadsheet::InMemorySpreadsheet;
use a2ui::stores::Stores;
use mockito::{Matcher, Server};

const PATH: &str = "/v1beta/models/test-model:generateContent";

fn provider(server: &Server) -> Arc<GeminiProvider> {
    let config = GeminiProviderConfig::new(server.url(), "test_key", "test-model");
    Arc::new(
        GeminiProvider::new(config)
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::new())),
    )
}

fn candidate(part: Value) -> String {
    json!({"candidates": [{"content": {"role": "model", "parts": [part]}}]}).to_string()
}

fn budget_stores() -> Stores {
    Stores {
        sheets: Arc::new(InMemorySpreadsheet::new().with_sheet(
            "Sheet1",
            vec![
                vec![json!("Date"), json!("Category"), json!("Amount"), json!("Note")],
                vec![json!("2026-01-02"), json!("Rent"), json!(120000), json!("")],
                vec![json!("2026-01-05"), json!("Food"), json!(4500), json!("")],
            ],
        )),
        ..Stores::in_memory()
    }
}

#[test]
fn test_budget_turn_over_http_with_retry() {
    let mut server = Server::new();
    let overloaded = server
        .mock("POST", PATH)
        .with_status(503)
        .with_body(r#"{"error": {"message": "The model is overloaded."}}"#)
        .expect(1)
        .create();
    let call = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {"temperature": 0.2}
        })))
        .with_status(200)
        .with_body(candidate(json!({"functionCall": {"name": "get_monthly_data", "args": {}}})))
        .expect(1)
        .create();
    let answer = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex("functionResponse".to_string()))
        .with_status(200)
        .with_body(candidate(json!({
            "text": "Rent dominates your spending.\n---a2ui_JSON---\n```json\n[{\"beginRendering\": {\"surfaceId\": \"budget-dash\", \"root\": \"main-col\"}}]\n```"
        })))
        .expect(1)
        .create();

    let app = build_app(
        Sample::Budget,
        provider(&server),
        &budget_stores(),
        &SampleOptions::default(),
    )
    .unwrap();
    let reply = app
        .process(
            "Check my budget",
            &[HistoryTurn::new("user", "hi"), HistoryTurn::new("model", "Hello!")],
        )
        .unwrap();

    overloaded.assert();
    call.assert();
    answer.assert();

    let body = serde_json::to_value(&reply).unwrap();
    assert_eq!(body["text"], "Rent dominates your spending.");
    assert_eq!(body["uiJson"][0]["beginRendering"]["surfaceId"], "budget-dash");
    assert_eq!(
        body["notice"],
        "Automatically retried 1 time(s) due to API overload."
    );
}

#[test]
fn test_function_call_signature_is_echoed() {
    let mut server = Server::new();
    let call = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "show budget"}]}]
        })))
        .with_status(200)
        .with_body(candidate(json!({
            "functionCall": {"name": "get_monthly_data", "args": {}},
            "thoughtSignature": "SIG-abc"
        })))
        .expect(1)
        .create();
    // only a follow-up that carries the signature is answered
    let answer = server
        .mock("POST", PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("functionResponse".to_string()),
            Matcher::PartialJson(json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "show budget"}]},
                    {"role": "model", "parts": [{
                        "functionCall": {"name": "get_monthly_data", "args": {}},
                        "thoughtSignature": "SIG-abc"
                    }]},
                    {"role": "function", "parts": [{"functionResponse": {
                        "name": "get_monthly_data",
                        "response": {
                            "name": "get_monthly_data",
                            "content": {"current_expenses": [
                                {"category": "Rent", "amount": 120000},
                                {"category": "Food", "amount": 4500}
                            ]}
                        }
                    }}]}
                ]
            })),
        ]))
        .with_status(200)
        .with_body(candidate(json!({"text": "Rent is your largest expense."})))
        .expect(1)
        .create();

    let app = build_app(
        Sample::Budget,
        provider(&server),
        &budget_stores(),
        &SampleOptions::default(),
    )
    .unwrap();
    let reply = app.process("show budget", &[]).unwrap();

    call.assert();
    answer.assert();
    assert_eq!(reply.text(), Some("Rent is your largest expense."));
}

#[test]
fn test_invalid_payload_is_reported() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(candidate(json!({"text": "Here you go.\n---a2ui_JSON---\n[{not json"})))
        .create();

    let app = build_app(
        Sample::Restaurant,
        provider(&server),
        &Stores::in_memory(),
        &SampleOptions::default(),
    )
    .unwrap();
    let body = serde_json::to_value(app.process("Chinese food in New York", &[]).unwrap()).unwrap();

    assert_eq!(body["text"], "Here you go.");
    assert_eq!(body["uiJson"], Value::Null);
    assert_eq!(body["error"], "JSON Parse Error");
}

#[test]
fn test_no_candidates() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"candidates": []}"#)
        .create();

    let app = build_app(
        Sample::Events,
        provider(&server),
        &Stores::in_memory(),
        &SampleOptions::default(),
    )
    .unwrap();
    let reply = app.process("What's on tomorrow?", &[]).unwrap();
    assert_eq!(reply.text(), Some("No response from AI."));
    assert_eq!(reply.payload(), None);
}

#[test]
fn test_demo_seed_loads() {
    let stores = Stores::load_seed(concat!(env!("CARGO_MANIFEST_DIR"), "/../../demos/seed.json")).unwrap();
    assert_eq!(stores.drive.list_folder("sample").unwrap().len(), 4);
    assert!(stores.sheets.has_sheet("Sheet1"));
    assert!(stores.sheets.has_sheet("data"));
    assert_eq!(stores.restaurants.restaurants().len(), 5);
}
