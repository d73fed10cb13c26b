//! Adaptive quiz generation and result analysis
//!
//! A quiz turn asks the model for a `QUIZ_INIT` block, taking the latest stored
//! answers into account. When the UI reports a finished quiz the answers are saved
//! to the `Quiz` sheet, scored, charted and summarised by the model as a
//! `SUMMARY_CARD`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::{App, Reply};
use crate::agent::{Agent, AgentConfig, NO_RESPONSE};
use crate::errors::AgentResult;
use crate::extract::{find_fenced_json, UI_JSON_DELIMITER};
use crate::models::message::{conversation, HistoryTurn};
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::providers::retry::retry_notice;
use crate::stores::spreadsheet::{display_cell, numeric_cell, Row, Spreadsheet};
use crate::stores::Stores;
use crate::toolbox::Toolbox;

pub const QUIZ_SHEET: &str = "Quiz";
pub const QUIZ_HEADER: [&str; 6] = [
    "Timestamp",
    "Question",
    "Answer",
    "Options",
    "UserSelection",
    "IsCorrect",
];
/// Prefix the UI puts in front of the finished quiz's JSON
pub const QUIZ_COMPLETED_PREFIX: &str = "SYSTEM_QUIZ_COMPLETED:";

const QUESTION_COUNT: usize = 5;
const GENERATION_HISTORY: usize = 30;
const SUMMARY_HISTORY: usize = 50;
const QUICKCHART_URL: &str = "https://quickchart.io/chart?w=500&h=300&c=";

/// A generated quiz, `quiz_data` holding the `QUIZ_INIT` block when one was found
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizReply {
    pub text: String,
    pub quiz_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Analysis of a finished quiz: the `SUMMARY_CARD` block, or plain text when the
/// model did not produce one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl QuizSummary {
    fn text<S: Into<String>>(text: S) -> Self {
        Self {
            quiz_summary: None,
            text: Some(text.into()),
        }
    }
}

/// One answered question as reported by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub user_selection: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
struct QuizCompletion {
    #[serde(default)]
    results: Vec<QuizAnswer>,
}

/// A stored answer as fed back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct PastAnswer {
    question: String,
    correct_answer: String,
    user_selection: String,
    is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }
}

pub struct QuizApp {
    provider: Arc<dyn Provider>,
    sheets: Arc<dyn Spreadsheet>,
    tutor: Agent,
}

impl QuizApp {
    pub fn new(provider: Arc<dyn Provider>, stores: &Stores) -> AgentResult<Self> {
        let prompt = system_prompt("quiz.md", &json!({ "question_count": QUESTION_COUNT }))?;
        let tutor = Agent::new(
            provider.clone(),
            Toolbox::empty(),
            prompt,
            AgentConfig::single_shot(0.1, UI_JSON_DELIMITER),
        );
        Ok(Self {
            provider,
            sheets: stores.sheets.clone(),
            tutor,
        })
    }

    /// Generate a quiz for the topic in `user_message`
    pub fn generate(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<QuizReply> {
        let past = serde_json::to_string(&past_answers(&*self.sheets, GENERATION_HISTORY))
            .unwrap_or_else(|_| "[]".to_string());
        let query = format!(
            "{}\n\n[PAST LEARNING HISTORY (JSON)]:\n{}",
            user_message, past
        );

        let generation = self.tutor.generate(conversation(history, &query))?;
        let notice = retry_notice(generation.retries);
        let Some(text) = generation.text else {
            return Ok(QuizReply {
                text: NO_RESPONSE.to_string(),
                quiz_data: None,
                notice,
            });
        };

        let quiz = find_fenced_json(&text, Some("QUIZ_INIT")).and_then(|block| {
            match block.parse() {
                Ok(data) if data["type"] == "QUIZ_INIT" => Some((block.remove_from(&text), data)),
                Ok(_) => None,
                Err(e) => {
                    warn!("Quiz JSON Parse Error: {}", e);
                    None
                }
            }
        });

        Ok(match quiz {
            Some((text, data)) => QuizReply {
                text,
                quiz_data: Some(data),
                notice,
            },
            None => QuizReply {
                text,
                quiz_data: None,
                notice,
            },
        })
    }

    /// Save, score and summarise a finished quiz reported as JSON
    pub fn complete(&self, payload: &str) -> AgentResult<QuizSummary> {
        let completion: QuizCompletion = match serde_json::from_str(payload.trim()) {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Invalid quiz completion payload: {}", e);
                return Ok(QuizSummary::text("Error processing quiz results."));
            }
        };

        if let Err(e) = save_answers(&*self.sheets, &completion.results) {
            warn!("Could not save quiz results: {}", e);
        }

        let current = score(&completion.results);
        let past = past_answers(&*self.sheets, SUMMARY_HISTORY);
        let overall = overall_score(&past, current);

        let prompt = system_prompt(
            "quiz_summary.md",
            &json!({
                "results": serde_json::to_string(&completion.results).unwrap_or_default(),
                "total_questions": overall.total,
                "total_correct": overall.correct,
                "current_chart_url": chart_url(current, "Current", ["Correct", "Incorrect"], ["#28a745", "#dc3545"]),
                "history_chart_url": chart_url(overall, "All Time", ["Total Correct", "Total Incorrect"], ["#17a2b8", "#6c757d"]),
                "score": current.correct,
                "total": current.total,
            }),
        )?;

        let analyst = Agent::new(
            self.provider.clone(),
            Toolbox::empty(),
            prompt,
            AgentConfig::single_shot(0.1, UI_JSON_DELIMITER),
        );
        let generation = analyst.generate(conversation(&[], "Analyze my quiz performance."))?;
        let text = generation.text.unwrap_or_else(|| NO_RESPONSE.to_string());

        Ok(match find_fenced_json(&text, None) {
            Some(block) => match block.parse() {
                Ok(summary) => QuizSummary {
                    quiz_summary: Some(summary),
                    text: None,
                },
                Err(_) => QuizSummary::text(format!(
                    "Analysis generated but JSON was invalid.\n{}",
                    text
                )),
            },
            None => QuizSummary::text(text),
        })
    }
}

impl App for QuizApp {
    fn process(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Reply> {
        match user_message.strip_prefix(QUIZ_COMPLETED_PREFIX) {
            Some(payload) => self.complete(payload).map(Reply::Summary),
            None => self.generate(user_message, history).map(Reply::Quiz),
        }
    }
}

fn save_answers(sheets: &dyn Spreadsheet, answers: &[QuizAnswer]) -> anyhow::Result<()> {
    if answers.is_empty() {
        return Ok(());
    }
    if !sheets.has_sheet(QUIZ_SHEET) {
        sheets.insert_sheet(QUIZ_SHEET)?;
        sheets.append_rows(QUIZ_SHEET, vec![QUIZ_HEADER.iter().map(|h| json!(h)).collect()])?;
    }

    let timestamp = Utc::now().to_rfc3339();
    let rows: Vec<Row> = answers
        .iter()
        .map(|answer| {
            vec![
                json!(timestamp),
                json!(answer.question),
                json!(answer.answer),
                json!(answer.options.to_string()),
                json!(answer.user_selection),
                json!(answer.is_correct),
            ]
        })
        .collect();
    info!("Saving {} quiz answer(s)", rows.len());
    sheets.append_rows(QUIZ_SHEET, rows)?;
    Ok(())
}

/// The last `limit` stored answers, oldest first
fn past_answers(sheets: &dyn Spreadsheet, limit: usize) -> Vec<PastAnswer> {
    let Ok(rows) = sheets.rows(QUIZ_SHEET) else {
        return Vec::new();
    };
    let answers: Vec<&Row> = rows.iter().skip(1).collect();
    let start = answers.len().saturating_sub(limit);

    answers[start..]
        .iter()
        .map(|row| {
            let text = |i: usize| row.get(i).map(display_cell).unwrap_or_default();
            PastAnswer {
                question: text(1),
                correct_answer: text(2),
                user_selection: text(4),
                is_correct: is_truthy(row.get(5)),
            }
        })
        .collect()
}

fn is_truthy(cell: Option<&Value>) -> bool {
    match cell {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(other) => numeric_cell(other).is_some_and(|n| n != 0.0),
        None => false,
    }
}

pub fn score(answers: &[QuizAnswer]) -> Score {
    Score {
        correct: answers.iter().filter(|a| a.is_correct).count(),
        total: answers.len(),
    }
}

/// All-time score from the stored answers, which normally include the current
/// session already; falls back to the current session when storage lags behind
fn overall_score(past: &[PastAnswer], current: Score) -> Score {
    let mut overall = if past.is_empty() {
        current
    } else {
        Score {
            correct: past.iter().filter(|a| a.is_correct).count(),
            total: past.len(),
        }
    };
    if overall.total < current.total {
        overall.correct += current.correct;
        overall.total += current.total;
    }
    overall
}

/// Doughnut chart of `score` rendered by quickchart.io
pub fn chart_url(score: Score, caption: &str, labels: [&str; 2], colors: [&str; 2]) -> String {
    let config = json!({
        "type": "doughnut",
        "data": {
            "labels": labels,
            "datasets": [{
                "data": [score.correct, score.incorrect()],
                "backgroundColor": colors,
            }]
        },
        "options": {
            "cutoutPercentage": 50,
            "plugins": {
                "doughnutlabel": {
                    "labels": [{
                        "text": format!("{}\n{}/{}", caption, score.correct, score.total),
                        "font": {"size": 28, "weight": "bold"}
                    }]
                },
                "legend": {"display": true, "position": "bottom", "labels": {"fontSize": 16}}
            }
        }
    });
    format!("{}{}", QUICKCHART_URL, urlencoding::encode(&config.to_string()))
}
