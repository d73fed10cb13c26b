use anyhow::Result;
use std::path::PathBuf;

use a2ui::models::message::HistoryTurn;
use a2ui::samples::{App, Reply};

use crate::prompt::{InputType, Prompt};

pub mod transcript;

use transcript::{load_turns, persist_turns};

pub struct Session<'a> {
    app: Box<dyn App>,
    prompt: Box<dyn Prompt + 'a>,
    title: String,
    history: Vec<HistoryTurn>,
    transcript: Option<PathBuf>,
}

impl<'a> Session<'a> {
    pub fn new(app: Box<dyn App>, prompt: Box<dyn Prompt + 'a>, title: &str) -> Self {
        Session {
            app,
            prompt,
            title: title.to_string(),
            history: Vec::new(),
            transcript: None,
        }
    }

    /// Record turns to `path`, resuming from the turns already in it
    pub fn with_transcript(mut self, path: PathBuf) -> Result<Self> {
        self.history = load_turns(&path)?;
        self.transcript = Some(path);
        Ok(self)
    }

    #[cfg(test)]
    pub fn history(&self) -> &[HistoryTurn] {
        &self.history
    }

    pub fn start(&mut self) -> Result<()> {
        if let Some(path) = &self.transcript {
            self.prompt.render_notice(&format!(
                "Recording to {} ({} earlier turn(s))",
                path.display(),
                self.history.len()
            ));
        }
        self.prompt.ready(&self.title);

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.process(&content);
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        if let Some(path) = &self.transcript {
            self.prompt
                .render_notice(&format!("Closing session. Recorded to {}", path.display()));
        }
        self.prompt.close();
        Ok(())
    }

    /// Run one turn; a failed turn leaves the history untouched
    pub fn process(&mut self, user_message: &str) {
        self.prompt.show_busy();
        let result = self.app.process(user_message, &self.history);
        self.prompt.hide_busy();

        match result {
            Ok(reply) => {
                self.prompt.render(&reply);
                self.history.push(HistoryTurn::new("user", user_message));
                self.history.push(HistoryTurn::new("model", history_text(&reply)));
                if let Some(path) = &self.transcript {
                    if let Err(e) = persist_turns(path, &self.history) {
                        self.prompt
                            .render_notice(&format!("Failed to persist transcript: {}", e));
                    }
                }
            }
            Err(e) => self.prompt.render_notice(&format!("Error: {}", e)),
        }
    }
}

/// What the model said, as the next turn should see it
fn history_text(reply: &Reply) -> String {
    match reply.text() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => reply.payload().map(|p| p.to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Input;
    use a2ui::errors::{AgentError, AgentResult};
    use a2ui::models::envelope::ResponseEnvelope;
    use a2ui::samples::QuizSummary;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use tempfile::tempdir;

    /// Replays scripted input and records what was rendered
    #[derive(Default)]
    struct ScriptedPrompt {
        inputs: VecDeque<&'static str>,
        rendered: Rc<RefCell<Vec<String>>>,
    }

    impl Prompt for ScriptedPrompt {
        fn render(&mut self, reply: &Reply) {
            self.rendered
                .borrow_mut()
                .push(reply.text().unwrap_or_default().to_string());
        }

        fn render_notice(&mut self, text: &str) {
            self.rendered.borrow_mut().push(text.to_string());
        }

        fn get_input(&mut self) -> Result<Input> {
            Ok(match self.inputs.pop_front() {
                Some("") => Input {
                    input_type: InputType::AskAgain,
                    content: None,
                },
                Some(text) => Input {
                    input_type: InputType::Message,
                    content: Some(text.to_string()),
                },
                None => Input {
                    input_type: InputType::Exit,
                    content: None,
                },
            })
        }

        fn show_busy(&mut self) {}
        fn hide_busy(&mut self) {}
        fn close(&self) {}
        fn ready(&self, _: &str) {}
    }

    /// Answers with the number of turns it was shown
    struct Counter;

    impl App for Counter {
        fn process(&self, user_message: &str, history: &[HistoryTurn]) -> AgentResult<Reply> {
            match user_message {
                "fail" => Err(AgentError::ToolLoopLimit(5)),
                "summary" => Ok(Reply::Summary(QuizSummary {
                    quiz_summary: Some(json!({"type": "SUMMARY_CARD"})),
                    text: None,
                })),
                _ => Ok(Reply::from(ResponseEnvelope::text(format!(
                    "seen {} turn(s)",
                    history.len()
                )))),
            }
        }
    }

    fn session(inputs: &[&'static str]) -> (Session<'static>, Rc<RefCell<Vec<String>>>) {
        let prompt = ScriptedPrompt {
            inputs: inputs.iter().copied().collect(),
            ..Default::default()
        };
        let rendered = prompt.rendered.clone();
        (Session::new(Box::new(Counter), Box::new(prompt), "Test"), rendered)
    }

    #[test]
    fn test_history_grows_with_each_turn() -> Result<()> {
        let (mut session, rendered) = session(&["hello", "", "again"]);
        session.start()?;

        assert_eq!(*rendered.borrow(), vec!["seen 0 turn(s)", "seen 2 turn(s)"]);
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history()[2], HistoryTurn::new("user", "again"));
        Ok(())
    }

    #[test]
    fn test_failed_turn_is_not_recorded() -> Result<()> {
        let (mut session, rendered) = session(&["fail", "hello"]);
        session.start()?;

        assert_eq!(rendered.borrow()[0], "Error: Model kept calling tools after 5 round(s)");
        assert_eq!(rendered.borrow()[1], "seen 0 turn(s)");
        assert_eq!(session.history().len(), 2);
        Ok(())
    }

    #[test]
    fn test_payload_only_reply_is_kept_as_json() {
        let (mut session, _) = session(&[]);
        session.process("summary");
        assert_eq!(session.history()[1].text, r#"{"type":"SUMMARY_CARD"}"#);
    }

    #[test]
    fn test_transcript_resumes() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("budget.jsonl");

        let (session1, _) = session(&["hello"]);
        let mut session1 = session1.with_transcript(path.clone())?;
        session1.start()?;

        let (session2, rendered) = session(&["again"]);
        let mut session2 = session2.with_transcript(path.clone())?;
        session2.start()?;

        assert!(rendered.borrow().contains(&"seen 2 turn(s)".to_string()));
        assert_eq!(load_turns(&path)?.len(), 4);
        Ok(())
    }
}
