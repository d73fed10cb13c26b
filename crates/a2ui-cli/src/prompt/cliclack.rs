use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;

use a2ui::samples::Reply;

use super::{Input, InputType, Prompt, Theme};

pub struct CliclackPrompt {
    spinner: Option<cliclack::ProgressBar>,
    input_mode: InputMode,
    theme: Theme,
}

enum InputMode {
    Singleline,
    Multiline,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt {
            spinner: None,
            input_mode: InputMode::Singleline,
            theme: Theme::Dark,
        }
    }

    fn theme_name(&self) -> &'static str {
        match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

fn print_payload(content: &str, theme: &str, name: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name(name))
        .theme(theme)
        .language("JSON")
        .grid(true)
        .header(true)
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

fn print(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if printed.is_err() {
        println!("{}", content);
    }
}

/// Header for the structured part of a reply
fn payload_name(reply: &Reply) -> &'static str {
    match reply {
        Reply::Envelope(_) => "UI Payload:",
        Reply::Quiz(_) => "Quiz:",
        Reply::Summary(_) => "Quiz Summary:",
    }
}

impl Prompt for CliclackPrompt {
    fn render(&mut self, reply: &Reply) {
        let theme = self.theme_name();

        if let Some(text) = reply.text().filter(|text| !text.is_empty()) {
            print(text, theme);
        }
        if let Some(payload) = reply.payload() {
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            print_payload(&pretty, theme, payload_name(reply));
        }
        match reply {
            Reply::Envelope(envelope) => {
                if let Some(error) = &envelope.error {
                    println!("{}", style(error).red());
                }
                if let Some(notice) = &envelope.notice {
                    println!("{}", style(notice).yellow().dim());
                }
            }
            Reply::Quiz(quiz) => {
                if let Some(notice) = &quiz.notice {
                    println!("{}", style(notice).yellow().dim());
                }
            }
            Reply::Summary(_) => (),
        }

        println!();
        let _ = io::stdout().flush();
    }

    fn render_notice(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }

    fn show_busy(&mut self) {
        let spin = spinner();
        spin.start("awaiting reply");
        self.spinner = Some(spin);
    }

    fn hide_busy(&mut self) {
        if let Some(spin) = self.spinner.take() {
            spin.stop("");
        }
    }

    fn get_input(&mut self) -> Result<Input> {
        let mut input = input("Message:").placeholder("");
        match self.input_mode {
            InputMode::Multiline => input = input.multiline(),
            InputMode::Singleline => (),
        }
        let message_text: String = input.interact()?;
        let message_text = message_text.trim().to_string();

        if message_text.eq_ignore_ascii_case("/exit") || message_text.eq_ignore_ascii_case("/quit")
        {
            Ok(Input {
                input_type: InputType::Exit,
                content: None,
            })
        } else if message_text.eq_ignore_ascii_case("/m") {
            self.input_mode = InputMode::Multiline;
            self.get_input()
        } else if message_text.eq_ignore_ascii_case("/s") {
            self.input_mode = InputMode::Singleline;
            self.get_input()
        } else if message_text.eq_ignore_ascii_case("/t") {
            self.theme = match self.theme {
                Theme::Light => {
                    println!("Switching to Dark theme");
                    Theme::Dark
                }
                Theme::Dark => {
                    println!("Switching to Light theme");
                    Theme::Light
                }
            };
            self.get_input()
        } else if message_text.eq_ignore_ascii_case("/?") {
            println!("Commands:");
            println!("/exit - Exit the session");
            println!("/m - Switch to multiline input mode");
            println!("/s - Switch to singleline input mode");
            println!("/t - Toggle Light/Dark theme");
            println!("/? - Display this help message");
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else if message_text.is_empty() {
            Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            })
        } else {
            Ok(Input {
                input_type: InputType::Message,
                content: Some(message_text),
            })
        }
    }

    fn close(&self) {
        // No cleanup required
    }
}
