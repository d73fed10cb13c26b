use anyhow::Result;
use a2ui::samples::Reply;

pub mod cliclack;

pub trait Prompt {
    fn render(&mut self, reply: &Reply);
    fn render_notice(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn close(&self);
    fn ready(&self, title: &str) {
        println!("\n");
        println!("{} is running! Type your request, or /? for help.", title);
        println!("\n");
    }
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // absent for control commands such as exit
}

pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Message,  // User sent a message
    Exit,     // User wants to exit the session
}

pub enum Theme {
    Light,
    Dark,
}
