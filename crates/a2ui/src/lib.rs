pub mod agent;
pub mod errors;
pub mod extract;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod samples;
pub mod stores;
pub mod toolbox;
