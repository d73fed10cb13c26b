mod prompt;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use a2ui::providers::configs::{GeminiProviderConfig, GEMINI_HOST, GEMINI_MODEL};
use a2ui::providers::gemini::GeminiProvider;
use a2ui::samples::{build_app, Sample, SampleOptions};
use a2ui::stores::Stores;

use crate::prompt::cliclack::CliclackPrompt;
use crate::session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Sample to talk to (drive, budget, restaurant, events, quiz or hub)
    #[arg(short, long, default_value = "hub")]
    sample: Sample,

    /// Gemini API Key (can also be set via GEMINI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use (can also be set via GEMINI_MODEL environment variable)
    #[arg(short, long)]
    model: Option<String>,

    /// Endpoint host (can also be set via GEMINI_HOST environment variable)
    #[arg(long)]
    host: Option<String>,

    /// JSON file with the initial drive, sheets and restaurants
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Upper bound on chained tool calls per turn
    #[arg(long, default_value_t = SampleOptions::default().max_tool_rounds)]
    max_tool_rounds: usize,

    /// Record the conversation to this file and resume from it
    #[arg(long)]
    transcript: Option<PathBuf>,
}

fn provider_config(cli: &Cli) -> Result<GeminiProviderConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("GEMINI_API_KEY").ok())
        .context("API key must be provided via --api-key or GEMINI_API_KEY environment variable")?;
    let model = cli
        .model
        .clone()
        .or_else(|| env::var("GEMINI_MODEL").ok())
        .unwrap_or_else(|| GEMINI_MODEL.to_string());
    let host = cli
        .host
        .clone()
        .or_else(|| env::var("GEMINI_HOST").ok())
        .unwrap_or_else(|| GEMINI_HOST.to_string());

    Ok(GeminiProviderConfig::new(host, api_key, model))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let provider = GeminiProvider::new(provider_config(&cli)?)?;
    let stores = match &cli.seed {
        Some(path) => Stores::load_seed(path)?,
        None => Stores::in_memory(),
    };
    let options = SampleOptions {
        max_tool_rounds: cli.max_tool_rounds,
    };
    let app = build_app(cli.sample, Arc::new(provider), &stores, &options)?;

    println!(
        "{} {}",
        style(cli.sample.title()).bold(),
        style("- type \"/exit\" to end the session").dim()
    );

    let mut session = Session::new(app, Box::new(CliclackPrompt::new()), cli.sample.title());
    if let Some(path) = cli.transcript.clone() {
        session = session.with_transcript(path)?;
    }
    session.start()
}
