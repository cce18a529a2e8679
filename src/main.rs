#![allow(dead_code)]

mod config;
mod gateway;
mod handler;
mod health;
mod intent;
mod model;
mod query;
mod redact;

use crate::gateway::{LndRestGateway, NodeGateway};
use crate::query::QueryEngine;
use clap::{Parser, Subcommand};
use config::Config;
use log::{error, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

#[derive(Parser)]
#[command(name = "ln-query", about = "Ask questions about your Lightning channels")]
struct Cli {
    /// Path to ln-query.toml config file
    #[arg(short, long, default_value = "ln-query.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question and exit
    Ask {
        /// The question, e.g. "show unhealthy channels"
        #[arg(required = true)]
        words: Vec<String>,
        /// Print the structured response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read questions from stdin until EOF, `exit` or Ctrl-C
    Shell,
    /// Show how a question is classified (no node connection)
    Classify {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

fn init_logging(level: &str) {
    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(log::LevelFilter::Info))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Classify { words } = &cli.command {
        init_logging("warn");
        let intent = intent::classify(&words.join(" "));
        println!("{}", serde_json::to_string_pretty(&intent)?);
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    init_logging(&config.general.log_level);

    info!("ln-query v{} starting", env!("CARGO_PKG_VERSION"));

    let gateway = Arc::new(LndRestGateway::new(&config)?);
    let engine = QueryEngine::from_config(gateway, &config)?;

    match cli.command {
        Commands::Ask { words, json } => ask(&engine, &words.join(" "), json).await,
        Commands::Shell => run_shell(&engine).await,
        Commands::Classify { .. } => Ok(()),
    }
}

async fn ask<G: NodeGateway + 'static>(
    engine: &QueryEngine<G>,
    question: &str,
    json: bool,
) -> anyhow::Result<()> {
    let response = engine.execute_query(question).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.text);
    }
    if response.data.error().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_shell<G: NodeGateway + 'static>(engine: &QueryEngine<G>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = signal::ctrl_c() => {
                println!();
                info!("Interrupted, leaving shell");
                break;
            }
        };

        let Some(line) = line else {
            println!();
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        let response = engine.execute_query(question).await;
        if let Some(e) = response.data.error() {
            error!("{}", e);
        }
        println!("{}\n", response.text);
    }

    Ok(())
}
