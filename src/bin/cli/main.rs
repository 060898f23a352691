mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vocab-cli", about = "Spaced repetition vocabulary trainer", version)]
struct Cli {
    /// Config file (default: <data dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overriding the config file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import words from a CSV file (columns: spanish, english, level, image_path)
    Import {
        /// CSV file to read
        file: PathBuf,
        /// Only import when the vocabulary is still empty
        #[arg(long)]
        if_empty: bool,
    },

    /// Run an interactive practice session
    Practice {
        /// Session length in minutes (default from config)
        #[arg(long)]
        minutes: Option<u32>,
    },

    /// Show overall progress
    Stats,

    /// Show the answer history of one word
    History {
        /// Word id
        word_id: i64,
    },

    /// Give every word a default progress record, keeping existing ones
    Seed,

    /// List every word with its progress toward mastery
    #[command(alias = "progress")]
    Words,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut app = app::App::new(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Command::Import { file, if_empty } => {
            commands::import::run(&mut app, &file, if_empty, &cli.format)?;
        }
        Command::Practice { minutes } => {
            commands::practice::run(&mut app, minutes)?;
        }
        Command::Stats => {
            commands::stats::run(&app, &cli.format)?;
        }
        Command::History { word_id } => {
            commands::history::run(&app, word_id, &cli.format)?;
        }
        Command::Seed => {
            commands::seed::run(&mut app, &cli.format)?;
        }
        Command::Words => {
            commands::words::run(&app, &cli.format)?;
        }
    }

    Ok(())
}
