use std::io;
use std::time::Duration;

use clap::Parser;
use crossterm::event::KeyEventKind;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod ai;
mod app;
mod cli;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod pipeline;
mod report;
mod services;
mod tui;

use ai::Scorer;
use app::App;
use cli::{Cli, Command};
use config::Config;
use db::Repository;
use error::{AppError, Result};
use feed::FeedFetcher;
use pipeline::{CycleOutcome, Pipeline, PipelineSettings};
use services::ContentFetcher;
use tui::{draw, handle_key_event};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    // The dashboard owns the terminal, so only warnings get through there
    let default_level = if matches!(command, Command::View { .. }) {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db {
        config.db_path = db_path;
    }

    match command {
        Command::Run => run_cycle(&config).await,
        Command::Ingest { query } => ingest_once(&config, query).await?,
        Command::Score => score_all(&config).await?,
        Command::List { min_score, limit } => {
            let repository = Repository::initialize(&config.db_path).await?;
            let articles = repository.query_all().await?;
            print!(
                "{}",
                report::render_listing(
                    &articles,
                    min_score.unwrap_or(config.min_score),
                    config.preview_chars,
                    limit,
                )
            );
        }
        Command::View { min_score } => view(&config, min_score).await?,
    }

    Ok(())
}

async fn ingestion_pipeline(config: &Config) -> Result<Pipeline<FeedFetcher, ContentFetcher>> {
    let repository = Repository::initialize(&config.db_path).await?;
    Ok(Pipeline::new(
        repository,
        FeedFetcher::new(config.search_endpoint.clone())?,
        ContentFetcher::new()?,
        PipelineSettings::from_config(config),
    ))
}

async fn scoring_pipeline(config: &Config) -> Result<Pipeline<FeedFetcher, ContentFetcher>> {
    let scorer = Scorer::from_config(config)?;
    Ok(ingestion_pipeline(config).await?.with_scorer(scorer))
}

/// One full cycle. Every failure is logged here and nothing is propagated,
/// so the process exits cleanly whatever happened.
async fn run_cycle(config: &Config) {
    let outcome = match scoring_pipeline(config).await {
        Ok(pipeline) => pipeline.run_cycle().await,
        Err(e) => CycleOutcome::Failed(e),
    };

    match outcome {
        CycleOutcome::Scored {
            query,
            attempts,
            inserted,
            scoring,
        } => info!(
            query = %query,
            attempts,
            inserted,
            scored = scoring.scored,
            rows_updated = scoring.rows_updated,
            "Cycle complete"
        ),
        CycleOutcome::Exhausted { attempts } => {
            warn!(attempts, "Not enough new articles found; nothing scored")
        }
        CycleOutcome::Failed(e) => error!(error = %e, "Cycle aborted"),
    }
}

async fn ingest_once(config: &Config, query: Option<String>) -> Result<()> {
    let pipeline = ingestion_pipeline(config).await?;
    let query = match query {
        Some(query) => query,
        None => pipeline
            .pick_query()
            .map(str::to_string)
            .ok_or_else(|| AppError::Config("topic catalog is empty".into()))?,
    };

    let outcome = pipeline.ingest(&query).await?;
    println!("Stored {} new articles for {:?}", outcome.inserted(), query);
    Ok(())
}

async fn score_all(config: &Config) -> Result<()> {
    let summary = scoring_pipeline(config).await?.score_unscored().await?;
    println!(
        "Scored {} articles ({} rows updated)",
        summary.scored, summary.rows_updated
    );
    Ok(())
}

async fn view(config: &Config, min_score: Option<u8>) -> Result<()> {
    let mut app = App::new(config, min_score).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key_event(key, app.show_help) {
                        if app.handle_action(action).await? {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
