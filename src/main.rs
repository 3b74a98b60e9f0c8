//! Yearly Bingo - command-line card manager.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, anyhow};
use bingo_card::CardAction;
use clap::Parser;
use cli::{Cli, Command, OutputFormat};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use yearly_bingo::{
    AdmissionGate, AppConfig, CardService, CardView, InMemoryCounterStore, JsonFileCardRepository, NewCard,
    WindowedAdmissionController,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    initialize_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(storage) = cli.storage.clone() {
        config = config.with_storage_path(storage);
    }
    debug!(?config, "Configuration resolved");

    if let Command::Admit { scope, client, count } = &cli.command {
        return run_admission(&config, scope, client, *count).await;
    }

    let repo = JsonFileCardRepository::open(config.storage_path())
        .await
        .context("Failed to open card storage")?;
    let service = CardService::new(repo);
    run_card_command(&service, cli.command, cli.format).await
}

/// Logs go to stderr so card output on stdout stays clean.
fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,bingo=info,yearly_bingo=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[instrument(skip(service, command))]
async fn run_card_command(
    service: &CardService<JsonFileCardRepository>,
    command: Command,
    format: OutputFormat,
) -> Result<()> {
    let view = match command {
        Command::New {
            year,
            size,
            no_free_space,
            title,
            category,
        } => {
            let mut request = NewCard::new(year);
            request.grid_size = size;
            request.has_free_space = !no_free_space;
            request.title = title;
            request.category = category;
            service.create_card(request).await?
        }
        Command::Add {
            card,
            position,
            content,
        } => service.apply(card, CardAction::AddItem { position, content }).await?,
        Command::Fill { card, contents } => service.fill_random(card, contents).await?,
        Command::Shuffle { card } => service.shuffle(card).await?,
        Command::Remove { card, position } => service.apply(card, CardAction::RemoveItem { position }).await?,
        Command::Finalize { card } => service.apply(card, CardAction::Finalize).await?,
        Command::Archive { card } => service.apply(card, CardAction::Archive).await?,
        Command::Complete {
            card,
            position,
            notes,
            proof,
        } => {
            let action = CardAction::CompleteItem {
                position,
                notes,
                proof_reference: proof,
            };
            service.apply(card, action).await?
        }
        Command::Uncomplete { card, position } => {
            service.apply(card, CardAction::UncompleteItem { position }).await?
        }
        Command::Show { card } => service.get(card).await?,
        Command::Stats { card } => {
            let stats = service.stats(card).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                OutputFormat::Grid => println!(
                    "{}/{} complete ({:.1}%), {} bingo(s)",
                    stats.completed_items(),
                    stats.total_items(),
                    stats.completion_percent(),
                    stats.bingos_achieved()
                ),
            }
            return Ok(());
        }
        Command::List => {
            let views = service.list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&views)?),
                OutputFormat::Grid => {
                    for view in &views {
                        println!(
                            "{}  {}  [{}]  {}/{}",
                            view.card().id(),
                            view.display_name(),
                            view.card().lifecycle_state(),
                            view.stats().completed_items(),
                            view.card().capacity()
                        );
                    }
                }
            }
            return Ok(());
        }
        Command::Admit { .. } => return Err(anyhow!("admission checks do not touch card storage")),
    };
    print_view(&view, format)
}

fn print_view(view: &CardView, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(view)?),
        OutputFormat::Grid => {
            println!("{}  ({})", view.display_name(), view.card().id());
            print!("{}", view.card().render());
            println!(
                "{} | {}/{} complete | {} bingo(s)",
                view.card().lifecycle_state(),
                view.stats().completed_items(),
                view.card().capacity(),
                view.stats().bingos_achieved()
            );
        }
    }
    Ok(())
}

#[instrument(skip(config))]
async fn run_admission(config: &AppConfig, scope: &str, client: &str, count: u32) -> Result<()> {
    let limits = config
        .rate_limit(scope)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown rate-limit scope '{}'", scope))?;
    let gate = admission_gate(config, limits).await?;
    info!(scope, client, count, "Running admission checks");

    for attempt in 1..=count {
        let decision = gate.check(client).await;
        println!(
            "#{attempt}: admitted={} remaining={} limit={} reset={}{}",
            decision.admitted(),
            decision.remaining(),
            decision.limit(),
            decision.reset_at().timestamp(),
            if *decision.fail_open() { " (fail-open)" } else { "" }
        );
    }
    Ok(())
}

#[cfg(feature = "redis")]
async fn admission_gate(
    config: &AppConfig,
    limits: yearly_bingo::RateLimitConfig,
) -> Result<Arc<dyn AdmissionGate>> {
    if let Some(url) = config.redis_url() {
        let store = yearly_bingo::RedisCounterStore::open(url)?;
        return Ok(Arc::new(WindowedAdmissionController::new(store, limits)));
    }
    Ok(Arc::new(WindowedAdmissionController::new(InMemoryCounterStore::new(), limits)))
}

#[cfg(not(feature = "redis"))]
async fn admission_gate(
    config: &AppConfig,
    limits: yearly_bingo::RateLimitConfig,
) -> Result<Arc<dyn AdmissionGate>> {
    if config.redis_url().is_some() {
        tracing::warn!("redis_url is set but the redis feature is disabled; counting in memory");
    }
    Ok(Arc::new(WindowedAdmissionController::new(InMemoryCounterStore::new(), limits)))
}
