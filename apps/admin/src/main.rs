use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpRosterSource, RosterEvent, UserRosterController};
use futures::future::join_all;
use shared::domain::UserId;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "admin", about = "List and remove users of the users API")]
struct Cli {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides the configured users API base URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current roster.
    List,
    /// Delete users by id, then show the refreshed roster.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(&cli.config)?;
    if let Some(api_base_url) = cli.api_base_url {
        settings.api_base_url = api_base_url;
    }
    let base_url = config::parse_base_url(&settings.api_base_url)?;
    info!(base_url = %base_url, "using users API");

    let source = HttpRosterSource::with_timeout(base_url, settings.request_timeout())?;
    let controller = UserRosterController::new(Arc::new(source));

    let succeeded = match cli.command {
        Command::List => list(&controller).await,
        Command::Delete { ids } => delete(&controller, ids).await,
    };
    controller.close().await;

    if !succeeded {
        bail!("one or more roster operations failed");
    }
    Ok(())
}

async fn list(controller: &UserRosterController) -> bool {
    let loaded = controller.load_roster().await.is_ok();
    println!("{}", render::render_view(&controller.view().await));
    loaded
}

async fn delete(controller: &UserRosterController, ids: Vec<String>) -> bool {
    if controller.load_roster().await.is_err() {
        println!("{}", render::render_view(&controller.view().await));
        return false;
    }

    let mut events = controller.subscribe();
    let ids: Vec<UserId> = ids.into_iter().map(UserId::from).collect();
    let deletes = join_all(ids.iter().map(|id| controller.request_delete(id)));
    tokio::pin!(deletes);

    let outcomes = loop {
        tokio::select! {
            outcomes = &mut deletes => break outcomes,
            event = events.recv() => match event {
                Ok(event) => print_progress(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "progress output lagged"),
                Err(RecvError::Closed) => break (&mut deletes).await,
            },
        }
    };
    while let Ok(event) = events.try_recv() {
        print_progress(&event);
    }

    let mut succeeded = true;
    for (id, outcome) in ids.iter().zip(outcomes) {
        match outcome {
            Ok(true) => println!("Deleted {id}"),
            Ok(false) => println!("Skipped {id}: delete already in progress"),
            Err(err) => {
                succeeded = false;
                println!("Failed {id}: {err}");
            }
        }
    }

    println!("{}", render::render_view(&controller.view().await));
    succeeded
}

fn print_progress(event: &RosterEvent) {
    if let Some(line) = render::describe_event(event) {
        println!("{line}");
    }
}
