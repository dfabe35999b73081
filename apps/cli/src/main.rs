//! docbatch entry point.

mod cli;
mod config;
mod progress;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use docbatch_protocol::UploadTask;
use docbatch_repo_client::RepoClient;
use docbatch_scheduler::AdmissionScheduler;

use crate::cli::{Cli, Command, ConfigArgs, UploadArgs};
use crate::config::Config;

/// Application name sent to the server's token-issuing flow.
const APP_NAME: &str = "docbatch";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging on stderr; stdout is for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Config::default()
        }
    };

    match cli.command {
        Command::Status => status(&config).await,
        Command::Ls { path } => ls(&config, path).await,
        Command::Folders => folders(&config).await,
        Command::Upload(args) => upload(&config, args).await,
        Command::TokenLink => token_link(&config),
        Command::Config(args) => update_config(&mut config, args),
    }
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let client = RepoClient::new(&config.server_url, &config.token)?;
    if client.check_status().await {
        println!("ok");
        Ok(())
    } else {
        println!("not connected");
        println!("get a token at: {}", client.token_link(APP_NAME));
        anyhow::bail!("server unreachable or token missing/invalid");
    }
}

async fn ls(config: &Config, path: Option<String>) -> anyhow::Result<()> {
    let client = RepoClient::new(&config.server_url, &config.token)?;
    let path = path.unwrap_or_else(|| config.path_filter.clone());
    let children = client
        .list_children(&path)
        .await
        .with_context(|| format!("listing {path} failed"))?;
    for doc in children {
        println!("{}\t{}\t{}", doc.doc_type, doc.uid, doc.path);
    }
    Ok(())
}

async fn folders(config: &Config) -> anyhow::Result<()> {
    let client = RepoClient::new(&config.server_url, &config.token)?;
    let folders = client
        .writable_folders(&config.path_filter)
        .await
        .context("folder listing failed")?;
    for folder in folders {
        println!("{folder}");
    }
    Ok(())
}

async fn upload(config: &Config, args: UploadArgs) -> anyhow::Result<()> {
    let concurrent = args.concurrent.unwrap_or(config.concurrent).max(1);
    let client = Arc::new(RepoClient::new(&config.server_url, &config.token)?);

    // Names already present in the destination, for the skip filter.
    let existing = if config.skip_reupload && !args.force {
        existing_names(&client, &args.dest).await
    } else {
        HashSet::new()
    };

    let mut tasks = Vec::new();
    let mut skipped = 0usize;
    for path in &args.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if existing.contains(&name) {
            tracing::info!(file = %name, "already in destination, skipping");
            skipped += 1;
            continue;
        }
        let task = UploadTask::from_path(tasks.len(), path, &args.dest)
            .with_context(|| format!("cannot select {}", path.display()))?;
        tasks.push(task);
    }

    if skipped > 0 {
        println!("skipped {skipped} file(s) already in {}", args.dest);
    }
    if tasks.is_empty() {
        println!("nothing to upload");
        return Ok(());
    }

    let total = tasks.len();
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();

    // Ctrl-C skips tasks that have not started yet; in-flight transfers
    // run to completion.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("cancelling: tasks not yet started will be skipped");
                cancel.cancel();
            }
        }
    });

    let renderer = tokio::spawn(progress::render_events(events_rx, total));
    let report = AdmissionScheduler::new(concurrent)
        .run_batch(client, events_tx, tasks, cancel)
        .await;
    let summary = renderer.await?;

    println!(
        "{} uploaded, {} failed ({} selected)",
        report.succeeded(),
        report.failed(),
        summary.selected
    );
    for problem in &summary.problems {
        eprintln!("problem: {problem}");
    }

    if !report.all_succeeded() {
        anyhow::bail!("{} of {total} uploads failed", report.failed());
    }
    Ok(())
}

fn token_link(config: &Config) -> anyhow::Result<()> {
    let client = RepoClient::new(&config.server_url, &config.token)?;
    println!("{}", client.token_link(APP_NAME));
    Ok(())
}

fn update_config(config: &mut Config, args: ConfigArgs) -> anyhow::Result<()> {
    let mut changed = false;
    if let Some(server) = args.server {
        config.server_url = server;
        changed = true;
    }
    if let Some(token) = args.token {
        config.token = token;
        changed = true;
    }
    if let Some(path_filter) = args.path_filter {
        config.path_filter = path_filter;
        changed = true;
    }
    if let Some(concurrent) = args.concurrent {
        config.concurrent = concurrent.max(1);
        changed = true;
    }
    if let Some(skip) = args.skip_reupload {
        config.skip_reupload = skip;
        changed = true;
    }

    if changed {
        config.save()?;
    }
    print!("{}", toml::to_string_pretty(&*config)?);
    Ok(())
}

/// Base names of the destination's current children.
///
/// A listing failure just disables the skip filter; the uploads themselves
/// will surface any real connectivity problem.
async fn existing_names(client: &RepoClient, dest: &str) -> HashSet<String> {
    match client.list_children(dest).await {
        Ok(children) => children
            .into_iter()
            .flat_map(|d| {
                let tail = d.path.rsplit('/').next().map(str::to_string);
                [Some(d.title), tail]
            })
            .flatten()
            .filter(|n| !n.is_empty())
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "destination listing failed, skip filter disabled");
            HashSet::new()
        }
    }
}
