// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod cli;
mod logging;

use anyhow::{anyhow, Context};
use clap::Parser;
use cli::{Cli, ClusterArgs, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use word_count_core::roster::{build_identities, load_roster, local_hostname, resolve_own_index};
use word_count_core::{ClusterConfig, Coordinator, SequentialCounter, WorkerNode, WorkerPaths};

const DEFAULT_CONFIG: &str = "config.json";

fn load_config(path: Option<&Path>, overrides: &ClusterArgs) -> anyhow::Result<ClusterConfig> {
    let mut config = match path {
        Some(path) => ClusterConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => ClusterConfig::load(DEFAULT_CONFIG)?,
        None => ClusterConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn run_coordinator(config: ClusterConfig) -> anyhow::Result<()> {
    let hosts = load_roster(&config.roster_path, config.num_workers).await?;
    let roster = build_identities(&hosts, config.base_port)?;
    info!("=== COORDINATOR STARTED ({} workers) ===", roster.len());

    let mut coordinator = Coordinator::connect(
        &roster,
        config.connect_policy(),
        config.max_frame_bytes,
        config.barrier_timeout(),
    )
    .await
    .context("connecting to workers")?;
    let report = coordinator.run().await?;

    match report.global_range {
        Some(range) => info!("Frequencies spanned {}", range),
        None => info!("No words found in any split"),
    }
    println!("{}", report.timings.report());
    info!("=== COORDINATOR FINISHED ===");
    Ok(())
}

async fn run_worker(
    config: ClusterConfig,
    id: Option<usize>,
    split: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let hosts = load_roster(&config.roster_path, config.num_workers).await?;
    let roster = build_identities(&hosts, config.base_port)?;
    let index = match id {
        Some(index) => index,
        None => {
            let hostname = local_hostname()?;
            resolve_own_index(&hosts, &hostname)
                .with_context(|| format!("resolving worker index of {}", hostname))?
        }
    };
    let identity = roster.get(index).cloned().ok_or_else(|| {
        anyhow!(
            "worker index {} is outside a roster of {}",
            index,
            roster.len()
        )
    })?;
    let paths = WorkerPaths {
        split: split.unwrap_or_else(|| config.split_path(index)),
        output: output.unwrap_or_else(|| config.output_path(index)),
    };

    let node = WorkerNode::bind(
        identity,
        roster,
        config.connect_policy(),
        config.max_frame_bytes,
    )?;
    info!("Worker {} listening on {}", index, node.local_addr());
    let report = node
        .run(&paths)
        .await
        .with_context(|| format!("worker {}", index))?;
    info!(
        "Worker {} finished: {} words counted, {} frequencies sorted",
        index,
        report.word_counts.len(),
        report.frequency_groups.len()
    );
    Ok(())
}

async fn run_sequential(files: Vec<PathBuf>, top: Option<usize>) -> anyhow::Result<()> {
    let mut counter = SequentialCounter::new();
    for file in &files {
        counter
            .count_file(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
    }
    for (word, count) in counter.sorted().into_iter().take(top.unwrap_or(usize::MAX)) {
        println!("{} {}", word, count);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Coordinator { cluster } => {
            let config = load_config(config_path, &cluster)?;
            run_coordinator(config).await
        }
        Command::Worker {
            cluster,
            id,
            split,
            output,
        } => {
            let config = load_config(config_path, &cluster)?;
            run_worker(config, id, split, output).await
        }
        Command::Sequential { files, top } => run_sequential(files, top).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
