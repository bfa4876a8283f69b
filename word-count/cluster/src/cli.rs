// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use word_count_core::ClusterConfig;

#[derive(Debug, Parser)]
#[command(
    name = "word-count-cluster",
    version,
    about = "Count and sort words by frequency across a cluster of workers"
)]
pub struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file (defaults to ./config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drive every worker of the roster through both jobs
    Coordinator {
        #[command(flatten)]
        cluster: ClusterArgs,
    },
    /// Run one worker and wait for the coordinator
    Worker {
        #[command(flatten)]
        cluster: ClusterArgs,

        /// Roster index of this worker; resolved from the hostname when omitted
        #[arg(long)]
        id: Option<usize>,

        /// Input split, overriding the configured template
        #[arg(long)]
        split: Option<PathBuf>,

        /// Result file, overriding the configured template
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count words on this machine only, most frequent first
    Sequential {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print only the first N words
        #[arg(long)]
        top: Option<usize>,
    },
}

/// Overrides shared by the coordinator and the workers
#[derive(Debug, Clone, Default, Args)]
pub struct ClusterArgs {
    /// Number of workers, taken from the head of the roster
    #[arg(long)]
    pub workers: Option<usize>,

    /// File listing one worker host per line
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Port of worker 0; worker i listens on base port + i
    #[arg(long)]
    pub base_port: Option<u16>,
}

impl ClusterArgs {
    pub fn apply(&self, config: &mut ClusterConfig) {
        if let Some(workers) = self.workers {
            config.num_workers = workers;
        }
        if let Some(roster) = &self.roster {
            config.roster_path = roster.clone();
        }
        if let Some(base_port) = self.base_port {
            config.base_port = base_port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_flags_parse() {
        let cli = Cli::parse_from([
            "word-count-cluster",
            "-vv",
            "worker",
            "--id",
            "2",
            "--workers",
            "4",
            "--base-port",
            "7000",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Worker { cluster, id, .. } => {
                assert_eq!(id, Some(2));
                assert_eq!(cluster.workers, Some(4));
                assert_eq!(cluster.base_port, Some(7000));
            }
            other => panic!("expected worker command, got {:?}", other),
        }
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let mut config = ClusterConfig::default();
        let args = ClusterArgs {
            workers: Some(8),
            ..ClusterArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.num_workers, 8);
        assert_eq!(config.base_port, ClusterConfig::default().base_port);
    }

    #[test]
    fn test_sequential_requires_files() {
        assert!(Cli::try_parse_from(["word-count-cluster", "sequential"]).is_err());
    }
}
