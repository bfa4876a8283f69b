// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ClusterError, Result};
use crate::wire_channel::{ConnectPolicy, DEFAULT_MAX_FRAME_BYTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ID_PLACEHOLDER: &str = "{id}";

/// Settings shared by the coordinator and every worker of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub num_workers: usize,
    pub base_port: u16,
    pub roster_path: PathBuf,
    /// Input split of each worker, `{id}` replaced by the worker index
    pub split_path_template: String,
    /// Sorted result of each worker, `{id}` replaced by the worker index
    pub output_path_template: String,
    pub connect_attempts: u32,
    pub connect_backoff_ms: u64,
    /// 0 waits forever
    pub barrier_timeout_ms: u64,
    pub max_frame_bytes: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            num_workers: 3,
            base_port: 9999,
            roster_path: PathBuf::from("machines.txt"),
            split_path_template: "splits/S{id}.txt".to_string(),
            output_path_template: "results/sorted{id}.txt".to_string(),
            connect_attempts: 20,
            connect_backoff_ms: 250,
            barrier_timeout_ms: 0,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ClusterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClusterError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ClusterConfig = serde_json::from_str(&contents)
            .map_err(|e| ClusterError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(ClusterError::Config("num_workers must be at least 1".to_string()));
        }
        for (name, template) in [
            ("split_path_template", &self.split_path_template),
            ("output_path_template", &self.output_path_template),
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(ClusterError::Config(format!(
                    "{} '{}' has no {} placeholder",
                    name, template, ID_PLACEHOLDER
                )));
            }
        }
        if self.max_frame_bytes == 0 {
            return Err(ClusterError::Config("max_frame_bytes must be positive".to_string()));
        }
        Ok(())
    }

    pub fn split_path(&self, id: usize) -> PathBuf {
        PathBuf::from(self.split_path_template.replace(ID_PLACEHOLDER, &id.to_string()))
    }

    pub fn output_path(&self, id: usize) -> PathBuf {
        PathBuf::from(self.output_path_template.replace(ID_PLACEHOLDER, &id.to_string()))
    }

    pub fn connect_policy(&self) -> ConnectPolicy {
        ConnectPolicy {
            attempts: self.connect_attempts,
            backoff: Duration::from_millis(self.connect_backoff_ms),
        }
    }

    pub fn barrier_timeout(&self) -> Option<Duration> {
        (self.barrier_timeout_ms > 0).then(|| Duration::from_millis(self.barrier_timeout_ms))
    }
}
