// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ClusterError, Result};
use std::path::Path;

/// Where a worker lives. Index, host and port are fixed for a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerIdentity {
    pub index: usize,
    pub host: String,
    pub port: u16,
}

impl WorkerIdentity {
    /// Worker `index` listens on `base_port + index`
    pub fn from_roster(index: usize, host: impl Into<String>, base_port: u16) -> Result<Self> {
        let port = u16::try_from(index)
            .ok()
            .and_then(|offset| base_port.checked_add(offset))
            .ok_or_else(|| {
                ClusterError::Roster(format!(
                    "worker {} does not fit above base port {}",
                    index, base_port
                ))
            })?;
        Ok(Self::with_port(index, host, port))
    }

    pub fn with_port(index: usize, host: impl Into<String>, port: u16) -> Self {
        Self {
            index,
            host: host.into(),
            port,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker {} ({})", self.index, self.address())
    }
}

/// First `n` non-blank lines of a roster, trimmed
pub fn parse_roster(text: &str, n: usize) -> Result<Vec<String>> {
    let hosts: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(n)
        .map(String::from)
        .collect();
    if hosts.len() < n {
        return Err(ClusterError::Roster(format!(
            "roster lists {} hosts, {} workers requested",
            hosts.len(),
            n
        )));
    }
    Ok(hosts)
}

pub async fn load_roster(path: impl AsRef<Path>, n: usize) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        ClusterError::Roster(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_roster(&text, n)
}

pub fn build_identities(hosts: &[String], base_port: u16) -> Result<Vec<WorkerIdentity>> {
    hosts
        .iter()
        .enumerate()
        .map(|(index, host)| WorkerIdentity::from_roster(index, host.as_str(), base_port))
        .collect()
}

/// Find the roster slot of the machine we are running on
pub fn resolve_own_index(hosts: &[String], hostname: &str) -> Result<usize> {
    let mut matches = hosts
        .iter()
        .enumerate()
        .filter(|(_, host)| host.eq_ignore_ascii_case(hostname))
        .map(|(index, _)| index);
    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (None, _) => Err(ClusterError::Roster(format!(
            "host {} is not in the roster",
            hostname
        ))),
        (Some(_), Some(_)) => Err(ClusterError::Roster(format!(
            "host {} appears more than once in the roster, pass an explicit index",
            hostname
        ))),
    }
}

pub fn local_hostname() -> Result<String> {
    let name = hostname::get()?;
    name.into_string()
        .map_err(|raw| ClusterError::Roster(format!("hostname {:?} is not valid UTF-8", raw)))
}
