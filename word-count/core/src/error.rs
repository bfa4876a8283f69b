// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::synchronization_signal::SynchronizationSignal;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

/// Every failure a coordinator or worker can run into.
/// Apart from a missing bucket during reduce (which is logged, not raised),
/// all of these abort the owning process.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Could not reach a worker, peer or coordinator
    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A signal arrived that does not match the current protocol state
    #[error("protocol violation: expected {expected}, received {received}")]
    ProtocolViolation { expected: String, received: String },

    /// A well-formed message arrived at a point where it makes no sense
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),

    #[error("channel to {0} closed")]
    ChannelClosed(String),

    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    #[error("barrier {phase} timed out after {elapsed:?}")]
    BarrierTimeout {
        phase: SynchronizationSignal,
        elapsed: Duration,
    },

    #[error("roster error: {0}")]
    Roster(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Failure attributed to one worker (coordinator side) or one peer (shuffle side)
    #[error("worker {index}: {source}")]
    Worker {
        index: usize,
        #[source]
        source: Box<ClusterError>,
    },

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ClusterError {
    pub fn violation(expected: impl std::fmt::Display, received: impl std::fmt::Display) -> Self {
        ClusterError::ProtocolViolation {
            expected: expected.to_string(),
            received: received.to_string(),
        }
    }

    pub fn for_worker(index: usize, source: ClusterError) -> Self {
        ClusterError::Worker {
            index,
            source: Box::new(source),
        }
    }

    /// Strips any `Worker` wrappers down to the underlying failure
    pub fn root(&self) -> &ClusterError {
        match self {
            ClusterError::Worker { source, .. } => source.root(),
            other => other,
        }
    }
}
