// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ClusterError, Result};
use crate::synchronization_signal::SynchronizationSignal;

/// Worker-side states of one run, strictly linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Awake,
    Map1,
    Shuffle1,
    Reduce1,
    Map2,
    Coordinate,
    Shuffle2,
    Reduce2,
    End,
}

impl Phase {
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Awake => Some(Phase::Map1),
            Phase::Map1 => Some(Phase::Shuffle1),
            Phase::Shuffle1 => Some(Phase::Reduce1),
            Phase::Reduce1 => Some(Phase::Map2),
            Phase::Map2 => Some(Phase::Coordinate),
            Phase::Coordinate => Some(Phase::Shuffle2),
            Phase::Shuffle2 => Some(Phase::Reduce2),
            Phase::Reduce2 => Some(Phase::End),
            Phase::End => None,
        }
    }

    /// Signal from the coordinator that moves a worker into this phase.
    /// `Shuffle2` follows the range exchange directly and `End` follows the
    /// worker's own final report, so neither has one.
    pub fn entry_signal(self) -> Option<SynchronizationSignal> {
        match self {
            Phase::Awake => Some(SynchronizationSignal::Awake),
            Phase::Map1 => Some(SynchronizationSignal::StartMap1),
            Phase::Shuffle1 => Some(SynchronizationSignal::Shuffle),
            Phase::Reduce1 => Some(SynchronizationSignal::Reduce),
            Phase::Map2 => Some(SynchronizationSignal::Map2),
            Phase::Coordinate => Some(SynchronizationSignal::Coordinate),
            Phase::Shuffle2 | Phase::End => None,
            Phase::Reduce2 => Some(SynchronizationSignal::Reduce2),
        }
    }

    /// Signal a worker reports once its work for this phase is done
    pub fn ready_signal(self) -> Option<SynchronizationSignal> {
        match self {
            Phase::Awake => Some(SynchronizationSignal::ReadyToMap),
            Phase::Map1 => Some(SynchronizationSignal::ReadyToShuffle),
            Phase::Shuffle1 => Some(SynchronizationSignal::ReadyToReduce),
            Phase::Reduce1 => Some(SynchronizationSignal::ReduceEnd),
            Phase::Map2 => Some(SynchronizationSignal::ReadyToCoordinate),
            // answered with a range, not a signal
            Phase::Coordinate => None,
            Phase::Shuffle2 => Some(SynchronizationSignal::ReadyToReduce2),
            Phase::Reduce2 => Some(SynchronizationSignal::End),
            Phase::End => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Awake => "AWAKE",
            Phase::Map1 => "MAP1",
            Phase::Shuffle1 => "SHUFFLE1",
            Phase::Reduce1 => "REDUCE1",
            Phase::Map2 => "MAP2",
            Phase::Coordinate => "COORDINATE",
            Phase::Shuffle2 => "SHUFFLE2",
            Phase::Reduce2 => "REDUCE2",
            Phase::End => "END",
        };
        f.write_str(name)
    }
}

/// Tracks where a worker is in the run and rejects anything out of order.
/// Reordered or duplicated signals are protocol violations.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    current: Option<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    fn upcoming(&self) -> Result<Phase> {
        match self.current {
            None => Ok(Phase::Awake),
            Some(phase) => phase.next().ok_or_else(|| {
                ClusterError::UnexpectedMessage(format!("no phase follows {}", phase))
            }),
        }
    }

    /// Enter the next phase on a coordinator signal
    pub fn accept(&mut self, received: SynchronizationSignal) -> Result<Phase> {
        let upcoming = self.upcoming()?;
        match upcoming.entry_signal() {
            Some(expected) if expected == received => {
                self.current = Some(upcoming);
                Ok(upcoming)
            }
            Some(expected) => Err(ClusterError::violation(expected, received)),
            None => Err(ClusterError::UnexpectedMessage(format!(
                "{} while entering {}, which has no start signal",
                received, upcoming
            ))),
        }
    }

    /// Enter the next phase without a coordinator signal (`Shuffle2`, `End`)
    pub fn advance(&mut self) -> Result<Phase> {
        let upcoming = self.upcoming()?;
        if let Some(expected) = upcoming.entry_signal() {
            return Err(ClusterError::UnexpectedMessage(format!(
                "{} must be entered on {}",
                upcoming, expected
            )));
        }
        self.current = Some(upcoming);
        Ok(upcoming)
    }

    /// Ready signal owed to the coordinator for the current phase
    pub fn ready_signal(&self) -> Result<SynchronizationSignal> {
        let phase = self
            .current
            .ok_or_else(|| ClusterError::UnexpectedMessage("run not started".to_string()))?;
        phase.ready_signal().ok_or_else(|| {
            ClusterError::UnexpectedMessage(format!("{} is not closed by a signal", phase))
        })
    }
}
