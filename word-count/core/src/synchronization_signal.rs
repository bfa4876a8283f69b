// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job::Job;
use serde::{Deserialize, Serialize};

/// Phase-transition tokens exchanged between the coordinator and workers.
/// They carry no payload; meaning comes from their position in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SynchronizationSignal {
    Awake,
    ReadyToMap,
    StartMap1,
    ReadyToShuffle,
    Shuffle,
    ReadyToReduce,
    Reduce,
    ReduceEnd,
    Map2,
    ReadyToCoordinate,
    Coordinate,
    ReadyToReduce2,
    Reduce2,
    End,
}

impl std::fmt::Display for SynchronizationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SynchronizationSignal::Awake => "AWAKE",
            SynchronizationSignal::ReadyToMap => "READY_TO_MAP",
            SynchronizationSignal::StartMap1 => "START_MAP1",
            SynchronizationSignal::ReadyToShuffle => "READY_TO_SHUFFLE",
            SynchronizationSignal::Shuffle => "SHUFFLE",
            SynchronizationSignal::ReadyToReduce => "READY_TO_REDUCE",
            SynchronizationSignal::Reduce => "REDUCE",
            SynchronizationSignal::ReduceEnd => "REDUCE_END",
            SynchronizationSignal::Map2 => "MAP2",
            SynchronizationSignal::ReadyToCoordinate => "READY_TO_COORDINATE",
            SynchronizationSignal::Coordinate => "COORDINATE",
            SynchronizationSignal::ReadyToReduce2 => "READY_TO_REDUCE2",
            SynchronizationSignal::Reduce2 => "REDUCE2",
            SynchronizationSignal::End => "END",
        };
        f.write_str(name)
    }
}

/// One cluster-wide barrier: the coordinator broadcasts `start`,
/// then every worker must answer with `ready` before the run advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    pub start: SynchronizationSignal,
    pub ready: SynchronizationSignal,
    pub label: &'static str,
    /// `None` for the split-loading step that precedes both jobs
    pub job: Option<Job>,
}

/// The full barrier sequence of a run, in order.
/// The `COORDINATE` barrier also carries the range exchange between its
/// start and ready signals.
pub const BARRIERS: [Barrier; 7] = [
    Barrier {
        start: SynchronizationSignal::Awake,
        ready: SynchronizationSignal::ReadyToMap,
        label: "Load the splits",
        job: None,
    },
    Barrier {
        start: SynchronizationSignal::StartMap1,
        ready: SynchronizationSignal::ReadyToShuffle,
        label: "Map",
        job: Some(Job::Count),
    },
    Barrier {
        start: SynchronizationSignal::Shuffle,
        ready: SynchronizationSignal::ReadyToReduce,
        label: "Shuffle",
        job: Some(Job::Count),
    },
    Barrier {
        start: SynchronizationSignal::Reduce,
        ready: SynchronizationSignal::ReduceEnd,
        label: "Reduce",
        job: Some(Job::Count),
    },
    Barrier {
        start: SynchronizationSignal::Map2,
        ready: SynchronizationSignal::ReadyToCoordinate,
        label: "Map",
        job: Some(Job::Sort),
    },
    Barrier {
        start: SynchronizationSignal::Coordinate,
        ready: SynchronizationSignal::ReadyToReduce2,
        label: "Shuffle",
        job: Some(Job::Sort),
    },
    Barrier {
        start: SynchronizationSignal::Reduce2,
        ready: SynchronizationSignal::End,
        label: "Reduce",
        job: Some(Job::Sort),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_wire_names_match_display() {
        for barrier in BARRIERS {
            for signal in [barrier.start, barrier.ready] {
                let encoded = serde_json::to_string(&signal).unwrap();
                assert_eq!(encoded, format!("\"{}\"", signal));
            }
        }
    }

    #[test]
    fn test_barrier_signals_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for barrier in BARRIERS {
            assert!(seen.insert(barrier.start));
            assert!(seen.insert(barrier.ready));
        }
        assert_eq!(seen.len(), 14);
    }
}
