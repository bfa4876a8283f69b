// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::range::Range;
use crate::synchronization_signal::SynchronizationSignal;
use serde::{Deserialize, Serialize};

/// Everything that travels on a coordinator <-> worker channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMessage {
    Signal(SynchronizationSignal),
    /// Local range (worker -> coordinator) or global range (coordinator -> worker).
    /// `None` stands for an empty key set.
    Range(Option<Range>),
}

impl std::fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlMessage::Signal(signal) => write!(f, "{}", signal),
            ControlMessage::Range(Some(range)) => write!(f, "RANGE {}", range),
            ControlMessage::Range(None) => write!(f, "RANGE []"),
        }
    }
}

impl From<SynchronizationSignal> for ControlMessage {
    fn from(signal: SynchronizationSignal) -> Self {
        ControlMessage::Signal(signal)
    }
}
