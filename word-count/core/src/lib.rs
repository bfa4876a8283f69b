// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod error;
pub use error::{ClusterError, Result};

pub mod job;
pub use job::{FrequencyGroups, Job, WordCounts};

pub mod synchronization_signal;
pub use synchronization_signal::{Barrier, SynchronizationSignal, BARRIERS};

pub mod phase_tracker;
pub use phase_tracker::{Phase, PhaseTracker};

pub mod range;
pub use range::Range;

pub mod control_message;
pub use control_message::ControlMessage;

pub mod control_channel;
pub use control_channel::ControlChannel;

pub mod wire_channel;
pub use wire_channel::{ConnectPolicy, WireChannel};

pub mod memory_channel;
pub use memory_channel::MemoryChannel;

pub mod worker_listener;
pub use worker_listener::WorkerListener;

pub mod partition;
pub use partition::{HashPartitioner, Partitioner, RangePartitioner};

pub mod reduce;
pub mod shuffle;
pub mod tokenizer;

pub mod roster;
pub use roster::WorkerIdentity;

pub mod config;
pub use config::ClusterConfig;

pub mod phase_timings;
pub use phase_timings::PhaseTimings;

pub mod result_writer;

pub mod sequential_counter;
pub use sequential_counter::SequentialCounter;

pub mod coordinator;
pub use coordinator::{Coordinator, RunReport};

pub mod worker_node;
pub use worker_node::{WorkerNode, WorkerPaths, WorkerReport};
