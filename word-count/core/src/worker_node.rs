// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::control_channel::{expect_range, recv_signal, send_signal, ControlChannel};
use crate::control_message::ControlMessage;
use crate::error::{ClusterError, Result};
use crate::job::{group_by_frequency, Bucket, FrequencyGroups, Job, WordCounts};
use crate::partition::{split_into_buckets, HashPartitioner, RangePartitioner};
use crate::phase_tracker::{Phase, PhaseTracker};
use crate::range::Range;
use crate::reduce::reduce_buckets;
use crate::result_writer::write_sorted;
use crate::roster::WorkerIdentity;
use crate::shuffle::exchange_buckets;
use crate::synchronization_signal::SynchronizationSignal;
use crate::tokenizer::tokenize;
use crate::wire_channel::{ConnectPolicy, WireChannel};
use crate::worker_listener::WorkerListener;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Input split and result file of one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPaths {
    pub split: PathBuf,
    pub output: PathBuf,
}

/// Final state of a worker after a complete run
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Job 1 result: counts of the words this worker owns
    pub word_counts: WordCounts,
    /// Job 2 result: the frequencies this worker owns, as written out
    pub frequency_groups: FrequencyGroups,
    pub local_range: Option<Range>,
    pub global_range: Option<Range>,
}

pub struct WorkerNode {
    identity: WorkerIdentity,
    roster: Vec<WorkerIdentity>,
    listener: WorkerListener,
    connect: ConnectPolicy,
    max_frame_bytes: usize,
}

impl WorkerNode {
    pub fn new(
        identity: WorkerIdentity,
        roster: Vec<WorkerIdentity>,
        listener: WorkerListener,
        connect: ConnectPolicy,
        max_frame_bytes: usize,
    ) -> Result<Self> {
        if roster.get(identity.index) != Some(&identity) {
            return Err(ClusterError::Roster(format!(
                "{} is not slot {} of the roster",
                identity, identity.index
            )));
        }
        Ok(Self {
            identity,
            roster,
            listener,
            connect,
            max_frame_bytes,
        })
    }

    /// Listen on every interface at the worker's roster port
    pub fn bind(
        identity: WorkerIdentity,
        roster: Vec<WorkerIdentity>,
        connect: ConnectPolicy,
        max_frame_bytes: usize,
    ) -> Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, identity.port));
        let listener = WorkerListener::bind(addr)?;
        Self::new(identity, roster, listener, connect, max_frame_bytes)
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Wait for the coordinator on the listener, then serve the run
    pub async fn run(mut self, paths: &WorkerPaths) -> Result<WorkerReport> {
        info!("{} waiting for the coordinator", self.identity);
        let stream = self.listener.accept().await?;
        let control = WireChannel::new(stream, "coordinator", self.max_frame_bytes);
        self.serve(control, paths).await
    }

    /// Serve one run over an already established control channel
    pub async fn serve<C: ControlChannel>(
        &mut self,
        mut control: C,
        paths: &WorkerPaths,
    ) -> Result<WorkerReport> {
        let mut tracker = PhaseTracker::new();
        let index = self.identity.index;
        let num_workers = self.roster.len();

        let signal = recv_signal(&mut control).await?;
        self.enter(&mut tracker, signal)?;
        let text = tokio::fs::read_to_string(&paths.split).await.map_err(|e| {
            ClusterError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read split {}: {}", paths.split.display(), e),
            ))
        })?;

        self.step(&mut control, &mut tracker).await?;
        let counts = tokenize(&text);
        info!("Worker {} mapped {} distinct words", index, counts.len());

        self.step(&mut control, &mut tracker).await?;
        let buckets = split_into_buckets(counts, &HashPartitioner::new(num_workers));
        let received = self.exchange(Job::Count, buckets).await?;

        self.step(&mut control, &mut tracker).await?;
        let word_counts = reduce_buckets(received);
        info!("Worker {} owns {} words", index, word_counts.len());

        self.step(&mut control, &mut tracker).await?;
        let groups = group_by_frequency(word_counts.clone());
        let local_range = Range::from_keys(groups.keys().copied());

        self.step(&mut control, &mut tracker).await?;
        control.send(ControlMessage::Range(local_range)).await?;
        let global_range = expect_range(&mut control).await?;
        let phase = tracker.advance()?;
        info!("Worker {} entered {} with range {:?}", index, phase, global_range);
        let buckets = partition_by_range(groups, local_range, global_range, num_workers)?;
        let received = self.exchange(Job::Sort, buckets).await?;

        self.step(&mut control, &mut tracker).await?;
        let frequency_groups = reduce_buckets(received);

        let written = write_sorted(&paths.output, &frequency_groups).await;
        if let Err(e) = &written {
            error!(
                "Worker {} failed to write {}: {}",
                index,
                paths.output.display(),
                e
            );
        }
        send_signal(&mut control, tracker.ready_signal()?).await?;
        tracker.advance()?;
        written?;
        info!("Worker {} wrote {}", index, paths.output.display());

        Ok(WorkerReport {
            word_counts,
            frequency_groups,
            local_range,
            global_range,
        })
    }

    fn enter(&self, tracker: &mut PhaseTracker, signal: SynchronizationSignal) -> Result<Phase> {
        let phase = tracker.accept(signal)?;
        info!("Worker {} entered {}", self.identity.index, phase);
        Ok(phase)
    }

    /// Report the current phase done and block until the coordinator opens the next one
    async fn step<C: ControlChannel>(
        &self,
        control: &mut C,
        tracker: &mut PhaseTracker,
    ) -> Result<Phase> {
        send_signal(control, tracker.ready_signal()?).await?;
        let signal = recv_signal(control).await?;
        self.enter(tracker, signal)
    }

    async fn exchange<K, V>(
        &mut self,
        job: Job,
        buckets: Vec<Bucket<K, V>>,
    ) -> Result<Vec<Option<Bucket<K, Option<V>>>>>
    where
        K: Eq + Hash + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        exchange_buckets(
            job,
            self.identity.index,
            &self.roster,
            &mut self.listener,
            buckets,
            self.connect,
            self.max_frame_bytes,
        )
        .await
    }
}

/// Job 2 split. Every local key must fall inside the global range.
fn partition_by_range(
    groups: FrequencyGroups,
    local: Option<Range>,
    global: Option<Range>,
    num_workers: usize,
) -> Result<Vec<Bucket<u64, Vec<String>>>> {
    match (local, global) {
        (None, _) => {
            if global.is_none() {
                warn!("Every worker reported an empty range");
            }
            Ok((0..num_workers).map(|_| Bucket::new()).collect())
        }
        (Some(local), Some(global)) if global.contains(local.start) && global.contains(local.end) => {
            Ok(split_into_buckets(groups, &RangePartitioner::new(global, num_workers)))
        }
        (Some(local), global) => Err(ClusterError::violation(
            format!("global range covering {}", local),
            match global {
                Some(range) => range.to_string(),
                None => "empty global range".to_string(),
            },
        )),
    }
}
