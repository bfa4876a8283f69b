// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::control_channel::{expect_range, expect_signal, send_signal, ControlChannel};
use crate::control_message::ControlMessage;
use crate::error::{ClusterError, Result};
use crate::phase_timings::PhaseTimings;
use crate::range::Range;
use crate::roster::WorkerIdentity;
use crate::synchronization_signal::{SynchronizationSignal, BARRIERS};
use crate::wire_channel::{ConnectPolicy, WireChannel};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::info;

/// What a finished run leaves behind on the coordinator
#[derive(Debug, Clone)]
pub struct RunReport {
    pub timings: PhaseTimings,
    /// Merged job 2 key range, `None` when no worker had any word
    pub global_range: Option<Range>,
}

/// Drives every worker through the barrier sequence.
/// Holds no job data; it only relays signals and ranges.
/// Any error leaves the coordinator unusable since channels in flight are dropped.
pub struct Coordinator<C: ControlChannel> {
    channels: Vec<C>,
    barrier_timeout: Option<Duration>,
}

impl Coordinator<WireChannel> {
    /// Open one control connection per worker, in roster order
    pub async fn connect(
        roster: &[WorkerIdentity],
        policy: ConnectPolicy,
        max_frame_bytes: usize,
        barrier_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut channels = Vec::with_capacity(roster.len());
        for worker in roster {
            let channel = WireChannel::connect(&worker.address(), policy, max_frame_bytes)
                .await
                .map_err(|e| ClusterError::for_worker(worker.index, e))?;
            info!("Connected to {}", worker);
            channels.push(channel);
        }
        Ok(Self::new(channels, barrier_timeout))
    }
}

async fn complete_step<C: ControlChannel>(
    channel: &mut C,
    start: SynchronizationSignal,
    ready: SynchronizationSignal,
) -> Result<()> {
    send_signal(channel, start).await?;
    expect_signal(channel, ready).await
}

async fn collect_range<C: ControlChannel>(channel: &mut C) -> Result<Option<Range>> {
    send_signal(channel, SynchronizationSignal::Coordinate).await?;
    expect_range(channel).await
}

async fn distribute_range<C: ControlChannel>(channel: &mut C, global: Option<Range>) -> Result<()> {
    channel.send(ControlMessage::Range(global)).await?;
    expect_signal(channel, SynchronizationSignal::ReadyToReduce2).await
}

impl<C: ControlChannel> Coordinator<C> {
    pub fn new(channels: Vec<C>, barrier_timeout: Option<Duration>) -> Self {
        Self {
            channels,
            barrier_timeout,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Run `step` against every worker concurrently and wait for all of them.
    /// Replies come back indexed by worker. The barrier timeout counts from
    /// `started`, so several rounds of one barrier share a single deadline.
    async fn on_every_worker<T, F, Fut>(
        &mut self,
        phase: SynchronizationSignal,
        started: Instant,
        step: F,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(C) -> Fut,
        Fut: Future<Output = (C, Result<T>)> + Send + 'static,
    {
        let channels = std::mem::take(&mut self.channels);
        let num_workers = channels.len();
        let mut tasks = JoinSet::new();
        for (index, channel) in channels.into_iter().enumerate() {
            let task = step(channel);
            tasks.spawn(async move {
                let (channel, result) = task.await;
                (index, channel, result)
            });
        }

        let mut slots: Vec<Option<(C, T)>> = (0..num_workers).map(|_| None).collect();
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                let (index, channel, result) = joined?;
                let reply = result.map_err(|e| ClusterError::for_worker(index, e))?;
                slots[index] = Some((channel, reply));
            }
            Ok::<(), ClusterError>(())
        };
        match self.barrier_timeout {
            Some(limit) => tokio::time::timeout_at((started + limit).into(), collect)
                .await
                .map_err(|_| ClusterError::BarrierTimeout {
                    phase,
                    elapsed: started.elapsed(),
                })??,
            None => collect.await?,
        }

        let mut replies = Vec::with_capacity(num_workers);
        for slot in slots {
            let (channel, reply) = slot.ok_or_else(|| {
                ClusterError::UnexpectedMessage(format!("worker missing from {}", phase))
            })?;
            self.channels.push(channel);
            replies.push(reply);
        }
        Ok(replies)
    }

    /// Broadcast `start`, then wait until every worker has answered `ready`.
    /// Returns the wall-clock time the barrier took.
    pub async fn run_phase(
        &mut self,
        start: SynchronizationSignal,
        ready: SynchronizationSignal,
    ) -> Result<Duration> {
        let started = Instant::now();
        self.on_every_worker(start, started, move |mut channel| async move {
            let result = complete_step(&mut channel, start, ready).await;
            (channel, result)
        })
        .await?;
        Ok(started.elapsed())
    }

    /// The `COORDINATE` barrier: gather local ranges, merge them, hand the
    /// global range back and wait for the job 2 shuffle to finish everywhere
    pub async fn coordinate_ranges(&mut self) -> Result<Option<Range>> {
        let phase = SynchronizationSignal::Coordinate;
        let started = Instant::now();
        let locals = self
            .on_every_worker(phase, started, |mut channel| async move {
                let result = collect_range(&mut channel).await;
                (channel, result)
            })
            .await?;

        let global = Range::merge(locals.into_iter().flatten());
        match global {
            Some(range) => info!("Global range {}", range),
            None => info!("No worker has any word, global range is empty"),
        }

        self.on_every_worker(phase, started, move |mut channel| async move {
            let result = distribute_range(&mut channel, global).await;
            (channel, result)
        })
        .await?;
        Ok(global)
    }

    /// Walk the whole barrier sequence once
    pub async fn run(&mut self) -> Result<RunReport> {
        let mut timings = PhaseTimings::new();
        let mut global_range = None;
        for barrier in BARRIERS {
            info!("Coordinator sending {} to all workers", barrier.start);
            let elapsed = if barrier.start == SynchronizationSignal::Coordinate {
                let started = Instant::now();
                global_range = self.coordinate_ranges().await?;
                started.elapsed()
            } else {
                self.run_phase(barrier.start, barrier.ready).await?
            };
            info!(
                "All {} workers reported {} after {:?}",
                self.num_workers(),
                barrier.ready,
                elapsed
            );
            timings.record(barrier, elapsed);
        }
        Ok(RunReport {
            timings,
            global_range,
        })
    }
}
