// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ClusterError, Result};
use crate::job::{Bucket, Job};
use crate::roster::WorkerIdentity;
use crate::wire_channel::{ConnectPolicy, WireChannel};
use crate::worker_listener::WorkerListener;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tokio::task::JoinSet;
use tracing::debug;

/// One worker's bucket for one peer, sent once per shuffle.
/// Values are nullable on the wire; reduce skips a null one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleMessage<K: Eq + Hash, V> {
    pub job: Job,
    pub from: usize,
    pub bucket: Bucket<K, Option<V>>,
}

/// Exchange buckets with every peer: bucket `j` goes to worker `j`, and one
/// bucket arrives from each of them. Returns what every worker sent us,
/// indexed by sender, with our own bucket kept locally.
pub async fn exchange_buckets<K, V>(
    job: Job,
    own_index: usize,
    roster: &[WorkerIdentity],
    listener: &mut WorkerListener,
    buckets: Vec<Bucket<K, V>>,
    connect: ConnectPolicy,
    max_frame_bytes: usize,
) -> Result<Vec<Option<Bucket<K, Option<V>>>>>
where
    K: Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    if buckets.len() != roster.len() || own_index >= roster.len() {
        return Err(ClusterError::UnexpectedMessage(format!(
            "{} buckets for {} workers as worker {}",
            buckets.len(),
            roster.len(),
            own_index
        )));
    }
    let mut outgoing: Vec<Option<Bucket<K, Option<V>>>> = buckets
        .into_iter()
        .map(|bucket| Some(bucket.into_iter().map(|(k, v)| (k, Some(v))).collect()))
        .collect();
    let own = outgoing[own_index].take();

    let send = send_buckets(job, own_index, roster, outgoing, connect, max_frame_bytes);
    let receive = receive_buckets::<K, V>(job, own_index, roster.len(), listener, max_frame_bytes);
    let ((), mut received) = tokio::try_join!(send, receive)?;

    received[own_index] = own;
    Ok(received)
}

async fn send_buckets<K, V>(
    job: Job,
    own_index: usize,
    roster: &[WorkerIdentity],
    outgoing: Vec<Option<Bucket<K, Option<V>>>>,
    connect: ConnectPolicy,
    max_frame_bytes: usize,
) -> Result<()>
where
    K: Eq + Hash + Serialize + Send + Sync + 'static,
    V: Serialize + Send + Sync + 'static,
{
    let mut senders = JoinSet::new();
    for (peer, bucket) in roster.iter().zip(outgoing) {
        let Some(bucket) = bucket else { continue };
        let addr = peer.address();
        let peer_index = peer.index;
        senders.spawn(async move {
            let entries = bucket.len();
            let message = ShuffleMessage {
                job,
                from: own_index,
                bucket,
            };
            let result = async {
                let mut channel = WireChannel::connect(&addr, connect, max_frame_bytes).await?;
                channel.send_frame(&message).await?;
                channel.close().await
            }
            .await;
            if result.is_ok() {
                debug!("Sent {} entries to worker {} ({})", entries, peer_index, job);
            }
            result.map_err(|e| ClusterError::for_worker(peer_index, e))
        });
    }
    while let Some(joined) = senders.join_next().await {
        joined??;
    }
    Ok(())
}

async fn receive_buckets<K, V>(
    job: Job,
    own_index: usize,
    num_workers: usize,
    listener: &mut WorkerListener,
    max_frame_bytes: usize,
) -> Result<Vec<Option<Bucket<K, Option<V>>>>>
where
    K: Eq + Hash + DeserializeOwned + Send + 'static,
    V: DeserializeOwned + Send + 'static,
{
    let mut readers = JoinSet::new();
    for _ in 1..num_workers {
        let stream = listener.accept().await?;
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        readers.spawn(async move {
            let mut channel = WireChannel::new(stream, peer, max_frame_bytes);
            channel.recv_frame::<ShuffleMessage<K, V>>().await
        });
    }

    let mut received: Vec<Option<Bucket<K, Option<V>>>> = (0..num_workers).map(|_| None).collect();
    while let Some(joined) = readers.join_next().await {
        let message = joined??;
        if message.job != job {
            return Err(ClusterError::violation(
                format!("{} bucket", job),
                format!("{} bucket from worker {}", message.job, message.from),
            ));
        }
        if message.from >= num_workers || message.from == own_index {
            return Err(ClusterError::UnexpectedMessage(format!(
                "bucket claims to come from worker {}",
                message.from
            )));
        }
        if received[message.from].is_some() {
            return Err(ClusterError::UnexpectedMessage(format!(
                "second {} bucket from worker {}",
                job, message.from
            )));
        }
        debug!(
            "Received {} entries from worker {} ({})",
            message.bucket.len(),
            message.from,
            job
        );
        received[message.from] = Some(message.bucket);
    }
    Ok(received)
}
