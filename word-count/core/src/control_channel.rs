// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::control_message::ControlMessage;
use crate::error::{ClusterError, Result};
use crate::range::Range;
use crate::synchronization_signal::SynchronizationSignal;
use async_trait::async_trait;

/// Ordered, reliable, bidirectional link between the coordinator and one worker.
/// Different implementations for TCP sockets and in-process channels.
#[async_trait]
pub trait ControlChannel: Send + 'static {
    async fn send(&mut self, message: ControlMessage) -> Result<()>;

    /// Next message from the peer; a closed channel is an error
    async fn recv(&mut self) -> Result<ControlMessage>;

    /// Peer description for logs and errors
    fn describe(&self) -> String;
}

pub async fn send_signal<C>(channel: &mut C, signal: SynchronizationSignal) -> Result<()>
where
    C: ControlChannel + ?Sized,
{
    channel.send(ControlMessage::Signal(signal)).await
}

/// Receive one message and require it to be `expected`
pub async fn expect_signal<C>(channel: &mut C, expected: SynchronizationSignal) -> Result<()>
where
    C: ControlChannel + ?Sized,
{
    match channel.recv().await? {
        ControlMessage::Signal(received) if received == expected => Ok(()),
        other => Err(ClusterError::violation(expected, other)),
    }
}

/// Receive any signal, leaving the ordering check to the caller
pub async fn recv_signal<C>(channel: &mut C) -> Result<SynchronizationSignal>
where
    C: ControlChannel + ?Sized,
{
    match channel.recv().await? {
        ControlMessage::Signal(signal) => Ok(signal),
        other => Err(ClusterError::UnexpectedMessage(format!(
            "{} from {} where a signal was due",
            other,
            channel.describe()
        ))),
    }
}

/// Receive one range message
pub async fn expect_range<C>(channel: &mut C) -> Result<Option<Range>>
where
    C: ControlChannel + ?Sized,
{
    match channel.recv().await? {
        ControlMessage::Range(range) => Ok(range),
        other => Err(ClusterError::violation("RANGE", other)),
    }
}
