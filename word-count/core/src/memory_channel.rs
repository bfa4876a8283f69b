// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::control_channel::ControlChannel;
use crate::control_message::ControlMessage;
use crate::error::{ClusterError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// In-process control channel, one end of a pair.
/// Lets a coordinator drive simulated workers without sockets.
pub struct MemoryChannel {
    name: String,
    tx: mpsc::UnboundedSender<ControlMessage>,
    rx: mpsc::UnboundedReceiver<ControlMessage>,
}

impl MemoryChannel {
    /// Two connected ends: what one sends the other receives
    pub fn pair(name: impl Into<String>) -> (MemoryChannel, MemoryChannel) {
        let name = name.into();
        let (left_tx, right_rx) = mpsc::unbounded_channel();
        let (right_tx, left_rx) = mpsc::unbounded_channel();
        (
            MemoryChannel {
                name: format!("{} (coordinator side)", name),
                tx: left_tx,
                rx: left_rx,
            },
            MemoryChannel {
                name: format!("{} (worker side)", name),
                tx: right_tx,
                rx: right_rx,
            },
        )
    }
}

#[async_trait]
impl ControlChannel for MemoryChannel {
    async fn send(&mut self, message: ControlMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| ClusterError::ChannelClosed(self.name.clone()))
    }

    async fn recv(&mut self) -> Result<ControlMessage> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| ClusterError::ChannelClosed(self.name.clone()))
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synchronization_signal::SynchronizationSignal;

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (mut coordinator, mut worker) = MemoryChannel::pair("w0");
        coordinator.send(SynchronizationSignal::Awake.into()).await.unwrap();
        coordinator.send(SynchronizationSignal::StartMap1.into()).await.unwrap();
        assert_eq!(
            worker.recv().await.unwrap(),
            ControlMessage::Signal(SynchronizationSignal::Awake)
        );
        assert_eq!(
            worker.recv().await.unwrap(),
            ControlMessage::Signal(SynchronizationSignal::StartMap1)
        );
    }

    #[tokio::test]
    async fn test_dropped_peer_is_closed() {
        let (mut coordinator, worker) = MemoryChannel::pair("w0");
        drop(worker);
        assert!(matches!(
            coordinator.recv().await,
            Err(ClusterError::ChannelClosed(_))
        ));
    }
}
