// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::control_channel::ControlChannel;
use crate::control_message::ControlMessage;
use crate::error::{ClusterError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 512 * 1024 * 1024;

/// How hard to try before giving up on a peer that is not listening yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            attempts: 20,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Connect to `addr`, retrying with jittered backoff while the peer boots
pub async fn connect_with_retry(addr: &str, policy: ConnectPolicy) -> Result<TcpStream> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) if attempt >= policy.attempts.max(1) => {
                return Err(ClusterError::Connection {
                    addr: addr.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                debug!("Connect to {} failed (attempt {}): {}", addr, attempt, e);
                let jitter = fastrand::u64(0..=policy.backoff.as_millis() as u64 / 2);
                tokio::time::sleep(policy.backoff + Duration::from_millis(jitter)).await;
            }
        }
    }
}

/// Length-prefixed JSON frames over one TCP stream:
/// a big-endian `u32` byte count followed by the `serde_json` body
pub struct WireChannel {
    stream: TcpStream,
    peer: String,
    max_frame_bytes: usize,
}

impl WireChannel {
    pub fn new(stream: TcpStream, peer: impl Into<String>, max_frame_bytes: usize) -> Self {
        Self {
            stream,
            peer: peer.into(),
            max_frame_bytes,
        }
    }

    pub async fn connect(addr: &str, policy: ConnectPolicy, max_frame_bytes: usize) -> Result<Self> {
        let stream = connect_with_retry(addr, policy).await?;
        Ok(Self::new(stream, addr, max_frame_bytes))
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub async fn send_frame<M: Serialize>(&mut self, message: &M) -> Result<()> {
        let body = serde_json::to_vec(message)?;
        if body.len() > self.max_frame_bytes || body.len() > u32::MAX as usize {
            return Err(ClusterError::FrameTooLarge {
                len: body.len(),
                max: self.max_frame_bytes,
            });
        }
        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn recv_frame<M: DeserializeOwned>(&mut self) -> Result<M> {
        let mut len_bytes = [0u8; 4];
        match self.stream.read_exact(&mut len_bytes).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ClusterError::ChannelClosed(self.peer.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > self.max_frame_bytes {
            return Err(ClusterError::FrameTooLarge {
                len,
                max: self.max_frame_bytes,
            });
        }
        let mut body = vec![0u8; len];
        match self.stream.read_exact(&mut body).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(ClusterError::ChannelClosed(self.peer.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl ControlChannel for WireChannel {
    async fn send(&mut self, message: ControlMessage) -> Result<()> {
        self.send_frame(&message).await
    }

    async fn recv(&mut self) -> Result<ControlMessage> {
        self.recv_frame().await
    }

    fn describe(&self) -> String {
        self.peer.clone()
    }
}
