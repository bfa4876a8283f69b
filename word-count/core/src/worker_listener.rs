// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ClusterError, Result};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// A worker's single listening socket. The coordinator and every shuffle
/// peer reach the worker through it.
pub struct WorkerListener {
    incoming: TcpListenerStream,
    local_addr: SocketAddr,
}

impl WorkerListener {
    /// Bind with `SO_REUSEADDR` so a restarted worker can reclaim its port
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = socket2::Socket::new(
            socket2::Domain::for_address(addr),
            socket2::Type::STREAM,
            Some(socket2::Protocol::TCP),
        )?;
        socket.set_reuse_address(true)?;
        socket
            .bind(&addr.into())
            .map_err(|e| ClusterError::Connection {
                addr: addr.to_string(),
                source: e,
            })?;
        socket.listen(1024)?;

        let std_listener: std::net::TcpListener = socket.into();
        std_listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(std_listener)?;
        let local_addr = listener.local_addr()?;
        debug!("Listening on {}", local_addr);

        Ok(Self {
            incoming: TcpListenerStream::new(listener),
            local_addr,
        })
    }

    /// Actual bound address; differs from the requested one for port 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn accept(&mut self) -> Result<TcpStream> {
        match self.incoming.next().await {
            Some(stream) => {
                let stream = stream?;
                stream.set_nodelay(true)?;
                Ok(stream)
            }
            None => Err(ClusterError::ChannelClosed(format!(
                "listener {}",
                self.local_addr
            ))),
        }
    }
}
