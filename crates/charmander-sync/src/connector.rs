//! Short-lived connections to the key-value store.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use charmander_proto::{Codec, Decode, ReplyDecoder};

use crate::error::{Result, SyncError};

/// One connection to the store.
///
/// Opened per batch of work and shut down afterwards; never pooled or
/// reused across cycles.
#[derive(Debug)]
pub struct StoreConnection {
    stream: TcpStream,
    codec: Codec,
    decoder: ReplyDecoder,
}

impl StoreConnection {
    /// Connects to `address` within `timeout`.
    ///
    /// Any failure (refusal, timeout, resolution) yields `None`. The
    /// store being unreachable means "skip this unit of work", not an
    /// error to propagate.
    pub async fn connect(address: &str, timeout: Duration) -> Option<Self> {
        match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => Some(Self {
                stream,
                codec: Codec::with_capacity(256),
                decoder: ReplyDecoder::new(),
            }),
            Ok(Err(error)) => {
                debug!(address, %error, "store connection failed");
                None
            }
            Err(_) => {
                debug!(address, "store connection timed out");
                None
            }
        }
    }

    /// Encodes and writes one command.
    ///
    /// Fire-and-forget: write failures are logged, not returned. The
    /// next cycle republishes everything anyway.
    pub async fn send(&mut self, args: &[&str]) {
        let frame = self.codec.encode(args);
        if let Err(error) = self.stream.write_all(frame).await {
            warn!(%error, "store write failed");
        }
    }

    /// Reads one single-value reply. `None` is a nil reply (missing key).
    pub async fn read_bulk(&mut self) -> Result<Option<String>> {
        loop {
            match self.decoder.try_bulk()? {
                Decode::Ready(value) => return Ok(value),
                Decode::Incomplete => self.fill().await?,
            }
        }
    }

    /// Reads one array reply.
    pub async fn read_array(&mut self) -> Result<Vec<String>> {
        loop {
            match self.decoder.try_array()? {
                Decode::Ready(values) => return Ok(values),
                Decode::Incomplete => self.fill().await?,
            }
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let mut buf = [0u8; 4096];
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Err(SyncError::ConnectionClosed);
        }
        self.decoder.feed(&buf[..n]);
        Ok(())
    }

    /// Shuts the connection down.
    pub async fn shutdown(mut self) {
        let _ = self.stream.shutdown().await;
    }
}
