//! ConnectionHandle - exclusive owner of the live control stream

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{ProbeError, Result};
use crate::probe::{Endpoint, RequestPayload, ResponseChunk};

/// Byte stream a probe can talk over (TCP in production, scripted in tests)
pub trait ControlStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ControlStream for T {}

/// Live connection to a control endpoint.
///
/// The state only moves forward: a handle is born connected and becomes
/// closed exactly once. Every operation on a closed handle fails with
/// [`ProbeError::Closed`].
pub struct ConnectionHandle<S: ControlStream> {
    endpoint: Endpoint,
    stream: Option<S>,
    read_timeout: Option<Duration>,
}

impl<S: ControlStream> ConnectionHandle<S> {
    pub(crate) fn new(endpoint: Endpoint, stream: S) -> Self {
        Self {
            endpoint,
            stream: Some(stream),
            read_timeout: None,
        }
    }

    pub(crate) fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    fn stream_mut(&mut self, operation: &'static str) -> Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or(ProbeError::Closed { operation })
    }

    /// Hand the whole payload to the transport, looping over short writes
    pub async fn send(&mut self, payload: &RequestPayload) -> Result<()> {
        let stream = self.stream_mut("send")?;
        stream
            .write_all(payload.as_bytes())
            .await
            .map_err(|source| ProbeError::Transmission { source })?;
        stream
            .flush()
            .await
            .map_err(|source| ProbeError::Transmission { source })?;

        debug!(bytes = payload.len(), "Control request sent");
        Ok(())
    }

    /// One read of up to `max_chunk_size` bytes.
    ///
    /// Returns an empty chunk once the peer has closed, or when a configured
    /// read timeout expires first; neither is an error.
    pub async fn read_chunk(&mut self, index: usize, max_chunk_size: usize) -> Result<ResponseChunk> {
        let read_timeout = self.read_timeout;
        let stream = self.stream_mut("read")?;
        let mut buf = vec![0u8; max_chunk_size];

        let result = match read_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.read(&mut buf)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(index, ?limit, "Read timed out without data");
                    Ok(0)
                }
            },
            None => stream.read(&mut buf).await,
        };

        let read = result.map_err(|source| ProbeError::Read { index, source })?;
        buf.truncate(read);

        debug!(index, bytes = read, "Read completed");
        Ok(ResponseChunk::new(index, buf))
    }

    /// Exactly `count` reads, in order, with no early exit after a close.
    ///
    /// `on_chunk` sees every chunk as soon as it is read. The first read
    /// error aborts the loop.
    pub async fn receive_loop<F>(
        &mut self,
        count: usize,
        max_chunk_size: usize,
        mut on_chunk: F,
    ) -> Result<Vec<ResponseChunk>>
    where
        F: FnMut(&ResponseChunk),
    {
        let mut chunks = Vec::new();
        for index in 1..=count {
            let chunk = self.read_chunk(index, max_chunk_size).await?;
            on_chunk(&chunk);
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    /// Shut down and release the stream. Fails if already closed.
    pub async fn close(&mut self) -> Result<()> {
        let mut stream = self
            .stream
            .take()
            .ok_or(ProbeError::Closed { operation: "close" })?;

        // Peer may already be gone; the release still counts
        if let Err(e) = stream.shutdown().await {
            warn!(endpoint = %self.endpoint, "Shutdown failed while closing: {}", e);
        }
        drop(stream);

        info!(endpoint = %self.endpoint, "Connection closed");
        Ok(())
    }
}

impl<S: ControlStream> Drop for ConnectionHandle<S> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!(endpoint = %self.endpoint, "Connection dropped without explicit close");
        }
    }
}
