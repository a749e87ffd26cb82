//! ControlChannelProbe - one-shot exchange with a renderer control port
//!
//! A run is strictly sequential:
//! connect, send one request, read a fixed number of times, close.
//! Close runs on every exit path once a connection exists; nothing is retried.

pub mod connection;
pub mod endpoint;
pub mod payload;
pub mod transport;

pub use connection::*;
pub use endpoint::*;
pub use payload::*;
pub use transport::*;

use std::time::Duration;

use tracing::{error, info};

use crate::error::{ProbeError, Result};

/// Default number of read attempts after the request is sent
pub const DEFAULT_READ_COUNT: usize = 10;

/// Default upper bound for a single read
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024;

/// Largest accepted single-read buffer (1 MiB)
pub const MAX_CHUNK_SIZE_LIMIT: usize = 1024 * 1024;

/// Everything a probe run needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub endpoint: Endpoint,
    pub payload: RequestPayload,
    pub read_count: usize,
    pub max_chunk_size: usize,
    /// Optional bound on connect; expiry is a connection error
    pub connect_timeout: Option<Duration>,
    /// Optional bound on each read; expiry yields an empty chunk
    pub read_timeout: Option<Duration>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            payload: RequestPayload::default(),
            read_count: DEFAULT_READ_COUNT,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            connect_timeout: None,
            read_timeout: None,
        }
    }
}

impl ProbeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ProbeError::invalid("max chunk size must be at least 1 byte"));
        }
        if self.max_chunk_size > MAX_CHUNK_SIZE_LIMIT {
            return Err(ProbeError::invalid(format!(
                "max chunk size {} exceeds the {} byte limit",
                self.max_chunk_size, MAX_CHUNK_SIZE_LIMIT
            )));
        }
        if self.payload.is_empty() {
            return Err(ProbeError::invalid("request payload is empty"));
        }
        Ok(())
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub endpoint: Endpoint,
    pub chunks: Vec<ResponseChunk>,
}

impl ProbeReport {
    pub fn bytes_received(&self) -> usize {
        self.chunks.iter().map(ResponseChunk::len).sum()
    }

    /// Reads that came back empty (peer closed or read timed out)
    pub fn empty_reads(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_empty()).count()
    }
}

/// Diagnostic client for a renderer control endpoint
pub struct ControlChannelProbe<C: Connector = TcpConnector> {
    settings: ProbeSettings,
    connector: C,
}

impl ControlChannelProbe<TcpConnector> {
    /// Probe over plain TCP
    pub fn new(settings: ProbeSettings) -> Result<Self> {
        let connector = TcpConnector::new(settings.connect_timeout);
        Self::with_connector(settings, connector)
    }
}

impl<C: Connector> ControlChannelProbe<C> {
    pub fn with_connector(settings: ProbeSettings, connector: C) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            connector,
        })
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Open the connection. No retry on failure.
    pub async fn connect(&self) -> Result<ConnectionHandle<C::Stream>> {
        let endpoint = &self.settings.endpoint;
        let stream = self.connector.connect(endpoint).await?;
        info!(%endpoint, "Connected to control endpoint");
        Ok(ConnectionHandle::new(endpoint.clone(), stream)
            .with_read_timeout(self.settings.read_timeout))
    }

    /// Run the scripted sequence once.
    ///
    /// `on_chunk` sees each chunk in read order. On failure the connection
    /// is closed before the error is returned.
    pub async fn run<F>(&self, mut on_chunk: F) -> Result<ProbeReport>
    where
        F: FnMut(&ResponseChunk),
    {
        let mut handle = self.connect().await?;

        let outcome = self.exchange(&mut handle, &mut on_chunk).await;
        let closed = handle.close().await;

        let chunks = match outcome {
            Ok(chunks) => chunks,
            Err(e) => {
                error!(endpoint = %self.settings.endpoint, "Probe run failed: {}", e);
                return Err(e);
            }
        };
        closed?;

        let report = ProbeReport {
            endpoint: self.settings.endpoint.clone(),
            chunks,
        };
        info!(
            reads = report.chunks.len(),
            bytes = report.bytes_received(),
            empty = report.empty_reads(),
            "Probe run completed"
        );
        Ok(report)
    }

    async fn exchange<F>(
        &self,
        handle: &mut ConnectionHandle<C::Stream>,
        on_chunk: &mut F,
    ) -> Result<Vec<ResponseChunk>>
    where
        F: FnMut(&ResponseChunk),
    {
        handle.send(&self.settings.payload).await?;
        handle
            .receive_loop(
                self.settings.read_count,
                self.settings.max_chunk_size,
                on_chunk,
            )
            .await
    }
}
