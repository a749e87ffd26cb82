//! Connector trait - how a probe obtains its byte stream

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ProbeError, Result};
use crate::probe::connection::ControlStream;
use crate::probe::Endpoint;

/// Opens the stream a [`crate::probe::ControlChannelProbe`] talks over.
///
/// Implementations never retry: one call, one attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: ControlStream;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Stream>;
}

/// Plain TCP connector
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let target = (endpoint.host(), endpoint.port());
        let attempt = match self.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, TcpStream::connect(target)).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", limit),
                )),
            },
            None => TcpStream::connect(target).await,
        };

        let stream = attempt.map_err(|source| ProbeError::Connection {
            endpoint: endpoint.clone(),
            source,
        })?;

        // Commands are tiny; don't let Nagle hold them back
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());

        let stream = TcpConnector::default().connect(&endpoint).await.unwrap();
        let (_accepted, peer) = listener.accept().await.unwrap();
        assert_eq!(stream.local_addr().unwrap(), peer);
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_error() {
        // Grab a free port, then release it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::from(listener.local_addr().unwrap());
        drop(listener);

        let err = TcpConnector::default().connect(&endpoint).await.unwrap_err();
        match err {
            ProbeError::Connection { endpoint: failed, .. } => assert_eq!(failed, endpoint),
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_connection_error() {
        let endpoint = Endpoint::new("host.invalid", 4711).unwrap();
        let connector = TcpConnector::new(Some(Duration::from_secs(5)));
        assert!(matches!(
            connector.connect(&endpoint).await,
            Err(ProbeError::Connection { .. })
        ));
    }
}
