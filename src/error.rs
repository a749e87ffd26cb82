//! Error taxonomy for the control probe

use std::io;

use thiserror::Error;

use crate::probe::Endpoint;

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Fatal conditions of a probe run.
///
/// A graceful peer close during the read loop is not an error; it shows up
/// as an empty [`crate::probe::ResponseChunk`] instead.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Endpoint unreachable, refused, unresolvable or timed out
    #[error("failed to connect to {endpoint}")]
    Connection {
        endpoint: Endpoint,
        #[source]
        source: io::Error,
    },

    /// The request payload could not be handed to the transport
    #[error("failed to transmit request payload")]
    Transmission {
        #[source]
        source: io::Error,
    },

    /// A read failed for a reason other than a graceful close
    #[error("read {index} failed")]
    Read {
        /// 1-based index of the failing read attempt
        index: usize,
        #[source]
        source: io::Error,
    },

    /// Operation attempted on a connection that was already closed
    #[error("cannot {operation} on a closed connection")]
    Closed { operation: &'static str },

    #[error("invalid probe settings: {0}")]
    InvalidSettings(String),
}

impl ProbeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidSettings(message.into())
    }

    /// Underlying I/O error kind, if the failure came from the transport
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Connection { source, .. }
            | Self::Transmission { source }
            | Self::Read { source, .. } => Some(source.kind()),
            Self::Closed { .. } | Self::InvalidSettings(_) => None,
        }
    }
}
