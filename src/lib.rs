//! SSR Control Probe
//!
//! A diagnostic client for the XML control port of the SoundScape Renderer.
//!
//! This library provides:
//! - A one-shot probe: connect, send one command, read a fixed number of chunks, close
//! - Typed builders for the renderer's `<request>` command vocabulary
//! - Layered configuration (defaults, config file, `SSR_PROBE_*` environment)

// =============================================================================
// Lints - Enforce code quality and consistency
// =============================================================================

// Deny truly dangerous patterns (these will fail the build)
#![deny(unsafe_code)]
#![deny(unused_must_use)]

pub mod command;
pub mod config;
pub mod error;
pub mod probe;

pub use command::{ControlCommand, ProcessingAction, TransportAction};
pub use error::{ProbeError, Result};
pub use probe::{
    ConnectionHandle, ControlChannelProbe, Endpoint, MessageTerminator, ProbeReport,
    ProbeSettings, RequestPayload, ResponseChunk,
};
