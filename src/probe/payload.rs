//! Request payloads and response chunks

use std::fmt;
use std::str::FromStr;

use crate::command::ControlCommand;
use crate::error::{ProbeError, Result};

/// Payload sent when nothing else is configured: turn the listener to 45°.
pub const DEFAULT_REQUEST: &str =
    "<request><reference><orientation azimuth='45'/></reference></request> \n";

/// Byte appended after a command so the renderer can split messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageTerminator {
    #[default]
    Newline,
    /// Binary zero, the renderer's own default end-of-message character
    Nul,
}

impl MessageTerminator {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Newline => b"\n",
            Self::Nul => b"\0",
        }
    }
}

impl FromStr for MessageTerminator {
    type Err = ProbeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newline" | "lf" | "\\n" => Ok(Self::Newline),
            "nul" | "null" | "zero" | "\\0" => Ok(Self::Nul),
            other => Err(ProbeError::invalid(format!(
                "unknown message terminator '{other}' (expected newline or nul)"
            ))),
        }
    }
}

/// Immutable bytes of one control command, terminator included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPayload {
    bytes: Vec<u8>,
}

impl RequestPayload {
    /// Wrap raw wire bytes. They are sent verbatim.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ProbeError::invalid("request payload is empty"));
        }
        Ok(Self { bytes })
    }

    /// Raw XML text followed by `terminator`
    pub fn from_xml(xml: &str, terminator: MessageTerminator) -> Result<Self> {
        let xml = xml.trim_end_matches(['\n', '\r', '\0']);
        if xml.trim().is_empty() {
            return Err(ProbeError::invalid("request payload is empty"));
        }
        let mut bytes = Vec::with_capacity(xml.len() + 1);
        bytes.extend_from_slice(xml.as_bytes());
        bytes.extend_from_slice(terminator.as_bytes());
        Ok(Self { bytes })
    }

    pub fn from_command(command: &ControlCommand, terminator: MessageTerminator) -> Self {
        let mut bytes = command.to_xml().into_bytes();
        bytes.extend_from_slice(terminator.as_bytes());
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for RequestPayload {
    fn default() -> Self {
        Self {
            bytes: DEFAULT_REQUEST.as_bytes().to_vec(),
        }
    }
}

/// Bytes returned by a single read, unparsed.
///
/// Empty means the peer had already closed its side when the read ran,
/// or a configured read timeout expired first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk {
    index: usize,
    bytes: Vec<u8>,
}

impl ResponseChunk {
    pub(crate) fn new(index: usize, bytes: Vec<u8>) -> Self {
        Self { index, bytes }
    }

    /// 1-based position of the read that produced this chunk
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Escaped byte-string form, e.g. `b'ok\x00'`
impl fmt::Display for ResponseChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("b'")?;
        for byte in &self.bytes {
            for escaped in std::ascii::escape_default(*byte) {
                fmt::Write::write_char(f, char::from(escaped))?;
            }
        }
        f.write_str("'")
    }
}
