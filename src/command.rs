//! Typed builders for the renderer's XML control vocabulary
//!
//! The renderer accepts `<request>` documents whose children address the
//! reference (listener), individual sources, the scene and the processing
//! state. Only the request side is modelled here; replies are never parsed.

use std::fmt;
use std::str::FromStr;

use quick_xml::escape::escape;

use crate::error::ProbeError;

/// Transport control actions accepted by `<state transport='...'/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Start,
    Stop,
    Rewind,
}

impl TransportAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Rewind => "rewind",
        }
    }
}

impl FromStr for TransportAction {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "play" => Ok(Self::Start),
            "stop" | "pause" => Ok(Self::Stop),
            "rewind" => Ok(Self::Rewind),
            other => Err(ProbeError::invalid(format!(
                "unknown transport action '{other}' (expected start, stop or rewind)"
            ))),
        }
    }
}

/// Audio processing switch accepted by `<state processing='...'/>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingAction {
    Start,
    Stop,
}

impl ProcessingAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

/// One control command.
///
/// Angles are in degrees, positions in metres, source volume is linear and
/// master volume is in dB, matching what the renderer expects on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    ReferenceOrientation { azimuth: f32 },
    ReferencePosition { x: f32, y: f32 },
    ReferenceOffsetOrientation { azimuth: f32 },
    ReferenceOffsetPosition { x: f32, y: f32 },
    SourcePosition { id: u32, x: f32, y: f32 },
    SourceOrientation { id: u32, azimuth: f32 },
    SourceVolume { id: u32, volume: f32 },
    SourceMute { id: u32, muted: bool },
    DeleteSource { id: u32 },
    MasterVolume { decibels: f32 },
    ClearScene,
    Transport(TransportAction),
    Processing(ProcessingAction),
}

impl ControlCommand {
    /// Render the full `<request>` document, without any terminator
    pub fn to_xml(&self) -> String {
        format!("<request>{}</request>", self.body())
    }

    fn body(&self) -> String {
        match self {
            Self::ReferenceOrientation { azimuth } => {
                wrap("reference", &[], &orientation(*azimuth))
            }
            Self::ReferencePosition { x, y } => wrap("reference", &[], &position(*x, *y)),
            Self::ReferenceOffsetOrientation { azimuth } => {
                wrap("reference_offset", &[], &orientation(*azimuth))
            }
            Self::ReferenceOffsetPosition { x, y } => {
                wrap("reference_offset", &[], &position(*x, *y))
            }
            Self::SourcePosition { id, x, y } => {
                wrap("source", &[("id", id.to_string())], &position(*x, *y))
            }
            Self::SourceOrientation { id, azimuth } => {
                wrap("source", &[("id", id.to_string())], &orientation(*azimuth))
            }
            Self::SourceVolume { id, volume } => empty(
                "source",
                &[("id", id.to_string()), ("volume", volume.to_string())],
            ),
            Self::SourceMute { id, muted } => empty(
                "source",
                &[("id", id.to_string()), ("mute", muted.to_string())],
            ),
            Self::DeleteSource { id } => {
                wrap("delete", &[], &empty("source", &[("id", id.to_string())]))
            }
            Self::MasterVolume { decibels } => empty("scene", &[("volume", decibels.to_string())]),
            Self::ClearScene => empty("scene", &[("clear", "true".to_string())]),
            Self::Transport(action) => {
                empty("state", &[("transport", action.as_str().to_string())])
            }
            Self::Processing(action) => {
                empty("state", &[("processing", action.as_str().to_string())])
            }
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn orientation(azimuth: f32) -> String {
    empty("orientation", &[("azimuth", azimuth.to_string())])
}

fn position(x: f32, y: f32) -> String {
    empty("position", &[("x", x.to_string()), ("y", y.to_string())])
}

fn attributes(attrs: &[(&str, String)]) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}='{}'", name, escape(value.as_str())))
        .collect()
}

fn empty(name: &str, attrs: &[(&str, String)]) -> String {
    format!("<{}{}/>", name, attributes(attrs))
}

fn wrap(name: &str, attrs: &[(&str, String)], inner: &str) -> String {
    format!("<{name}{}>{inner}</{name}>", attributes(attrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_orientation_matches_wire_example() {
        let cmd = ControlCommand::ReferenceOrientation { azimuth: 45.0 };
        assert_eq!(
            cmd.to_xml(),
            "<request><reference><orientation azimuth='45'/></reference></request>"
        );
    }

    #[test]
    fn test_reference_and_offset_positions() {
        let cmd = ControlCommand::ReferencePosition { x: 1.5, y: -2.0 };
        assert_eq!(
            cmd.to_xml(),
            "<request><reference><position x='1.5' y='-2'/></reference></request>"
        );

        let cmd = ControlCommand::ReferenceOffsetOrientation { azimuth: -90.0 };
        assert_eq!(
            cmd.to_xml(),
            "<request><reference_offset><orientation azimuth='-90'/></reference_offset></request>"
        );
    }

    #[test]
    fn test_source_commands() {
        assert_eq!(
            ControlCommand::SourcePosition { id: 2, x: 0.5, y: 3.0 }.to_xml(),
            "<request><source id='2'><position x='0.5' y='3'/></source></request>"
        );
        assert_eq!(
            ControlCommand::SourceVolume { id: 1, volume: 0.25 }.to_xml(),
            "<request><source id='1' volume='0.25'/></request>"
        );
        assert_eq!(
            ControlCommand::SourceMute { id: 4, muted: true }.to_xml(),
            "<request><source id='4' mute='true'/></request>"
        );
        assert_eq!(
            ControlCommand::DeleteSource { id: 7 }.to_xml(),
            "<request><delete><source id='7'/></delete></request>"
        );
    }

    #[test]
    fn test_scene_and_state_commands() {
        assert_eq!(
            ControlCommand::MasterVolume { decibels: -6.0 }.to_xml(),
            "<request><scene volume='-6'/></request>"
        );
        assert_eq!(
            ControlCommand::ClearScene.to_xml(),
            "<request><scene clear='true'/></request>"
        );
        assert_eq!(
            ControlCommand::Transport(TransportAction::Rewind).to_xml(),
            "<request><state transport='rewind'/></request>"
        );
        assert_eq!(
            ControlCommand::Processing(ProcessingAction::Stop).to_xml(),
            "<request><state processing='stop'/></request>"
        );
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        assert_eq!(
            empty("source", &[("name", "a'b<c&d".to_string())]),
            "<source name='a&apos;b&lt;c&amp;d'/>"
        );
    }

    #[test]
    fn test_transport_action_parsing() {
        assert_eq!("Start".parse::<TransportAction>().unwrap(), TransportAction::Start);
        assert_eq!("pause".parse::<TransportAction>().unwrap(), TransportAction::Stop);
        assert!("fast-forward".parse::<TransportAction>().is_err());
    }
}
