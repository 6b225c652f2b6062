//! JSON messages exchanged with the web client.

use crate::audio::{AudioSettings, SessionAudioState};
use crate::cat::format::{self, NoiseControl, Vfo};
use crate::cat::{self, ResponseKind};
use crate::error::ControlError;
use crate::panadapter::{Boundaries, FilterUiValues, SpectrumFrame};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text token that asks the bridge to close the session.
pub const DISCONNECT: &str = "DISCONNECT";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    AudioControl(AudioControl),
    VfoControl(VfoControl),
    FilterControl(FilterControl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioAction {
    #[serde(alias = "set_main_volume")]
    SetMainVolume,
    #[serde(alias = "set_sub_volume")]
    SetSubVolume,
    #[serde(alias = "set_sub_enabled")]
    SetSubEnabled,
    #[serde(alias = "set_audio_routing")]
    SetAudioRouting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioControl {
    pub action: AudioAction,
    #[serde(default)]
    pub value: Value,
}

impl AudioControl {
    pub fn apply(&self, state: &mut SessionAudioState) -> Result<(), ControlError> {
        match self.action {
            AudioAction::SetMainVolume => state.set_main_volume(self.number("set-main-volume")?),
            AudioAction::SetSubVolume => state.set_sub_volume(self.number("set-sub-volume")?),
            AudioAction::SetSubEnabled => {
                let enabled = self.value.as_bool().ok_or(ControlError::InvalidValue {
                    action: "set-sub-enabled",
                    expected: "a boolean",
                })?;
                state.set_sub_enabled(enabled);
            }
            AudioAction::SetAudioRouting => {
                let token = self.value.as_str().ok_or(ControlError::InvalidValue {
                    action: "set-audio-routing",
                    expected: "a routing pattern string",
                })?;
                state.set_routing(token);
            }
        }
        Ok(())
    }

    fn number(&self, action: &'static str) -> Result<f32, ControlError> {
        self.value
            .as_f64()
            .map(|v| v as f32)
            .ok_or(ControlError::InvalidValue {
                action,
                expected: "a number",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VfoAction {
    #[serde(alias = "set_frequency")]
    SetFrequency,
    #[serde(alias = "set_mode")]
    SetMode,
    #[serde(alias = "set_noise_control")]
    SetNoiseControl,
    #[serde(alias = "toggle_sub_rx")]
    ToggleSubRx,
}

fn default_noise_level() -> u8 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct VfoControl {
    pub action: VfoAction,
    #[serde(default)]
    pub vfo: Vfo,
    #[serde(default)]
    pub frequency: Option<u64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub noise_type: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_noise_level")]
    pub level: u8,
    #[serde(default)]
    pub filter: u8,
}

impl VfoControl {
    /// CAT text to forward to the radio, validated against the command
    /// registry.
    pub fn command(&self) -> Result<String, ControlError> {
        let cmd = match self.action {
            VfoAction::SetFrequency => {
                let hz = self.frequency.ok_or(ControlError::MissingField("frequency"))?;
                format::frequency(self.vfo, hz)
            }
            VfoAction::SetMode => {
                let mode = self.mode.as_deref().ok_or(ControlError::MissingField("mode"))?;
                format::mode(self.vfo, mode)?
            }
            VfoAction::SetNoiseControl => {
                let kind: NoiseControl = self
                    .noise_type
                    .as_deref()
                    .ok_or(ControlError::MissingField("noise_type"))?
                    .parse()?;
                format::noise(self.vfo, kind, self.enabled, self.level, self.filter)
            }
            VfoAction::ToggleSubRx => format::toggle_sub_rx().to_string(),
        };
        cat::parse(&cmd)?;
        Ok(cmd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterAction {
    Query,
    Cycle,
    #[serde(alias = "update_values", alias = "update_filter_values")]
    UpdateValues,
}

/// BW/SHIFT pair in kHz as shown by the client.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FilterValues {
    #[serde(default)]
    pub bw: Option<f64>,
    #[serde(default, alias = "shift")]
    pub shft: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterControl {
    pub action: FilterAction,
    #[serde(default)]
    pub vfo: Vfo,
    #[serde(default)]
    pub filter_state: FilterValues,
}

impl FilterControl {
    /// Commands for this action. Nothing is returned unless every one of
    /// them passes registry validation.
    pub fn commands(&self) -> Result<Vec<String>, ControlError> {
        let cmds: Vec<String> = match self.action {
            FilterAction::Query => vec![format::filter_query(self.vfo)],
            FilterAction::Cycle => vec![format::filter_cycle(self.vfo)],
            FilterAction::UpdateValues => {
                format::filter_values(self.vfo, self.filter_state.bw, self.filter_state.shft)
                    .into()
            }
        };
        for cmd in &cmds {
            cat::parse(cmd)?;
        }
        Ok(cmds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Cat {
        text: String,
        updates: Map<String, Value>,
        response_type: ResponseKind,
    },
    CatRejected {
        text: String,
        error: String,
    },
    AudioSettings {
        settings: AudioSettings,
    },
    VfoResponse {
        action: VfoAction,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    FilterResponse {
        action: FilterAction,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    FilterUpdate {
        vfo: Vfo,
        filter_data: FilterUiValues,
    },
    BoundaryUpdate(Boundaries),
    SpectrumData(SpectrumFrame),
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = ?e, "failed to serialize server message");
                "{}".to_string()
            }
        }
    }
}

/// How a text frame from the client is handled.
#[derive(Debug)]
pub enum ClientText<'a> {
    Control(Result<ClientMessage, serde_json::Error>),
    Disconnect,
    Cat(&'a str),
    Unrecognized(&'a str),
}

pub fn classify_text(text: &str) -> ClientText<'_> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        ClientText::Control(serde_json::from_str(trimmed))
    } else if trimmed == DISCONNECT {
        ClientText::Disconnect
    } else if trimmed.ends_with(';') {
        ClientText::Cat(trimmed)
    } else {
        ClientText::Unrecognized(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RoutingPattern;
    use crate::error::CatError;
    use serde_json::json;

    fn control(text: &str) -> ClientMessage {
        match classify_text(text) {
            ClientText::Control(Ok(msg)) => msg,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classify_variants() {
        assert!(matches!(classify_text(" DISCONNECT "), ClientText::Disconnect));
        assert!(matches!(classify_text("FA;"), ClientText::Cat("FA;")));
        assert!(matches!(classify_text("hello"), ClientText::Unrecognized(_)));
        assert!(matches!(
            classify_text("{\"type\":\"nope\"}"),
            ClientText::Control(Err(_))
        ));
    }

    #[test]
    fn audio_control_mutates_state() {
        let mut state = SessionAudioState::new(1.0, 1.0, false, RoutingPattern::default());
        let ClientMessage::AudioControl(c) =
            control(r#"{"type":"audio_control","action":"set-main-volume","value":0.5}"#)
        else {
            panic!("expected audio control");
        };
        c.apply(&mut state).unwrap();
        assert_eq!(state.settings().main_volume, 0.5);

        let ClientMessage::AudioControl(c) =
            control(r#"{"type":"audio_control","action":"set_sub_enabled","value":true}"#)
        else {
            panic!("expected audio control");
        };
        c.apply(&mut state).unwrap();
        assert!(state.settings().sub_enabled);

        let ClientMessage::AudioControl(c) =
            control(r#"{"type":"audio_control","action":"set-sub-enabled","value":"yes"}"#)
        else {
            panic!("expected audio control");
        };
        assert!(matches!(
            c.apply(&mut state),
            Err(ControlError::InvalidValue { .. })
        ));
    }

    #[test]
    fn vfo_control_commands() {
        let ClientMessage::VfoControl(c) = control(
            r#"{"type":"vfo_control","action":"set-frequency","vfo":"b","frequency":7040000}"#,
        ) else {
            panic!("expected vfo control");
        };
        assert_eq!(c.command().unwrap(), "FB00007040000;");

        let ClientMessage::VfoControl(c) =
            control(r#"{"type":"vfo_control","action":"set-noise-control","noise_type":"NB","enabled":true}"#)
        else {
            panic!("expected vfo control");
        };
        assert_eq!(c.command().unwrap(), "NB0510;");

        let ClientMessage::VfoControl(c) =
            control(r#"{"type":"vfo_control","action":"set-mode"}"#)
        else {
            panic!("expected vfo control");
        };
        assert_eq!(c.command(), Err(ControlError::MissingField("mode")));
    }

    #[test]
    fn filter_control_commands() {
        let ClientMessage::FilterControl(c) = control(
            r#"{"type":"filter_control","action":"update-values","vfo":"B","filter_state":{"bw":2.4,"shft":1.2}}"#,
        ) else {
            panic!("expected filter control");
        };
        assert_eq!(c.commands().unwrap(), vec!["IS$0120;", "BW$0240;"]);

        let ClientMessage::FilterControl(c) =
            control(r#"{"type":"filter_control","action":"cycle"}"#)
        else {
            panic!("expected filter control");
        };
        assert_eq!(c.commands().unwrap(), vec!["FP+;"]);
    }

    #[test]
    fn out_of_range_controls_build_nothing() {
        let ClientMessage::VfoControl(c) = control(
            r#"{"type":"vfo_control","action":"set-frequency","vfo":"A","frequency":0}"#,
        ) else {
            panic!("expected vfo control");
        };
        assert!(matches!(
            c.command(),
            Err(ControlError::Cat(CatError::OutOfRange { .. }))
        ));

        let ClientMessage::FilterControl(c) = control(
            r#"{"type":"filter_control","action":"update-values","filter_state":{"bw":-1.0,"shft":1.5}}"#,
        ) else {
            panic!("expected filter control");
        };
        assert!(matches!(
            c.commands(),
            Err(ControlError::Cat(CatError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn server_messages_are_type_tagged() {
        let msg = ServerMessage::VfoResponse {
            action: VfoAction::ToggleSubRx,
            status: Status::Success,
            error: None,
        };
        let v: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(
            v,
            json!({"type": "vfo_response", "action": "toggle-sub-rx", "status": "success"})
        );

        let msg = ServerMessage::Cat {
            text: "AG$050;".to_string(),
            updates: Map::new(),
            response_type: ResponseKind::AiUpdate,
        };
        let v: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(v["type"], "cat");
        assert_eq!(v["response_type"], "ai_update");
    }
}
