use thiserror::Error;

/// Radio link envelope errors. The offending bytes are dropped; the link stays up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("start marker not found")]
    MissingStartMarker,

    #[error("end marker not found")]
    MissingEndMarker,

    #[error("declared length {declared} does not match {actual} payload bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("empty payload")]
    EmptyPayload,
}

/// Audio payload failures. These never leave the decode/encode call as a fault;
/// callers turn them into silence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("audio payload too short ({0} bytes)")]
    TooShort(usize),

    #[error("unexpected audio packet type {0}")]
    WrongPacketType(u8),

    #[error("unsupported audio mode {0}")]
    UnsupportedMode(u8),

    #[error("invalid {bits}-bit stereo data length {len}")]
    InvalidPcmLength { bits: u8, len: usize },

    #[error("frame size must be non-zero")]
    ZeroFrameSize,

    #[error("opus codec unavailable")]
    CodecUnavailable,

    #[error("opus: {0}")]
    Opus(String),

    #[error("no samples decoded")]
    Empty,
}

impl From<opus::Error> for DecodeError {
    fn from(e: opus::Error) -> Self {
        DecodeError::Opus(e.to_string())
    }
}

/// CAT command rejections. A rejected command never reaches the radio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("operation {operation} not supported for {command}")]
    UnsupportedOperation { command: String, operation: String },

    #[error("command {0} does not support the sub receiver")]
    UnsupportedSubReceiver(String),

    #[error("value {value} out of range [{min}, {max}] for {command}")]
    OutOfRange {
        command: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("unknown mode {0:?}")]
    UnknownMode(String),

    #[error("unknown noise control {0:?}")]
    UnknownNoiseType(String),
}

/// Malformed spectrum telemetry. Dropped and counted, never surfaced to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpectrumError {
    #[error("spectrum payload too short ({len} bytes, need {need})")]
    TooShort { len: usize, need: usize },

    #[error("wrong packet type {0}, expected 2")]
    WrongPacketType(u8),

    #[error("spectrum payload carries no bins")]
    NoBins,
}

/// Rejected client control messages. Answered with an error status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("{action} expects {expected}")]
    InvalidValue {
        action: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Cat(#[from] CatError),
}
