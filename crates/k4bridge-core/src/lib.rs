//! Protocol and media engine for bridging a K4 transceiver's remote link to
//! a web client: packet framing, RX/TX audio, CAT commands and the
//! panadapter. No networking lives here.

pub mod audio;
pub mod auth;
pub mod cat;
pub mod codec;
pub mod config;
pub mod dsp;
pub mod error;
pub mod panadapter;
pub mod protocol;
pub mod util;
