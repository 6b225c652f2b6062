//! HTTP/WebSocket front end that bridges web clients to a K4 radio link.

pub mod app;
pub mod banner;
pub mod build_info;
pub mod logging;
pub mod radio;
pub mod shutdown;
pub mod state;
pub mod ws;
