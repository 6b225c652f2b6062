pub mod frame;

pub use frame::{encode, encode_cat, FrameBuffer, Packet, PayloadType};
