//! API handlers.

pub mod tracks;
pub mod websocket;
