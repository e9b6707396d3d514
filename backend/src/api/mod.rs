//! API handlers.

pub mod lists;
pub mod version;
pub mod websocket;
