//! Network Layer
//!
//! Message shapes for bot clients. Sockets and sessions are left to the
//! embedding server; nothing here touches game state directly.

pub mod protocol;

pub use protocol::{
    ClientMessage, ServerMessage, StateMessage, WireAction, ProtocolError,
    decode_turn,
};
