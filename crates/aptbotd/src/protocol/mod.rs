//! Inbound chat protocol frames.
//!
//! Each raw line received from the chat service is decoded into an [`Event`]
//! by [`parse`]. Lines that do not match the grammar, or that carry a command
//! outside the recognised set, produce no event.

mod escape;
mod event;
mod parser;

pub use escape::{collapse_whitespace, decode_tag_value};
pub use event::{Command, Event};
pub use parser::{REPLY_BODY_TAG, parse};

/// Keep-alive probe sent by the chat service.
pub(crate) const PING_PROBE: &str = "PING :tmi.twitch.tv";

/// Literal answer to [`PING_PROBE`].
pub(crate) const PONG_REPLY: &str = "PONG :tmi.twitch.tv";
