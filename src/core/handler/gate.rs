// src/core/handler/gate.rs

//! The authorization gate: decides whether an inbound message is a command
//! attempt and whether its sender may issue it.

use crate::core::protocol::{InboundMessage, Principal};

/// The leading character that marks a message as a command attempt.
pub const COMMAND_MARKER: char = '/';

/// What the dispatcher should do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision<'a> {
    /// A command attempt from the principal. Holds the text after the marker.
    Authorized(&'a str),
    /// A command attempt from anyone else; answered with a denial.
    Denied,
    /// Not a command attempt; produces no output regardless of sender.
    Ignored,
}

/// Returns true if `text` starts with the command marker once leading whitespace is removed.
pub fn is_command_attempt(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_MARKER)
}

/// Classifies `message` against the single authorized principal.
pub fn authorize<'a>(principal: &Principal, message: &'a InboundMessage) -> GateDecision<'a> {
    if !is_command_attempt(&message.text) {
        return GateDecision::Ignored;
    }
    let text = message.text.trim();
    if !principal.matches(&message.sender_id) {
        return GateDecision::Denied;
    }
    GateDecision::Authorized(&text[COMMAND_MARKER.len_utf8()..])
}
