use serde::{Deserialize, Serialize};
use std::fmt;

/// Room identifier. Opaque, user-supplied (the lobby form takes free text),
/// so this is a string and not a generated id.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display identity given at join time (an email in the lobby UI).
/// Unvalidated; the relay treats it as opaque.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
