use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CredentialError {
    #[error("Malformed token")]
    Malformed,

    #[error("Token payload is missing identity claims")]
    MissingClaims,
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Unknown event name: {0}")]
    UnknownEvent(String),

    #[error("Bad payload for event {event}: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Frame is not an event object: {0}")]
    Frame(String),
}
