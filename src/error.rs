use thiserror::Error;

/// The `GetCurrentState` reply could not be turned into a [`DisplayState`].
///
/// No partial state is ever returned alongside this error.
///
/// [`DisplayState`]: displayctl_state::DisplayState
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("reply does not have the expected shape")]
    Payload(#[source] zbus::Error),
    #[error("unknown layout mode {0}")]
    UnknownLayoutMode(u32),
    #[error("property {key} has an unexpected type")]
    InvalidProperty { key: &'static str },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("error talking to the display configuration service")]
    Transport(#[source] zbus::Error),
    #[error("error decoding the current display state")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    /// The state changed since it was fetched. Fetch it again and rebuild the configuration.
    #[error("the configuration is based on stale state (serial {serial}): {reason}")]
    StaleSerial { serial: u32, reason: String },
    /// The service refused the configuration itself.
    #[error("the configuration was rejected: {0}")]
    Rejected(String),
    #[error("error talking to the display configuration service")]
    Transport(#[source] zbus::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("{option} given without a logical monitor, add one with --logical-monitor first")]
    NoPendingLogicalMonitor { option: &'static str },
    #[error("tried to add unknown monitor {0}")]
    UnknownMonitor(String),
    #[error("monitor {0} has no preferred mode")]
    NoPreferredMode(String),
    #[error("invalid {option} value {value}")]
    InvalidNumericArgument { option: &'static str, value: String },
}
