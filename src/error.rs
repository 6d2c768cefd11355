//! Error handling for PID minting and metadata synthesis
//!
//! Collaborator traits (object store, registry client) return `anyhow::Result`
//! so backends can attach whatever context they like; the core maps those
//! failures into [`PidError`] at the seam.

use thiserror::Error;

/// Main error type for the PID subsystem
#[derive(Error, Debug)]
pub enum PidError {
    #[error("Invalid persistent identifier: '{0}'")]
    InvalidPid(String),

    #[error("Unsupported protocol '{0}' (expected doi, hdl or perma)")]
    UnsupportedProtocol(String),

    #[error("Invalid authority '{authority}' for protocol {protocol}")]
    InvalidAuthority { protocol: String, authority: String },

    #[error("Identifier counter source is not available")]
    CounterUnavailable,

    #[error("Owning dataset has no identifier; cannot mint a dependent file identifier")]
    MissingOwnerIdentifier,

    #[error("Missing required attribute '{attribute}' for metadata generation")]
    MissingAttribute { attribute: &'static str },

    #[error("Object store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for PidError {
    fn from(error: serde_yaml::Error) -> Self {
        PidError::Config(error.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PidError::InvalidAuthority {
            protocol: "doi".to_string(),
            authority: "11.1234".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid authority '11.1234' for protocol doi"
        );

        let err = PidError::MissingAttribute {
            attribute: "identifier",
        };
        assert!(err.to_string().contains("'identifier'"));
    }

    #[test]
    fn test_store_error_keeps_source() {
        let err = PidError::Store(anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "Object store error: connection reset");
        assert!(std::error::Error::source(&err).is_some());
    }
}
