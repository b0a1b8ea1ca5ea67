//! Error types for device sessions
//!
//! Every operation on a device session reports one of four failure kinds:
//! the device could not be reached, it answered with something we could
//! not make sense of, it refused our credentials, or it returned host data
//! with malformed addresses.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure reaching the device
    #[error("connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Response body was not the HTML or JSON we expected
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Device rejected the login; carries the device's own error string
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Malformed MAC or IP literal in host data
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// True when re-running bootstrap + login is the sensible recovery
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("invalid JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_protocol_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().starts_with("protocol error: invalid JSON"));
    }

    #[test]
    fn test_auth_message_is_preserved() {
        let err = Error::auth("user_pass_err");
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "authentication failed: user_pass_err");
    }
}
