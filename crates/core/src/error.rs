use thiserror::Error;

/// Result type alias for symposium-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the symposium dialogue runner
///
/// User-initiated cancellation is deliberately absent: an interrupted run is
/// a normal outcome (`RunEnd::Cancelled` in the dialogue crate), not an
/// error. Everything here is fatal for the run that raised it.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file and terminal operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// A completion stream failed before or during a turn
    #[error("stream failure for {speaker}: {reason}")]
    Stream { speaker: String, reason: String },

    /// Provider construction/request shaping errors
    #[error("provider error: {0}")]
    Provider(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<std::convert::Infallible> for Error {
    fn from(infallible: std::convert::Infallible) -> Self {
        match infallible {}
    }
}

impl Error {
    /// Attach a speaker identity to a stream failure.
    pub fn stream(speaker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Stream { speaker: speaker.into(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err: Error = Error::Config("missing speaker".to_string());
        assert_eq!(config_err.to_string(), "configuration error: missing speaker");

        let provider_err: Error = Error::Provider("unknown endpoint".to_string());
        assert_eq!(provider_err.to_string(), "provider error: unknown endpoint");

        let parse_err: Error = Error::Parse("invalid JSON".to_string());
        assert_eq!(parse_err.to_string(), "parse error: invalid JSON");

        let other_err: Error = Error::Other("something went wrong".to_string());
        assert_eq!(other_err.to_string(), "something went wrong");
    }

    #[test]
    fn test_stream_error_carries_speaker() {
        let err = Error::stream("Nietzsche", "connection refused");
        assert_eq!(err.to_string(), "stream failure for Nietzsche: connection refused");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_err.into();
        assert_eq!(error.to_string(), "I/O error: denied");
    }

    #[test]
    fn test_result_type_alias() {
        let ok: Result<i32> = Ok(42);
        assert!(ok.is_ok());

        let err: Result<i32> = Err(Error::Other("error".to_string()));
        assert!(err.is_err());
    }
}
