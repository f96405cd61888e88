use thiserror::Error;

/// Top-level error type for the Parlance system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates return
/// this type directly so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParlanceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ParlanceError {
    fn from(err: toml::de::Error) -> Self {
        ParlanceError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ParlanceError {
    fn from(err: toml::ser::Error) -> Self {
        ParlanceError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ParlanceError {
    fn from(err: serde_json::Error) -> Self {
        ParlanceError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Parlance operations.
pub type Result<T> = std::result::Result<T, ParlanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParlanceError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = ParlanceError::Engine("aborted".to_string());
        assert_eq!(err.to_string(), "Engine error: aborted");

        let err = ParlanceError::Session("invalid phase".to_string());
        assert_eq!(err.to_string(), "Session error: invalid phase");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ParlanceError = io_err.into();
        assert!(matches!(err, ParlanceError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: ParlanceError = parsed.unwrap_err().into();
        assert!(matches!(err, ParlanceError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: ParlanceError = parsed.unwrap_err().into();
        assert!(matches!(err, ParlanceError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
