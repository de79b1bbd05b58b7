//! Error types for the query core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FederationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint {endpoint} returned status {status}")]
    EndpointStatus { endpoint: String, status: u16 },

    #[error("Query rejected by {0}: {1}")]
    QueryRejected(String, String),

    #[error("Unexpected response shape from {0}: {1}")]
    InvalidResponse(String, String),

    #[error("Unknown resource class: {0}")]
    UnknownClass(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

impl FederationError {
    /// Whether a single-endpoint query may be retried after this error.
    ///
    /// Transport failures and server-side errors are transient. A rejected
    /// query means the generated text itself is defective, so retrying it
    /// can only fail the same way.
    pub fn is_retryable(&self) -> bool {
        match self {
            FederationError::Http(_) => true,
            FederationError::EndpointStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = FederationError::Config("missing endpoints".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("missing endpoints"));
    }

    #[test]
    fn test_query_rejected_display() {
        let err = FederationError::QueryRejected(
            "http://ex.org/sparql".to_string(),
            "parse error at line 3".to_string(),
        );
        let display = format!("{}", err);
        assert!(display.contains("Query rejected"));
        assert!(display.contains("http://ex.org/sparql"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "config not found");
        let err: FederationError = io_err.into();
        match err {
            FederationError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{broken");
        let err: FederationError = result.unwrap_err().into();
        match err {
            FederationError::Json(_) => {}
            _ => panic!("Expected Json variant"),
        }
    }

    #[test]
    fn test_server_status_is_retryable() {
        let err = FederationError::EndpointStatus {
            endpoint: "http://ex.org/sparql".to_string(),
            status: 503,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_status_is_not_retryable() {
        let err = FederationError::EndpointStatus {
            endpoint: "http://ex.org/sparql".to_string(),
            status: 400,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rejected_query_is_not_retryable() {
        let err = FederationError::QueryRejected(
            "http://ex.org/sparql".to_string(),
            "bad syntax".to_string(),
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<FederationError>();
        assert_sync::<FederationError>();
    }
}
