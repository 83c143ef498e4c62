//! Shared error type across goyagi crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Requested resource does not exist.
    NotFound,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GoyagiError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum GoyagiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config: {0}")]
    Config(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl GoyagiError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GoyagiError::BadRequest(_) => ClientCode::BadRequest,
            GoyagiError::NotFound(_) => ClientCode::NotFound,
            GoyagiError::Bind { .. }
            | GoyagiError::Config(_)
            | GoyagiError::Storage(_)
            | GoyagiError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Whether the error belongs to the server rather than the caller.
    pub fn is_server_fault(&self) -> bool {
        self.client_code() == ClientCode::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_bare_message() {
        let err = GoyagiError::NotFound("movie not found".into());
        assert_eq!(err.to_string(), "movie not found");
        assert_eq!(err.client_code().as_str(), "NOT_FOUND");
        assert!(!err.is_server_fault());
    }

    #[test]
    fn bind_is_internal() {
        let err = GoyagiError::Bind {
            addr: "127.0.0.1:80".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.is_server_fault());
        assert!(err.to_string().starts_with("failed to bind 127.0.0.1:80"));
    }
}
