//! Fine-grained machine-checkable error codes

use crate::kind::{ErrorKind, ParseEnumError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Codes attached to errors of kind [`ErrorKind::Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkErrorCode {
    InvalidUrl,
    RequestTimeout,
    ConnectionRefused,
    ConnectionReset,
    DnsLookupFailed,
    HostUnreachable,
    TooManyRedirects,
    TlsHandshakeFailed,
    BadResponse,
    ServiceUnavailable,
}

impl NetworkErrorCode {
    pub const ALL: [NetworkErrorCode; 10] = [
        NetworkErrorCode::InvalidUrl,
        NetworkErrorCode::RequestTimeout,
        NetworkErrorCode::ConnectionRefused,
        NetworkErrorCode::ConnectionReset,
        NetworkErrorCode::DnsLookupFailed,
        NetworkErrorCode::HostUnreachable,
        NetworkErrorCode::TooManyRedirects,
        NetworkErrorCode::TlsHandshakeFailed,
        NetworkErrorCode::BadResponse,
        NetworkErrorCode::ServiceUnavailable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkErrorCode::InvalidUrl => "INVALID_URL",
            NetworkErrorCode::RequestTimeout => "REQUEST_TIMEOUT",
            NetworkErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            NetworkErrorCode::ConnectionReset => "CONNECTION_RESET",
            NetworkErrorCode::DnsLookupFailed => "DNS_LOOKUP_FAILED",
            NetworkErrorCode::HostUnreachable => "HOST_UNREACHABLE",
            NetworkErrorCode::TooManyRedirects => "TOO_MANY_REDIRECTS",
            NetworkErrorCode::TlsHandshakeFailed => "TLS_HANDSHAKE_FAILED",
            NetworkErrorCode::BadResponse => "BAD_RESPONSE",
            NetworkErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for NetworkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkErrorCode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetworkErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("network error code", s))
    }
}

/// Codes attached to errors of kind [`ErrorKind::Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseErrorCode {
    DatabaseConnectionError,
    DatabaseTimeoutError,
    DatabaseQueryError,
    DatabaseConstraintError,
    DatabaseDuplicateKeyError,
    DatabaseTransactionError,
    DatabaseRecordNotFound,
    DatabaseMigrationError,
}

impl DatabaseErrorCode {
    pub const ALL: [DatabaseErrorCode; 8] = [
        DatabaseErrorCode::DatabaseConnectionError,
        DatabaseErrorCode::DatabaseTimeoutError,
        DatabaseErrorCode::DatabaseQueryError,
        DatabaseErrorCode::DatabaseConstraintError,
        DatabaseErrorCode::DatabaseDuplicateKeyError,
        DatabaseErrorCode::DatabaseTransactionError,
        DatabaseErrorCode::DatabaseRecordNotFound,
        DatabaseErrorCode::DatabaseMigrationError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseErrorCode::DatabaseConnectionError => "DATABASE_CONNECTION_ERROR",
            DatabaseErrorCode::DatabaseTimeoutError => "DATABASE_TIMEOUT_ERROR",
            DatabaseErrorCode::DatabaseQueryError => "DATABASE_QUERY_ERROR",
            DatabaseErrorCode::DatabaseConstraintError => "DATABASE_CONSTRAINT_ERROR",
            DatabaseErrorCode::DatabaseDuplicateKeyError => "DATABASE_DUPLICATE_KEY_ERROR",
            DatabaseErrorCode::DatabaseTransactionError => "DATABASE_TRANSACTION_ERROR",
            DatabaseErrorCode::DatabaseRecordNotFound => "DATABASE_RECORD_NOT_FOUND",
            DatabaseErrorCode::DatabaseMigrationError => "DATABASE_MIGRATION_ERROR",
        }
    }
}

impl fmt::Display for DatabaseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatabaseErrorCode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatabaseErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("database error code", s))
    }
}

/// A recognised fine-grained code from either code set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Network(NetworkErrorCode),
    Database(DatabaseErrorCode),
}

impl ErrorCode {
    /// Recognise a raw code string. Returns `None` for anything outside
    /// both code sets.
    pub fn parse(code: &str) -> Option<Self> {
        if let Ok(code) = code.parse::<NetworkErrorCode>() {
            return Some(ErrorCode::Network(code));
        }
        code.parse::<DatabaseErrorCode>().ok().map(ErrorCode::Database)
    }

    /// The kind an error carrying this code is classified as
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::Network(_) => ErrorKind::Network,
            ErrorCode::Database(_) => ErrorKind::Database,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Network(code) => code.as_str(),
            ErrorCode::Database(code) => code.as_str(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<NetworkErrorCode> for ErrorCode {
    fn from(code: NetworkErrorCode) -> Self {
        ErrorCode::Network(code)
    }
}

impl From<DatabaseErrorCode> for ErrorCode {
    fn from(code: DatabaseErrorCode) -> Self {
        ErrorCode::Database(code)
    }
}

/// An error carrying a raw code string next to its message.
///
/// Raise this (directly or as the source of another error) when the code
/// should be picked up by classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CodedError {
    pub code: String,
    pub message: String,
}

impl CodedError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The recognised code, if the raw string names one
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::parse(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(
            ErrorCode::parse("REQUEST_TIMEOUT"),
            Some(ErrorCode::Network(NetworkErrorCode::RequestTimeout))
        );
        assert_eq!(
            ErrorCode::parse("DATABASE_TIMEOUT_ERROR"),
            Some(ErrorCode::Database(DatabaseErrorCode::DatabaseTimeoutError))
        );
        assert_eq!(ErrorCode::parse("request_timeout"), None);
        assert_eq!(ErrorCode::parse("ECONNRESET"), None);
    }

    #[test]
    fn test_code_kind() {
        assert_eq!(ErrorCode::from(NetworkErrorCode::InvalidUrl).kind(), ErrorKind::Network);
        assert_eq!(
            ErrorCode::from(DatabaseErrorCode::DatabaseQueryError).kind(),
            ErrorKind::Database
        );
    }

    #[test]
    fn test_serde_identifiers() {
        for code in NetworkErrorCode::ALL {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
        for code in DatabaseErrorCode::ALL {
            assert_eq!(serde_json::to_value(code).unwrap(), code.as_str());
        }
        let code: ErrorCode = serde_json::from_str("\"DATABASE_RECORD_NOT_FOUND\"").unwrap();
        assert_eq!(code, ErrorCode::Database(DatabaseErrorCode::DatabaseRecordNotFound));
    }

    #[test]
    fn test_coded_error() {
        let err = CodedError::new("CONNECTION_REFUSED", "upstream refused");
        assert_eq!(err.to_string(), "upstream refused");
        assert_eq!(
            err.error_code(),
            Some(ErrorCode::Network(NetworkErrorCode::ConnectionRefused))
        );
        assert_eq!(CodedError::new("E42", "nope").error_code(), None);
    }
}
