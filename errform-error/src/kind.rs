//! Error kinds, categories and layers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned when a string does not name a variant of one of the closed
/// enumerations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {enumeration} '{value}'")]
pub struct ParseEnumError {
    pub enumeration: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(enumeration: &'static str, value: &str) -> Self {
        Self {
            enumeration,
            value: value.to_string(),
        }
    }
}

/// The kind of error that occurred.
///
/// Determines which structured shape is produced. Users match on ErrorKind
/// to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Input failed validation
    Validation,

    /// The operation conflicts with existing state
    Conflict,

    /// A third-party service failed
    ExternalService,

    /// A database operation failed
    Database,

    /// Catch-all for anything not otherwise recognised
    Internal,

    /// The requested resource does not exist
    NotFound,

    /// A network operation failed
    Network,

    /// The caller is not allowed to do this
    Authorization,

    /// The caller could not be identified
    Authentication,

    /// Configuration is missing or malformed
    BadConfig,

    /// Converting data between shapes failed
    Transformation,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::Validation,
        ErrorKind::Conflict,
        ErrorKind::ExternalService,
        ErrorKind::Database,
        ErrorKind::Internal,
        ErrorKind::NotFound,
        ErrorKind::Network,
        ErrorKind::Authorization,
        ErrorKind::Authentication,
        ErrorKind::BadConfig,
        ErrorKind::Transformation,
    ];

    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::ExternalService => "ExternalService",
            ErrorKind::Database => "Database",
            ErrorKind::Internal => "Internal",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Network => "Network",
            ErrorKind::Authorization => "Authorization",
            ErrorKind::Authentication => "Authentication",
            ErrorKind::BadConfig => "BadConfig",
            ErrorKind::Transformation => "Transformation",
        }
    }

    /// Name used when this kind is rendered as an error type, e.g. as the
    /// header of a relabelled stack trace
    pub fn error_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::ExternalService => "ExternalServiceError",
            ErrorKind::Database => "DatabaseError",
            ErrorKind::Internal => "InternalError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Authorization => "AuthorizationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::BadConfig => "BadConfigError",
            ErrorKind::Transformation => "TransformationError",
        }
    }

    /// Category used when the caller does not supply one
    pub fn default_category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Validation => ErrorCategory::Validation,
            ErrorKind::Conflict => ErrorCategory::Conflict,
            ErrorKind::ExternalService => ErrorCategory::ExternalService,
            ErrorKind::Database => ErrorCategory::Database,
            ErrorKind::Internal => ErrorCategory::Internal,
            ErrorKind::NotFound => ErrorCategory::NotFound,
            ErrorKind::Network => ErrorCategory::Network,
            ErrorKind::Authorization => ErrorCategory::Authorization,
            ErrorKind::Authentication => ErrorCategory::Authentication,
            ErrorKind::BadConfig => ErrorCategory::BadConfig,
            ErrorKind::Transformation => ErrorCategory::Transformation,
        }
    }

    /// HTTP status an adapter would answer with for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Transformation => 422,
            ErrorKind::ExternalService => 502,
            ErrorKind::Network => 503,
            ErrorKind::Database | ErrorKind::Internal | ErrorKind::BadConfig => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("error kind", s))
    }
}

/// Broad classification of an error, independent of the shape produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    ExternalService,
    Database,
    Network,
    Configuration,
    Internal,
    BadConfig,
    Transformation,
}

impl ErrorCategory {
    /// Every category, in declaration order
    pub const ALL: [ErrorCategory; 12] = [
        ErrorCategory::Validation,
        ErrorCategory::Authentication,
        ErrorCategory::Authorization,
        ErrorCategory::NotFound,
        ErrorCategory::Conflict,
        ErrorCategory::ExternalService,
        ErrorCategory::Database,
        ErrorCategory::Network,
        ErrorCategory::Configuration,
        ErrorCategory::Internal,
        ErrorCategory::BadConfig,
        ErrorCategory::Transformation,
    ];

    /// Returns the stable identifier of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::ExternalService => "external_service",
            ErrorCategory::Database => "database",
            ErrorCategory::Network => "network",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Internal => "internal",
            ErrorCategory::BadConfig => "bad_config",
            ErrorCategory::Transformation => "transformation",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("error category", s))
    }
}

/// Architectural layer that raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLayer {
    App,
    Router,
    Repository,
    Service,
    Controller,
    Model,
    Utility,
}

impl ErrorLayer {
    /// Every layer, in declaration order
    pub const ALL: [ErrorLayer; 7] = [
        ErrorLayer::App,
        ErrorLayer::Router,
        ErrorLayer::Repository,
        ErrorLayer::Service,
        ErrorLayer::Controller,
        ErrorLayer::Model,
        ErrorLayer::Utility,
    ];

    /// Returns the stable identifier of this layer
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLayer::App => "app",
            ErrorLayer::Router => "router",
            ErrorLayer::Repository => "repository",
            ErrorLayer::Service => "service",
            ErrorLayer::Controller => "controller",
            ErrorLayer::Model => "model",
            ErrorLayer::Utility => "utility",
        }
    }

    /// Label written over the `Error:` header of traces raised in this layer
    pub fn error_label(&self) -> &'static str {
        match self {
            ErrorLayer::App => "AppError",
            ErrorLayer::Router => "RouterError",
            ErrorLayer::Repository => "RepositoryError",
            ErrorLayer::Service => "ServiceError",
            ErrorLayer::Controller => "ControllerError",
            ErrorLayer::Model => "ModelError",
            ErrorLayer::Utility => "UtilityError",
        }
    }
}

impl fmt::Display for ErrorLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorLayer {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorLayer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("error layer", s))
    }
}
