// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA client error types.
//!
//! Errors are grouped by the layer that produced them so the command loop can
//! tell "you are not connected" apart from "the server rejected the request".
//!
//! # Error Categories
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint discovery, session establishment, liveness
//! ├── Browse        - Browse round-trip failures
//! ├── Operation     - Batched read / write failures
//! └── Configuration - Invalid node ids, endpoints, security settings
//! ```
//!
//! Every failure is all-or-nothing: a batch that fails half way is reported
//! as a single error and no partial result escapes.
//!
//! # Examples
//!
//! ```
//! use opcsh_opcua::error::{ConnectionError, OpcUaError};
//!
//! let error = OpcUaError::not_connected();
//! assert!(error.is_not_connected());
//! assert_eq!(error.category(), "connection");
//!
//! let error = OpcUaError::connection(ConnectionError::refused("opc.tcp://localhost:4840"));
//! for hint in error.recovery_hints() {
//!     println!("Hint: {}", hint);
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

// =============================================================================
// OpcUaError - Main Error Type
// =============================================================================

/// The main error type for OPC UA client operations.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// Connection-related errors, including "no session".
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Browse errors.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Read/write operation errors.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl OpcUaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a browse error.
    #[inline]
    pub fn browse(error: BrowseError) -> Self {
        Self::Browse(error)
    }

    /// Creates an operation error.
    #[inline]
    pub fn operation(error: OperationError) -> Self {
        Self::Operation(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates a read failed error.
    pub fn read_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation(OperationError::read_failed(node_id, message))
    }

    /// Creates a write failed error.
    pub fn write_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation(OperationError::write_failed(node_id, message))
    }

    /// Creates a browse failed error.
    pub fn browse_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Browse(BrowseError::browse_failed(node_id, message))
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Returns `true` if the operation failed because no session is active.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::Connection(ConnectionError::NotConnected))
    }

    /// Returns `true` if this error came from establishing a connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the severity of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(ConnectionError::NotConnected) => ErrorSeverity::Warning,
            Self::Connection(ConnectionError::AlreadyConnected { .. }) => ErrorSeverity::Warning,
            Self::Connection(_) => ErrorSeverity::Error,
            Self::Browse(BrowseError::NodeNotFound { .. }) => ErrorSeverity::Warning,
            Self::Browse(_) => ErrorSeverity::Error,
            Self::Operation(OperationError::BadStatus { .. }) => ErrorSeverity::Warning,
            Self::Operation(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category as a string.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Browse(_) => "browse",
            Self::Operation(_) => "operation",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Browse(e) => e.error_code(),
            Self::Operation(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) => e.recovery_hints(),
            Self::Browse(e) => e.recovery_hints(),
            Self::Operation(e) => e.recovery_hints(),
            Self::Configuration(e) => e.recovery_hints(),
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(e) => e.user_message(),
            Self::Browse(e) => e.user_message(),
            Self::Operation(e) => e.user_message(),
            Self::Configuration(e) => e.to_string(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The server refused the session.
    #[error("Connection refused to '{endpoint}': {reason}")]
    Refused {
        /// Target endpoint.
        endpoint: String,
        /// Reason reported by the transport.
        reason: String,
    },

    /// Endpoint discovery found nothing at the address.
    #[error("Endpoint not found: '{endpoint}'")]
    EndpointNotFound {
        /// The endpoint URL.
        endpoint: String,
    },

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL: '{url}' - {reason}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Reason.
        reason: String,
    },

    /// No endpoint matches the configured security settings.
    #[error("No suitable endpoint found with security '{security}'")]
    NoSuitableEndpoint {
        /// Requested security mode and policy.
        security: String,
    },

    /// A session is already active.
    #[error("Already connected to '{endpoint}'")]
    AlreadyConnected {
        /// Endpoint of the active session.
        endpoint: String,
    },

    /// The connection was closed by the remote side.
    #[error("Connection closed: {reason}")]
    Closed {
        /// Close reason.
        reason: String,
    },

    /// No session is active.
    #[error("Not connected")]
    NotConnected,

    /// The server did not answer within the request timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The request that timed out.
        operation: String,
        /// The configured request timeout.
        timeout: Duration,
    },
}

impl ConnectionError {
    /// Creates a refused error.
    pub fn refused(endpoint: impl Into<String>) -> Self {
        Self::Refused {
            endpoint: endpoint.into(),
            reason: "session could not be established".to_string(),
        }
    }

    /// Creates a refused error with the transport's reason.
    pub fn refused_with_reason(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Refused {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an endpoint not found error.
    pub fn endpoint_not_found(endpoint: impl Into<String>) -> Self {
        Self::EndpointNotFound {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a no suitable endpoint error.
    pub fn no_suitable_endpoint(security: impl Into<String>) -> Self {
        Self::NoSuitableEndpoint {
            security: security.into(),
        }
    }

    /// Creates an already connected error.
    pub fn already_connected(endpoint: impl Into<String>) -> Self {
        Self::AlreadyConnected {
            endpoint: endpoint.into(),
        }
    }

    /// Creates a closed error.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Refused { .. } => ErrorCode::new(1, 1),
            Self::EndpointNotFound { .. } => ErrorCode::new(1, 2),
            Self::InvalidEndpoint { .. } => ErrorCode::new(1, 3),
            Self::NoSuitableEndpoint { .. } => ErrorCode::new(1, 4),
            Self::AlreadyConnected { .. } => ErrorCode::new(1, 5),
            Self::Closed { .. } => ErrorCode::new(1, 6),
            Self::NotConnected => ErrorCode::new(1, 7),
            Self::Timeout { .. } => ErrorCode::new(1, 8),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Refused { .. } => vec![
                "Check if the OPC UA server is running",
                "Verify the endpoint URL is correct",
                "Check that the server trusts this client's certificate",
            ],
            Self::EndpointNotFound { .. } => vec![
                "Verify the server URL is correct",
                "Check if the server is running",
            ],
            Self::InvalidEndpoint { .. } => vec!["Use format: opc.tcp://hostname:port/path"],
            Self::NoSuitableEndpoint { .. } => vec![
                "Check available security modes on the server",
                "Try security mode None for testing",
            ],
            Self::AlreadyConnected { .. } => vec!["Disconnect before connecting to another server"],
            Self::Closed { .. } => vec!["Reconnect to the server"],
            Self::NotConnected => vec!["Connect to a server first: connect <endpoint>"],
            Self::Timeout { .. } => vec![
                "Check the network path to the server",
                "Raise client.request_timeout for slow servers",
            ],
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Refused { endpoint, .. } => format!("Could not connect to {}", endpoint),
            Self::EndpointNotFound { endpoint } => format!("No endpoint found at {}", endpoint),
            Self::InvalidEndpoint { url, reason } => format!("Invalid endpoint {}: {}", url, reason),
            Self::NoSuitableEndpoint { security } => {
                format!("Server offers no endpoint with security {}", security)
            }
            Self::AlreadyConnected { endpoint } => format!("Already connected to {}", endpoint),
            Self::Closed { .. } => "The connection was closed".to_string(),
            Self::NotConnected => "Not connected to a server".to_string(),
            Self::Timeout { operation, timeout } => format!(
                "The server did not answer the {} request within {}",
                operation,
                humantime::format_duration(*timeout)
            ),
        }
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Browse errors.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// The browse round-trip failed.
    #[error("Browse failed for node '{node_id}': {message}")]
    BrowseFailed {
        /// Node that was browsed.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// The node does not exist on the server.
    #[error("Node not found: '{node_id}'")]
    NodeNotFound {
        /// The node ID.
        node_id: String,
    },

    /// A continuation point expired or was rejected.
    #[error("Invalid continuation point while browsing '{node_id}'")]
    InvalidContinuationPoint {
        /// Node that was browsed.
        node_id: String,
    },
}

impl BrowseError {
    /// Creates a browse failed error.
    pub fn browse_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrowseFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a node not found error.
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_id: node_id.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::BrowseFailed { .. } => ErrorCode::new(2, 1),
            Self::NodeNotFound { .. } => ErrorCode::new(2, 2),
            Self::InvalidContinuationPoint { .. } => ErrorCode::new(2, 3),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::BrowseFailed { .. } => vec!["Refresh the current node and try again"],
            Self::NodeNotFound { .. } => vec!["The node may have been removed; navigate back and refresh"],
            Self::InvalidContinuationPoint { .. } => vec!["Browse the node again"],
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::BrowseFailed { node_id, .. } => format!("Could not list children of {}", node_id),
            Self::NodeNotFound { node_id } => format!("Node {} does not exist", node_id),
            Self::InvalidContinuationPoint { node_id } => {
                format!("Listing of {} was interrupted", node_id)
            }
        }
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Read/write operation errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A batched read failed.
    #[error("Read failed for node '{node_id}': {message}")]
    ReadFailed {
        /// Node ID.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// A write failed.
    #[error("Write failed for node '{node_id}': {message}")]
    WriteFailed {
        /// Node ID.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// The server's response does not match the request.
    #[error("Malformed response for node '{node_id}': expected {expected} results, got {actual}")]
    MalformedResponse {
        /// Node ID.
        node_id: String,
        /// Number of results requested.
        expected: usize,
        /// Number of results received.
        actual: usize,
    },

    /// The server answered with a bad status code.
    #[error("Bad status 0x{status_code:08X} for node '{node_id}'")]
    BadStatus {
        /// Node ID.
        node_id: String,
        /// OPC UA status code.
        status_code: u32,
    },
}

impl OperationError {
    /// Creates a read failed error.
    pub fn read_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a write failed error.
    pub fn write_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed response error.
    pub fn malformed_response(node_id: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::MalformedResponse {
            node_id: node_id.into(),
            expected,
            actual,
        }
    }

    /// Creates a bad status error.
    pub fn bad_status(node_id: impl Into<String>, status_code: u32) -> Self {
        Self::BadStatus {
            node_id: node_id.into(),
            status_code,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ReadFailed { .. } => ErrorCode::new(3, 1),
            Self::WriteFailed { .. } => ErrorCode::new(3, 2),
            Self::MalformedResponse { .. } => ErrorCode::new(3, 3),
            Self::BadStatus { .. } => ErrorCode::new(3, 4),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::ReadFailed { .. } => vec![
                "Check the connection to the server",
                "Verify the node still exists",
            ],
            Self::WriteFailed { .. } => vec![
                "Check the node's access level",
                "Verify the value matches the node's data type",
            ],
            Self::MalformedResponse { .. } => vec!["Retry the operation", "Check server logs"],
            Self::BadStatus { .. } => vec!["Check the node's access rights"],
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::ReadFailed { node_id, .. } => format!("Could not read {}", node_id),
            Self::WriteFailed { node_id, .. } => format!("Could not write {}", node_id),
            Self::MalformedResponse { node_id, .. } => {
                format!("Server sent an unexpected answer for {}", node_id)
            }
            Self::BadStatus { node_id, status_code } => {
                format!("Server rejected {} (0x{:08X})", node_id, status_code)
            }
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid node ID.
    #[error("Invalid node ID '{node_id}': {reason}")]
    InvalidNodeId {
        /// The invalid node ID string.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// Invalid endpoint.
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The endpoint.
        endpoint: String,
        /// Reason.
        reason: String,
    },

    /// Missing required field.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// Invalid security configuration.
    #[error("Invalid security configuration: {reason}")]
    InvalidSecurity {
        /// Reason.
        reason: String,
    },

    /// Invalid timeout value.
    #[error("Invalid timeout {duration:?}: {reason}")]
    InvalidTimeout {
        /// The timeout value.
        duration: Duration,
        /// Reason.
        reason: String,
    },

    /// Invalid value for a setting.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Reason.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid node ID error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid security error.
    pub fn invalid_security(reason: impl Into<String>) -> Self {
        Self::InvalidSecurity {
            reason: reason.into(),
        }
    }

    /// Creates an invalid timeout error.
    pub fn invalid_timeout(duration: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            duration,
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidNodeId { .. } => ErrorCode::new(4, 1),
            Self::InvalidEndpoint { .. } => ErrorCode::new(4, 2),
            Self::MissingField { .. } => ErrorCode::new(4, 3),
            Self::InvalidSecurity { .. } => ErrorCode::new(4, 4),
            Self::InvalidTimeout { .. } => ErrorCode::new(4, 5),
            Self::InvalidValue { .. } => ErrorCode::new(4, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidNodeId { .. } => vec![
                "Use format: ns=<namespace>;<type>=<value>",
                "Types: i=numeric, s=string, g=guid, b=opaque",
            ],
            Self::InvalidEndpoint { .. } => vec!["Use format: opc.tcp://hostname:port/path"],
            Self::MissingField { .. } => vec!["Add the missing field to the configuration"],
            Self::InvalidSecurity { .. } => vec![
                "Security mode and policy must both be None or both be set",
            ],
            Self::InvalidTimeout { .. } => vec!["Use a positive duration such as \"30s\""],
            Self::InvalidValue { .. } => vec!["Check the configuration reference"],
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, expected in normal operation.
    Info,
    /// Recoverable by the user.
    Warning,
    /// The operation failed.
    Error,
    /// The client cannot work with this setup.
    Critical,
}

impl ErrorSeverity {
    /// Converts to a tracing level.
    pub fn to_tracing_level(&self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code in the form `OPCUA-<category>-<number>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category number.
    pub category: u8,
    /// Error number within the category.
    pub number: u16,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OPCUA-{}-{:03}", self.category, self.number)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result type for OPC UA client operations.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// Tests
// =============================================================================
