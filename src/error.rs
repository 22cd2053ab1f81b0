//! # Error Handling
//!
//! Error types for the photo-to-poetry workflow.
//!
//! ## Error Classification
//!
//! Every failure the workflow can produce falls into one of three groups:
//!
//! - **Precondition**: a stage was triggered before the stage it depends on
//!   produced its output. No network call is made; the user sees a notice.
//! - **Transport**: the backend could not be reached, timed out, answered with
//!   a non-success status, or sent something that is not JSON.
//! - **Protocol**: the backend answered with well-formed JSON that lacks the
//!   field the stage needs.
//!
//! Local failures (camera, file, image encoding, configuration) get their own
//! variants so callers can decide how loudly to report them.
//!
//! ## Usage
//!
//! ```rust
//! use photo_poetry::error::{PoetryError, HasRecoverySuggestion};
//! use photo_poetry::session::Stage;
//!
//! let error = PoetryError::missing_field(Stage::Caption, "caption")
//!     .with_recovery_suggestion("Check that the captioning service is running");
//!
//! assert_eq!(error.category(), "missing_field");
//! assert!(error.recovery_suggestion().is_some());
//! ```

use std::{error::Error as StdError, fmt};

use crate::session::Stage;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, e.g. a stage triggered too early
    Info,
    /// Something went wrong but the user can simply try again
    Warning,
    /// The operation failed
    Error,
}

/// How an error should be presented and what the user can do about it
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the severity, builder style
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Base error type for the photo-to-poetry client
#[derive(Debug)]
pub enum PoetryError {
    /// A stage was triggered before its input exists
    Precondition {
        stage: Stage,
        notice: &'static str,
        context: ErrorContext,
    },
    /// The request never produced a response
    Network {
        operation: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
    /// The request exceeded the configured timeout
    Timeout {
        operation: String,
        context: ErrorContext,
    },
    /// The backend answered with a non-success status
    Backend {
        operation: String,
        status: u16,
        message: Option<String>,
        context: ErrorContext,
    },
    /// The response body could not be interpreted
    Decode {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// A well-formed response lacks the field the stage needs
    MissingField {
        stage: Stage,
        field: &'static str,
        context: ErrorContext,
    },
    /// The camera or file source failed to produce bytes
    Capture {
        source_kind: String,
        reason: String,
        context: ErrorContext,
    },
    /// Image sniffing, decoding, resizing or encoding failed
    Image {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
}

/// Result alias used across the library
pub type PoetryResult<T> = Result<T, PoetryError>;

impl PoetryError {
    /// Create a precondition error carrying the user-facing notice
    pub fn precondition(stage: Stage, notice: &'static str) -> Self {
        Self::Precondition {
            stage,
            notice,
            context: ErrorContext::new().with_severity(ErrorSeverity::Info),
        }
    }

    /// Create a transport error
    pub fn network(
        operation: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            operation: operation.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create an error for a non-success HTTP status
    pub fn backend(operation: impl Into<String>, status: u16, message: Option<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            status,
            message,
            context: ErrorContext::new(),
        }
    }

    /// Create a response decoding error
    pub fn decode(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an error for a response missing its payload field
    pub fn missing_field(stage: Stage, field: &'static str) -> Self {
        Self::MissingField {
            stage,
            field,
            context: ErrorContext::new(),
        }
    }

    /// Create a capture source error
    pub fn capture(source_kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Capture {
            source_kind: source_kind.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an image processing error
    pub fn image(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Image {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Attach the path involved in an I/O error
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Precondition { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Backend { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::MissingField { context, .. } => context,
            Self::Capture { context, .. } => context,
            Self::Image { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Precondition { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Backend { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::MissingField { context, .. } => context,
            Self::Capture { context, .. } => context,
            Self::Image { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Precondition { .. } => "precondition",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Backend { .. } => "backend",
            Self::Decode { .. } => "decode",
            Self::MissingField { .. } => "missing_field",
            Self::Capture { .. } => "capture",
            Self::Image { .. } => "image",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    /// Whether this is a "do the previous step first" error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    /// Text for the blocking alert shown to the user.
    ///
    /// Precondition notices are returned verbatim; everything else is the
    /// `Display` rendering, which names the failed operation.
    pub fn notice(&self) -> String {
        match self {
            Self::Precondition { notice, .. } => (*notice).to_string(),
            Self::Backend {
                message: Some(message),
                ..
            } => format!("{}: {}", self.operation_label(), message),
            other => other.to_string(),
        }
    }

    /// The notice followed by what the user can do about it.
    ///
    /// Precondition notices carry no suggestion and come back unchanged.
    pub fn alert_text(&self) -> String {
        let mut text = self.notice();
        if let Some(suggestion) = self.recovery_suggestion() {
            text.push('\n');
            text.push_str(suggestion);
        }
        if classify::is_transient(self) {
            text.push_str("\nPlease try again.");
        }
        text
    }

    fn operation_label(&self) -> &str {
        match self {
            Self::Network { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Backend { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Image { operation, .. }
            | Self::Io { operation, .. } => operation.as_str(),
            Self::Precondition { stage, .. } | Self::MissingField { stage, .. } => stage.label(),
            Self::Capture { source_kind, .. } => source_kind.as_str(),
            Self::Config { field, .. } => field.as_str(),
        }
    }
}

impl fmt::Display for PoetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoetryError::Precondition { stage, notice, .. } => {
                write!(f, "Cannot start {}: {}", stage.label(), notice)
            }
            PoetryError::Network {
                operation, source, ..
            } => {
                write!(f, "Network error during {}: {}", operation, source)
            }
            PoetryError::Timeout { operation, .. } => {
                write!(f, "Timed out waiting for {}", operation)
            }
            PoetryError::Backend {
                operation,
                status,
                message,
                ..
            } => {
                if let Some(message) = message {
                    write!(
                        f,
                        "Backend rejected {} (status {}): {}",
                        operation, status, message
                    )
                } else {
                    write!(f, "Backend rejected {} (status {})", operation, status)
                }
            }
            PoetryError::Decode {
                operation, reason, ..
            } => {
                write!(f, "Invalid response to {}: {}", operation, reason)
            }
            PoetryError::MissingField { stage, field, .. } => {
                write!(
                    f,
                    "Response to {} did not contain '{}'",
                    stage.label(),
                    field
                )
            }
            PoetryError::Capture {
                source_kind,
                reason,
                ..
            } => {
                write!(f, "Capture from {} failed: {}", source_kind, reason)
            }
            PoetryError::Image {
                operation, reason, ..
            } => {
                write!(f, "Image {} failed: {}", operation, reason)
            }
            PoetryError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            PoetryError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
        }
    }
}

impl StdError for PoetryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Network { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for PoetryError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for PoetryError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Failures that may go away if the user simply triggers the stage again
    pub fn is_transient(error: &PoetryError) -> bool {
        matches!(
            error,
            PoetryError::Network { .. } | PoetryError::Timeout { .. }
        ) || matches!(error, PoetryError::Backend { status, .. } if *status >= 500)
    }
}

impl From<std::io::Error> for PoetryError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<image::ImageError> for PoetryError {
    fn from(error: image::ImageError) -> Self {
        Self::image("processing", error.to_string())
    }
}

impl From<base64::DecodeError> for PoetryError {
    fn from(error: base64::DecodeError) -> Self {
        Self::image("base64 decoding", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_notice_is_verbatim() {
        let error = PoetryError::precondition(Stage::Upload, "Capture an image first!");
        assert_eq!(error.category(), "precondition");
        assert_eq!(error.notice(), "Capture an image first!");
        assert_eq!(error.severity(), ErrorSeverity::Info);
        assert!(error.is_precondition());
    }

    #[test]
    fn test_backend_notice_uses_server_message() {
        let error = PoetryError::backend("caption request", 404, Some("Caption not found".into()));
        assert_eq!(error.notice(), "caption request: Caption not found");
        assert_eq!(
            error.to_string(),
            "Backend rejected caption request (status 404): Caption not found"
        );
    }

    #[test]
    fn test_alert_text_appends_suggestion() {
        let error = PoetryError::capture("camera", "ffmpeg not found")
            .with_recovery_suggestion("Install ffmpeg and make sure it is on PATH");

        assert_eq!(error.recovery_suggestion(), Some("Install ffmpeg and make sure it is on PATH"));
        assert_eq!(
            error.alert_text(),
            "Capture from camera failed: ffmpeg not found\nInstall ffmpeg and make sure it is on PATH"
        );
    }

    #[test]
    fn test_alert_text_for_precondition_is_the_notice() {
        let error = PoetryError::precondition(Stage::Caption, "Upload an image first!");
        assert_eq!(error.alert_text(), "Upload an image first!");
    }

    #[test]
    fn test_alert_text_asks_to_retry_transient_failures() {
        let error = PoetryError::timeout("poem request");
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert_eq!(
            error.alert_text(),
            "Timed out waiting for poem request\nPlease try again."
        );

        let rejected = PoetryError::backend("caption request", 404, Some("Caption not found".into()));
        assert!(!rejected.alert_text().contains("try again"));
    }

    #[test]
    fn test_io_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = PoetryError::io("reading image", io).with_path("/tmp/cat.png");
        assert!(error.source().is_some());
        assert!(error.to_string().contains("/tmp/cat.png"));
    }

    #[test]
    fn test_error_classification() {
        let timeout = PoetryError::timeout("poem request");
        assert!(classify::is_transient(&timeout));

        let server = PoetryError::backend("upload", 500, None);
        assert!(classify::is_transient(&server));

        let not_found = PoetryError::backend("caption request", 404, None);
        assert!(!classify::is_transient(&not_found));

        let missing = PoetryError::precondition(Stage::Poetry, "Generate a caption first!");
        assert!(!classify::is_transient(&missing));
    }
}
