//! Centralized error handling for the engine
//! Defines the error kinds, severity levels, and the `Result` alias

use std::fmt;

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational message (not really an error)
    Info,
    /// Warning - something might be wrong but the operation can continue
    Warning,
    /// Standard error - the operation failed but the engine can continue
    Error,
    /// Critical error - an internal invariant was violated
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Category of the error, per the error handling design
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An offset or range fell outside `[0, length]`
    OutOfRange,
    /// An operation required a non-empty document
    EmptyDocument,
    /// Regex compilation failed; search falls back to literal matching
    InvalidPattern,
    /// An internal invariant was violated
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "OutOfRange"),
            Self::EmptyDocument => write!(f, "EmptyDocument"),
            Self::InvalidPattern => write!(f, "InvalidPattern"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// A structured error raised by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    /// How serious the error is
    pub severity: ErrorSeverity,
    /// What kind of error occurred
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
}

impl EngineError {
    /// Create a new standard error (severity: Error)
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Error,
            kind,
            message: message.into(),
        }
    }

    /// Create a critical error (an invariant violation)
    pub fn critical(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Critical,
            kind,
            message: message.into(),
        }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfRange, message)
    }

    pub fn empty_document(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyDocument, message)
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPattern, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::critical(ErrorKind::Internal, message)
    }

    /// Check if the message contains a substring (useful for tests)
    pub fn contains_msg(&self, sub: &str) -> bool {
        self.message.contains(sub)
    }

    /// Log this error at a level matching its severity. Used on the
    /// `throw_on_error = false` path (see the error handling design).
    pub fn log(&self) {
        match self.severity {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                log::error!("[{}] {}", self.kind, self.message);
            }
            ErrorSeverity::Warning => log::warn!("[{}] {}", self.kind, self.message),
            ErrorSeverity::Info => log::info!("[{}] {}", self.kind, self.message),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

impl std::error::Error for EngineError {}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
