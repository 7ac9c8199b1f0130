//! Common error infrastructure for sokol-core.
//!
//! Domain errors (`RegistryError`, `TreeError`, `StatError`, ...) live next to
//! the operations that raise them. This module holds what they share: a
//! severity classification and the [`SokolError`] trait.
//!
//! # Severity
//!
//! - **Recoverable**: expected control flow, e.g. a slot rejecting a candidate.
//!   The caller rejects the action and the tree stays untouched.
//! - **Validation**: malformed configuration caught at load/registration time.
//! - **Internal**: a component is missing data it is assumed to provide.
//! - **Fatal**: the content is authored inconsistently (missing system
//!   dependency); not meant to be caught by calling code.

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Expected rejection; retry with a different input.
    Recoverable,

    /// Invalid input or configuration; do not retry without changes.
    Validation,

    /// Unexpected inconsistency; indicates a bug in content or code.
    Internal,

    /// Unrecoverable, the operation must be aborted.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates a bug rather than bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all sokol-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait SokolError: std::error::Error {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
