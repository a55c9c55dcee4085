//!
//! # Overview
//!
//! This module defines the single error type for the testscope library and CLI. Every
//! fallible operation returns `ScopeError`, which carries a `miette` diagnostic code
//! (`testscope::<area>`) and, where useful, a help message.
//!
//! # Error Construction
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Contract, "ancestor title #{} is empty", index)`
//!
//! - **Wrap foreign errors with `From`.**
//!   `regex::Error`, `serde_json::Error`, `serde_yaml::Error` and `std::io::Error` convert
//!   with `?`.
//!
//! Decoding identifiers never produces an error; filtering only fails while compiling
//! patterns; reconciliation fails only on contract violations.

use miette::Diagnostic;
use thiserror::Error;

/// Type-safe error classification, mirroring the `ScopeError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A constructed pattern failed to compile
    Pattern,
    /// An input violated a documented tree or result contract
    Contract,
    /// Settings could not be parsed
    Config,
    /// Reading input failed
    Io,
    /// An input document was not valid JSON for the expected shape
    Json,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Pattern => "Pattern",
            ErrorType::Contract => "Contract",
            ErrorType::Config => "Config",
            ErrorType::Io => "Io",
            ErrorType::Json => "Json",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type for every testscope failure mode.
#[derive(Debug, Error, Diagnostic)]
pub enum ScopeError {
    #[error("Pattern error: {message}")]
    #[diagnostic(
        code(testscope::pattern),
        help("patterns are built from escaped identifiers; a very large selection can exceed the regex size limit")
    )]
    Pattern {
        message: String,
        #[source]
        source: Option<regex::Error>,
    },

    #[error("Contract violation: {message}")]
    #[diagnostic(code(testscope::contract))]
    Contract { message: String },

    #[error("Config error: {message}")]
    #[diagnostic(
        code(testscope::config),
        help("expected keys: matchMode (literal | regex), pathNormalization (exact | driveLetter | caseInsensitive)")
    )]
    Config {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    #[error("I/O error: {message}")]
    #[diagnostic(code(testscope::io))]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    #[diagnostic(code(testscope::json))]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl ScopeError {
    /// Returns the classification of this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ScopeError::Pattern { .. } => ErrorType::Pattern,
            ScopeError::Contract { .. } => ErrorType::Contract,
            ScopeError::Config { .. } => ErrorType::Config,
            ScopeError::Io { .. } => ErrorType::Io,
            ScopeError::Json { .. } => ErrorType::Json,
        }
    }

    /// Attaches a human readable location (usually a file path) to the message.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            ScopeError::Pattern { message, source } => ScopeError::Pattern {
                message: format!("{context}: {message}"),
                source,
            },
            ScopeError::Contract { message } => ScopeError::Contract {
                message: format!("{context}: {message}"),
            },
            ScopeError::Config { message, source } => ScopeError::Config {
                message: format!("{context}: {message}"),
                source,
            },
            ScopeError::Io { message, source } => ScopeError::Io {
                message: format!("{context}: {message}"),
                source,
            },
            ScopeError::Json { message, source } => ScopeError::Json {
                message: format!("{context}: {message}"),
                source,
            },
        }
    }
}

impl From<regex::Error> for ScopeError {
    fn from(e: regex::Error) -> Self {
        ScopeError::Pattern {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

impl From<serde_yaml::Error> for ScopeError {
    fn from(e: serde_yaml::Error) -> Self {
        ScopeError::Config {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(e: serde_json::Error) -> Self {
        ScopeError::Json {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for ScopeError {
    fn from(e: std::io::Error) -> Self {
        ScopeError::Io {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

/// Constructs a message-only `ScopeError` variant.
///
/// Works for every variant; variants with a `source` field get `None`.
#[macro_export]
macro_rules! err_msg {
    (Contract, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::ScopeError::Contract {
            message: format!($msg, $($arg),+),
        }
    };
    (Contract, $msg:expr) => {
        $crate::ScopeError::Contract {
            message: format!("{}", $msg),
        }
    };
    ($variant:ident, $msg:expr, $($arg:expr),+ $(,)?) => {
        $crate::ScopeError::$variant {
            message: format!($msg, $($arg),+),
            source: None,
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::ScopeError::$variant {
            message: format!("{}", $msg),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_contract_error_renders_code() {
        let err = err_msg!(Contract, "ancestor title #{} is empty", 2);
        assert_eq!(err.error_type(), ErrorType::Contract);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("testscope::contract"));
        assert!(output.contains("ancestor title #2 is empty"));
    }

    #[test]
    fn test_config_error_carries_help() {
        let yaml_err = serde_yaml::from_str::<u32>("not: [a number").unwrap_err();
        let err = ScopeError::from(yaml_err).with_context("scope.yaml");
        assert_eq!(err.error_type(), ErrorType::Config);
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("scope.yaml"));
        assert!(output.contains("matchMode"));
    }

    #[test]
    fn test_message_only_pattern_error() {
        let err = err_msg!(Pattern, "too large");
        assert!(matches!(err, ScopeError::Pattern { source: None, .. }));
        assert_eq!(err.to_string(), "Pattern error: too large");
    }
}
