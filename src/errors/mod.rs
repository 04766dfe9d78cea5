//! Error types for the stream parser.

use thiserror::Error;

/// Result type alias for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Main error type for the stream parser.
///
/// The taxonomy distinguishes errors that are recovered locally (a malformed
/// JSON payload yields an empty fragment and the stream continues), errors
/// that are surfaced to the consumer as the final stream item (a custom
/// parser reporting failure), and errors that are swallowed at the driver
/// level (source faults), which end the stream with no error item.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// A record payload could not be decoded as expected (invalid JSON,
    /// missing structure). Recovered locally in built-in extraction.
    #[error("Malformed payload: {message}")]
    MalformedPayload {
        /// Description of what failed to decode
        message: String,
    },

    /// A custom chunk parser reported failure. Surfaced to the consumer
    /// as the final emitted item, then the stream terminates.
    #[error("Parser error: {message}")]
    Parser {
        /// Error message reported by the parser
        message: String,
    },

    /// The byte-stream source failed mid-stream. Logged and swallowed;
    /// the consumer sees the stream end with no error item.
    #[error("Source error: {message}")]
    Source {
        /// Description of the source failure
        message: String,
    },

    /// Unexpected internal fault. Logged and swallowed like source errors.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal fault
        message: String,
    },
}

impl ParseError {
    /// Shorthand for a malformed-payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        ParseError::MalformedPayload {
            message: message.into(),
        }
    }

    /// Shorthand for a custom-parser error.
    pub fn parser(message: impl Into<String>) -> Self {
        ParseError::Parser {
            message: message.into(),
        }
    }

    /// Shorthand for a source error.
    pub fn source(message: impl Into<String>) -> Self {
        ParseError::Source {
            message: message.into(),
        }
    }

    /// Returns true if this error terminates the stream when it occurs
    /// during record processing.
    ///
    /// Only custom-parser errors reach the consumer through the value
    /// channel; malformed payloads are recovered, and source/internal
    /// faults are swallowed by the driver.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParseError::Parser { .. })
    }
}
