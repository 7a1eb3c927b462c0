// Event Engine Error Handling

use std::fmt;

use crate::asm::AsmError;
use crate::cc::CcError;

/// Errors raised by the load, build and authoring passes.
///
/// A `parse` miss is not an error: recognizers return `false` and the caller
/// moves on to the next candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum EventError {
    // Build-time faults, fatal to the current build
    WriteFault(String),
    CompileFault(String),

    // Authoring errors
    Metadata(String),
    UnknownEvent(String),

    // Image layout did not match the board definition
    MalformedImage(String),

    // Ambient
    Config(String),
    Io(String),
}

impl EventError {
    pub fn write_fault(msg: impl Into<String>) -> Self {
        EventError::WriteFault(msg.into())
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        EventError::Metadata(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        EventError::MalformedImage(msg.into())
    }

    /// Whether this error must abort the whole build.
    pub fn is_build_fault(&self) -> bool {
        matches!(
            self,
            EventError::WriteFault(_) | EventError::CompileFault(_)
        )
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventError::WriteFault(msg) => write!(f, "Write fault: {}", msg),
            EventError::CompileFault(msg) => write!(f, "Compile fault: {}", msg),
            EventError::Metadata(msg) => write!(f, "{}", msg),
            EventError::UnknownEvent(id) => write!(f, "Unknown event '{}'", id),
            EventError::MalformedImage(msg) => write!(f, "Malformed image: {}", msg),
            EventError::Config(msg) => write!(f, "Configuration error: {}", msg),
            EventError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for EventError {}

impl From<AsmError> for EventError {
    fn from(err: AsmError) -> Self {
        EventError::CompileFault(err.to_string())
    }
}

impl From<CcError> for EventError {
    fn from(err: CcError) -> Self {
        EventError::CompileFault(err.to_string())
    }
}

impl From<std::io::Error> for EventError {
    fn from(err: std::io::Error) -> Self {
        EventError::Io(err.to_string())
    }
}
