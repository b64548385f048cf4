// ABOUTME: Typed root causes for fatal failures of the replica identity run
// ABOUTME: Lets callers tell configuration problems apart from connection problems

use std::fmt;

/// Failures that abort a run before any table is processed.
///
/// Returned wrapped in `anyhow::Error`; use `downcast_ref::<IdentityError>()`
/// to inspect the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// A required connection parameter is missing or empty
    Config(String),
    /// The destination database could not be reached
    Connection(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IdentityError::Config(msg) => write!(f, "Configuration error: {}", msg),
            IdentityError::Connection(msg) => write!(f, "Connection error: {}", msg),
        }
    }
}

impl std::error::Error for IdentityError {}
