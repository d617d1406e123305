//! Error taxonomy for the edit pipeline.
//!
//! Only the policy failures live here. Missing or unreadable inputs are I/O
//! concerns and are reported by the binary with `anyhow` context.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    /// The keyword set was empty after trimming.
    #[error("no keywords found; an edit pass needs at least one keyword")]
    NoKeywords,

    /// The scanner found no structural block of any kind.
    #[error("no structural blocks found (no sections, functions, loops or case statements)")]
    NoStructure,

    #[error("invalid substitution rule '{from}' -> '{to}': {reason}")]
    InvalidSubstitution {
        from: String,
        to: String,
        reason: &'static str,
    },
}
