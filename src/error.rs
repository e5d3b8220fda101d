//! Rich diagnostic error types for the cogcore engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know what went wrong and how
//! to fix it. [`CoreError`] wraps them all for the composition root.

use miette::Diagnostic;
use thiserror::Error;

pub use crate::agent::error::AgentError;
pub use crate::knowledge::error::KnowledgeError;

/// Top-level error type for the cogcore engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the host.
#[derive(Debug, Error, Diagnostic)]
pub enum CoreError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("status serialization failed: {message}")]
    #[diagnostic(
        code(cogcore::status::serialize),
        help("This is a bug in the status snapshot types; please report it.")
    )]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Graph store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("unknown graph reference: {reference}")]
    #[diagnostic(
        code(cogcore::graph::unknown_ref),
        help(
            "The reference does not name an atom in this graph store. \
             References are only valid for the store that issued them."
        )
    )]
    UnknownRef { reference: u64 },

    #[error("edge has no members")]
    #[diagnostic(
        code(cogcore::graph::empty_edge),
        help("Pass at least one member reference when creating an edge.")
    )]
    EmptyEdge,

    #[error("reference {reference} is not an edge")]
    #[diagnostic(
        code(cogcore::graph::not_an_edge),
        help("Outgoing traversal is only defined for edge atoms.")
    )]
    NotAnEdge { reference: u64 },

    #[error("graph reference space exhausted")]
    #[diagnostic(
        code(cogcore::graph::exhausted),
        help("The store has allocated 2^64 - 1 references. Start a fresh store.")
    )]
    Exhausted,

    #[error("graph store fault: {message}")]
    #[diagnostic(
        code(cogcore::graph::store_fault),
        help("The underlying graph store reported a failure. The operation was not applied.")
    )]
    StoreFault { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(cogcore::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(cogcore::config::parse),
        help("Check the TOML syntax. Unknown sections are rejected; missing fields take defaults.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(cogcore::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for graph store operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Convenience alias for top-level operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
