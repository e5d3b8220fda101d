//! Knowledge-integration error types with rich miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use crate::error::GraphError;

#[derive(Debug, Error, Diagnostic)]
pub enum KnowledgeError {
    #[error("empty {what} description")]
    #[diagnostic(
        code(cogcore::knowledge::empty_description),
        help("Knowledge items are named by their description; pass a non-empty string.")
    )]
    EmptyDescription { what: &'static str },

    #[error("unsupported export format: \"{format}\"")]
    #[diagnostic(
        code(cogcore::knowledge::unsupported_format),
        help("Supported export formats are \"json\" and \"text\".")
    )]
    UnsupportedFormat { format: String },

    #[error("unknown knowledge item: {item}")]
    #[diagnostic(
        code(cogcore::knowledge::unknown_item),
        help("The reference does not name an atom in the agent's graph store.")
    )]
    UnknownItem { item: u64 },

    #[error("export serialization failed: {message}")]
    #[diagnostic(
        code(cogcore::knowledge::serialize),
        help("This is a bug in the JSON export; please report it.")
    )]
    Serialize { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// Convenience alias for knowledge operations.
pub type KnowledgeResult<T> = std::result::Result<T, KnowledgeError>;
