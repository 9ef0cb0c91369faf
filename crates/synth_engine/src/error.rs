use synth_ast::{AstError, ValueError};
use thiserror::Error;

/// Externally visible engine failures.
///
/// Arithmetic domain errors never appear here: they are caught at the
/// single candidate attempt that produced them and treated as "try the
/// next candidate". Only the terminal outcomes of a whole search
/// propagate.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("cannot prove {target} within the given depth")]
    DepthExhausted { target: String },
    #[error("cannot prove {target}")]
    ProofNotFound { target: String },
    #[error("base digit string contains no digits")]
    EmptyBase,
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Ast(#[from] AstError),
    #[error("malformed dictionary export: {0}")]
    MalformedExport(String),
}
