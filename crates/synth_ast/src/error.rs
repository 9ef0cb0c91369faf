//! Error types for synth_ast.

use thiserror::Error;

/// Arithmetic domain failures from the exact value primitive.
///
/// These are raised when an operation is mathematically undefined for its
/// operands, as opposed to producing zero or any other value. Callers that
/// try speculative combinations (the dictionary merge, the proof search)
/// catch these locally and move on to the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("invalid numeral '{0}'")]
    InvalidNumeral(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo undefined for {0} % {1}")]
    UndefinedModulo(String, String),
    #[error("power undefined for {0} ^ {1}")]
    UndefinedPower(String, String),
}

/// Errors from reconstructing nodes out of their serialized form.
#[derive(Error, Debug)]
pub enum AstError {
    #[error("unknown operator '{op}' with {arity} children")]
    UnknownOperator { op: String, arity: usize },
    #[error("operator node with no children")]
    EmptyOperator,
    #[error(transparent)]
    Value(#[from] ValueError),
}
