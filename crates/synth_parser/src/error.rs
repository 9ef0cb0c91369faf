use synth_ast::ValueError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("parse error: {0}")]
    NomError(String),
    #[error("unconsumed input: {0}")]
    UnconsumedInput(String),
    #[error(transparent)]
    Eval(#[from] ValueError),
}
