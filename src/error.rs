/// Internal failure taxonomy for the math rewriter. None of these escape a
/// public entry point; the rewriter maps them to the `(ERR)` / `(NaN)`
/// literal markers instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("unexpected input at position {position}: {slice:?}")]
    UnexpectedToken { position: usize, slice: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("trailing input after expression: {0:?}")]
    TrailingInput(String),
    #[error("unknown math function {0:?}")]
    UnknownFunction(String),
    #[error("{name} expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },
}
