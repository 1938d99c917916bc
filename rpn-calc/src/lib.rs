//! Arithmetic expression evaluation in three stages: the tokenizer splits
//! the source into tokens, the converter reorders them into Reverse Polish
//! Notation with the shunting-yard algorithm, and the evaluator reduces the
//! RPN sequence to a single `f64`.
//!
//! ```
//! let tokens = rpn_calc::tokenize("(3 + 4) * 2").unwrap();
//! let rpn = rpn_calc::to_postfix(&tokens).unwrap();
//! assert_eq!(rpn_calc::evaluate(&rpn).unwrap(), 14.0);
//! ```

pub mod builtins;
pub mod ffi;
pub mod rpn_converter;
pub mod rpn_evaluator;
pub mod tokenizer;

pub use builtins::Builtin;
pub use rpn_converter::{RPNConverterError, RPNExpr, RpnConverter};
pub use rpn_evaluator::{RpnEvaluator, RpnEvaluatorError};
pub use tokenizer::{Token, TokenKind, TokenizedInput, Tokenizer, TokenizerError};

/// Failure of any pipeline stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("failed to tokenize the input: {0}")]
    Tokenize(#[from] TokenizerError),
    #[error("failed to convert the input to RPN: {0}")]
    Convert(#[from] RPNConverterError),
    #[error("failed to evaluate the RPN expression: {0}")]
    Evaluate(#[from] RpnEvaluatorError),
}

impl Error {
    /// Whether the error points at a bug in the pipeline rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Evaluate(e) if e.is_internal())
    }

    /// Process exit status for this error, shared by the CLI and the C ABI.
    pub fn status_code(&self) -> i32 {
        match self {
            _ if self.is_internal() => 70,
            Error::Tokenize(_) => 3,
            Error::Convert(_) => 4,
            Error::Evaluate(_) => 5,
        }
    }
}

pub fn tokenize(source: &str) -> Result<TokenizedInput<'_>, TokenizerError> {
    Tokenizer::new(source).tokenize()
}

pub fn to_postfix<'a>(tokens: &TokenizedInput<'a>) -> Result<RPNExpr<'a>, RPNConverterError> {
    RpnConverter::convert(tokens)
}

pub fn evaluate(postfix: &RPNExpr) -> Result<f64, RpnEvaluatorError> {
    RpnEvaluator::evaluate(postfix)
}

/// Runs the whole pipeline on `source`.
pub fn eval_str(source: &str) -> Result<f64, Error> {
    let tokens = tokenize(source)?;
    tracing::debug!("tokens:\n{}", tokens);

    let rpn = to_postfix(&tokens)?;
    tracing::debug!("RPN:\n{}", rpn);

    Ok(evaluate(&rpn)?)
}
