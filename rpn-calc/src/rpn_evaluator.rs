use crate::builtins::{self, Builtin};
use crate::rpn_converter::RPNExpr;
use crate::tokenizer::{Token, TokenKind};

pub struct RpnEvaluator;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RpnEvaluatorError {
    #[error("divide by zero")]
    DivideByZero,
    #[error("{function}({arg}) is undefined")]
    Undefined { function: Builtin, arg: f64 },
    #[error("internal error: unknown function '{0}'")]
    UnknownFunction(String),
    #[error("internal error: invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("internal error: unexpected token '{0}' in RPN")]
    UnexpectedToken(String),
    #[error("internal error: evaluation stack underflow at '{0}'")]
    StackUnderflow(String),
    #[error("internal error: {remaining} values left on the evaluation stack")]
    MalformedStack { remaining: usize },
}

impl RpnEvaluatorError {
    /// Whether this error means the RPN sequence itself was malformed,
    /// as opposed to the expression being mathematically invalid.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            RpnEvaluatorError::DivideByZero | RpnEvaluatorError::Undefined { .. }
        )
    }
}

fn pop(stack: &mut Vec<f64>, token: &Token) -> Result<f64, RpnEvaluatorError> {
    stack
        .pop()
        .ok_or_else(|| RpnEvaluatorError::StackUnderflow(token.text.to_string()))
}

impl RpnEvaluator {
    /// Evaluates a postfix sequence. The sequence is not modified, so the
    /// same expression can be evaluated any number of times.
    pub fn evaluate(tokens: &RPNExpr) -> Result<f64, RpnEvaluatorError> {
        let result = Self::run(tokens);
        if let Err(e) = &result {
            if e.is_internal() {
                tracing::warn!(error = %e, "malformed RPN expression");
            }
        }
        result
    }

    fn run(tokens: &RPNExpr) -> Result<f64, RpnEvaluatorError> {
        use TokenKind::*;

        let mut eval_stack: Vec<f64> = Vec::with_capacity(tokens.len());

        for token in tokens.iter() {
            match token.kind {
                Number => {
                    let num: f64 = token
                        .text
                        .parse()
                        .map_err(|_| RpnEvaluatorError::InvalidNumber(token.text.to_string()))?;
                    eval_stack.push(num);
                }
                KeywordPi => eval_stack.push(builtins::PI),
                KeywordE => eval_stack.push(builtins::E),
                Plus | Minus | Multiply | Divide => {
                    let b = pop(&mut eval_stack, token)?;
                    let a = pop(&mut eval_stack, token)?;
                    let result = match token.kind {
                        Plus => a + b,
                        Minus => a - b,
                        Multiply => a * b,
                        _ => {
                            if b == 0.0 {
                                return Err(RpnEvaluatorError::DivideByZero);
                            }
                            a / b
                        }
                    };
                    tracing::trace!(a, b, op = token.text, result, "binary op");
                    eval_stack.push(result);
                }
                Negate => {
                    let a = pop(&mut eval_stack, token)?;
                    eval_stack.push(-a);
                }
                Function => {
                    let function = Builtin::from_name(token.text)
                        .ok_or_else(|| RpnEvaluatorError::UnknownFunction(token.text.to_string()))?;
                    let arg = pop(&mut eval_stack, token)?;
                    let result = function
                        .apply(arg)
                        .ok_or(RpnEvaluatorError::Undefined { function, arg })?;
                    tracing::trace!(%function, arg, result, "function");
                    eval_stack.push(result);
                }
                OpenParen | CloseParen | EndOfInput => {
                    return Err(RpnEvaluatorError::UnexpectedToken(token.kind.as_str().to_string()));
                }
            }
        }

        match eval_stack.as_slice() {
            [result] => Ok(*result),
            rest => Err(RpnEvaluatorError::MalformedStack {
                remaining: rest.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpn_converter::RpnConverter;
    use crate::tokenizer::Tokenizer;
    use TokenKind::*;

    fn tok(kind: TokenKind, text: &str) -> Token<'_> {
        Token::new(kind, text, 0)
    }

    fn eval(input: &str) -> Result<f64, RpnEvaluatorError> {
        let tokens = Tokenizer::new(input).tokenize().unwrap();
        let rpn = RpnConverter::convert(&tokens).unwrap();
        RpnEvaluator::evaluate(&rpn)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_rpn_evaluator() {
        let tokens = RPNExpr(vec![tok(Number, "1"), tok(Number, "2"), tok(Plus, "+")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), 3.0);

        let tokens = RPNExpr(vec![tok(Number, "1"), tok(Number, "2"), tok(Minus, "-")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), -1.0);

        let tokens = RPNExpr(vec![tok(Number, "2"), tok(Number, "3"), tok(Multiply, "*")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), 6.0);

        let tokens = RPNExpr(vec![tok(Number, "7"), tok(Number, "2"), tok(Divide, "/")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), 3.5);

        let tokens = RPNExpr(vec![tok(Number, "2.5E+2")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), 250.0);

        let tokens = RPNExpr(vec![tok(KeywordPi, "pi"), tok(KeywordE, "e"), tok(Minus, "-")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap(),
            builtins::PI - builtins::E
        );
    }

    #[test]
    fn test_convert_to_rpn_and_eval() {
        assert_eq!(eval("3 + 4 * 2").unwrap(), 11.0);
        assert_eq!(eval("(3 + 4) * 2").unwrap(), 14.0);
        assert_eq!(eval("10 - 2 - 3").unwrap(), 5.0);
        assert_eq!(eval("2 * 3 + 4").unwrap(), 10.0);
        assert_eq!(eval("100 / 10 / 5").unwrap(), 2.0);
        assert_eq!(eval("1.5E+3 - 5E-1").unwrap(), 1499.5);
        assert_eq!(eval("-2 * 3").unwrap(), -6.0);
        assert_eq!(eval("4 - -(1 + 1)").unwrap(), 6.0);
        assert_close(eval("sin(0)").unwrap(), 0.0);
        assert_close(eval("cos(pi)").unwrap(), -1.0);
        assert_close(eval("ln(e * e)").unwrap(), 2.0);
        assert_close(eval("log(1000) + exp(0)").unwrap(), 4.0);
        assert_close(eval("atan(1) * 4").unwrap(), builtins::PI);
        assert_close(eval("asin(1) - acos(0)").unwrap(), 0.0);
        assert_close(eval("sec(0) + csc(pi / 2) + cot(pi / 4)").unwrap(), 3.0);
    }

    #[test]
    fn test_negative_zero_denominator() {
        assert_eq!(
            eval("1 / ((0 - 1) * 0)").unwrap_err(),
            RpnEvaluatorError::DivideByZero
        );
    }

    #[test]
    fn test_rpn_evaluator_divide_by_zero() {
        let err = eval("1 / 0").unwrap_err();
        assert_eq!(err, RpnEvaluatorError::DivideByZero);
        assert!(!err.is_internal());
        assert_eq!(eval("5 / (2 - 2)").unwrap_err(), RpnEvaluatorError::DivideByZero);
        assert_eq!(eval("0 / 5").unwrap(), 0.0);
    }

    #[test]
    fn test_rpn_evaluator_domain_errors() {
        assert_eq!(
            eval("log(-1)").unwrap_err(),
            RpnEvaluatorError::Undefined {
                function: Builtin::Log,
                arg: -1.0
            }
        );
        assert!(matches!(
            eval("tan(1.5707963268)").unwrap_err(),
            RpnEvaluatorError::Undefined {
                function: Builtin::Tan,
                ..
            }
        ));
        assert!(matches!(
            eval("ln(0)").unwrap_err(),
            RpnEvaluatorError::Undefined {
                function: Builtin::Ln,
                ..
            }
        ));
        assert!(matches!(
            eval("2 + asin(2)").unwrap_err(),
            RpnEvaluatorError::Undefined {
                function: Builtin::Asin,
                ..
            }
        ));
        assert!(!eval("cot(0)").unwrap_err().is_internal());
    }

    #[test]
    fn test_rpn_evaluator_internal_errors() {
        let tokens = RPNExpr(vec![tok(Number, "1"), tok(Plus, "+")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::StackUnderflow("+".to_string())
        );

        let tokens = RPNExpr(vec![tok(Function, "sin")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::StackUnderflow("sin".to_string())
        );

        let tokens = RPNExpr(vec![tok(Number, "1"), tok(Function, "sqrt")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::UnknownFunction("sqrt".to_string())
        );

        let tokens = RPNExpr(vec![tok(Number, "1"), tok(Number, "2")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::MalformedStack { remaining: 2 }
        );

        let tokens = RPNExpr(vec![]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::MalformedStack { remaining: 0 }
        );

        let tokens = RPNExpr(vec![tok(Number, "1"), tok(OpenParen, "(")]);
        let err = RpnEvaluator::evaluate(&tokens).unwrap_err();
        assert_eq!(
            err,
            RpnEvaluatorError::UnexpectedToken("TOKEN_OPEN_PARENTHESIS".to_string())
        );
        assert!(err.is_internal());

        let tokens = RPNExpr(vec![tok(Number, "1.2.3")]);
        assert_eq!(
            RpnEvaluator::evaluate(&tokens).unwrap_err(),
            RpnEvaluatorError::InvalidNumber("1.2.3".to_string())
        );
    }

    #[test]
    fn test_rpn_evaluator_zero_result_is_a_value() {
        let tokens = RPNExpr(vec![tok(Number, "0")]);
        assert_eq!(RpnEvaluator::evaluate(&tokens).unwrap(), 0.0);
    }

    #[test]
    fn test_rpn_evaluator_reuses_input() {
        let tokens = Tokenizer::new("(1 + 2) / 4 * pi").tokenize().unwrap();
        let rpn = RpnConverter::convert(&tokens).unwrap();
        let snapshot = rpn.clone();

        let first = RpnEvaluator::evaluate(&rpn).unwrap();
        let second = RpnEvaluator::evaluate(&rpn).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(rpn, snapshot);
    }
}
