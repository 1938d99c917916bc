use crate::builtins::Builtin;
use crate::tokenizer::{Token, TokenKind, TokenizedInput};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RPNConverterError {
    #[error("invalid function name at '{name}' (offset {pos})")]
    UnknownFunction { name: String, pos: usize },
    #[error("mismatched parentheses: unexpected ')' at offset {pos}")]
    MismatchedClosingParen { pos: usize },
    #[error("mismatched parentheses: '(' at offset {pos} is never closed")]
    MismatchedOpeningParen { pos: usize },
    #[error("not enough operands for '{op}' at offset {pos}")]
    NotEnoughOperands { op: String, pos: usize },
    #[error("too many operands")]
    TooManyOperands,
    #[error("empty expression")]
    EmptyExpression,
}

impl RPNConverterError {
    pub fn is_mismatched_parens(&self) -> bool {
        matches!(
            self,
            RPNConverterError::MismatchedClosingParen { .. }
                | RPNConverterError::MismatchedOpeningParen { .. }
        )
    }
}

/// Postfix token sequence. Contains no parentheses and no `EndOfInput`.
#[derive(Debug, PartialEq, Clone)]
pub struct RPNExpr<'a>(pub Vec<Token<'a>>);

impl<'a> std::ops::Deref for RPNExpr<'a> {
    type Target = Vec<Token<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for RPNExpr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for token in self.iter() {
            writeln!(f, "{}", token)?;
        }
        Ok(())
    }
}

pub struct RpnConverter;

impl RpnConverter {
    /// Returns the precedence of an operator, 0 for anything else.
    ///
    /// Every binary operator is left-associative.
    fn precedence(kind: TokenKind) -> u8 {
        use TokenKind::*;

        match kind {
            Plus | Minus => 1,
            Multiply | Divide => 2,
            Negate => 3,
            _ => 0,
        }
    }

    /// A minus is a negation unless it follows something that yields a value.
    fn makes_unary(prev: Option<TokenKind>) -> bool {
        use TokenKind::*;

        !matches!(prev, Some(Number | KeywordPi | KeywordE | CloseParen))
    }

    /// Verifies that the RPN expression reduces to exactly one value.
    fn verify_rpn(tokens: &[Token]) -> Result<(), RPNConverterError> {
        use TokenKind::*;

        if tokens.is_empty() {
            return Err(RPNConverterError::EmptyExpression);
        }

        let mut n_operands = 0usize;
        for token in tokens {
            let needed = match token.kind {
                Number | KeywordPi | KeywordE => 0,
                Function | Negate => 1,
                _ => 2,
            };

            if n_operands < needed {
                return Err(RPNConverterError::NotEnoughOperands {
                    op: token.text.to_string(),
                    pos: token.pos,
                });
            }

            match token.kind {
                Number | KeywordPi | KeywordE => n_operands += 1,
                Function | Negate => (),
                _ => n_operands -= 1,
            }
        }

        if n_operands > 1 {
            return Err(RPNConverterError::TooManyOperands);
        }

        Ok(())
    }

    /// Converts infix notation to Reverse Polish Notation
    /// using the Shunting Yard algorithm.
    ///
    /// Conversion stops at the first `EndOfInput`.
    pub fn convert<'a>(tokens: &TokenizedInput<'a>) -> Result<RPNExpr<'a>, RPNConverterError> {
        use TokenKind::*;

        let mut output = Vec::with_capacity(tokens.len());
        let mut stack: Vec<Token<'a>> = Vec::new();
        let mut prev = None;

        for mut token in tokens.iter().copied() {
            if token.kind == Minus && RpnConverter::makes_unary(prev) {
                token.kind = Negate;
            }
            prev = Some(token.kind);

            match token.kind {
                Number | KeywordPi | KeywordE => output.push(token),
                Function => {
                    if Builtin::from_name(token.text).is_none() {
                        return Err(RPNConverterError::UnknownFunction {
                            name: token.text.to_string(),
                            pos: token.pos,
                        });
                    }
                    stack.push(token);
                }
                OpenParen | Negate => stack.push(token),
                CloseParen => {
                    let mut found = false;
                    while let Some(tok) = stack.pop() {
                        if tok.kind == OpenParen {
                            found = true;
                            break;
                        }
                        output.push(tok);
                    }

                    if !found {
                        return Err(RPNConverterError::MismatchedClosingParen { pos: token.pos });
                    }

                    // A function applies to the parenthesized group right after it.
                    if stack.last().is_some_and(|t| t.kind == Function) {
                        output.extend(stack.pop());
                    }
                }
                Plus | Minus | Multiply | Divide => {
                    let prec = RpnConverter::precedence(token.kind);
                    while let Some(top) = stack.last() {
                        let is_operator = top.kind.is_binary_op() || top.kind == Negate;
                        if !is_operator || RpnConverter::precedence(top.kind) < prec {
                            break;
                        }
                        output.extend(stack.pop());
                    }

                    stack.push(token);
                }
                EndOfInput => break,
            }
        }

        while let Some(tok) = stack.pop() {
            match tok.kind {
                OpenParen => {
                    return Err(RPNConverterError::MismatchedOpeningParen { pos: tok.pos });
                }
                CloseParen => {
                    return Err(RPNConverterError::MismatchedClosingParen { pos: tok.pos });
                }
                _ => output.push(tok),
            }
        }

        RpnConverter::verify_rpn(&output)?;
        tracing::debug!(count = output.len(), "converted to RPN");

        Ok(RPNExpr(output))
    }
}
