#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    Plus,
    Minus,
    Multiply,
    Divide,
    OpenParen,
    CloseParen,
    Function,
    KeywordPi,
    KeywordE,
    EndOfInput,
    /// Prefix minus. Never produced by the tokenizer; the converter turns a
    /// `Minus` in operand position into this.
    Negate,
}

impl TokenKind {
    /// Name used when dumping token lists.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;

        match self {
            Number => "TOKEN_NUMBER",
            Plus => "TOKEN_OPERATOR_PLUS",
            Minus => "TOKEN_OPERATOR_MINUS",
            Multiply => "TOKEN_OPERATOR_MULTIPLY",
            Divide => "TOKEN_OPERATOR_DIVIDE",
            OpenParen => "TOKEN_OPEN_PARENTHESIS",
            CloseParen => "TOKEN_CLOSED_PARENTHESIS",
            Function => "TOKEN_FUNCTION",
            KeywordPi => "TOKEN_KEYWORD_PI",
            KeywordE => "TOKEN_KEYWORD_E",
            EndOfInput => "TOKEN_EOF",
            Negate => "TOKEN_OPERATOR_NEGATE",
        }
    }

    pub fn is_binary_op(self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Multiply | TokenKind::Divide
        )
    }
}

/// A lexeme borrowed from the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Exact source text of the lexeme. Empty for `EndOfInput`.
    pub text: &'a str,
    /// Byte offset of the lexeme in the source.
    pub pos: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, pos: usize) -> Self {
        Self { kind, text, pos }
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Token(type: {}, value: '{}')", self.kind.as_str(), self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizerError {
    #[error("invalid character at '{ch}' (offset {pos})")]
    UnexpectedCharacter { ch: char, pos: usize },
    #[error("invalid floating-point number at '{lexeme}' (offset {pos})")]
    InvalidDecimal { lexeme: String, pos: usize },
    #[error("invalid scientific notation at '{lexeme}' (offset {pos})")]
    InvalidExponent { lexeme: String, pos: usize },
    #[error("invalid character after number at '{lexeme}' (offset {pos})")]
    InvalidNumberSuffix { lexeme: String, pos: usize },
    #[error("invalid character after keyword at '{lexeme}' (offset {pos})")]
    InvalidKeywordSuffix { lexeme: String, pos: usize },
    #[error("invalid character after function at '{lexeme}' (offset {pos})")]
    InvalidFunctionSuffix { lexeme: String, pos: usize },
}

impl TokenizerError {
    /// The offending source text.
    pub fn lexeme(&self) -> String {
        use TokenizerError::*;

        match self {
            UnexpectedCharacter { ch, .. } => ch.to_string(),
            InvalidDecimal { lexeme, .. }
            | InvalidExponent { lexeme, .. }
            | InvalidNumberSuffix { lexeme, .. }
            | InvalidKeywordSuffix { lexeme, .. }
            | InvalidFunctionSuffix { lexeme, .. } => lexeme.clone(),
        }
    }

    /// Byte offset where the offending lexeme starts.
    pub fn pos(&self) -> usize {
        use TokenizerError::*;

        match self {
            UnexpectedCharacter { pos, .. }
            | InvalidDecimal { pos, .. }
            | InvalidExponent { pos, .. }
            | InvalidNumberSuffix { pos, .. }
            | InvalidKeywordSuffix { pos, .. }
            | InvalidFunctionSuffix { pos, .. } => *pos,
        }
    }
}

/// Token sequence terminated by exactly one `EndOfInput`.
#[derive(Debug, PartialEq, Clone)]
pub struct TokenizedInput<'a>(pub Vec<Token<'a>>);

impl<'a> std::ops::Deref for TokenizedInput<'a> {
    type Target = Vec<Token<'a>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for TokenizedInput<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for token in self.iter() {
            writeln!(f, "{}", token)?;
        }
        Ok(())
    }
}

/// Single-pass scanner over an expression string.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

/// Characters that may legally follow a number or a keyword.
fn is_delimiter(b: Option<u8>) -> bool {
    match b {
        None => true,
        Some(b) => matches!(b, b' ' | b'+' | b'-' | b'*' | b'/' | b'(' | b')'),
    }
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + offset).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    /// Source text from `start` up to and including the character at `at`.
    ///
    /// `at` must be a char boundary; at end of input the slice stops there.
    fn lexeme_through(&self, start: usize, at: usize) -> String {
        let end = self.src[at..]
            .chars()
            .next()
            .map_or(self.src.len(), |c| at + c.len_utf8());
        self.src[start..end].to_string()
    }

    fn scan_number(&mut self) -> Result<Token<'a>, TokenizerError> {
        let start = self.pos;
        self.eat_while(|b| b.is_ascii_digit());

        if self.peek() == Some(b'.') {
            if !self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
                return Err(TokenizerError::InvalidDecimal {
                    lexeme: self.lexeme_through(start, self.pos + 1),
                    pos: start,
                });
            }
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }

        if self.peek() == Some(b'E') {
            match (self.peek_at(1), self.peek_at(2)) {
                (Some(b'+' | b'-'), Some(b'0'..=b'9')) => {
                    self.pos += 2;
                    self.eat_while(|b| b.is_ascii_digit());
                }
                (Some(b'+' | b'-'), _) => {
                    return Err(TokenizerError::InvalidExponent {
                        lexeme: self.lexeme_through(start, self.pos + 2),
                        pos: start,
                    });
                }
                _ => {
                    return Err(TokenizerError::InvalidExponent {
                        lexeme: self.lexeme_through(start, self.pos + 1),
                        pos: start,
                    });
                }
            }
        }

        if !is_delimiter(self.peek()) {
            return Err(TokenizerError::InvalidNumberSuffix {
                lexeme: self.lexeme_through(start, self.pos),
                pos: start,
            });
        }

        Ok(Token::new(TokenKind::Number, &self.src[start..self.pos], start))
    }

    fn scan_identifier(&mut self) -> Result<Token<'a>, TokenizerError> {
        let start = self.pos;
        self.eat_while(|b| b.is_ascii_lowercase());
        let text = &self.src[start..self.pos];

        let keyword = match text {
            "e" => Some(TokenKind::KeywordE),
            "pi" => Some(TokenKind::KeywordPi),
            _ => None,
        };

        if let Some(kind) = keyword {
            if !is_delimiter(self.peek()) {
                return Err(TokenizerError::InvalidKeywordSuffix {
                    lexeme: self.lexeme_through(start, self.pos),
                    pos: start,
                });
            }
            return Ok(Token::new(kind, text, start));
        }

        // Whether the name is a known function is decided by the converter.
        if self.peek() != Some(b'(') {
            return Err(TokenizerError::InvalidFunctionSuffix {
                lexeme: self.lexeme_through(start, self.pos),
                pos: start,
            });
        }

        Ok(Token::new(TokenKind::Function, text, start))
    }

    /// Splits the whole source into tokens, or fails on the first lexical error.
    pub fn tokenize(mut self) -> Result<TokenizedInput<'a>, TokenizerError> {
        use TokenKind::*;

        let mut tokens = Vec::new();

        while let Some(b) = self.peek() {
            let single = match b {
                b'(' => Some(OpenParen),
                b')' => Some(CloseParen),
                b'+' => Some(Plus),
                b'-' => Some(Minus),
                b'*' => Some(Multiply),
                b'/' => Some(Divide),
                _ => None,
            };

            if let Some(kind) = single {
                tokens.push(Token::new(kind, &self.src[self.pos..self.pos + 1], self.pos));
                self.pos += 1;
                continue;
            }

            match b {
                b' ' => self.pos += 1,
                b'0'..=b'9' => tokens.push(self.scan_number()?),
                b'a'..=b'z' => tokens.push(self.scan_identifier()?),
                _ => {
                    let ch = self.src[self.pos..].chars().next().unwrap_or('\0');
                    return Err(TokenizerError::UnexpectedCharacter { ch, pos: self.pos });
                }
            }
        }

        tokens.push(Token::new(EndOfInput, "", self.src.len()));
        tracing::debug!(count = tokens.len(), "tokenized input");

        Ok(TokenizedInput(tokens))
    }
}
