//! Arithmetic evaluator backing the `calculate` tool
//!
//! A small recursive-descent parser over numeric literals, `+ - * /`, unary
//! signs and parentheses. Nothing else is representable, so no input can reach
//! anything but arithmetic.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | '(' expr ')'
//! ```

use thiserror::Error;

/// Bound on parenthesis and unary-sign nesting.
pub const MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalcError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter { found: char, position: usize },
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expression nesting exceeds {MAX_NESTING_DEPTH} levels")]
    TooDeep,
    #[error("result is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some((position, _)) = parser.peek() {
        return Err(CalcError::UnexpectedToken(position));
    }

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

fn tokenize(expression: &str) -> Result<Vec<(usize, Token)>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some((position, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if !(next.is_ascii_digit() || next == '.') {
                        break;
                    }
                    literal.push(next);
                    chars.next();
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.clone()))?;
                Token::Number(value)
            }
            found => return Err(CalcError::UnexpectedCharacter { found, position }),
        };
        tokens.push((position, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, Token)> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let next = self.peek();
        if next.is_some() {
            self.cursor += 1;
        }
        next
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(CalcError::TooDeep);
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some((_, token @ (Token::Plus | Token::Minus))) = self.peek() {
            self.cursor += 1;
            let rhs = self.term()?;
            value = if token == Token::Plus {
                value + rhs
            } else {
                value - rhs
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some((_, token @ (Token::Star | Token::Slash))) = self.peek() {
            self.cursor += 1;
            let rhs = self.unary()?;
            value = if token == Token::Star {
                value * rhs
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some((_, Token::Plus)) => {
                self.cursor += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            Some((_, Token::Minus)) => {
                self.cursor += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(-value)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance() {
            Some((_, Token::Number(value))) => Ok(value),
            Some((_, Token::LeftParen)) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some((_, Token::RightParen)) => Ok(value),
                    Some((position, _)) => Err(CalcError::UnexpectedToken(position)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some((position, _)) => Err(CalcError::UnexpectedToken(position)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}
