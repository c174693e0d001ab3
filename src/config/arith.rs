//! Restricted arithmetic evaluation for config values.
//!
//! Accepts only numbers, parentheses, whitespace and the binary/unary
//! operators `+ - * /`. Anything else (letters, names, calls) is rejected
//! before evaluation, so no input can reach beyond plain arithmetic.
//!
//! Integer operands stay integers under `+ - *`; `/` is true division and
//! always yields a float.

use thiserror::Error;

/// Deepest unary/parenthesis nesting accepted.
const MAX_NESTING: usize = 256;

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ArithError {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("trailing input after expression")]
    Trailing,
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("invalid number literal {0:?}")]
    BadLiteral(String),
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ArithError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = if literal.contains('.') {
                    literal
                        .parse::<f64>()
                        .map(Number::Float)
                        .map_err(|_| ArithError::BadLiteral(literal.clone()))?
                } else {
                    literal
                        .parse::<i64>()
                        .map(Number::Int)
                        .map_err(|_| ArithError::BadLiteral(literal.clone()))?
                };
                tokens.push(Token::Num(number));
            }
            other => return Err(ArithError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Number, ArithError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            match op {
                Token::Plus | Token::Minus => {
                    self.next();
                    let rhs = self.term()?;
                    lhs = apply(&op, lhs, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Number, ArithError> {
        let mut lhs = self.factor()?;
        while let Some(op) = self.peek() {
            let op = op.clone();
            match op {
                Token::Star | Token::Slash => {
                    self.next();
                    let rhs = self.factor()?;
                    lhs = apply(&op, lhs, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn factor(&mut self) -> Result<Number, ArithError> {
        if self.depth >= MAX_NESTING {
            return Err(ArithError::TooDeep);
        }
        self.depth += 1;
        let value = self.unary();
        self.depth -= 1;
        value
    }

    // factor := ('+' | '-') factor | number | '(' expr ')'
    fn unary(&mut self) -> Result<Number, ArithError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Plus) => self.factor(),
            Some(Token::Minus) => match self.factor()? {
                Number::Int(i) => i.checked_neg().map(Number::Int).ok_or(ArithError::Overflow),
                Number::Float(f) => Ok(Number::Float(-f)),
            },
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(ArithError::Trailing),
                    None => Err(ArithError::UnexpectedEnd),
                }
            }
            Some(Token::RParen) => Err(ArithError::UnexpectedChar(')')),
            Some(Token::Star) => Err(ArithError::UnexpectedChar('*')),
            Some(Token::Slash) => Err(ArithError::UnexpectedChar('/')),
            None => Err(ArithError::UnexpectedEnd),
        }
    }
}

fn apply(op: &Token, lhs: Number, rhs: Number) -> Result<Number, ArithError> {
    if let Token::Slash = op {
        let divisor = rhs.as_f64();
        if divisor == 0.0 {
            return Err(ArithError::DivisionByZero);
        }
        return Ok(Number::Float(lhs.as_f64() / divisor));
    }

    match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => {
            let result = match op {
                Token::Plus => a.checked_add(b),
                Token::Minus => a.checked_sub(b),
                Token::Star => a.checked_mul(b),
                _ => None,
            };
            result.map(Number::Int).ok_or(ArithError::Overflow)
        }
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            let result = match op {
                Token::Plus => a + b,
                Token::Minus => a - b,
                _ => a * b,
            };
            Ok(Number::Float(result))
        }
    }
}

/// Evaluate a restricted arithmetic expression.
pub fn evaluate(input: &str) -> Result<Number, ArithError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ArithError::UnexpectedEnd);
    }

    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(ArithError::Trailing);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2*3"), Ok(Number::Int(6)));
        assert_eq!(evaluate("2+3*4"), Ok(Number::Int(14)));
        assert_eq!(evaluate("(2+3)*4"), Ok(Number::Int(20)));
        assert_eq!(evaluate("10 - 2 - 3"), Ok(Number::Int(5)));
    }

    #[test]
    fn test_division_is_true_division() {
        assert_eq!(evaluate("7/2"), Ok(Number::Float(3.5)));
        assert_eq!(evaluate("6/3"), Ok(Number::Float(2.0)));
        assert_eq!(evaluate("1/0"), Err(ArithError::DivisionByZero));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&deep), Err(ArithError::TooDeep));

        let shallow = format!("{}7{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&shallow), Ok(Number::Int(7)));
    }

    #[test]
    fn test_unary_and_floats() {
        assert_eq!(evaluate("-4+1"), Ok(Number::Int(-3)));
        assert_eq!(evaluate("-(2*3)"), Ok(Number::Int(-6)));
        assert_eq!(evaluate("1.5*2"), Ok(Number::Float(3.0)));
    }

    #[test]
    fn test_rejects_non_arithmetic() {
        assert!(evaluate("2*x").is_err());
        assert!(evaluate("__import__('os')").is_err());
        assert!(evaluate("2**3").is_err());
        assert!(evaluate("(1+2").is_err());
        assert!(evaluate("1 2").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert_eq!(evaluate("9223372036854775807+1"), Err(ArithError::Overflow));
    }
}
