use crate::common::Float;
use crate::error::MathError;
use logos::Logos;
use logos_iter::{LogosIter, PeekableLexer};

type Lexer<'source> = PeekableLexer<'source, logos::Lexer<'source, MathToken>, MathToken>;

#[derive(Logos, Debug, Copy, Clone, PartialEq)]
enum MathToken {
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse())]
    Number(Float),
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[regex(r"[ \t]+", logos::skip)]
    #[error]
    Error,
}

/// Evaluates a flat arithmetic expression. Division by zero is not an error
/// here; it yields a non-finite value the caller is expected to reject.
pub(crate) fn eval(input: &str) -> Result<Float, MathError> {
    let mut parser = Parser {
        lexer: MathToken::lexer(input).peekable_lexer(),
    };
    let value = parser.addition()?;
    match parser.lexer.next() {
        None => Ok(value),
        Some(_) => Err(MathError::TrailingInput(parser.lexer.slice().to_string())),
    }
}

struct Parser<'source> {
    lexer: Lexer<'source>,
}

impl Parser<'_> {
    fn addition(&mut self) -> Result<Float, MathError> {
        let mut lhs = self.multiplication()?;
        loop {
            match self.lexer.peek() {
                Some(MathToken::Plus) => {
                    self.lexer.next();
                    lhs += self.multiplication()?;
                }
                Some(MathToken::Minus) => {
                    self.lexer.next();
                    lhs -= self.multiplication()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn multiplication(&mut self) -> Result<Float, MathError> {
        let mut lhs = self.unary()?;
        loop {
            match self.lexer.peek() {
                Some(MathToken::Star) => {
                    self.lexer.next();
                    lhs *= self.unary()?;
                }
                Some(MathToken::Slash) => {
                    self.lexer.next();
                    lhs /= self.unary()?;
                }
                Some(MathToken::Percent) => {
                    self.lexer.next();
                    lhs %= self.unary()?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Float, MathError> {
        match self.lexer.peek() {
            Some(MathToken::Plus) => {
                self.lexer.next();
                self.unary()
            }
            Some(MathToken::Minus) => {
                self.lexer.next();
                Ok(-self.unary()?)
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Float, MathError> {
        match self.lexer.next() {
            Some(MathToken::Number(value)) => Ok(value),
            Some(MathToken::LeftParen) => {
                let value = self.addition()?;
                match self.lexer.next() {
                    Some(MathToken::RightParen) => Ok(value),
                    Some(_) => Err(self.unexpected()),
                    None => Err(MathError::UnexpectedEnd),
                }
            }
            Some(_) => Err(self.unexpected()),
            None => Err(MathError::UnexpectedEnd),
        }
    }

    fn unexpected(&self) -> MathError {
        MathError::UnexpectedToken {
            position: self.lexer.span().start,
            slice: self.lexer.slice().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(eval("10 % 4").unwrap(), 2.0);
    }

    #[test]
    fn test_unary_signs() {
        assert_eq!(eval("-3 + 5").unwrap(), 2.0);
        assert_eq!(eval("--5").unwrap(), 5.0);
        assert_eq!(eval("+2.5 * 2").unwrap(), 5.0);
    }

    #[test]
    fn test_division_by_zero_is_not_finite() {
        assert!(!eval("3 / 0").unwrap().is_finite());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(eval(""), Err(MathError::UnexpectedEnd)));
        assert!(matches!(eval("(1 + 2"), Err(MathError::UnexpectedEnd)));
        assert!(matches!(eval("1 2"), Err(MathError::TrailingInput(_))));
        assert!(matches!(
            eval("3.5.6"),
            Err(MathError::UnexpectedToken { .. }) | Err(MathError::TrailingInput(_))
        ));
    }
}
