use std::mem;

use thiserror::Error;

use crate::{
    ast::{CaseDirection, ExpressionNode, Operation, Token},
    lexer::{LexError, Lexer},
};

/// Errors raised while building an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found:?}")]
    UnexpectedToken { expected: String, found: Token },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{name} expects {expected}")]
    WrongArity { name: String, expected: &'static str },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
}

/// Parses a complete expression.
///
/// # Examples
///
/// ```
/// use treeq::ast::Operation;
/// use treeq::parser::parse_expression;
///
/// let expr = parse_expression(".name | trim").unwrap();
/// assert_eq!(expr.operation, Operation::Pipe);
/// ```
pub fn parse_expression(input: &str) -> Result<ExpressionNode, ParseError> {
    Parser::new(Lexer::new(input))?.parse()
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(format!("{:?}", expected)));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: self.current_token.clone(),
        }
    }

    /// Parse primary expressions: paths starting with '.', literals, '(' ')' and calls
    fn parse_primary(&mut self) -> Result<ExpressionNode, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Dot => {
                self.advance()?;
                self.parse_path_start()
            }
            // Literals
            Token::String(s) => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Interpolate(s)))
            }
            Token::Integer(n) => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Integer(n)))
            }
            Token::Float(n) => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Float(n)))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Boolean(b)))
            }
            Token::Null => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Null))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::Identifier(name) => {
                self.advance()?;
                self.parse_call(name)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("an expression"))
            }
        }
    }

    /// What may follow the leading '.' of a path: nothing, a key, or a bracket
    fn parse_path_start(&mut self) -> Result<ExpressionNode, ParseError> {
        match &self.current_token {
            Token::Identifier(_) | Token::String(_) => self.parse_key(),
            Token::LBracket => self.parse_bracket(),
            _ => Ok(ExpressionNode::leaf(Operation::SelfRef)),
        }
    }

    fn parse_key(&mut self) -> Result<ExpressionNode, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Identifier(name) | Token::String(name) => {
                self.advance()?;
                Ok(ExpressionNode::leaf(Operation::Traverse(name)))
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("a key"))
            }
        }
    }

    /// '[' ']' | '[' int ']' | '[' string ']'
    fn parse_bracket(&mut self) -> Result<ExpressionNode, ParseError> {
        self.expect(Token::LBracket)?;
        let expr = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::RBracket => {
                self.current_token = Token::RBracket;
                ExpressionNode::leaf(Operation::Iterate)
            }
            Token::Integer(n) => {
                self.advance()?;
                ExpressionNode::leaf(Operation::Index(n))
            }
            Token::String(key) => {
                self.advance()?;
                ExpressionNode::leaf(Operation::Traverse(key))
            }
            token => {
                self.current_token = token;
                return Err(self.unexpected("']', an index or a quoted key"));
            }
        };
        self.expect(Token::RBracket)?;
        Ok(expr)
    }

    /// Parse access chains: `.a.b[0][]`
    fn parse_access(&mut self) -> Result<ExpressionNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let step = if self.check(&Token::LBracket) {
                self.parse_bracket()?
            } else if self.check(&Token::Dot) {
                self.advance()?; // consume '.'
                match &self.current_token {
                    Token::LBracket => self.parse_bracket()?,
                    _ => self.parse_key()?,
                }
            } else {
                break;
            };
            expr = ExpressionNode::binary(Operation::Pipe, expr, step);
        }
        Ok(expr)
    }

    fn parse_call(&mut self, name: String) -> Result<ExpressionNode, ParseError> {
        let args = if self.check(&Token::LParen) {
            self.advance()?;
            let first = self.parse_expression()?;
            let args = if self.check(&Token::Semicolon) {
                self.advance()?;
                let second = self.parse_expression()?;
                vec![first, second]
            } else {
                vec![first]
            };
            self.expect(Token::RParen)?;
            args
        } else {
            vec![]
        };

        let arity = |expected: &'static str| ParseError::WrongArity {
            name: name.clone(),
            expected,
        };
        let no_args = |operation: Operation, args: Vec<ExpressionNode>| {
            if args.is_empty() {
                Ok(ExpressionNode::leaf(operation))
            } else {
                Err(arity("no arguments"))
            }
        };

        match name.as_str() {
            "trim" => no_args(Operation::Trim, args),
            "upcase" => no_args(Operation::ChangeCase(CaseDirection::Upper), args),
            "downcase" => no_args(Operation::ChangeCase(CaseDirection::Lower), args),
            "ascii_upcase" => no_args(Operation::ChangeCase(CaseDirection::AsciiUpper), args),
            "ascii_downcase" => no_args(Operation::ChangeCase(CaseDirection::AsciiLower), args),
            "to_string" => no_args(Operation::ToString, args),
            "join" | "split" => {
                let operation = if name == "join" {
                    Operation::Join
                } else {
                    Operation::Split
                };
                match <[ExpressionNode; 1]>::try_from(args) {
                    Ok([separator]) => Ok(ExpressionNode::with_argument(operation, separator)),
                    Err(_) => Err(arity("one argument")),
                }
            }
            "sub" => match <[ExpressionNode; 2]>::try_from(args) {
                Ok([pattern, replacement]) => Ok(ExpressionNode::with_argument(
                    Operation::Substitute,
                    ExpressionNode::block(pattern, replacement),
                )),
                Err(_) => Err(arity("two arguments: sub(regex; replacement)")),
            },
            "match" | "capture" | "test" => {
                let operation = match name.as_str() {
                    "match" => Operation::Match,
                    "capture" => Operation::Capture,
                    _ => Operation::Test,
                };
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(pattern), None) => Ok(ExpressionNode::with_argument(operation, pattern)),
                    (Some(pattern), Some(flags)) => Ok(ExpressionNode::with_argument(
                        operation,
                        ExpressionNode::block(pattern, flags),
                    )),
                    _ => Err(arity("a pattern and optional flags")),
                }
            }
            _ => Err(ParseError::UnknownFunction(name.clone())),
        }
    }

    /// `postfix (('=' | '|=') postfix)?`
    fn parse_assignment(&mut self) -> Result<ExpressionNode, ParseError> {
        let target = self.parse_access()?;

        let operation = match &self.current_token {
            Token::Assign => Operation::Assign,
            Token::UpdateAssign => Operation::Update,
            _ => return Ok(target),
        };
        self.advance()?;
        let value = self.parse_access()?;
        Ok(ExpressionNode::binary(operation, target, value))
    }

    fn parse_union(&mut self) -> Result<ExpressionNode, ParseError> {
        let mut left = self.parse_assignment()?;

        while self.check(&Token::Comma) {
            self.advance()?;
            let right = self.parse_assignment()?;
            left = ExpressionNode::binary(Operation::Union, left, right);
        }
        Ok(left)
    }

    /// Pipes bind loosest and associate to the right.
    pub fn parse_expression(&mut self) -> Result<ExpressionNode, ParseError> {
        let left = self.parse_union()?;

        if self.check(&Token::Pipe) {
            self.advance()?;
            let right = self.parse_expression()?;
            return Ok(ExpressionNode::binary(Operation::Pipe, left, right));
        }
        Ok(left)
    }

    pub fn parse(&mut self) -> Result<ExpressionNode, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(operation: Operation) -> ExpressionNode {
        ExpressionNode::leaf(operation)
    }

    fn traverse(key: &str) -> ExpressionNode {
        leaf(Operation::Traverse(key.to_string()))
    }

    fn string(s: &str) -> ExpressionNode {
        leaf(Operation::Interpolate(s.to_string()))
    }

    #[test]
    fn test_identity() {
        assert_eq!(parse_expression(".").unwrap(), leaf(Operation::SelfRef));
    }

    #[test]
    fn test_nested_path() {
        let expr = parse_expression(".a.b[0][]").unwrap();
        let expected = ExpressionNode::binary(
            Operation::Pipe,
            ExpressionNode::binary(
                Operation::Pipe,
                ExpressionNode::binary(Operation::Pipe, traverse("a"), traverse("b")),
                leaf(Operation::Index(0)),
            ),
            leaf(Operation::Iterate),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_bracket_forms() {
        assert_eq!(parse_expression(".[-1]").unwrap(), leaf(Operation::Index(-1)));
        assert_eq!(parse_expression(".[\"a b\"]").unwrap(), traverse("a b"));
        assert_eq!(parse_expression(".\"a b\"").unwrap(), traverse("a b"));
        assert_eq!(parse_expression(".[]").unwrap(), leaf(Operation::Iterate));
    }

    #[test]
    fn test_sub_packs_block() {
        let expr = parse_expression("sub(\"o\"; \"0\")").unwrap();
        assert_eq!(
            expr,
            ExpressionNode::with_argument(
                Operation::Substitute,
                ExpressionNode::block(string("o"), string("0")),
            )
        );
    }

    #[test]
    fn test_match_with_and_without_flags() {
        let plain = parse_expression("match(\"a\")").unwrap();
        assert_eq!(plain, ExpressionNode::with_argument(Operation::Match, string("a")));

        let global = parse_expression("match(\"a\"; \"g\")").unwrap();
        assert!(global.rhs.as_ref().is_some_and(|rhs| rhs.is_block()));
    }

    #[test]
    fn test_update_binds_tighter_than_pipe() {
        let expr = parse_expression(".a |= trim | .a").unwrap();
        assert_eq!(expr.operation, Operation::Pipe);
        assert_eq!(expr.lhs.as_ref().map(|lhs| lhs.operation.clone()), Some(Operation::Update));
    }

    #[test]
    fn test_regex_escapes_survive_lexing() {
        let expr = parse_expression(r#"test("\d+\.\d+")"#).unwrap();
        assert_eq!(expr.rhs.map(|rhs| *rhs), Some(string(r"\d+\.\d+")));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_expression("frobnicate"),
            Err(ParseError::UnknownFunction("frobnicate".into()))
        );
        assert!(matches!(
            parse_expression("sub(\"a\")"),
            Err(ParseError::WrongArity { .. })
        ));
        assert!(matches!(
            parse_expression("trim(\"a\")"),
            Err(ParseError::WrongArity { .. })
        ));
        assert!(matches!(parse_expression(".a |"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(
            parse_expression("\"open"),
            Err(ParseError::Lex(LexError::UnterminatedString { .. }))
        ));
    }
}
