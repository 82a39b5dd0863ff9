use std::collections::HashMap;

use log::{debug, trace};

use crate::ast::{ASTNode, Expression, Function, Prototype};
use crate::lexer::{Lexer, Location, Token};

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unknown token when expecting an expression")]
    UnknownToken(Token),
    #[error("expected ')'")]
    ExpectedCloseParen(Token),
    #[error("Expected ')' or ',' in argument list")]
    ExpectedArgumentDelimiter(Token),
    #[error("Expected function name in prototype")]
    ExpectedFunctionName(Token),
    #[error("Expected '(' in prototype")]
    ExpectedPrototypeOpenParen(Token),
    #[error("Expected ')' in prototype")]
    ExpectedPrototypeCloseParen(Token),
    #[error("duplicate parameter '{0}' in prototype")]
    DuplicateParameter(String),
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
#[error("{kind} (at {location})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub location: Location,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// which top-level entry point a unit went through
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnitKind {
    Definition,
    Extern,
    TopLevelExpression,
}

/// Operator table and prototype policy, fixed for the life of a parser.
#[derive(Debug, Clone)]
pub struct Settings {
    pub operator_precedence: HashMap<char, i32>,
    pub allow_duplicate_params: bool,
}

impl std::default::Default for Settings {
    fn default() -> Self {
        Self::empty()
            .with_operator('<', 10)
            .with_operator('+', 20)
            .with_operator('-', 20)
            .with_operator('*', 40)
    }
}

impl Settings {
    /// settings with no binary operators at all
    pub fn empty() -> Self {
        Self {
            operator_precedence: HashMap::new(),
            allow_duplicate_params: true,
        }
    }

    /// install or override an operator; higher binds tighter
    pub fn with_operator(mut self, op: char, precedence: i32) -> Self {
        self.operator_precedence.insert(op, precedence);
        self
    }
}

/// A single parse session: one lexer, one token of lookahead.
///
/// Nothing is read until the first call to [`Parser::advance`], which the
/// caller must make before parsing the first unit.
pub struct Parser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    current: Token,
    location: Location,
    settings: Settings,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(chars: I, settings: Settings) -> Self {
        Self {
            lexer: Lexer::new(chars),
            current: Token::Eof,
            location: Location::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_token(&self) -> &Token {
        &self.current
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn advance(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        self.location = self.lexer.token_start();
        trace!("token {} at {}", self.current, self.location);
        &self.current
    }

    fn error<T>(&self, kind: ParseErrorKind) -> ParseResult<T> {
        debug!("parse failed at {}: {}", self.location, kind);
        Err(ParseError {
            kind,
            location: self.location,
        })
    }

    fn current_operator(&self) -> Option<(char, i32)> {
        match self.current {
            Token::Char(op) if op.is_ascii() => match self.settings.operator_precedence.get(&op) {
                Some(&precedence) if precedence > 0 => Some((op, precedence)),
                _ => None,
            },
            _ => None,
        }
    }

    /// precedence of the current token, or -1 if it is not a binary operator
    pub fn token_precedence(&self) -> i32 {
        self.current_operator().map_or(-1, |(_, precedence)| precedence)
    }

    fn parse_number(&mut self, num: f64) -> ParseResult<Expression> {
        self.advance();
        Ok(Expression::Number(num))
    }

    fn parse_identifier(&mut self, ident: String) -> ParseResult<Expression> {
        self.advance();

        if self.current != Token::Char('(') {
            return Ok(Expression::Variable(ident));
        }
        self.advance();

        let mut args = Vec::new();
        if self.current != Token::Char(')') {
            loop {
                args.push(self.parse_expression()?);

                match self.current {
                    Token::Char(')') => break,
                    Token::Char(',') => {
                        self.advance();
                    }
                    ref tok => {
                        return self.error(ParseErrorKind::ExpectedArgumentDelimiter(tok.clone()))
                    }
                }
            }
        }
        self.advance();

        Ok(Expression::Call(ident, args))
    }

    fn parse_nested(&mut self) -> ParseResult<Expression> {
        self.advance();
        let res = self.parse_expression()?;
        if self.current != Token::Char(')') {
            return self.error(ParseErrorKind::ExpectedCloseParen(self.current.clone()));
        }
        self.advance();
        Ok(res)
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current {
            Token::Number(num) => self.parse_number(num),
            Token::Ident(ref ident) => {
                let ident = ident.clone();
                self.parse_identifier(ident)
            }
            Token::Char('(') => self.parse_nested(),
            ref tok => self.error(ParseErrorKind::UnknownToken(tok.clone())),
        }
    }

    fn parse_rhs(&mut self, expr_precedence: i32, lhs: Expression) -> ParseResult<Expression> {
        let mut result = lhs;

        loop {
            let (operator, precedence) = match self.current_operator() {
                Some((op, pr)) if pr >= expr_precedence => (op, pr),
                _ => return Ok(result),
            };
            self.advance();

            let mut rhs = self.parse_primary()?;

            if precedence < self.token_precedence() {
                rhs = self.parse_rhs(precedence + 1, rhs)?;
            }

            result = Expression::binary(operator, result, rhs);
        }
    }

    pub fn parse_expression(&mut self) -> ParseResult<Expression> {
        let lhs = self.parse_primary()?;
        self.parse_rhs(0, lhs)
    }

    pub fn parse_prototype(&mut self) -> ParseResult<Prototype> {
        let name = match self.current {
            Token::Ident(ref name) => name.clone(),
            ref tok => return self.error(ParseErrorKind::ExpectedFunctionName(tok.clone())),
        };
        self.advance();

        if self.current != Token::Char('(') {
            return self.error(ParseErrorKind::ExpectedPrototypeOpenParen(self.current.clone()));
        }

        let mut args: Vec<String> = Vec::new();
        loop {
            let arg = match self.advance() {
                Token::Ident(arg) => arg.clone(),
                _ => break,
            };
            if !self.settings.allow_duplicate_params && args.contains(&arg) {
                return self.error(ParseErrorKind::DuplicateParameter(arg));
            }
            args.push(arg);
        }
        if self.current != Token::Char(')') {
            return self.error(ParseErrorKind::ExpectedPrototypeCloseParen(self.current.clone()));
        }
        self.advance();

        Ok(Prototype { name, args })
    }

    /// `def` prototype expression
    pub fn parse_definition(&mut self) -> ParseResult<Function> {
        debug!("parsing definition at {}", self.location);
        self.advance();
        let prototype = self.parse_prototype()?;
        let body = self.parse_expression()?;
        Ok(Function { prototype, body })
    }

    /// `extern` prototype
    pub fn parse_external(&mut self) -> ParseResult<Prototype> {
        debug!("parsing extern at {}", self.location);
        self.advance();
        self.parse_prototype()
    }

    pub fn parse_top_level_expression(&mut self) -> ParseResult<Function> {
        debug!("parsing top-level expression at {}", self.location);
        let body = self.parse_expression()?;
        Ok(Function {
            prototype: Prototype::anonymous(),
            body,
        })
    }

    /// Parses one unit starting at the current token, or `None` at end of input.
    /// Top-level semicolons are skipped.
    pub fn parse_unit(&mut self) -> Option<(UnitKind, ParseResult<ASTNode>)> {
        while self.current == Token::Char(';') {
            self.advance();
        }
        let unit = match self.current {
            Token::Eof => return None,
            Token::Def => (
                UnitKind::Definition,
                self.parse_definition().map(ASTNode::Function),
            ),
            Token::Extern => (UnitKind::Extern, self.parse_external().map(ASTNode::Extern)),
            _ => (
                UnitKind::TopLevelExpression,
                self.parse_top_level_expression().map(ASTNode::Function),
            ),
        };
        Some(unit)
    }
}

/// parse a whole buffer, stopping at the first error
pub fn parse_str(input: &str, settings: Settings) -> ParseResult<Vec<ASTNode>> {
    let mut parser = Parser::new(input.chars(), settings);
    parser.advance();

    let mut ast = Vec::new();
    while let Some((_, node)) = parser.parse_unit() {
        ast.push(node?);
    }
    Ok(ast)
}
