//! Front end for the mana expression language: a character-level lexer and
//! a precedence-climbing parser producing the tree in [`ast`].

pub mod ast;
pub mod driver;
pub mod lexer;
pub mod parser;
pub mod source;

pub use ast::{ASTNode, Expression, Function, Prototype};
pub use lexer::{lex, Lexer, Location, Token};
pub use parser::{parse_str, ParseError, ParseErrorKind, Parser, Settings, UnitKind};
