use std::{collections::HashMap, fmt};

use lazy_static::lazy_static;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Def,
    Extern,
    Ident(String),
    Number(f64),
    /// any other single character, operators and punctuation included
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "end of input"),
            Token::Def => write!(f, "'def'"),
            Token::Extern => write!(f, "'extern'"),
            Token::Ident(ident) => write!(f, "identifier '{}'", ident),
            Token::Number(num) => write!(f, "number {}", num),
            Token::Char(c) => write!(f, "'{}'", c.escape_default()),
        }
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Token> = {
        let mut map = HashMap::new();
        map.insert("def", Token::Def);
        map.insert("extern", Token::Extern);
        map
    };
}

/// 1-based line and column of a character in the input
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Converts a numeric literal the way `strtod` does: the longest prefix that
/// reads as a float wins, and nothing readable yields zero.
fn parse_number(literal: &str) -> f64 {
    (1..=literal.len())
        .rev()
        .find_map(|end| literal[..end].parse().ok())
        .unwrap_or(0.0)
}

/// Pulls tokens out of a character stream with one character of lookahead.
pub struct Lexer<I: Iterator<Item = char>> {
    chars: I,
    /// the current unconsumed character, `None` once the input is exhausted
    last_char: Option<char>,
    line: u32,
    column: u32,
    token_start: Location,
}

impl<I: Iterator<Item = char>> Lexer<I> {
    pub fn new(chars: I) -> Self {
        // seeded with a blank so nothing is read until the first token is requested
        Self {
            chars,
            last_char: Some(' '),
            line: 1,
            column: 0,
            token_start: Location::default(),
        }
    }

    /// where the most recently returned token began
    pub fn token_start(&self) -> Location {
        self.token_start
    }

    fn bump(&mut self) {
        if self.last_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        }
        // end of input also takes a column, so `Eof` sits just past the last character
        self.last_char = self.chars.next();
        self.column += 1;
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column.max(1),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.last_char, Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_comment(&mut self) {
        while !matches!(self.last_char, None | Some('\n') | Some('\r')) {
            self.bump();
        }
    }

    /// consume characters while `pred` holds, collecting them
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut res = String::new();
        while let Some(c) = self.last_char {
            if !pred(c) {
                break;
            }
            res.push(c);
            self.bump();
        }
        res
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.token_start = self.location();

            let c = match self.last_char {
                Some(c) => c,
                None => return Token::Eof,
            };

            if c.is_ascii_alphabetic() {
                let ident = self.take_while(|c| c.is_ascii_alphanumeric());
                return match KEYWORDS.get(ident.as_str()) {
                    Some(keyword) => keyword.clone(),
                    None => Token::Ident(ident),
                };
            }

            if c.is_ascii_digit() || c == '.' {
                let literal = self.take_while(|c| c.is_ascii_digit() || c == '.');
                return Token::Number(parse_number(&literal));
            }

            if c == '#' {
                self.skip_comment();
                continue;
            }

            self.bump();
            return Token::Char(c);
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Lexer<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.next_token() {
            Token::Eof => None,
            tok => Some(tok),
        }
    }
}

/// lex the given input string in full, stopping before the end-of-input token
pub fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input.chars()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Token {
        Token::Ident(name.to_string())
    }

    #[test]
    fn lex_works() {
        let input = "def add(x y) x+1.0;";
        let tokenized = vec![
            Token::Def,
            ident("add"),
            Token::Char('('),
            ident("x"),
            ident("y"),
            Token::Char(')'),
            ident("x"),
            Token::Char('+'),
            Token::Number(1.0),
            Token::Char(';'),
        ];
        assert_eq!(lex(input), tokenized);
    }

    #[test]
    fn keywords_need_exact_match() {
        assert_eq!(
            lex("extern define def2 Def"),
            vec![Token::Extern, ident("define"), ident("def2"), ident("Def")]
        );
    }

    #[test]
    fn identifiers_stop_at_non_alphanumerics() {
        assert_eq!(
            lex("foo_bar x1y"),
            vec![ident("foo"), Token::Char('_'), ident("bar"), ident("x1y")]
        );
    }

    #[test]
    fn comments_are_transparent() {
        let input = "# leading comment\n1 # trailing\n# another\r+ 2 # at eof";
        assert_eq!(
            lex(input),
            vec![Token::Number(1.0), Token::Char('+'), Token::Number(2.0)]
        );
    }

    #[test]
    fn long_comment_runs_do_not_recurse() {
        let input = "# c\n".repeat(100_000) + "x";
        assert_eq!(lex(&input), vec![ident("x")]);
    }

    #[test]
    fn numbers_are_permissive() {
        assert_eq!(
            lex("42 .5 3. 1.2.3 ."),
            vec![
                Token::Number(42.0),
                Token::Number(0.5),
                Token::Number(3.0),
                Token::Number(1.2),
                Token::Number(0.0),
            ]
        );
    }

    #[test]
    fn number_then_identifier_splits() {
        assert_eq!(lex("2x"), vec![Token::Number(2.0), ident("x")]);
    }

    #[test]
    fn unknown_characters_pass_through() {
        assert_eq!(
            lex("@ é <"),
            vec![Token::Char('@'), Token::Char('é'), Token::Char('<')]
        );
    }

    #[test]
    fn eof_is_sticky() {
        let mut lexer = Lexer::new("x".chars());
        assert_eq!(lexer.next_token(), ident("x"));
        assert_eq!(lexer.next_token(), Token::Eof);
        assert_eq!(lexer.next_token(), Token::Eof);
    }

    #[test]
    fn tracks_token_locations() {
        let mut lexer = Lexer::new("a +\n  foo(1)".chars());
        let mut starts = Vec::new();
        while lexer.next_token() != Token::Eof {
            let Location { line, column } = lexer.token_start();
            starts.push((line, column));
        }
        assert_eq!(starts, vec![(1, 1), (1, 3), (2, 3), (2, 6), (2, 7), (2, 8)]);
    }

    #[test]
    fn eof_sits_past_last_character() {
        let eof_at = |input: &str| {
            let mut lexer = Lexer::new(input.chars());
            while lexer.next_token() != Token::Eof {}
            lexer.token_start()
        };
        assert_eq!(eof_at("1 +"), Location { line: 1, column: 4 });
        assert_eq!(eof_at("ab\n"), Location { line: 2, column: 1 });
        assert_eq!(eof_at("x # note"), Location { line: 1, column: 9 });
        assert_eq!(eof_at(""), Location { line: 1, column: 1 });
    }

    #[test]
    fn parse_number_matches_strtod_prefix_rule() {
        assert_eq!(parse_number("12.5.7"), 12.5);
        assert_eq!(parse_number(".."), 0.0);
        assert_eq!(parse_number("007"), 7.0);
    }
}
