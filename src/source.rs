use std::io::BufRead;

use log::error;

/// Yields the characters of a buffered reader, one line at a time, so an
/// interactive reader is only asked for more once the last line is used up.
///
/// Bytes that are not valid UTF-8 come through as U+FFFD. Only an I/O
/// failure ends the stream early; the lexer sees it as end of input.
pub struct ReadChars<R> {
    reader: R,
    bytes: Vec<u8>,
    line: String,
    pos: usize,
    done: bool,
}

impl<R: BufRead> ReadChars<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::new(),
            line: String::new(),
            pos: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for ReadChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.line[self.pos..].chars().next() {
                self.pos += c.len_utf8();
                return Some(c);
            }
            if self.done {
                return None;
            }

            self.bytes.clear();
            self.pos = 0;
            match self.reader.read_until(b'\n', &mut self.bytes) {
                Ok(0) => {
                    self.line.clear();
                    self.done = true;
                }
                Ok(_) => self.line = String::from_utf8_lossy(&self.bytes).into_owned(),
                Err(e) => {
                    error!("failed to read input: {}", e);
                    self.line.clear();
                    self.done = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, Token};
    use pretty_assertions::assert_eq;
    use std::io::{self, Cursor, Read};

    #[test]
    fn reads_all_lines() {
        let chars: String = ReadChars::new(Cursor::new("ab\nçd\n\ne")).collect();
        assert_eq!(chars, "ab\nçd\n\ne");
    }

    #[test]
    fn empty_reader_is_empty() {
        assert_eq!(ReadChars::new(Cursor::new("")).next(), None);
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
        }
    }

    #[test]
    fn read_error_ends_input() {
        let reader = Cursor::new("x\n").chain(Broken);
        let chars: String = ReadChars::new(io::BufReader::new(reader)).collect();
        assert_eq!(chars, "x\n");
    }

    #[test]
    fn invalid_utf8_becomes_replacement_char() {
        let chars: String = ReadChars::new(Cursor::new(b"a\xff b\n".to_vec())).collect();
        assert_eq!(chars, "a\u{FFFD} b\n");
    }

    #[test]
    fn input_after_invalid_utf8_survives() {
        let source = ReadChars::new(Cursor::new(b"1 + 2\n# caf\xe9\nfoo(3)\n".to_vec()));
        let tokens: Vec<Token> = Lexer::new(source).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Number(1.0),
                Token::Char('+'),
                Token::Number(2.0),
                Token::Ident("foo".to_string()),
                Token::Char('('),
                Token::Number(3.0),
                Token::Char(')'),
            ]
        );
    }

    #[test]
    fn invalid_utf8_outside_comment_is_a_char_token() {
        let source = ReadChars::new(Cursor::new(b"x \xfe y".to_vec()));
        let tokens: Vec<Token> = Lexer::new(source).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("x".to_string()),
                Token::Char('\u{FFFD}'),
                Token::Ident("y".to_string()),
            ]
        );
    }
}
