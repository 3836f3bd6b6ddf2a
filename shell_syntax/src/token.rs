//! Lexer for the command language.
//!
//! Tokens are words (maximal runs of non-whitespace, non-punctuation
//! bytes) and the punctuation set `( ) ; & < > |`, with `>>` folded into
//! a single token. Whitespace around tokens is skipped on both sides, so
//! the cursor always rests on token-start or end of input.

use std::fmt;

const WHITESPACE: &[u8] = b" \t\r\n\x0B";
const SYMBOLS: &[u8] = b"<|>&;()";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Word(&'a str),
    Pipe,
    LParen,
    RParen,
    Semi,
    Amp,
    RedirIn,
    RedirOut,
    RedirAppend,
    End,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => f.write_str(w),
            Token::Pipe => f.write_str("|"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Semi => f.write_str(";"),
            Token::Amp => f.write_str("&"),
            Token::RedirIn => f.write_str("<"),
            Token::RedirOut => f.write_str(">"),
            Token::RedirAppend => f.write_str(">>"),
            Token::End => f.write_str("end of input"),
        }
    }
}

/// Cursor over one input line.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    fn skip_whitespace(&mut self) {
        let n = self
            .rest
            .bytes()
            .take_while(|b| WHITESPACE.contains(b))
            .count();
        self.rest = &self.rest[n..];
    }

    /// First byte of the next token, without consuming it.
    pub fn peek_byte(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.rest.bytes().next()
    }

    /// True when the next token starts with one of `set`.
    pub fn peek_any(&mut self, set: &[u8]) -> bool {
        match self.peek_byte() {
            Some(b) => set.contains(&b),
            None => false,
        }
    }

    /// Consume and return the next token. At end of input this keeps
    /// returning [`Token::End`].
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let bytes = self.rest.as_bytes();
        let (token, used) = match bytes.first() {
            None => (Token::End, 0),
            Some(b'|') => (Token::Pipe, 1),
            Some(b'(') => (Token::LParen, 1),
            Some(b')') => (Token::RParen, 1),
            Some(b';') => (Token::Semi, 1),
            Some(b'&') => (Token::Amp, 1),
            Some(b'<') => (Token::RedirIn, 1),
            Some(b'>') => {
                if bytes.get(1) == Some(&b'>') {
                    (Token::RedirAppend, 2)
                } else {
                    (Token::RedirOut, 1)
                }
            }
            Some(_) => {
                // Word: run to the next whitespace or symbol byte. Only
                // ASCII bytes delimit, so the cut is always a valid char
                // boundary.
                let end = bytes
                    .iter()
                    .position(|b| WHITESPACE.contains(b) || SYMBOLS.contains(b))
                    .unwrap_or(bytes.len());
                (Token::Word(&self.rest[..end]), end)
            }
        };
        self.rest = &self.rest[used..];
        self.skip_whitespace();
        token
    }

    /// Unconsumed remainder, for leftover diagnostics.
    pub fn rest(&self) -> &'a str {
        self.rest
    }

    /// True once only whitespace remains.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.rest.is_empty()
    }
}
