//! # Shell Syntax
//!
//! Tokenizer and recursive-descent parser for the interactive command
//! language. A committed line goes in, an owned command tree comes out;
//! the tree's words stay borrowed slices of the line.
//!
//! ## Grammar
//!
//! ```text
//! line     := pipeline ( '&' )* ( ';' line )?
//! pipeline := exec ( '|' pipeline )?
//! exec     := '(' line ')' redirs | redirs ( word redirs )*
//! redirs   := ( ( '<' word ) | ( '>' word ) | ( '>>' word ) )*
//! ```
//!
//! ## Philosophy
//!
//! - **One token of lookahead**: a non-consuming peek drives every branch
//! - **Borrowed words**: argument and target slices reference the input
//!   line; nothing is copied or mutated during the parse
//! - **Unrecoverable errors**: the first syntax error aborts the whole
//!   parse; there is no resynchronization
//!
//! ## Design
//!
//! - [`Tokenizer`]: lexes words and punctuation, `>>` as one token
//! - [`Cmd`]: the five-variant command tree with owned children
//! - [`parse_line`]: entry point, rejects leftover unconsumed text

pub mod cmd;
pub mod parser;
pub mod token;

pub use cmd::{Cmd, RedirFd, RedirMode, MAX_ARGS};
pub use parser::{parse_line, ParseError};
pub use token::{Token, Tokenizer};
