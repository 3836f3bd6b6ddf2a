//! Recursive-descent parser over the tokenizer.
//!
//! Redirections wrap the command parsed so far in encounter order, so the
//! first one written ends up innermost and execution applies them
//! outer-to-inner during the walk.

use thiserror::Error;

use crate::cmd::{Cmd, RedirFd, RedirMode, MAX_ARGS};
use crate::token::{Token, Tokenizer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing file for redirection")]
    MissingRedirTarget,
    #[error("missing )")]
    UnmatchedParen,
    #[error("too many args")]
    TooManyArgs,
    #[error("syntax error near '{0}'")]
    UnexpectedToken(String),
    #[error("leftovers: {0}")]
    Leftovers(String),
}

/// Parse one full line. Unconsumed text after the grammar completes is
/// an error.
pub fn parse_line(input: &str) -> Result<Cmd<'_>, ParseError> {
    let mut tokens = Tokenizer::new(input);
    let cmd = parse_sequence(&mut tokens)?;
    if !tokens.at_end() {
        return Err(ParseError::Leftovers(tokens.rest().to_string()));
    }
    Ok(cmd)
}

/// `line := pipeline ( '&' )* ( ';' line )?`
fn parse_sequence<'a>(tokens: &mut Tokenizer<'a>) -> Result<Cmd<'a>, ParseError> {
    let mut cmd = parse_pipeline(tokens)?;
    while tokens.peek_any(b"&") {
        tokens.next_token();
        cmd = Cmd::back(cmd);
    }
    if tokens.peek_any(b";") {
        tokens.next_token();
        cmd = Cmd::list(cmd, parse_sequence(tokens)?);
    }
    Ok(cmd)
}

/// `pipeline := exec ( '|' pipeline )?`
fn parse_pipeline<'a>(tokens: &mut Tokenizer<'a>) -> Result<Cmd<'a>, ParseError> {
    let cmd = parse_exec(tokens)?;
    if tokens.peek_any(b"|") {
        tokens.next_token();
        return Ok(Cmd::pipe(cmd, parse_pipeline(tokens)?));
    }
    Ok(cmd)
}

struct Redirection<'a> {
    target: &'a str,
    mode: RedirMode,
    fd: RedirFd,
}

fn collect_redirs<'a>(
    tokens: &mut Tokenizer<'a>,
    out: &mut Vec<Redirection<'a>>,
) -> Result<(), ParseError> {
    while tokens.peek_any(b"<>") {
        let op = tokens.next_token();
        let Token::Word(target) = tokens.next_token() else {
            return Err(ParseError::MissingRedirTarget);
        };
        let (mode, fd) = if op == Token::RedirIn {
            (RedirMode::Read, RedirFd::Stdin)
        } else {
            // `>` and `>>` both open write+create; append is not a
            // distinct mode.
            (RedirMode::WriteCreate, RedirFd::Stdout)
        };
        out.push(Redirection { target, mode, fd });
    }
    Ok(())
}

fn apply_redirs<'a>(mut cmd: Cmd<'a>, redirs: Vec<Redirection<'a>>) -> Cmd<'a> {
    for r in redirs {
        cmd = Cmd::redir(cmd, r.target, r.mode, r.fd);
    }
    cmd
}

/// `exec := '(' line ')' redirs | redirs ( word redirs )*`
fn parse_exec<'a>(tokens: &mut Tokenizer<'a>) -> Result<Cmd<'a>, ParseError> {
    if tokens.peek_any(b"(") {
        return parse_block(tokens);
    }

    let mut argv = Vec::new();
    let mut redirs = Vec::new();
    collect_redirs(tokens, &mut redirs)?;
    while !tokens.peek_any(b"|)&;") {
        let word = match tokens.next_token() {
            Token::End => break,
            Token::Word(word) => word,
            other => return Err(ParseError::UnexpectedToken(other.to_string())),
        };
        argv.push(word);
        if argv.len() >= MAX_ARGS {
            return Err(ParseError::TooManyArgs);
        }
        collect_redirs(tokens, &mut redirs)?;
    }
    Ok(apply_redirs(Cmd::exec(argv), redirs))
}

fn parse_block<'a>(tokens: &mut Tokenizer<'a>) -> Result<Cmd<'a>, ParseError> {
    debug_assert!(tokens.peek_any(b"("));
    tokens.next_token();
    let cmd = parse_sequence(tokens)?;
    if !tokens.peek_any(b")") {
        return Err(ParseError::UnmatchedParen);
    }
    tokens.next_token();
    let mut redirs = Vec::new();
    collect_redirs(tokens, &mut redirs)?;
    Ok(apply_redirs(cmd, redirs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_exec() {
        assert_eq!(
            parse_line("ls -l\n").unwrap(),
            Cmd::exec(vec!["ls", "-l"])
        );
    }

    #[test]
    fn test_empty_line_is_empty_exec() {
        assert_eq!(parse_line("").unwrap(), Cmd::exec(vec![]));
        assert_eq!(parse_line("\n").unwrap(), Cmd::exec(vec![]));
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            parse_line("echo a | grep a\n").unwrap(),
            Cmd::pipe(Cmd::exec(vec!["echo", "a"]), Cmd::exec(vec!["grep", "a"]))
        );
    }

    #[test]
    fn test_pipe_is_right_associative() {
        assert_eq!(
            parse_line("a | b | c\n").unwrap(),
            Cmd::pipe(
                Cmd::exec(vec!["a"]),
                Cmd::pipe(Cmd::exec(vec!["b"]), Cmd::exec(vec!["c"]))
            )
        );
    }

    #[test]
    fn test_background() {
        assert_eq!(
            parse_line("sleep 5 &\n").unwrap(),
            Cmd::back(Cmd::exec(vec!["sleep", "5"]))
        );
    }

    #[test]
    fn test_repeated_ampersand_nests() {
        assert_eq!(
            parse_line("a & &\n").unwrap(),
            Cmd::back(Cmd::back(Cmd::exec(vec!["a"])))
        );
    }

    #[test]
    fn test_list_chains_rightward() {
        assert_eq!(
            parse_line("a; b; c\n").unwrap(),
            Cmd::list(
                Cmd::exec(vec!["a"]),
                Cmd::list(Cmd::exec(vec!["b"]), Cmd::exec(vec!["c"]))
            )
        );
    }

    #[test]
    fn test_redirections_nest_in_written_order() {
        // First one written ends up innermost.
        assert_eq!(
            parse_line("cat < a.txt > b.txt\n").unwrap(),
            Cmd::redir(
                Cmd::redir(
                    Cmd::exec(vec!["cat"]),
                    "a.txt",
                    RedirMode::Read,
                    RedirFd::Stdin
                ),
                "b.txt",
                RedirMode::WriteCreate,
                RedirFd::Stdout
            )
        );
    }

    #[test]
    fn test_redirections_interleave_with_words() {
        assert_eq!(
            parse_line("< in cat > out\n").unwrap(),
            Cmd::redir(
                Cmd::redir(Cmd::exec(vec!["cat"]), "in", RedirMode::Read, RedirFd::Stdin),
                "out",
                RedirMode::WriteCreate,
                RedirFd::Stdout
            )
        );
    }

    #[test]
    fn test_append_parses_as_write_create() {
        assert_eq!(
            parse_line("x >> log\n").unwrap(),
            parse_line("x > log\n").unwrap()
        );
    }

    #[test]
    fn test_block_with_redirect() {
        assert_eq!(
            parse_line("(a; b) > out\n").unwrap(),
            Cmd::redir(
                Cmd::list(Cmd::exec(vec!["a"]), Cmd::exec(vec!["b"])),
                "out",
                RedirMode::WriteCreate,
                RedirFd::Stdout
            )
        );
    }

    #[test]
    fn test_pipeline_of_blocks() {
        assert_eq!(
            parse_line("(a) | (b)\n").unwrap(),
            Cmd::pipe(Cmd::exec(vec!["a"]), Cmd::exec(vec!["b"]))
        );
    }

    #[test]
    fn test_missing_redirect_target() {
        assert_eq!(
            parse_line("cat <\n").unwrap_err(),
            ParseError::MissingRedirTarget
        );
        assert_eq!(
            parse_line("cat < | x\n").unwrap_err(),
            ParseError::MissingRedirTarget
        );
    }

    #[test]
    fn test_unmatched_paren() {
        assert_eq!(
            parse_line("(a; b\n").unwrap_err(),
            ParseError::UnmatchedParen
        );
    }

    #[test]
    fn test_leftover_close_paren() {
        assert_eq!(
            parse_line("a )").unwrap_err(),
            ParseError::Leftovers(")".to_string())
        );
    }

    #[test]
    fn test_paren_inside_word_list_is_syntax_error() {
        assert_eq!(
            parse_line("ls ( x\n").unwrap_err(),
            ParseError::UnexpectedToken("(".to_string())
        );
    }

    #[test]
    fn test_argument_cap() {
        let nine = "a b c d e f g h i\n";
        assert!(parse_line(nine).is_ok());
        let ten = "a b c d e f g h i j\n";
        assert_eq!(parse_line(ten).unwrap_err(), ParseError::TooManyArgs);
    }
}
