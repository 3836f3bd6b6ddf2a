//! The parsed command tree.
//!
//! Five variants, each exclusively owning its children; word and target
//! slices borrow from the line the tree was parsed out of.

/// Hard cap on collected argument slices per `Exec` node, terminator
/// slot included.
pub const MAX_ARGS: usize = 10;

/// How a redirection target is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirMode {
    Read,
    WriteCreate,
}

/// Which standard descriptor a redirection rebinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirFd {
    Stdin,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd<'a> {
    /// Plain program invocation. An empty `argv` executes as a no-op.
    Exec { argv: Vec<&'a str> },
    /// Descriptor rebinding applied to everything below it.
    Redir {
        child: Box<Cmd<'a>>,
        target: &'a str,
        mode: RedirMode,
        fd: RedirFd,
    },
    /// `left | right`, one OS pipe between them.
    Pipe {
        left: Box<Cmd<'a>>,
        right: Box<Cmd<'a>>,
    },
    /// `left ; right`, left runs to completion first.
    List {
        left: Box<Cmd<'a>>,
        right: Box<Cmd<'a>>,
    },
    /// `child &`, not waited on.
    Back { child: Box<Cmd<'a>> },
}

impl<'a> Cmd<'a> {
    pub fn exec(argv: Vec<&'a str>) -> Self {
        Cmd::Exec { argv }
    }

    pub fn redir(child: Cmd<'a>, target: &'a str, mode: RedirMode, fd: RedirFd) -> Self {
        Cmd::Redir {
            child: Box::new(child),
            target,
            mode,
            fd,
        }
    }

    pub fn pipe(left: Cmd<'a>, right: Cmd<'a>) -> Self {
        Cmd::Pipe {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn list(left: Cmd<'a>, right: Cmd<'a>) -> Self {
        Cmd::List {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn back(child: Cmd<'a>) -> Self {
        Cmd::Back {
            child: Box::new(child),
        }
    }
}
