//! # Interactive Shell Host
//!
//! The user-facing interpreter loop and its `tsh` binary: settings,
//! directory completion, the `cd` builtin, the prompt/read/dispatch
//! cycle over a shared console, and the feeder that drives the console
//! from raw input bytes.
//!
//! ## Philosophy
//!
//! - **The loop owns the terminal**: prompt and diagnostics go to the
//!   error stream; command output belongs to the spawned processes
//! - **One builtin**: `cd` must move the interpreter itself, everything
//!   else becomes a child process
//! - **Completion is loop-side**: a trailing tab never reaches the
//!   parser
//! - **Per-line recovery**: parse errors and dead leaves cost one
//!   diagnostic line, never the session
//! - **The feeder closes the session**: input end-of-file becomes a
//!   committed tail plus the end-of-file key, never an abandoned reader

pub mod autocomplete;
pub mod feeder;
pub mod repl;
pub mod settings;

pub use autocomplete::Completion;
pub use repl::{Repl, ReplError, ReplStatus};
pub use settings::{SettingsError, ShellSettings};
