//! # Shell Exec
//!
//! Tree-walking interpreter for parsed command lines: spawning, pipe
//! wiring, redirection, sequencing and background jobs.
//!
//! ## Philosophy
//!
//! - **Wire, then spawn**: descriptors are opened and attached before a
//!   process starts; nothing is rebound inside a running process
//! - **Seam over syscalls**: all process work goes through the
//!   [`ProcessApi`] trait, so orchestration is testable against a
//!   recording mock with no real processes involved
//! - **Leaf failures are local**: a program that will not spawn or a
//!   file that will not open kills only its own subtree; siblings run
//!   and the failure is reported, not propagated
//!
//! ## Design
//!
//! - [`ProcessApi`] / [`HostProcesses`] / [`MockProcesses`]: the seam
//! - [`Executor`]: the tree walk, one [`RunReport`] per line
//! - [`JobTable`]: background processes, polled between lines

pub mod ids;
pub mod jobs;
pub mod process;
pub mod run;

pub use ids::{FileId, JobId, PipeId, ProcId};
pub use jobs::{Job, JobNotice, JobTable};
pub use process::{
    ExecError, ExitCode, HostProcesses, MockEvent, MockProcesses, ProcessApi, SpawnRequest,
    StreamSpec,
};
pub use run::{Executor, RunReport};
