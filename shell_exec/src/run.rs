//! Tree-walking command execution.
//!
//! The walk spawns every foreground leaf of the tree, then waits for
//! them in spawn order. Waiting is interleaved only where sequencing
//! demands it: a `List` waits out its left side before its right side
//! spawns. Redirections open eagerly on the way down, so every target
//! named on the line is created even when a later rebinding shadows it,
//! and the innermost binding is the one the leaf process sees.

use shell_syntax::{Cmd, RedirFd};

use crate::ids::ProcId;
use crate::jobs::{JobNotice, JobTable};
use crate::process::{ExecError, ExitCode, ProcessApi, SpawnRequest, StreamSpec};

/// What one line produced.
#[derive(Debug)]
pub struct RunReport {
    /// First nonzero exit among the foreground waits, 0 when every
    /// process succeeded or none ran.
    pub exit_code: ExitCode,
    /// Per-leaf failures that were skipped over: a program that would
    /// not spawn or a redirect target that would not open. Siblings of
    /// the failed leaf still ran.
    pub failures: Vec<ExecError>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.failures.is_empty()
    }
}

/// Stream bindings accumulated on the way down the tree.
#[derive(Debug, Clone, Copy)]
struct Bindings {
    stdin: StreamSpec,
    stdout: StreamSpec,
}

impl Bindings {
    fn inherit() -> Self {
        Self {
            stdin: StreamSpec::Inherit,
            stdout: StreamSpec::Inherit,
        }
    }
}

/// Drives a [`ProcessApi`] from parsed command trees.
pub struct Executor<P: ProcessApi> {
    api: P,
    jobs: JobTable,
}

impl<P: ProcessApi> Executor<P> {
    pub fn new(api: P) -> Self {
        Self {
            api,
            jobs: JobTable::new(),
        }
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut P {
        &mut self.api
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    /// Runs one parsed line to completion of its foreground processes.
    ///
    /// Pipe allocation failure and handle-bookkeeping errors abort the
    /// walk; a leaf that fails to spawn or a redirect that fails to open
    /// only lands in [`RunReport::failures`].
    pub fn run(&mut self, cmd: &Cmd<'_>) -> Result<RunReport, ExecError> {
        let mut failures = Vec::new();
        let mut exit_code = 0;
        let procs = self.spawn_tree(cmd, Bindings::inherit(), &mut failures, &mut exit_code)?;
        for proc in procs {
            let code = self.api.wait(proc)?;
            latch(&mut exit_code, code);
        }
        Ok(RunReport {
            exit_code,
            failures,
        })
    }

    /// Polls background jobs once, returning those that finished.
    pub fn reap_jobs(&mut self) -> Result<Vec<JobNotice>, ExecError> {
        self.jobs.reap(&mut self.api)
    }

    /// Spawns the subtree under `bind` and returns its still-running
    /// foreground processes, oldest first. Waits performed inside the
    /// walk latch their codes into `exit_code`.
    fn spawn_tree(
        &mut self,
        cmd: &Cmd<'_>,
        bind: Bindings,
        failures: &mut Vec<ExecError>,
        exit_code: &mut ExitCode,
    ) -> Result<Vec<ProcId>, ExecError> {
        match cmd {
            Cmd::Exec { argv } => {
                if argv.is_empty() {
                    return Ok(Vec::new());
                }
                let request = SpawnRequest::new(argv.iter().map(|s| s.to_string()).collect())
                    .with_stdin(bind.stdin)
                    .with_stdout(bind.stdout);
                match self.api.spawn(request) {
                    Ok(proc) => Ok(vec![proc]),
                    Err(err @ ExecError::SpawnFailed { .. }) => {
                        failures.push(err);
                        Ok(Vec::new())
                    }
                    Err(err) => Err(err),
                }
            }

            Cmd::Redir {
                child,
                target,
                mode,
                fd,
            } => {
                let file = match self.api.open_file(target, *mode) {
                    Ok(file) => file,
                    Err(err @ ExecError::OpenFailed { .. }) => {
                        // The whole subtree under a dead redirect is
                        // skipped, like the process that exited here.
                        failures.push(err);
                        return Ok(Vec::new());
                    }
                    Err(err) => return Err(err),
                };
                let mut bind = bind;
                match fd {
                    RedirFd::Stdin => bind.stdin = StreamSpec::File(file),
                    RedirFd::Stdout => bind.stdout = StreamSpec::File(file),
                }
                let procs = self.spawn_tree(child, bind, failures, exit_code)?;
                // Children hold duplicated handles; ours goes now.
                self.api.close_file(file)?;
                Ok(procs)
            }

            Cmd::Pipe { left, right } => {
                let pipe = self.api.pipe()?;
                let left_bind = Bindings {
                    stdin: bind.stdin,
                    stdout: StreamSpec::PipeWrite(pipe),
                };
                let right_bind = Bindings {
                    stdin: StreamSpec::PipeRead(pipe),
                    stdout: bind.stdout,
                };
                let mut procs = self.spawn_tree(left, left_bind, failures, exit_code)?;
                procs.extend(self.spawn_tree(right, right_bind, failures, exit_code)?);
                // Both sides are wired; drop our ends so end-of-file can
                // reach the reader.
                self.api.release_pipe(pipe)?;
                Ok(procs)
            }

            Cmd::List { left, right } => {
                let left_procs = self.spawn_tree(left, bind, failures, exit_code)?;
                for proc in left_procs {
                    let code = self.api.wait(proc)?;
                    latch(exit_code, code);
                }
                self.spawn_tree(right, bind, failures, exit_code)
            }

            Cmd::Back { child } => {
                let procs = self.spawn_tree(child, bind, failures, exit_code)?;
                let name = leading_name(child);
                for proc in procs {
                    self.jobs.adopt(proc, name.clone());
                }
                Ok(Vec::new())
            }
        }
    }
}

/// First nonzero code wins; later ones only fill an empty slot.
fn latch(slot: &mut ExitCode, code: ExitCode) {
    if *slot == 0 {
        *slot = code;
    }
}

/// First program name under a node, for job notices.
fn leading_name(cmd: &Cmd<'_>) -> String {
    match cmd {
        Cmd::Exec { argv } => argv.first().copied().unwrap_or("").to_string(),
        Cmd::Redir { child, .. } | Cmd::Back { child } => leading_name(child),
        Cmd::Pipe { left, .. } | Cmd::List { left, .. } => leading_name(left),
    }
}
