//! The interactive loop.
//!
//! Prompt on the error stream, then one line from the console per
//! iteration. `cd` changes the interpreter's own directory, a trailing
//! tab asks for directory completion, everything else is parsed and
//! handed to the executor. Background jobs are reaped at the end of
//! every iteration, after the line's own foreground work.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use console_core::{CancelToken, Console, ConsoleError, TextDevice};
use shell_exec::{ExecError, Executor, ProcessApi};
use shell_syntax::parse_line;
use thiserror::Error;

use crate::autocomplete::{self, Completion};
use crate::settings::ShellSettings;

/// Errors that end the interpreter run. Per-line trouble (parse
/// errors, leaves that would not spawn) is reported and survived.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("console error: {0}")]
    Console(#[from] ConsoleError),

    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("stream error: {0}")]
    Stream(#[from] io::Error),
}

/// Whether the loop should keep going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplStatus {
    Continue,
    Eof,
}

/// One interactive session over a shared console.
pub struct Repl<D: TextDevice, P: ProcessApi, W: Write, E: Write> {
    console: Arc<Console<D>>,
    executor: Executor<P>,
    settings: ShellSettings,
    cancel: CancelToken,
    /// Set by the interrupt side on a dump key, serviced here.
    dump: Arc<AtomicBool>,
    out: W,
    err: E,
}

impl<D, P, W, E> Repl<D, P, W, E>
where
    D: TextDevice,
    P: ProcessApi,
    W: Write,
    E: Write,
{
    pub fn new(console: Arc<Console<D>>, api: P, settings: ShellSettings, out: W, err: E) -> Self {
        Self {
            console,
            executor: Executor::new(api),
            settings,
            cancel: CancelToken::new(),
            dump: Arc::new(AtomicBool::new(false)),
            out,
            err,
        }
    }

    /// Token a peer thread can use to unblock a pending read.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Flag the feeder raises when the dump key arrives; the next loop
    /// iteration prints the job table.
    pub fn dump_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dump)
    }

    pub fn executor(&self) -> &Executor<P> {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut Executor<P> {
        &mut self.executor
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    pub fn err(&self) -> &E {
        &self.err
    }

    /// Runs until end-of-file.
    pub fn run(&mut self) -> Result<(), ReplError> {
        while self.step()? == ReplStatus::Continue {}
        Ok(())
    }

    /// One iteration: prompt, read a line, dispatch it, reap.
    pub fn step(&mut self) -> Result<ReplStatus, ReplError> {
        write!(self.err, "{}", self.settings.prompt)?;
        self.err.flush()?;

        let mut buf = vec![0u8; self.settings.read_chunk.max(1)];
        let n = self.console.read(&mut buf, &self.cancel)?;
        if n == 0 {
            return Ok(ReplStatus::Eof);
        }

        let line = String::from_utf8_lossy(&buf[..n]).into_owned();
        self.dispatch(&line)?;

        for notice in self.executor.reap_jobs()? {
            writeln!(self.err, "{notice}")?;
        }
        if self.dump.swap(false, Ordering::SeqCst) {
            self.dump_jobs()?;
        }
        Ok(ReplStatus::Continue)
    }

    fn dispatch(&mut self, line: &str) -> Result<(), ReplError> {
        if let Some(arg) = line.strip_prefix("cd ") {
            return self.change_dir(arg);
        }
        if let Some(request) = autocomplete::tab_request(line) {
            return self.complete(request);
        }
        self.run_line(line)
    }

    /// chdir must happen in the interpreter itself, not in a child.
    fn change_dir(&mut self, arg: &str) -> Result<(), ReplError> {
        let dir = arg.strip_suffix('\n').unwrap_or(arg);
        if env::set_current_dir(dir).is_err() {
            writeln!(self.err, "cannot cd {dir}")?;
        }
        Ok(())
    }

    fn complete(&mut self, prefix: &str) -> Result<(), ReplError> {
        match autocomplete::complete_in(prefix, Path::new("."), self.settings.match_cap) {
            Ok(Completion::NoMatch) => {}
            Ok(Completion::Unique(name)) => writeln!(self.out, "{name}")?,
            Ok(Completion::Ambiguous(matches)) => {
                writeln!(self.out)?;
                writeln!(self.out, "{}", matches.join(" "))?;
            }
            Err(_) => writeln!(self.err, "cannot open current directory")?,
        }
        Ok(())
    }

    fn run_line(&mut self, line: &str) -> Result<(), ReplError> {
        let cmd = match parse_line(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                writeln!(self.err, "{e}")?;
                return Ok(());
            }
        };

        let report = self.executor.run(&cmd)?;
        for failure in &report.failures {
            writeln!(self.err, "{failure}")?;
        }
        Ok(())
    }

    fn dump_jobs(&mut self) -> Result<(), ReplError> {
        let jobs = self.executor.jobs().jobs();
        writeln!(self.err, "jobs: {}", jobs.len())?;
        for job in jobs {
            writeln!(self.err, "  {} {}", job.proc, job.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    use console_core::key::ctrl;
    use console_device::CellGrid;
    use shell_exec::{MockEvent, MockProcesses};
    use tempfile::TempDir;

    type MockRepl = Repl<CellGrid, MockProcesses, Vec<u8>, Vec<u8>>;

    fn session(api: MockProcesses) -> (Arc<Console<CellGrid>>, MockRepl) {
        let console = Arc::new(Console::new(CellGrid::new()));
        let repl = Repl::new(
            Arc::clone(&console),
            api,
            ShellSettings::default(),
            Vec::new(),
            Vec::new(),
        );
        (console, repl)
    }

    fn type_line(console: &Console<CellGrid>, line: &str) {
        console.interrupt(line.bytes()).unwrap();
    }

    fn type_eof(console: &Console<CellGrid>) {
        console.interrupt([ctrl(b'D')]).unwrap();
    }

    fn out_text(repl: &MockRepl) -> String {
        String::from_utf8(repl.out().clone()).unwrap()
    }

    fn err_text(repl: &MockRepl) -> String {
        String::from_utf8(repl.err().clone()).unwrap()
    }

    #[test]
    fn test_prompt_precedes_every_read() {
        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, "ls\n");
        type_eof(&console);

        repl.run().unwrap();

        assert_eq!(err_text(&repl), "$ $ ");
        assert_eq!(repl.executor().api().spawn_count(), 1);
        assert_eq!(repl.executor().api().spawned()[0].argv, vec!["ls"]);
    }

    #[test]
    fn test_eof_alone_ends_the_loop() {
        let (console, mut repl) = session(MockProcesses::new());
        type_eof(&console);

        repl.run().unwrap();

        assert_eq!(err_text(&repl), "$ ");
        assert_eq!(repl.executor().api().spawn_count(), 0);
    }

    #[test]
    fn test_cancel_token_unblocks_a_silent_session() {
        let (_console, mut repl) = session(MockProcesses::new());
        let cancel = repl.cancel_token();

        std::thread::scope(|s| {
            let run = s.spawn(|| repl.run());
            cancel.cancel();
            let err = run.join().unwrap().unwrap_err();
            assert!(matches!(err, ReplError::Console(ConsoleError::Cancelled)));
        });
    }

    #[test]
    fn test_empty_line_runs_nothing() {
        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, "\n");
        type_eof(&console);

        repl.run().unwrap();

        assert_eq!(repl.executor().api().spawn_count(), 0);
        assert_eq!(err_text(&repl), "$ $ ");
    }

    #[test]
    fn test_parse_error_reports_and_loop_continues() {
        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, "cat <\nls\n");
        type_eof(&console);

        repl.run().unwrap();

        assert!(err_text(&repl).contains("missing file for redirection"));
        assert_eq!(repl.executor().api().spawn_count(), 1);
        assert!(out_text(&repl).is_empty());
    }

    #[test]
    fn test_failed_leaf_is_reported_not_fatal() {
        let api = MockProcesses::new().with_failing_spawn("nope");
        let (console, mut repl) = session(api);
        type_line(&console, "nope; ls\n");
        type_eof(&console);

        repl.run().unwrap();

        assert!(err_text(&repl).contains("exec nope failed"));
        assert_eq!(repl.executor().api().spawn_count(), 1);
    }

    #[test]
    fn test_pipe_line_spawns_both_sides() {
        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, "echo a | grep a\n");
        type_eof(&console);

        repl.run().unwrap();

        assert_eq!(repl.executor().api().spawn_count(), 2);
        assert_eq!(err_text(&repl), "$ $ ");
    }

    #[test]
    fn test_cd_failure_reports_diagnostic() {
        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, "cd /no/such/dir\n");
        type_eof(&console);

        repl.run().unwrap();

        assert!(err_text(&repl).contains("cannot cd /no/such/dir"));
        assert_eq!(repl.executor().api().spawn_count(), 0);
    }

    // The one test that moves the interpreter's working directory; cd
    // and completion share it, so both are exercised here.
    #[test]
    fn test_cd_then_completion_in_new_directory() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("target.txt")).unwrap();
        File::create(dir.path().join("tarball")).unwrap();

        let (console, mut repl) = session(MockProcesses::new());
        type_line(&console, &format!("cd {}\n", dir.path().display()));
        type_line(&console, "targ\t\n");
        type_line(&console, "tar\t\n");
        type_eof(&console);

        repl.run().unwrap();

        assert_eq!(repl.executor().api().spawn_count(), 0);
        assert_eq!(out_text(&repl), "target.txt\n\ntarball target.txt\n");
        assert_eq!(err_text(&repl), "$ $ $ $ ");
    }

    #[test]
    fn test_background_job_notice_follows_reap() {
        let api = MockProcesses::new().with_exit_code("slow", 7);
        let (console, mut repl) = session(api);
        type_line(&console, "slow &\n");
        type_eof(&console);

        repl.run().unwrap();

        assert!(err_text(&repl).contains("slow exited with 7"));
        let events = repl.executor().api().events();
        assert!(events.iter().all(|e| !matches!(e, MockEvent::Wait { .. })));
    }

    #[test]
    fn test_dump_key_lists_live_jobs() {
        let api = MockProcesses::new().with_hung("slow");
        let (console, mut repl) = session(api);
        type_line(&console, "slow &\n");
        let summary = console.interrupt([ctrl(b'P')]).unwrap();
        assert!(summary.process_dump);
        repl.dump_flag().store(true, Ordering::SeqCst);
        type_eof(&console);

        repl.run().unwrap();

        let err = err_text(&repl);
        assert!(err.contains("jobs: 1"));
        assert!(err.contains("slow"));
        assert!(!err.contains("exited"));
    }

    #[test]
    fn test_long_line_splits_at_read_chunk() {
        let console = Arc::new(Console::new(CellGrid::new()));
        let settings = ShellSettings {
            read_chunk: 8,
            ..ShellSettings::default()
        };
        let mut repl = Repl::new(
            Arc::clone(&console),
            MockProcesses::new(),
            settings,
            Vec::new(),
            Vec::new(),
        );
        type_line(&console, "abcdefghij\n");
        type_eof(&console);

        repl.run().unwrap();

        let spawned = repl.executor().api().spawned();
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].argv, vec!["abcdefgh"]);
        assert_eq!(spawned[1].argv, vec!["ij"]);
    }
}
