//! The process-spawning seam.
//!
//! The executor never talks to the OS directly. It drives [`ProcessApi`],
//! for which two implementations exist:
//! - [`HostProcesses`]: real processes via `std::process`, real pipes via
//!   `std::io::pipe`, real files
//! - [`MockProcesses`]: a recorder that hands out handles and logs every
//!   call, for deterministic orchestration tests
//!
//! Descriptor wiring is builder-style: files and pipe ends are opened
//! up front, attached to a [`SpawnRequest`], and duplicated into the
//! child at spawn. Duplication (not transfer) is what lets several
//! children share one open file description, the way forked processes
//! inherit a descriptor.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{PipeReader, PipeWriter};
use std::process::{Child, Command, ExitStatus, Stdio};

use shell_syntax::RedirMode;
use thiserror::Error;

use crate::ids::{FileId, PipeId, ProcId};

/// Conventional process exit code. 0 is success.
pub type ExitCode = i32;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("open {path} failed")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("exec {name} failed")]
    SpawnFailed {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("pipe allocation failed")]
    PipeFailed(#[source] io::Error),
    #[error("descriptor duplication failed")]
    DupFailed(#[source] io::Error),
    #[error("wait failed")]
    WaitFailed(#[source] io::Error),
    #[error("stale descriptor handle")]
    StaleHandle,
}

/// Where a spawned process's standard stream comes from or goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSpec {
    /// Share the shell's own stream.
    Inherit,
    /// A file previously opened through [`ProcessApi::open_file`].
    File(FileId),
    /// Read end of an allocated pipe.
    PipeRead(PipeId),
    /// Write end of an allocated pipe.
    PipeWrite(PipeId),
}

/// Everything needed to start one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub argv: Vec<String>,
    pub stdin: StreamSpec,
    pub stdout: StreamSpec,
}

impl SpawnRequest {
    /// Creates a request inheriting both standard streams
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            stdin: StreamSpec::Inherit,
            stdout: StreamSpec::Inherit,
        }
    }

    /// Rebinds standard input
    pub fn with_stdin(mut self, spec: StreamSpec) -> Self {
        self.stdin = spec;
        self
    }

    /// Rebinds standard output
    pub fn with_stdout(mut self, spec: StreamSpec) -> Self {
        self.stdout = spec;
        self
    }

    /// Program name, for diagnostics.
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

/// Process primitives the executor runs on.
///
/// # Design Principles
///
/// **Handles, not descriptors**: callers hold opaque ids; raw OS
/// descriptors never cross this boundary.
///
/// **Wire before spawn**: every stream a child will use exists before
/// the child does, so end-of-file propagates once writers are done.
///
/// **Explicit teardown**: pipes and redirect files are released by the
/// caller when the subtree that needed them has been spawned; children
/// keep their own duplicated handles.
pub trait ProcessApi {
    /// Opens a redirection target. `WriteCreate` creates the file if
    /// missing and does not truncate an existing one.
    fn open_file(&mut self, path: &str, mode: RedirMode) -> Result<FileId, ExecError>;

    /// Drops an opened file. The id must be live.
    fn close_file(&mut self, file: FileId) -> Result<(), ExecError>;

    /// Allocates one pipe, both ends held until [`release_pipe`].
    ///
    /// [`release_pipe`]: ProcessApi::release_pipe
    fn pipe(&mut self) -> Result<PipeId, ExecError>;

    /// Drops the shell's copies of both pipe ends.
    fn release_pipe(&mut self, pipe: PipeId) -> Result<(), ExecError>;

    /// Starts a process with its streams attached.
    fn spawn(&mut self, request: SpawnRequest) -> Result<ProcId, ExecError>;

    /// Blocks until the process exits and returns its exit code.
    fn wait(&mut self, proc: ProcId) -> Result<ExitCode, ExecError>;

    /// Non-blocking poll; `Some(code)` reaps the process.
    fn try_wait(&mut self, proc: ProcId) -> Result<Option<ExitCode>, ExecError>;
}

fn status_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    match ExitStatusExt::signal(&status) {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> ExitCode {
    -1
}

struct PipeEnds {
    reader: PipeReader,
    writer: PipeWriter,
}

/// Real implementation over the host OS.
#[derive(Default)]
pub struct HostProcesses {
    files: HashMap<FileId, File>,
    pipes: HashMap<PipeId, PipeEnds>,
    children: HashMap<ProcId, Child>,
}

impl HostProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    fn stdio_for(&self, spec: StreamSpec) -> Result<Stdio, ExecError> {
        match spec {
            StreamSpec::Inherit => Ok(Stdio::inherit()),
            StreamSpec::File(id) => {
                let file = self.files.get(&id).ok_or(ExecError::StaleHandle)?;
                let dup = file.try_clone().map_err(ExecError::DupFailed)?;
                Ok(Stdio::from(dup))
            }
            StreamSpec::PipeRead(id) => {
                let ends = self.pipes.get(&id).ok_or(ExecError::StaleHandle)?;
                let dup = ends.reader.try_clone().map_err(ExecError::DupFailed)?;
                Ok(Stdio::from(dup))
            }
            StreamSpec::PipeWrite(id) => {
                let ends = self.pipes.get(&id).ok_or(ExecError::StaleHandle)?;
                let dup = ends.writer.try_clone().map_err(ExecError::DupFailed)?;
                Ok(Stdio::from(dup))
            }
        }
    }
}

impl ProcessApi for HostProcesses {
    fn open_file(&mut self, path: &str, mode: RedirMode) -> Result<FileId, ExecError> {
        let opened = match mode {
            RedirMode::Read => File::open(path),
            // Write without truncate, for both redirection forms.
            RedirMode::WriteCreate => OpenOptions::new().write(true).create(true).open(path),
        };
        let file = opened.map_err(|source| ExecError::OpenFailed {
            path: path.to_string(),
            source,
        })?;
        let id = FileId::new();
        self.files.insert(id, file);
        Ok(id)
    }

    fn close_file(&mut self, file: FileId) -> Result<(), ExecError> {
        self.files.remove(&file).ok_or(ExecError::StaleHandle)?;
        Ok(())
    }

    fn pipe(&mut self) -> Result<PipeId, ExecError> {
        let (reader, writer) = io::pipe().map_err(ExecError::PipeFailed)?;
        let id = PipeId::new();
        self.pipes.insert(id, PipeEnds { reader, writer });
        Ok(id)
    }

    fn release_pipe(&mut self, pipe: PipeId) -> Result<(), ExecError> {
        self.pipes.remove(&pipe).ok_or(ExecError::StaleHandle)?;
        Ok(())
    }

    fn spawn(&mut self, request: SpawnRequest) -> Result<ProcId, ExecError> {
        let name = request.name().to_string();
        if request.argv.is_empty() {
            return Err(ExecError::SpawnFailed {
                name,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty argv"),
            });
        }
        let stdin = self.stdio_for(request.stdin)?;
        let stdout = self.stdio_for(request.stdout)?;
        let child = Command::new(&request.argv[0])
            .args(&request.argv[1..])
            .stdin(stdin)
            .stdout(stdout)
            .spawn()
            .map_err(|source| ExecError::SpawnFailed { name, source })?;
        let id = ProcId::new();
        self.children.insert(id, child);
        Ok(id)
    }

    fn wait(&mut self, proc: ProcId) -> Result<ExitCode, ExecError> {
        let mut child = self.children.remove(&proc).ok_or(ExecError::StaleHandle)?;
        let status = child.wait().map_err(ExecError::WaitFailed)?;
        Ok(status_code(status))
    }

    fn try_wait(&mut self, proc: ProcId) -> Result<Option<ExitCode>, ExecError> {
        let child = self.children.get_mut(&proc).ok_or(ExecError::StaleHandle)?;
        match child.try_wait().map_err(ExecError::WaitFailed)? {
            Some(status) => {
                self.children.remove(&proc);
                Ok(Some(status_code(status)))
            }
            None => Ok(None),
        }
    }
}

/// One recorded [`MockProcesses`] call, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Open { path: String, mode: RedirMode },
    CloseFile,
    Pipe,
    ReleasePipe,
    Spawn { name: String },
    Wait { name: String },
    TryWait { name: String },
}

/// Recording double for orchestration tests.
///
/// Hands out fresh ids, validates that every handle a spawn references
/// is still live, and logs each call. Exit codes default to 0 and can
/// be scripted per program name, as can spawn/open failures and
/// processes that stay running until [`finish`] is called.
///
/// [`finish`]: MockProcesses::finish
#[derive(Default)]
pub struct MockProcesses {
    events: Vec<MockEvent>,
    spawned: Vec<SpawnRequest>,
    files: HashMap<FileId, String>,
    pipes: Vec<PipeId>,
    running: HashMap<ProcId, String>,
    exit_codes: HashMap<String, ExitCode>,
    failing_spawns: Vec<String>,
    failing_opens: Vec<String>,
    hung: Vec<String>,
}

impl MockProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `spawn` to fail for this program name
    pub fn with_failing_spawn(mut self, name: &str) -> Self {
        self.failing_spawns.push(name.to_string());
        self
    }

    /// Scripts `open_file` to fail for this path
    pub fn with_failing_open(mut self, path: &str) -> Self {
        self.failing_opens.push(path.to_string());
        self
    }

    /// Scripts the exit code returned when this program is reaped
    pub fn with_exit_code(mut self, name: &str, code: ExitCode) -> Self {
        self.exit_codes.insert(name.to_string(), code);
        self
    }

    /// Keeps this program running until [`finish`] is called
    ///
    /// [`finish`]: MockProcesses::finish
    pub fn with_hung(mut self, name: &str) -> Self {
        self.hung.push(name.to_string());
        self
    }

    /// Lets a hung program exit on the next poll.
    pub fn finish(&mut self, name: &str) {
        self.hung.retain(|hung| hung != name);
    }

    pub fn events(&self) -> &[MockEvent] {
        &self.events
    }

    /// Spawn requests in spawn order, including stream specs.
    pub fn spawned(&self) -> &[SpawnRequest] {
        &self.spawned
    }

    /// Path a live file handle was opened from.
    pub fn file_path(&self, file: FileId) -> Option<&str> {
        self.files.get(&file).map(String::as_str)
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.len()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.len()
    }

    fn check_stream(&self, spec: StreamSpec) -> Result<(), ExecError> {
        match spec {
            StreamSpec::Inherit => Ok(()),
            StreamSpec::File(id) => {
                if self.files.contains_key(&id) {
                    Ok(())
                } else {
                    Err(ExecError::StaleHandle)
                }
            }
            StreamSpec::PipeRead(id) | StreamSpec::PipeWrite(id) => {
                if self.pipes.contains(&id) {
                    Ok(())
                } else {
                    Err(ExecError::StaleHandle)
                }
            }
        }
    }

    fn name_of(&self, proc: ProcId) -> Result<String, ExecError> {
        self.running
            .get(&proc)
            .cloned()
            .ok_or(ExecError::StaleHandle)
    }
}

impl ProcessApi for MockProcesses {
    fn open_file(&mut self, path: &str, mode: RedirMode) -> Result<FileId, ExecError> {
        if self.failing_opens.iter().any(|p| p == path) {
            return Err(ExecError::OpenFailed {
                path: path.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted open failure"),
            });
        }
        let id = FileId::new();
        self.files.insert(id, path.to_string());
        self.events.push(MockEvent::Open {
            path: path.to_string(),
            mode,
        });
        Ok(id)
    }

    fn close_file(&mut self, file: FileId) -> Result<(), ExecError> {
        self.files.remove(&file).ok_or(ExecError::StaleHandle)?;
        self.events.push(MockEvent::CloseFile);
        Ok(())
    }

    fn pipe(&mut self) -> Result<PipeId, ExecError> {
        let id = PipeId::new();
        self.pipes.push(id);
        self.events.push(MockEvent::Pipe);
        Ok(id)
    }

    fn release_pipe(&mut self, pipe: PipeId) -> Result<(), ExecError> {
        let before = self.pipes.len();
        self.pipes.retain(|p| *p != pipe);
        if self.pipes.len() == before {
            return Err(ExecError::StaleHandle);
        }
        self.events.push(MockEvent::ReleasePipe);
        Ok(())
    }

    fn spawn(&mut self, request: SpawnRequest) -> Result<ProcId, ExecError> {
        let name = request.name().to_string();
        if self.failing_spawns.iter().any(|n| *n == name) {
            return Err(ExecError::SpawnFailed {
                name,
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        self.check_stream(request.stdin)?;
        self.check_stream(request.stdout)?;
        let id = ProcId::new();
        self.running.insert(id, name.clone());
        self.spawned.push(request);
        self.events.push(MockEvent::Spawn { name });
        Ok(id)
    }

    fn wait(&mut self, proc: ProcId) -> Result<ExitCode, ExecError> {
        let name = self.name_of(proc)?;
        self.running.remove(&proc);
        self.events.push(MockEvent::Wait { name: name.clone() });
        Ok(self.exit_codes.get(&name).copied().unwrap_or(0))
    }

    fn try_wait(&mut self, proc: ProcId) -> Result<Option<ExitCode>, ExecError> {
        let name = self.name_of(proc)?;
        self.events.push(MockEvent::TryWait { name: name.clone() });
        if self.hung.iter().any(|hung| *hung == name) {
            return Ok(None);
        }
        self.running.remove(&proc);
        Ok(Some(self.exit_codes.get(&name).copied().unwrap_or(0)))
    }
}
