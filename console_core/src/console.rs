//! Console front half: one lock around the editor, blocking reads, and
//! interrupt-driven key delivery.
//!
//! All mutation funnels through the mutex. `interrupt` applies decoded
//! keys and wakes one reader per committed line; `read` sleeps on the
//! condvar until committed bytes appear, re-checking its cancel token on
//! every resumption so a shutdown is never missed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use console_device::TextDevice;
use thiserror::Error;

use crate::buffer::EOF_MARK;
use crate::editor::{KeyOutcome, LineEditor};
use crate::key::Key;
use crate::snapshot::EditorSnapshot;

/// How long a blocked reader sleeps between cancel checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("read cancelled")]
    Cancelled,
    #[error("console lock poisoned")]
    Poisoned,
}

/// Shared flag a reader polls while blocked.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// What one interrupt batch produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InterruptSummary {
    pub committed_lines: usize,
    /// A process dump was requested; run it after this call returns.
    pub process_dump: bool,
}

pub struct Console<D: TextDevice> {
    state: Mutex<LineEditor<D>>,
    readers: Condvar,
}

impl<D: TextDevice> Console<D> {
    pub fn new(device: D) -> Self {
        Self {
            state: Mutex::new(LineEditor::new(device)),
            readers: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LineEditor<D>>, ConsoleError> {
        self.state.lock().map_err(|_| ConsoleError::Poisoned)
    }

    /// Feed raw key codes, as delivered by the input source. Unknown
    /// codes are dropped. Readers are woken once per committed line.
    pub fn interrupt<I>(&self, codes: I) -> Result<InterruptSummary, ConsoleError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut summary = InterruptSummary::default();
        let mut editor = self.lock()?;
        for code in codes {
            let Some(key) = Key::from_code(code) else {
                continue;
            };
            match editor.apply_key(key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Committed { lines } => {
                    summary.committed_lines += lines;
                    for _ in 0..lines {
                        self.readers.notify_one();
                    }
                }
                KeyOutcome::ProcessDump => summary.process_dump = true,
            }
        }
        Ok(summary)
    }

    /// Blocking read of committed bytes. Stops early at a newline
    /// (inclusive) or at the end-of-file marker (excluded; a marker that
    /// follows payload bytes is pushed back so the next call returns 0).
    pub fn read(&self, dst: &mut [u8], cancel: &CancelToken) -> Result<usize, ConsoleError> {
        let target = dst.len();
        let mut n = target;
        let mut editor = self.lock()?;
        while n > 0 {
            let Some(byte) = editor.buffer_mut().take_committed() else {
                if cancel.is_cancelled() {
                    return Err(ConsoleError::Cancelled);
                }
                let (guard, _) = self
                    .readers
                    .wait_timeout(editor, POLL_INTERVAL)
                    .map_err(|_| ConsoleError::Poisoned)?;
                editor = guard;
                continue;
            };
            if byte == EOF_MARK {
                if n < target {
                    // Partial line consumed; keep the marker for the
                    // next read.
                    editor.buffer_mut().rewind_read();
                }
                break;
            }
            dst[target - n] = byte;
            n -= 1;
            if byte == b'\n' {
                break;
            }
        }
        editor.buffer_mut().reset_cursor();
        Ok(target - n)
    }

    /// Render bytes straight through the device, bypassing line editing.
    pub fn write(&self, bytes: &[u8]) -> Result<usize, ConsoleError> {
        let mut editor = self.lock()?;
        for &byte in bytes {
            editor.device_mut().render(byte);
        }
        Ok(bytes.len())
    }

    pub fn snapshot(&self) -> Result<EditorSnapshot, ConsoleError> {
        Ok(self.lock()?.snapshot())
    }

    /// Inspect the device under the lock.
    pub fn with_device<R>(&self, f: impl FnOnce(&D) -> R) -> Result<R, ConsoleError> {
        Ok(f(self.lock()?.device()))
    }

    /// Run a closure against the locked editor.
    pub fn with_editor<R>(
        &self,
        f: impl FnOnce(&mut LineEditor<D>) -> R,
    ) -> Result<R, ConsoleError> {
        let mut editor = self.lock()?;
        Ok(f(&mut editor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ctrl;
    use console_device::CellGrid;
    use std::thread;

    fn console() -> Console<CellGrid> {
        Console::new(CellGrid::new())
    }

    #[test]
    fn test_read_returns_committed_line() {
        let con = console();
        con.interrupt(b"ls\n".iter().copied()).unwrap();

        let mut buf = [0u8; 64];
        let n = con.read(&mut buf, &CancelToken::new()).unwrap();
        assert_eq!(&buf[..n], b"ls\n");
    }

    #[test]
    fn test_read_blocks_until_interrupt_commits() {
        let con = console();
        thread::scope(|s| {
            let reader = s.spawn(|| {
                let mut buf = [0u8; 16];
                let n = con.read(&mut buf, &CancelToken::new()).unwrap();
                buf[..n].to_vec()
            });

            let summary = con.interrupt(b"go\n".iter().copied()).unwrap();
            assert_eq!(summary.committed_lines, 1);
            assert_eq!(reader.join().unwrap(), b"go\n");
        });
    }

    #[test]
    fn test_reads_split_on_newlines() {
        let con = console();
        con.interrupt(b"a\nb\n".iter().copied()).unwrap();

        let cancel = CancelToken::new();
        let mut buf = [0u8; 64];
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(&buf[..n], b"a\n");
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(&buf[..n], b"b\n");
    }

    #[test]
    fn test_eof_on_empty_line_reads_zero() {
        let con = console();
        let summary = con.interrupt([ctrl(b'D')]).unwrap();
        assert_eq!(summary.committed_lines, 1);

        let mut buf = [0u8; 16];
        let n = con.read(&mut buf, &CancelToken::new()).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_eof_after_payload_is_pushed_back() {
        let con = console();
        // Stage "hi" followed by the marker, committed without a newline.
        con.with_editor(|ed| {
            let buf = ed.buffer_mut();
            buf.insert(0, b'h');
            buf.insert(1, b'i');
            buf.insert(2, EOF_MARK);
            buf.commit();
        })
        .unwrap();

        let cancel = CancelToken::new();
        let mut buf = [0u8; 16];
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(&buf[..n], b"hi");
        // The marker was left in place; it terminates the next read.
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_cancel_unblocks_reader() {
        let con = console();
        let cancel = CancelToken::new();
        thread::scope(|s| {
            let reader = s.spawn(|| {
                let mut buf = [0u8; 16];
                con.read(&mut buf, &cancel)
            });
            cancel.cancel();
            let err = reader.join().unwrap().unwrap_err();
            assert!(matches!(err, ConsoleError::Cancelled));
        });
    }

    #[test]
    fn test_process_dump_is_reported_not_applied() {
        let con = console();
        let summary = con.interrupt([ctrl(b'P')]).unwrap();
        assert!(summary.process_dump);
        assert_eq!(summary.committed_lines, 0);
        assert_eq!(con.snapshot().unwrap().line, b"");
    }

    #[test]
    fn test_write_bypasses_line_discipline() {
        let con = console();
        let n = con.write(b"out\n").unwrap();
        assert_eq!(n, 4);
        con.with_device(|dev| {
            assert_eq!(dev.row_string(0), "out");
            assert_eq!(dev.cursor(), console_device::GRID_WIDTH);
        })
        .unwrap();
        // Nothing committed for readers.
        assert_eq!(con.snapshot().unwrap().write_count, 0);
    }

    #[test]
    fn test_pasted_lines_wake_one_reader_each() {
        let con = console();
        con.with_editor(|ed| ed.clipboard_mut().copy(b"a\nb\n")).unwrap();
        let summary = con.interrupt([ctrl(b'V')]).unwrap();
        assert_eq!(summary.committed_lines, 2);

        let cancel = CancelToken::new();
        let mut buf = [0u8; 16];
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(&buf[..n], b"a\n");
        let n = con.read(&mut buf, &cancel).unwrap();
        assert_eq!(&buf[..n], b"b\n");
    }

    #[test]
    fn test_with_editor_returns_the_closure_value() {
        let con = console();
        con.interrupt(b"ab".iter().copied()).unwrap();
        let len = con.with_editor(|ed| ed.buffer().line_len()).unwrap();
        assert_eq!(len, 2);
    }

    #[test]
    fn test_zero_length_read_returns_immediately() {
        let con = console();
        let mut buf = [0u8; 0];
        let n = con.read(&mut buf, &CancelToken::new()).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_unknown_codes_are_dropped() {
        let con = console();
        con.interrupt([0u8, 0u8]).unwrap();
        assert_eq!(con.snapshot().unwrap().line, b"");
    }
}
