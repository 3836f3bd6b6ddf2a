//! Raw-byte pump from the input stream into console interrupts.
//!
//! The producer half of a session: read chunks, hand them to
//! [`Console::interrupt`], surface dump requests, and when the stream
//! dries up make sure the blocked reader actually observes end-of-file.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use console_core::{key, Console, TextDevice};

/// Bytes pulled from the source per interrupt batch.
const CHUNK: usize = 64;

/// Feeds `src` into the console until it is exhausted or errors, then
/// closes the session: a partial final line is committed, the
/// end-of-file key is staged, and the blocked reader wakes.
/// Process-dump requests are raised on `dump` for the loop to service.
pub fn pump<D, R>(console: &Console<D>, mut src: R, dump: &AtomicBool)
where
    D: TextDevice,
    R: Read,
{
    let mut chunk = [0u8; CHUNK];
    loop {
        match src.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => match console.interrupt(chunk[..n].iter().copied()) {
                Ok(summary) => {
                    if summary.process_dump {
                        dump.store(true, Ordering::SeqCst);
                    }
                }
                Err(_) => return,
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    finish(console);
}

/// The end-of-file key only stages the marker on an empty line, so an
/// uncommitted tail is committed first.
fn finish<D: TextDevice>(console: &Console<D>) {
    let pending = console
        .with_editor(|ed| ed.buffer().line_len())
        .unwrap_or(0);
    if pending > 0 {
        let _ = console.interrupt([b'\n']);
    }
    let _ = console.interrupt([key::ctrl(b'D')]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_core::CancelToken;
    use console_device::CellGrid;
    use std::io::Cursor;

    fn read_line(console: &Console<CellGrid>) -> Vec<u8> {
        let mut buf = [0u8; 100];
        let n = console.read(&mut buf, &CancelToken::new()).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn test_pump_delivers_lines_and_end_of_file() {
        let console = Console::new(CellGrid::new());
        let dump = AtomicBool::new(false);
        pump(&console, Cursor::new(b"ls\n".to_vec()), &dump);

        assert_eq!(read_line(&console), b"ls\n");
        assert_eq!(read_line(&console), b"");
        assert!(!dump.load(Ordering::SeqCst));
    }

    #[test]
    fn test_partial_final_line_is_committed_before_end_of_file() {
        let console = Console::new(CellGrid::new());
        let dump = AtomicBool::new(false);
        pump(&console, Cursor::new(b"echo hi".to_vec()), &dump);

        assert_eq!(read_line(&console), b"echo hi\n");
        assert_eq!(read_line(&console), b"");
    }

    #[test]
    fn test_source_larger_than_one_chunk_is_fed_whole() {
        let console = Console::new(CellGrid::new());
        let dump = AtomicBool::new(false);
        let mut src = vec![b'x'; 70];
        src.push(b'\n');
        pump(&console, Cursor::new(src.clone()), &dump);

        assert_eq!(read_line(&console), src);
        assert_eq!(read_line(&console), b"");
    }

    #[test]
    fn test_dump_key_raises_the_flag() {
        let console = Console::new(CellGrid::new());
        let dump = AtomicBool::new(false);
        pump(&console, Cursor::new(vec![key::ctrl(b'P')]), &dump);

        assert!(dump.load(Ordering::SeqCst));
        assert_eq!(read_line(&console), b"");
    }
}
