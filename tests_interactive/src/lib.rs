//! # Interactive Console Integration Tests
//!
//! End-to-end checks of the keyboard-to-reader path: raw key codes in,
//! committed lines out, with the editor, the device grid and the
//! counters observed from outside.
//!
//! ## Test Philosophy
//!
//! - **Keys only**: every flow is driven through `Console::interrupt`,
//!   the way a keyboard interrupt handler would deliver it
//! - **Observable state**: assertions go through snapshots, reads and
//!   the device grid, never through editor internals
//! - **Real blocking**: reader threads genuinely block and are woken
//!   by commits

#![cfg(test)]

use std::thread;

use console_core::key::{ctrl, KEY_END, KEY_HOME, KEY_LEFT};
use console_core::{CancelToken, Console, EditorSnapshot};
use console_device::{CellGrid, NORMAL_ATTR};

fn console() -> Console<CellGrid> {
    Console::new(CellGrid::new())
}

#[test]
fn test_typed_line_reaches_blocked_reader_verbatim() {
    let console = console();
    let cancel = CancelToken::new();

    thread::scope(|s| {
        let reader = s.spawn(|| {
            let mut buf = [0u8; 100];
            let n = console.read(&mut buf, &cancel).unwrap();
            buf[..n].to_vec()
        });

        console.interrupt("echo hi\n".bytes()).unwrap();
        assert_eq!(reader.join().unwrap(), b"echo hi\n");
    });
}

#[test]
fn test_echo_renders_line_on_the_grid() {
    let console = console();
    console.interrupt("ls -l".bytes()).unwrap();

    let row = console.with_device(|d| d.row_string(0)).unwrap();
    assert!(row.starts_with("ls -l"));
}

#[test]
fn test_insert_backspace_restores_console_state() {
    let console = console();
    console.interrupt("ab".bytes()).unwrap();
    let grid_before = console.with_device(CellGrid::clone).unwrap();
    let before = console.snapshot().unwrap();

    console.interrupt([b'c', 0x08]).unwrap();

    let after = console.snapshot().unwrap();
    assert_eq!(console.with_device(CellGrid::clone).unwrap(), grid_before);
    assert_eq!(after.line, before.line);
    assert_eq!(after.cursor_offset, before.cursor_offset);
    assert_eq!(after.hardware_cursor, before.hardware_cursor);
    assert_eq!(after.read_count, before.read_count);
    assert_eq!(after.write_count, before.write_count);
    assert_eq!(after.edit_count, before.edit_count);
}

#[test]
fn test_highlight_and_clear_restore_attributes() {
    let console = console();
    console.interrupt("abcd".bytes()).unwrap();

    // Mark at the line end, move back, apply: a reversed range.
    console.interrupt([ctrl(b'S'), KEY_LEFT, KEY_LEFT, ctrl(b'S')]).unwrap();

    let attrs = console
        .with_device(|d| (d.attr_at(1), d.attr_at(2), d.attr_at(4)))
        .unwrap();
    assert_eq!(attrs.0, NORMAL_ATTR);
    assert_eq!(attrs.1, 0x70);
    assert_eq!(attrs.2, 0x70);

    console.interrupt([ctrl(b'S')]).unwrap();
    let restored = console
        .with_device(|d| (0..6).map(|i| d.attr_at(i)).collect::<Vec<_>>())
        .unwrap();
    assert!(restored.iter().all(|a| *a == NORMAL_ATTR));
}

#[test]
fn test_full_buffer_commits_without_newline() {
    let console = console();
    let summary = console.interrupt(std::iter::repeat(b'x').take(128)).unwrap();
    assert_eq!(summary.committed_lines, 1);

    let cancel = CancelToken::new();
    let mut buf = [0u8; 128];
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(n, 128);
    assert!(buf.iter().all(|b| *b == b'x'));

    console.interrupt("ok\n".bytes()).unwrap();
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(&buf[..n], b"ok\n");
}

#[test]
fn test_undo_discards_stale_history_across_lines() {
    let console = console();
    console.interrupt("hi\n".bytes()).unwrap();

    // Two live insertions, then two pops that hit stale records from
    // the committed line.
    console.interrupt("yo".bytes()).unwrap();
    console.interrupt([ctrl(b'Z'); 4]).unwrap();
    assert!(console.snapshot().unwrap().line.is_empty());

    console.interrupt("done\n".bytes()).unwrap();

    let cancel = CancelToken::new();
    let mut buf = [0u8; 100];
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(&buf[..n], b"hi\n");
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(&buf[..n], b"done\n");

    let snapshot = console.snapshot().unwrap();
    assert_eq!(snapshot.read_count, snapshot.write_count);
}

#[test]
fn test_copy_paste_commits_two_identical_lines() {
    let console = console();
    console.interrupt("run".bytes()).unwrap();
    console
        .interrupt([KEY_HOME, ctrl(b'S'), KEY_END, ctrl(b'S'), ctrl(b'C')])
        .unwrap();

    // The first paste replaces the still-applied selection.
    let first = console.interrupt([ctrl(b'V'), b'\n']).unwrap();
    assert_eq!(first.committed_lines, 1);
    let second = console.interrupt([ctrl(b'V'), b'\n']).unwrap();
    assert_eq!(second.committed_lines, 1);

    let cancel = CancelToken::new();
    let mut buf = [0u8; 100];
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(&buf[..n], b"run\n");
    let n = console.read(&mut buf, &cancel).unwrap();
    assert_eq!(&buf[..n], b"run\n");
}

#[test]
fn test_snapshot_serializes_for_fixtures() {
    let console = console();
    console.interrupt("echo fixture".bytes()).unwrap();

    let snapshot = console.snapshot().unwrap();
    let encoded = serde_json::to_string(&snapshot).unwrap();
    let decoded: EditorSnapshot = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, snapshot);
}
