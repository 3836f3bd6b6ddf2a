//! The per-key line editor state machine.
//!
//! One decoded key in, buffer and screen effects out. The editor owns the
//! device handle, the ring buffer, undo history, selection and clipboard;
//! the console wraps the whole thing in its lock. Echo discipline: append
//! renders one byte, any structural edit redraws the shifted tail and
//! restores the hardware cursor by hand.

use console_device::{TextDevice, BACKSPACE};

use crate::buffer::{InputBuffer, EOF_MARK};
use crate::history::EditHistory;
use crate::key::Key;
use crate::selection::{Clipboard, Selection};
use crate::snapshot::EditorSnapshot;

/// Outcome of feeding one key to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Key handled; nothing new for readers.
    Continue,
    /// Lines were committed; wake one reader per line. A paste can commit
    /// more than one.
    Committed { lines: usize },
    /// Run the process dump after the console lock is released.
    ProcessDump,
}

fn is_word_space(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Line editor over a [`TextDevice`].
pub struct LineEditor<D: TextDevice> {
    device: D,
    buffer: InputBuffer,
    history: EditHistory,
    selection: Selection,
    clipboard: Clipboard,
}

impl<D: TextDevice> LineEditor<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            buffer: InputBuffer::new(),
            history: EditHistory::new(),
            selection: Selection::Idle,
            clipboard: Clipboard::new(),
        }
    }

    /// Apply one key and report what it produced.
    pub fn apply_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Insert(byte) => {
                if self.insert_byte(byte) {
                    KeyOutcome::Committed { lines: 1 }
                } else {
                    KeyOutcome::Continue
                }
            }
            Key::Backspace => {
                self.backspace();
                KeyOutcome::Continue
            }
            Key::KillLine => {
                self.kill_line();
                KeyOutcome::Continue
            }
            Key::Left => {
                self.move_left();
                KeyOutcome::Continue
            }
            Key::Right => {
                self.move_right();
                KeyOutcome::Continue
            }
            Key::Home => {
                self.move_home();
                KeyOutcome::Continue
            }
            Key::End => {
                self.move_end();
                KeyOutcome::Continue
            }
            // Reserved band without line semantics.
            Key::Up | Key::Down => KeyOutcome::Continue,
            Key::WordForward => self.word_forward(),
            Key::WordBackward => {
                self.word_backward();
                KeyOutcome::Continue
            }
            Key::Undo => {
                self.undo();
                KeyOutcome::Continue
            }
            Key::SelectMark => {
                self.select_mark();
                KeyOutcome::Continue
            }
            Key::Copy => {
                self.copy_selection();
                KeyOutcome::Continue
            }
            Key::Paste => self.paste(),
            Key::ProcessDump => KeyOutcome::ProcessDump,
        }
    }

    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut InputBuffer {
        &mut self.buffer
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub(crate) fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Deterministic state capture for parity tests.
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            read_count: self.buffer.read_count(),
            write_count: self.buffer.write_count(),
            edit_count: self.buffer.edit_count(),
            cursor_offset: self.buffer.cursor(),
            line: self.buffer.line_to_vec(),
            hardware_cursor: self.device.cursor(),
            history_depth: self.history.len(),
            selection: self.selection,
            clipboard: self.clipboard.paste().to_vec(),
        }
    }

    /// Hardware cell where the current line starts.
    fn line_start_hw(&self) -> usize {
        self.device.cursor().saturating_sub(self.buffer.cursor())
    }

    /// Take an applied highlight off the screen. True if there was one.
    fn clear_applied_selection(&mut self) -> bool {
        if let Some((lo, hi)) = self.selection.normalized() {
            self.device.invert(lo, hi);
            self.selection = Selection::Idle;
            true
        } else {
            false
        }
    }

    /// Applied selection clipped to the current line, as inclusive line
    /// offsets. `None` when nothing of it lies on the line.
    fn selection_line_range(&self) -> Option<(usize, usize)> {
        let (lo, hi) = self.selection.normalized()?;
        let line_start = self.line_start_hw();
        let len = self.buffer.line_len();
        if len == 0 || hi < line_start {
            return None;
        }
        let rel_start = lo.saturating_sub(line_start);
        let mut rel_end = hi - line_start;
        if rel_end >= len {
            rel_end = len - 1;
        }
        if rel_start > rel_end {
            return None;
        }
        Some((rel_start, rel_end))
    }

    /// Insert one byte at the cursor. Returns true when the insertion
    /// committed the line.
    fn insert_byte(&mut self, raw: u8) -> bool {
        // A full ring drops the key outright, selection or not.
        if self.buffer.is_full() {
            return false;
        }
        if self.selection.is_selected() {
            self.delete_selection();
        }
        let byte = if raw == b'\r' { b'\n' } else { raw };
        let pos = self.buffer.cursor();
        let len = self.buffer.line_len();
        self.buffer.insert(pos, byte);
        self.buffer.set_cursor(pos + 1);
        self.history.shift_for_insert(pos);
        self.history.push(byte, pos);

        if pos < len {
            // Mid-line: redraw the shifted tail, then step the cursor one.
            let hw = self.device.cursor();
            for off in pos..self.buffer.line_len() {
                self.device.render(self.buffer.line_byte(off));
            }
            self.device.set_cursor(hw + 1);
        } else {
            self.device.render(byte);
        }

        if byte == b'\n' || byte == EOF_MARK || self.buffer.is_full() {
            self.buffer.commit();
            return true;
        }
        false
    }

    fn backspace(&mut self) {
        if self.selection.is_selected() {
            self.delete_selection();
            return;
        }
        let pos = self.buffer.cursor();
        if pos == 0 {
            return;
        }
        self.buffer.remove(pos - 1);
        self.buffer.set_cursor(pos - 1);

        let start_hw = self.device.cursor().saturating_sub(1);
        self.device.set_cursor(start_hw);
        for off in pos - 1..self.buffer.line_len() {
            self.device.render(self.buffer.line_byte(off));
        }
        self.device.render(b' ');
        self.device.set_cursor(start_hw);
    }

    fn kill_line(&mut self) {
        self.clear_applied_selection();
        let len = self.buffer.line_len();
        let line_start = self.line_start_hw();
        self.device.set_cursor(line_start + len);
        while self.buffer.line_len() > 0
            && self.buffer.line_byte(self.buffer.line_len() - 1) != b'\n'
        {
            self.buffer.remove(self.buffer.line_len() - 1);
            self.device.render(BACKSPACE);
        }
        self.buffer.set_cursor(self.buffer.line_len());
    }

    fn move_left(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        let pos = self.buffer.cursor();
        if pos > 0 {
            self.buffer.set_cursor(pos - 1);
            let hw = self.device.cursor();
            self.device.set_cursor(hw.saturating_sub(1));
        }
    }

    fn move_right(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        let pos = self.buffer.cursor();
        if pos < self.buffer.line_len() {
            self.device.set_cursor(self.device.cursor() + 1);
            self.buffer.set_cursor(pos + 1);
        }
    }

    fn move_home(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        let line_start = self.line_start_hw();
        self.device.set_cursor(line_start);
        self.buffer.set_cursor(0);
    }

    fn move_end(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        let pos = self.buffer.cursor();
        let len = self.buffer.line_len();
        self.device.set_cursor(self.device.cursor() + (len - pos));
        self.buffer.set_cursor(len);
    }

    fn word_forward(&mut self) -> KeyOutcome {
        if self.clear_applied_selection() {
            return KeyOutcome::Continue;
        }
        if self.buffer.line_len() == 0 {
            // End-of-file: stage the marker (unechoed) so a reader drains
            // to it and reports zero bytes. A ring already full of
            // committed bytes cannot take it; the commit alone still
            // wakes the reader.
            self.buffer.insert(0, EOF_MARK);
            self.buffer.commit();
            return KeyOutcome::Committed { lines: 1 };
        }
        let len = self.buffer.line_len();
        let pos = self.buffer.cursor();
        let mut i = pos;
        while i < len && !is_word_space(self.buffer.line_byte(i)) {
            i += 1;
        }
        while i < len && is_word_space(self.buffer.line_byte(i)) {
            i += 1;
        }
        if i != pos {
            let hw = self.device.cursor();
            self.device.set_cursor(hw + (i - pos));
            self.buffer.set_cursor(i);
        }
        KeyOutcome::Continue
    }

    fn word_backward(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        if self.buffer.line_len() == 0 {
            return;
        }
        let pos = self.buffer.cursor();
        let mut i = pos;
        while i > 0 && is_word_space(self.buffer.line_byte(i - 1)) {
            i -= 1;
        }
        while i > 0 && !is_word_space(self.buffer.line_byte(i - 1)) {
            i -= 1;
        }
        if i != pos {
            let hw = self.device.cursor();
            self.device.set_cursor(hw.saturating_sub(pos - i));
            self.buffer.set_cursor(i);
        }
    }

    fn undo(&mut self) {
        if self.clear_applied_selection() {
            return;
        }
        let Some(record) = self.history.pop() else {
            return;
        };
        let len = self.buffer.line_len();
        if record.position >= len {
            // Stale record from an earlier committed line; the byte it
            // would remove is no longer editable.
            return;
        }
        let current = self.buffer.cursor();
        let line_start = self.line_start_hw();
        self.buffer.remove(record.position);
        self.history.shift_after_remove(record.position);

        self.device.set_cursor(line_start);
        for _ in 0..len {
            self.device.render(b' ');
        }
        self.device.set_cursor(line_start);
        for off in 0..self.buffer.line_len() {
            self.device.render(self.buffer.line_byte(off));
        }

        let new_cursor = if current >= record.position {
            current.saturating_sub(1)
        } else {
            current
        };
        self.buffer.set_cursor(new_cursor);
        self.device.set_cursor(line_start + new_cursor);
    }

    fn select_mark(&mut self) {
        match self.selection {
            Selection::Selected { .. } => {
                self.clear_applied_selection();
            }
            Selection::Selecting { start } => {
                let end = self.device.cursor();
                self.selection = Selection::Selected { start, end };
                if let Some((lo, hi)) = self.selection.normalized() {
                    self.device.invert(lo, hi);
                }
            }
            Selection::Idle => {
                self.selection = Selection::Selecting {
                    start: self.device.cursor(),
                };
            }
        }
    }

    fn copy_selection(&mut self) {
        match self.selection {
            Selection::Selected { .. } => {
                if let Some((rel_start, rel_end)) = self.selection_line_range() {
                    let bytes: Vec<u8> = (rel_start..=rel_end)
                        .map(|off| self.buffer.line_byte(off))
                        .collect();
                    self.clipboard.copy(&bytes);
                }
                // Selection stays applied.
            }
            Selection::Selecting { .. } => self.selection = Selection::Idle,
            Selection::Idle => {}
        }
    }

    fn delete_selection(&mut self) {
        let range = self.selection_line_range();
        self.clear_applied_selection();
        let Some((rel_start, rel_end)) = range else {
            return;
        };
        let count = rel_end - rel_start + 1;
        let line_start = self.line_start_hw();
        self.buffer.remove_range(rel_start, count);
        self.history.remove_range(rel_start, count);

        self.device.set_cursor(line_start + rel_start);
        for off in rel_start..self.buffer.line_len() {
            self.device.render(self.buffer.line_byte(off));
        }
        for _ in 0..count {
            self.device.render(b' ');
        }
        self.buffer.set_cursor(rel_start);
        self.device.set_cursor(line_start + rel_start);
    }

    fn paste(&mut self) -> KeyOutcome {
        if self.clipboard.is_empty() {
            return KeyOutcome::Continue;
        }
        if self.selection.is_selected() {
            self.delete_selection();
        } else if self.selection.is_selecting() {
            self.selection = Selection::Idle;
        }
        let bytes = self.clipboard.paste().to_vec();
        let mut lines = 0;
        for byte in bytes {
            if byte == 0 {
                continue;
            }
            if self.insert_byte(byte) {
                lines += 1;
            }
        }
        if lines > 0 {
            KeyOutcome::Committed { lines }
        } else {
            KeyOutcome::Continue
        }
    }
}
