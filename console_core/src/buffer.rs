//! The circular input buffer.
//!
//! Committed and in-progress bytes share one fixed ring. Three
//! monotonically increasing counters address it modulo the capacity:
//! `read` (next byte a reader consumes), `write` (committed boundary) and
//! `edit` (end of the line being edited), with `read <= write <= edit`
//! and `edit - read <= INPUT_CAPACITY` always.

/// Ring capacity in bytes.
pub const INPUT_CAPACITY: usize = 128;

/// In-band end-of-file marker (the Ctrl+D code). A reader that meets it
/// stops without copying it out.
pub const EOF_MARK: u8 = 0x04;

/// Fixed-size circular line buffer with monotonic counters.
#[derive(Debug, Clone)]
pub struct InputBuffer {
    bytes: [u8; INPUT_CAPACITY],
    read: u64,
    write: u64,
    edit: u64,
    /// Editing cursor relative to `write`, in `[0, edit - write]`.
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0; INPUT_CAPACITY],
            read: 0,
            write: 0,
            edit: 0,
            cursor: 0,
        }
    }

    fn slot(counter: u64) -> usize {
        (counter % INPUT_CAPACITY as u64) as usize
    }

    pub fn read_count(&self) -> u64 {
        self.read
    }

    pub fn write_count(&self) -> u64 {
        self.write
    }

    pub fn edit_count(&self) -> u64 {
        self.edit
    }

    /// Length of the in-progress line.
    pub fn line_len(&self) -> usize {
        (self.edit - self.write) as usize
    }

    /// Total staged bytes, committed plus in-progress.
    pub fn pending(&self) -> usize {
        (self.edit - self.read) as usize
    }

    /// Committed bytes not yet consumed by a reader.
    pub fn committed(&self) -> usize {
        (self.write - self.read) as usize
    }

    pub fn is_full(&self) -> bool {
        self.pending() == INPUT_CAPACITY
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the editing cursor; clamped to the line.
    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.line_len());
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Byte of the in-progress line at `offset < line_len()`.
    pub fn line_byte(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.line_len());
        self.bytes[Self::slot(self.write + offset as u64)]
    }

    /// The whole in-progress line as a vector.
    pub fn line_to_vec(&self) -> Vec<u8> {
        (0..self.line_len()).map(|off| self.line_byte(off)).collect()
    }

    /// Insert into the in-progress line, shifting the tail right.
    ///
    /// Returns false (byte dropped) when the ring is full.
    pub fn insert(&mut self, offset: usize, byte: u8) -> bool {
        debug_assert!(offset <= self.line_len());
        if self.is_full() {
            return false;
        }
        let len = self.line_len() as u64;
        let mut i = len;
        while i > offset as u64 {
            self.bytes[Self::slot(self.write + i)] = self.bytes[Self::slot(self.write + i - 1)];
            i -= 1;
        }
        self.bytes[Self::slot(self.write + offset as u64)] = byte;
        self.edit += 1;
        true
    }

    /// Remove one byte of the in-progress line, shifting the tail left.
    pub fn remove(&mut self, offset: usize) {
        self.remove_range(offset, 1);
    }

    /// Remove `count` bytes starting at `offset`, shifting the tail left.
    pub fn remove_range(&mut self, offset: usize, count: usize) {
        let len = self.line_len();
        debug_assert!(offset + count <= len);
        if count == 0 {
            return;
        }
        for j in offset..len - count {
            self.bytes[Self::slot(self.write + j as u64)] =
                self.bytes[Self::slot(self.write + (j + count) as u64)];
        }
        self.edit -= count as u64;
    }

    /// Commit the in-progress line: readers may now consume it.
    pub fn commit(&mut self) {
        self.write = self.edit;
        self.cursor = 0;
    }

    pub fn has_committed(&self) -> bool {
        self.read != self.write
    }

    /// Consume one committed byte.
    pub fn take_committed(&mut self) -> Option<u8> {
        if self.read == self.write {
            return None;
        }
        let byte = self.bytes[Self::slot(self.read)];
        self.read += 1;
        Some(byte)
    }

    /// Step `read` back one byte, used to leave an end-of-file marker in
    /// place for the next read.
    pub fn rewind_read(&mut self) {
        debug_assert!(self.read > 0);
        self.read -= 1;
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buf = InputBuffer::new();
        assert_eq!(buf.line_len(), 0);
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.committed(), 0);
        assert!(!buf.has_committed());
    }

    #[test]
    fn test_append_and_commit() {
        let mut buf = InputBuffer::new();
        assert!(buf.insert(0, b'h'));
        assert!(buf.insert(1, b'i'));
        assert_eq!(buf.line_len(), 2);
        assert!(!buf.has_committed());

        buf.commit();
        assert_eq!(buf.line_len(), 0);
        assert_eq!(buf.committed(), 2);
        assert_eq!(buf.take_committed(), Some(b'h'));
        assert_eq!(buf.take_committed(), Some(b'i'));
        assert_eq!(buf.take_committed(), None);
    }

    #[test]
    fn test_insert_mid_line_shifts_tail() {
        let mut buf = InputBuffer::new();
        for (i, b) in b"hllo".iter().enumerate() {
            buf.insert(i, *b);
        }
        buf.insert(1, b'e');
        assert_eq!(buf.line_to_vec(), b"hello");
    }

    #[test]
    fn test_remove_shifts_tail_left() {
        let mut buf = InputBuffer::new();
        for (i, b) in b"heello".iter().enumerate() {
            buf.insert(i, *b);
        }
        buf.remove(1);
        assert_eq!(buf.line_to_vec(), b"hello");
    }

    #[test]
    fn test_remove_range() {
        let mut buf = InputBuffer::new();
        for (i, b) in b"abcdef".iter().enumerate() {
            buf.insert(i, *b);
        }
        buf.remove_range(1, 3);
        assert_eq!(buf.line_to_vec(), b"aef");
    }

    #[test]
    fn test_full_ring_drops_insert() {
        let mut buf = InputBuffer::new();
        for i in 0..INPUT_CAPACITY {
            assert!(buf.insert(i, b'x'));
        }
        assert!(buf.is_full());
        assert!(!buf.insert(INPUT_CAPACITY, b'y'));
        assert_eq!(buf.line_len(), INPUT_CAPACITY);
    }

    #[test]
    fn test_counters_stay_ordered_across_wraparound() {
        let mut buf = InputBuffer::new();
        // Push several whole lines through the ring so the counters pass
        // the capacity.
        for round in 0..5u8 {
            for i in 0..40 {
                assert!(buf.insert(i, b'a' + round));
            }
            buf.commit();
            while buf.take_committed().is_some() {}
        }
        assert!(buf.read_count() >= INPUT_CAPACITY as u64);
        assert_eq!(buf.read_count(), buf.write_count());
        assert_eq!(buf.write_count(), buf.edit_count());

        // The ring still behaves after wraparound.
        buf.insert(0, b'z');
        assert_eq!(buf.line_to_vec(), b"z");
    }

    #[test]
    fn test_commit_resets_cursor() {
        let mut buf = InputBuffer::new();
        buf.insert(0, b'a');
        buf.set_cursor(1);
        buf.commit();
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_set_cursor_clamps_to_line() {
        let mut buf = InputBuffer::new();
        buf.insert(0, b'a');
        buf.set_cursor(10);
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_rewind_read_reexposes_byte() {
        let mut buf = InputBuffer::new();
        buf.insert(0, EOF_MARK);
        buf.commit();
        assert_eq!(buf.take_committed(), Some(EOF_MARK));
        buf.rewind_read();
        assert_eq!(buf.take_committed(), Some(EOF_MARK));
    }
}
