//! In-memory reference device: an 80x25 grid of character and attribute
//! bytes, laid out the way the VGA text buffer keeps them at 0xB8000.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::{
    invert_attr, TextDevice, ACTIVE_ROWS, BACKSPACE, GRID_HEIGHT, GRID_WIDTH, NORMAL_ATTR,
};

/// Plain-memory character grid implementing [`TextDevice`].
///
/// Equality compares cells and cursor, which is what screen-restoration
/// tests lean on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    chars: Vec<u8>,
    attrs: Vec<u8>,
    pos: usize,
}

impl CellGrid {
    pub fn new() -> Self {
        Self {
            chars: vec![b' '; GRID_WIDTH * GRID_HEIGHT],
            attrs: vec![NORMAL_ATTR; GRID_WIDTH * GRID_HEIGHT],
            pos: 0,
        }
    }

    /// Character byte at a linear cell offset.
    pub fn char_at(&self, pos: usize) -> u8 {
        self.chars[pos]
    }

    /// Attribute byte at a linear cell offset.
    pub fn attr_at(&self, pos: usize) -> u8 {
        self.attrs[pos]
    }

    /// One row as a string with trailing blanks removed.
    pub fn row_string(&self, row: usize) -> String {
        let start = row * GRID_WIDTH;
        let bytes = &self.chars[start..start + GRID_WIDTH];
        let mut s: String = bytes.iter().map(|&b| b as char).collect();
        while s.ends_with(' ') {
            s.pop();
        }
        s
    }

    fn blank(&mut self, pos: usize) {
        self.chars[pos] = b' ';
        self.attrs[pos] = NORMAL_ATTR;
    }
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDevice for CellGrid {
    fn render(&mut self, byte: u8) {
        match byte {
            b'\n' => self.pos += GRID_WIDTH - self.pos % GRID_WIDTH,
            BACKSPACE => {
                if self.pos > 0 {
                    self.pos -= 1;
                }
            }
            _ => {
                self.chars[self.pos] = byte;
                self.attrs[self.pos] = NORMAL_ATTR;
                self.pos += 1;
            }
        }

        if self.pos / GRID_WIDTH >= ACTIVE_ROWS {
            self.scroll();
            self.pos -= GRID_WIDTH;
        }

        // The cell under the cursor is always blank, which is also what
        // erases the deleted character after a backspace.
        self.blank(self.pos);
    }

    fn cursor(&self) -> usize {
        self.pos
    }

    fn set_cursor(&mut self, pos: usize) {
        self.pos = pos.min(GRID_WIDTH * GRID_HEIGHT - 1);
    }

    fn invert(&mut self, start: usize, end: usize) {
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        let hi = hi.min(GRID_WIDTH * GRID_HEIGHT - 1);
        for pos in lo..=hi {
            self.attrs[pos] = invert_attr(self.attrs[pos]);
        }
    }

    fn scroll(&mut self) {
        let active = ACTIVE_ROWS * GRID_WIDTH;
        self.chars.copy_within(GRID_WIDTH..active, 0);
        self.attrs.copy_within(GRID_WIDTH..active, 0);
        for pos in active - GRID_WIDTH..active {
            self.blank(pos);
        }
    }
}
