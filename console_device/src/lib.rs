//! # Character-Cell Console Device
//!
//! This crate defines the display side of the console: a character-cell
//! grid addressed by a single linear hardware cursor, the way CGA text
//! memory is addressed by `col + 80 * row`.
//!
//! ## Philosophy
//!
//! This is NOT a terminal emulator. No ANSI escape codes, no VT100, no TTY
//! model. A device renders one byte at a time at the hardware cursor and
//! the line editor above it owns all echo and redraw decisions.
//!
//! ## Design Principles
//!
//! 1. **Minimal and deterministic**: same byte sequence, same cells
//! 2. **Testable**: the reference grid is plain memory, fully inspectable
//! 3. **Explicit cursor**: the cursor is device state, moved only by
//!    `render` and `set_cursor`
//! 4. **Involutory highlight**: selection highlight is an attribute
//!    inversion, so applying it twice restores every cell

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod grid;

pub use grid::CellGrid;

/// Grid dimensions, CGA text mode.
pub const GRID_WIDTH: usize = 80;
pub const GRID_HEIGHT: usize = 25;

/// Rows actually used before scrolling kicks in. The console scrolls
/// once the cursor enters row 24 and never draws there.
pub const ACTIVE_ROWS: usize = 24;

/// Default attribute byte: light gray on black.
pub const NORMAL_ATTR: u8 = 0x07;

/// Byte that moves the cursor back one cell when rendered.
pub const BACKSPACE: u8 = 0x08;

/// Swap the foreground and background nibbles of an attribute byte.
///
/// This is its own inverse, which is what makes highlight-then-clear
/// restore the exact previous attributes.
pub const fn invert_attr(attr: u8) -> u8 {
    ((attr & 0x0F) << 4) | ((attr & 0xF0) >> 4)
}

/// A character-cell display addressed by a linear hardware cursor.
///
/// `render` carries the console's full echo contract:
/// newline jumps to the next row start, backspace steps the cursor back,
/// anything else is drawn and advances the cursor; afterwards the cell
/// under the cursor is blanked and the grid scrolls if the cursor left
/// the active region.
pub trait TextDevice {
    /// Draw one byte at the hardware cursor and advance it.
    fn render(&mut self, byte: u8);

    /// Current hardware cursor as a linear cell offset.
    fn cursor(&self) -> usize;

    /// Move the hardware cursor. Does not blank or draw anything.
    fn set_cursor(&mut self, pos: usize);

    /// Invert the attribute byte of every cell in `start..=end`.
    ///
    /// Callers may pass the bounds in either order.
    fn invert(&mut self, start: usize, end: usize);

    /// Shift the active region up one row and blank the freed row.
    fn scroll(&mut self);
}
