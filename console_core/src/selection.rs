//! Selection state and the internal clipboard.
//!
//! Selections are marked in hardware-cursor coordinates (linear cell
//! offsets), not line offsets; the editor clips them to the current line
//! when it copies or deletes. No system clipboard, just the console's own
//! buffer.

use serde::{Deserialize, Serialize};

/// Clipboard capacity, one byte short of the input ring.
pub const CLIPBOARD_CAPACITY: usize = 127;

/// Selection mode, driven by the mark key.
///
/// A pending mark (`Selecting`) survives cursor movement; moving and
/// marking again is how a range is chosen. Only `Selected` has a visible
/// highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    Idle,
    Selecting {
        start: usize,
    },
    Selected {
        start: usize,
        end: usize,
    },
}

impl Selection {
    /// Applied-range bounds in `(low, high)` order.
    pub fn normalized(&self) -> Option<(usize, usize)> {
        match *self {
            Selection::Selected { start, end } => {
                Some(if start <= end { (start, end) } else { (end, start) })
            }
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Selection::Idle)
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, Selection::Selecting { .. })
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::Selected { .. })
    }
}

/// Internal clipboard buffer, overwritten by each copy.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    content: Vec<u8>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy bytes in, truncated to [`CLIPBOARD_CAPACITY`].
    pub fn copy(&mut self, bytes: &[u8]) {
        self.content.clear();
        let take = bytes.len().min(CLIPBOARD_CAPACITY);
        self.content.extend_from_slice(&bytes[..take]);
    }

    pub fn paste(&self) -> &[u8] {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Clipboard content as a string, empty when it is not UTF-8.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.content).unwrap_or("")
    }
}
