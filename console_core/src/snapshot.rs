//! Editor snapshot for deterministic parity testing

use crate::selection::Selection;
use serde::{Deserialize, Serialize};

/// Complete editor state snapshot for parity testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub read_count: u64,
    pub write_count: u64,
    pub edit_count: u64,
    pub cursor_offset: usize,
    pub line: Vec<u8>,
    pub hardware_cursor: usize,
    pub history_depth: usize,
    pub selection: Selection,
    pub clipboard: Vec<u8>,
}

impl EditorSnapshot {
    /// Compute a deterministic hash of the snapshot state
    /// This is used for fast comparison in parity tests
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        // Hash ring counters
        hasher.update(self.read_count.to_le_bytes());
        hasher.update(self.write_count.to_le_bytes());
        hasher.update(self.edit_count.to_le_bytes());

        // Hash cursors
        hasher.update(self.cursor_offset.to_le_bytes());
        hasher.update(self.hardware_cursor.to_le_bytes());

        // Hash the pending line
        hasher.update(&self.line);
        hasher.update(b"\n");

        // Hash history depth
        hasher.update(self.history_depth.to_le_bytes());

        // Hash selection state
        match self.selection {
            Selection::Idle => hasher.update([0u8]),
            Selection::Selecting { start } => {
                hasher.update([1u8]);
                hasher.update(start.to_le_bytes());
            }
            Selection::Selected { start, end } => {
                hasher.update([2u8]);
                hasher.update(start.to_le_bytes());
                hasher.update(end.to_le_bytes());
            }
        }

        // Hash clipboard
        hasher.update(&self.clipboard);

        let result = hasher.finalize();
        let bytes: [u8; 8] = result[..8].try_into().unwrap();
        u64::from_le_bytes(bytes)
    }
}
