//! Per-insertion undo records.
//!
//! Every insertion pushes one record; undo pops the newest. Positions are
//! relative to the start of the in-progress line, so records survive
//! commits as stale entries; the editor discards those on pop instead of
//! letting them edit a line they never belonged to.

/// Maximum retained records; further insertions go unrecorded.
pub const HISTORY_CAPACITY: usize = 128;

/// One recorded insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRecord {
    pub byte: u8,
    pub position: usize,
}

/// Bounded stack of insertion records.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    records: Vec<EditRecord>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record an insertion. Silently unrecorded once the stack is full.
    pub fn push(&mut self, byte: u8, position: usize) {
        if self.records.len() < HISTORY_CAPACITY {
            self.records.push(EditRecord { byte, position });
        }
    }

    pub fn pop(&mut self) -> Option<EditRecord> {
        self.records.pop()
    }

    /// An insertion happened at `position`: bump every record at or past
    /// it. Call before pushing the record for the insertion itself.
    pub fn shift_for_insert(&mut self, position: usize) {
        for record in &mut self.records {
            if record.position >= position {
                record.position += 1;
            }
        }
    }

    /// A byte was removed at `position`: records past it slide down one.
    pub fn shift_after_remove(&mut self, position: usize) {
        for record in &mut self.records {
            if record.position > position {
                record.position -= 1;
            }
        }
    }

    /// `count` bytes were removed starting at `position`: drop records
    /// inside the range, slide the ones past it.
    pub fn remove_range(&mut self, position: usize, count: usize) {
        self.records.retain(|record| {
            record.position < position || record.position >= position + count
        });
        for record in &mut self.records {
            if record.position >= position + count {
                record.position -= count;
            }
        }
    }
}
