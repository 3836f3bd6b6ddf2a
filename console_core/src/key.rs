//! Raw key-code decoding.
//!
//! Key codes are single bytes: ASCII from the keyboard translation layer,
//! plus a reserved band at 0xE0 for navigation keys.

/// Navigation key codes.
pub const KEY_HOME: u8 = 0xE0;
pub const KEY_END: u8 = 0xE1;
pub const KEY_UP: u8 = 0xE2;
pub const KEY_DOWN: u8 = 0xE3;
pub const KEY_LEFT: u8 = 0xE4;
pub const KEY_RIGHT: u8 = 0xE5;

/// The code a Ctrl-chord delivers: `ctrl(b'D')` for Ctrl+D.
pub const fn ctrl(c: u8) -> u8 {
    c & 0x1f
}

/// One decoded key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A byte for the line itself. Printables and tab, but also any
    /// control byte without a binding here; those insert and echo as-is.
    Insert(u8),
    /// 0x08 or 0x7F.
    Backspace,
    /// Ctrl+U: discard the uncommitted line.
    KillLine,
    /// Ctrl+D: token jump forward, or end-of-file on an empty line.
    WordForward,
    /// Ctrl+A: token jump backward.
    WordBackward,
    /// Ctrl+Z: revert the most recent insertion.
    Undo,
    /// Ctrl+S: mark selection start / apply selection end.
    SelectMark,
    /// Ctrl+C: copy the applied selection. Never a process signal.
    Copy,
    /// Ctrl+V: insert the clipboard at the cursor.
    Paste,
    /// Ctrl+P: request a process dump, run after the lock drops.
    ProcessDump,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Decode one raw key code. The 0 filler byte decodes to `None`.
    pub fn from_code(code: u8) -> Option<Key> {
        let key = match code {
            0 => return None,
            0x08 | 0x7f => Key::Backspace,
            KEY_HOME => Key::Home,
            KEY_END => Key::End,
            KEY_UP => Key::Up,
            KEY_DOWN => Key::Down,
            KEY_LEFT => Key::Left,
            KEY_RIGHT => Key::Right,
            c if c == ctrl(b'U') => Key::KillLine,
            c if c == ctrl(b'D') => Key::WordForward,
            c if c == ctrl(b'A') => Key::WordBackward,
            c if c == ctrl(b'Z') => Key::Undo,
            c if c == ctrl(b'S') => Key::SelectMark,
            c if c == ctrl(b'C') => Key::Copy,
            c if c == ctrl(b'V') => Key::Paste,
            c if c == ctrl(b'P') => Key::ProcessDump,
            c => Key::Insert(c),
        };
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_chord_codes() {
        assert_eq!(ctrl(b'D'), 0x04);
        assert_eq!(ctrl(b'U'), 0x15);
        assert_eq!(ctrl(b'Z'), 0x1a);
    }

    #[test]
    fn test_printable_decodes_to_insert() {
        assert_eq!(Key::from_code(b'a'), Some(Key::Insert(b'a')));
        assert_eq!(Key::from_code(b' '), Some(Key::Insert(b' ')));
        assert_eq!(Key::from_code(b'\t'), Some(Key::Insert(b'\t')));
        assert_eq!(Key::from_code(b'\n'), Some(Key::Insert(b'\n')));
    }

    #[test]
    fn test_control_bindings() {
        assert_eq!(Key::from_code(ctrl(b'U')), Some(Key::KillLine));
        assert_eq!(Key::from_code(ctrl(b'D')), Some(Key::WordForward));
        assert_eq!(Key::from_code(ctrl(b'A')), Some(Key::WordBackward));
        assert_eq!(Key::from_code(ctrl(b'Z')), Some(Key::Undo));
        assert_eq!(Key::from_code(ctrl(b'S')), Some(Key::SelectMark));
        assert_eq!(Key::from_code(ctrl(b'C')), Some(Key::Copy));
        assert_eq!(Key::from_code(ctrl(b'V')), Some(Key::Paste));
        assert_eq!(Key::from_code(ctrl(b'P')), Some(Key::ProcessDump));
    }

    #[test]
    fn test_both_backspace_codes() {
        assert_eq!(Key::from_code(0x08), Some(Key::Backspace));
        assert_eq!(Key::from_code(0x7f), Some(Key::Backspace));
    }

    #[test]
    fn test_navigation_band() {
        assert_eq!(Key::from_code(KEY_LEFT), Some(Key::Left));
        assert_eq!(Key::from_code(KEY_RIGHT), Some(Key::Right));
        assert_eq!(Key::from_code(KEY_HOME), Some(Key::Home));
        assert_eq!(Key::from_code(KEY_END), Some(Key::End));
        assert_eq!(Key::from_code(KEY_UP), Some(Key::Up));
        assert_eq!(Key::from_code(KEY_DOWN), Some(Key::Down));
    }

    #[test]
    fn test_filler_byte_is_dropped() {
        assert_eq!(Key::from_code(0), None);
    }

    #[test]
    fn test_unbound_control_byte_is_inserted() {
        // Ctrl+B has no binding; the editor takes it verbatim.
        assert_eq!(Key::from_code(ctrl(b'B')), Some(Key::Insert(0x02)));
    }
}
