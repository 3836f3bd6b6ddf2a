//! # Console Core
//!
//! The kernel-resident half of the interactive path: a line editor over a
//! fixed circular byte buffer, and the locked console object that feeds
//! committed lines to blocking readers.
//!
//! ## Philosophy
//!
//! - **Deterministic**: same key-code trace, same buffer and screen state
//! - **One lock**: a single mutex guards editor, buffer and device; one
//!   condvar wakes readers on commit
//! - **Monotonic counters**: the ring is addressed by ever-increasing
//!   `read <= write <= edit` counters taken modulo the capacity, never by
//!   wrapped pointers
//! - **Interrupt side never blocks**: key draining is bounded work under
//!   the lock; process dumps are deferred until after release
//!
//! ## Design
//!
//! - [`Key`]: decoded key events (control bindings, navigation codes)
//! - [`InputBuffer`]: the 128-byte ring with commit semantics
//! - [`EditHistory`]: bounded per-insertion undo records
//! - [`Selection`] / [`Clipboard`]: screen-coordinate selection state
//! - [`LineEditor`]: per-key state machine driving a [`TextDevice`]
//! - [`Console`]: blocking line I/O with cancellation
//! - [`EditorSnapshot`]: deterministic state capture for parity tests

pub mod buffer;
pub mod console;
pub mod editor;
pub mod history;
pub mod key;
pub mod selection;
pub mod snapshot;

pub use buffer::{InputBuffer, EOF_MARK, INPUT_CAPACITY};
pub use console::{CancelToken, Console, ConsoleError, InterruptSummary};
pub use editor::{KeyOutcome, LineEditor};
pub use history::{EditHistory, EditRecord, HISTORY_CAPACITY};
pub use key::Key;
pub use selection::{Clipboard, Selection, CLIPBOARD_CAPACITY};
pub use snapshot::EditorSnapshot;

pub use console_device::TextDevice;
