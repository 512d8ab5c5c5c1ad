//! Listener traits notified synchronously by the engine and the journal.
//!
//! Every method has a no-op default, so a host only overrides the
//! callbacks it actually cares about.

/// Notified about content-level mutations as they happen.
pub trait ContentListener {
    fn on_content_loaded(&mut self) {}
    fn on_text_inserted(&mut self, _start: usize, _text: &str) {}
    fn on_text_deleted(&mut self, _start: usize, _end: usize) {}
}

/// Notified about undo/redo journal activity.
pub trait JournalListener {
    fn on_undo(&mut self) {}
    fn on_redo(&mut self) {}
    fn on_change(&mut self, _start: usize, _end: usize, _timestamp: u64) {}
    fn on_stack_change(&mut self, _new_size: usize) {}
}
