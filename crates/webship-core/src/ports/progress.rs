//! Progress sink port (driven/secondary port)
//!
//! Operator-facing progress reporting. The engine announces uploads,
//! directory creation, deletions, and retention skips through this
//! interface but never owns console state; the CLI decides how the
//! messages are rendered.

/// Receives human-readable progress messages from the mirror engine
pub trait IProgressSink: Send + Sync {
    /// Routine progress: uploads, created directories, step transitions.
    fn info(&self, message: &str);

    /// Something noteworthy but not fatal.
    fn warn(&self, message: &str);

    /// A remote entry was kept because the retention policy protects it.
    fn skip(&self, message: &str);

    /// A failure that is about to end the run.
    fn error(&self, message: &str);
}

/// Sink that discards every message. Used in tests and as a default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl IProgressSink for NullProgress {
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn skip(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
