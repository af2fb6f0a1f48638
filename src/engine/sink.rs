//! Streaming verdict observers.

use crate::types::Verdict;
use std::sync::Mutex;

/// Receives each verdict as soon as the scheduler settles it.
///
/// Sinks observe; they never filter or reorder. The engine still returns
/// the full verdict list when the run completes.
pub trait VerdictSink: Send + Sync {
    fn accept(&self, verdict: &Verdict);
}

/// Discards everything. The default when a caller only wants the
/// returned verdict list.
pub struct NullSink;

impl VerdictSink for NullSink {
    fn accept(&self, _verdict: &Verdict) {}
}

/// Buffers verdicts for later inspection.
#[derive(Default)]
pub struct CollectingSink {
    verdicts: Mutex<Vec<Verdict>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.verdicts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything buffered so far.
    pub fn drain(&self) -> Vec<Verdict> {
        std::mem::take(&mut *self.verdicts.lock().unwrap())
    }
}

impl VerdictSink for CollectingSink {
    fn accept(&self, verdict: &Verdict) {
        self.verdicts.lock().unwrap().push(verdict.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_sink_buffers_in_arrival_order() {
        let sink = CollectingSink::new();
        sink.accept(&Verdict::no_match("http://a.test/", "r1", 3));
        sink.accept(&Verdict::no_match("http://b.test/", "r1", 4));

        assert_eq!(sink.len(), 2);
        let drained = sink.drain();
        assert_eq!(drained[0].target, "http://a.test/");
        assert_eq!(drained[1].target, "http://b.test/");
        assert!(sink.is_empty());
    }
}
