//! Completion bookkeeping for workflow runs.

use trellis_core::{ProgressSink, ProgressUpdate};

/// Percent reached once profile validation completes.
pub(crate) const VALIDATED_OFFSET: u8 = 10;

/// Filesystem operations completed between automatic reports.
pub(crate) const REPORT_EVERY: u64 = 10;

/// Percentage of a run completed, scaled into the band above `offset`.
///
/// An empty run (zero total units) saturates at 100.
#[must_use]
pub fn progress_percent(completed: u64, total: u64, offset: u8) -> u8 {
    if total == 0 {
        return 100;
    }
    let band = u64::from(100_u8.saturating_sub(offset));
    let scaled = (completed.saturating_mul(band) + total / 2) / total;
    let percent = u64::from(offset) + scaled;
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Mutable progress state threaded through the pipeline stages.
///
/// The validation offset is assumed already reported when the context is
/// created; every later report emits the delta between the current percent
/// and what has been reported so far.
pub(crate) struct ExecutionContext<'a> {
    sink: &'a dyn ProgressSink,
    total: u64,
    completed: u64,
    offset: u8,
    reported: u8,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, total: u64, offset: u8) -> Self {
        Self {
            sink,
            total,
            completed: 0,
            offset,
            reported: offset,
        }
    }

    /// Record completed units, reporting when a cadence boundary is crossed.
    pub(crate) fn advance(&mut self, count: u64, message: &str) {
        let before = self.completed / REPORT_EVERY;
        self.completed = self.completed.saturating_add(count);
        if self.completed / REPORT_EVERY != before {
            self.report(message);
        }
    }

    /// Record completed units and always report.
    pub(crate) fn complete(&mut self, count: u64, message: &str) {
        self.completed = self.completed.saturating_add(count);
        self.report(message);
    }

    /// Report the current completion percentage.
    pub(crate) fn report(&mut self, message: &str) {
        let percent = progress_percent(self.completed, self.total, self.offset);
        let increment = percent.saturating_sub(self.reported);
        self.reported = self.reported.max(percent);
        self.sink
            .report(ProgressUpdate::with_message(increment, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectSink {
        updates: Mutex<Vec<ProgressUpdate>>,
    }

    impl ProgressSink for CollectSink {
        fn report(&self, update: ProgressUpdate) {
            self.updates.lock().unwrap().push(update);
        }
    }

    #[test]
    fn percent_saturates_on_empty_totals() {
        assert_eq!(progress_percent(0, 0, 10), 100);
    }

    #[test]
    fn percent_scales_into_the_offset_band() {
        assert_eq!(progress_percent(5, 10, 10), 55);
        assert_eq!(progress_percent(10, 10, 10), 100);
        assert_eq!(progress_percent(0, 10, 10), 10);
    }

    #[test]
    fn percent_never_exceeds_100() {
        assert_eq!(progress_percent(20, 10, 10), 100);
        assert_eq!(progress_percent(1, 3, 95), 97);
    }

    #[test]
    fn advance_reports_on_cadence_boundaries() {
        let sink = CollectSink::default();
        let mut ctx = ExecutionContext::new(&sink, 40, VALIDATED_OFFSET);
        for _ in 0..25 {
            ctx.advance(1, "linking");
        }
        // boundaries at 10 and 20 completed units
        let updates = sink.updates.lock().unwrap();
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn batched_advances_cross_boundaries_once() {
        let sink = CollectSink::default();
        let mut ctx = ExecutionContext::new(&sink, 40, VALIDATED_OFFSET);
        ctx.advance(7, "copying");
        ctx.advance(5, "copying");
        let updates = sink.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn increments_sum_to_the_full_band() {
        let sink = CollectSink::default();
        let mut ctx = ExecutionContext::new(&sink, 13, VALIDATED_OFFSET);
        for _ in 0..13 {
            ctx.complete(1, "step");
        }
        let updates = sink.updates.lock().unwrap();
        let total: u32 = updates.iter().map(|u| u32::from(u.increment)).sum();
        assert_eq!(total + u32::from(VALIDATED_OFFSET), 100);
    }
}
