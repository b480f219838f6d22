//! Progress reporting for long coverage passes.
//!
//! The sink contract: may be absent (use [`NoProgress`]), and must
//! never abort a pass — [`emit`] swallows panics coming out of a
//! sink, so a misbehaving callback costs at most its own output.

use std::panic::{AssertUnwindSafe, catch_unwind};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Observer for coarse progress milestones. `percent` is 0..=100.
pub trait ProgressSink {
    fn report(&mut self, percent: u8, message: Option<&str>);
}

/// The absent callback.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8, _message: Option<&str>) {}
}

/// Any closure works as a sink.
impl<F> ProgressSink for F
where
    F: FnMut(u8, Option<&str>),
{
    fn report(&mut self, percent: u8, message: Option<&str>) {
        self(percent, message);
    }
}

/// Invoke the sink, swallowing anything it throws. The engine's
/// control flow must not depend on callback behavior.
pub fn emit(sink: &mut dyn ProgressSink, percent: u8, message: Option<&str>) {
    let result = catch_unwind(AssertUnwindSafe(|| sink.report(percent.min(100), message)));
    if result.is_err() {
        debug!(percent, "progress sink panicked; ignoring");
    }
}

/// Terminal progress bar adapter for the CLI.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:30.cyan/blue} {percent:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarSink {
    fn report(&mut self, percent: u8, message: Option<&str>) {
        self.bar.set_position(u64::from(percent.min(100)));
        if let Some(msg) = message {
            self.bar.set_message(msg.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_receives_milestones() {
        let mut seen: Vec<u8> = Vec::new();
        {
            let mut sink = |p: u8, _m: Option<&str>| seen.push(p);
            emit(&mut sink, 10, None);
            emit(&mut sink, 200, Some("clamped"));
        }
        assert_eq!(seen, vec![10, 100]);
    }

    #[test]
    fn panicking_sink_is_swallowed() {
        let mut sink = |_p: u8, _m: Option<&str>| panic!("callback bug");
        emit(&mut sink, 50, None);
        // Still alive afterwards
        emit(&mut NoProgress, 60, None);
    }
}
