//! Reporting sinks receiving progress, per-step results and run completion.
//!
//! The sink protocol mirrors a browser test runner's reporting channel:
//! progress carries the running step total, each concluded step produces one
//! result record, and a final completion signal closes the run.

use std::io::Write;

use serde::Serialize;

use crate::error::ReportError;

/// Result record produced for one concluded step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Name of the scenario the step belongs to.
    pub description: String,
    /// Every failure message logged so far.
    pub log: Vec<String>,
    /// Single-element path holding the feature name.
    pub suite: Vec<String>,
    /// Whether the step counts as passed.
    pub success: bool,
    /// Whether the step was skipped.
    pub skipped: bool,
    /// Elapsed time in milliseconds.
    pub time: u64,
}

/// Receiver of translator output.
pub trait ReportingSink {
    /// Report how many steps have concluded so far.
    fn report_progress(&mut self, total: usize);
    /// Report the result of one concluded step.
    fn report_result(&mut self, report: &StepReport);
    /// Signal that the engine finished the run.
    fn report_run_complete(&mut self);
}

impl<S: ReportingSink + ?Sized> ReportingSink for &mut S {
    fn report_progress(&mut self, total: usize) {
        (**self).report_progress(total);
    }

    fn report_result(&mut self, report: &StepReport) {
        (**self).report_result(report);
    }

    fn report_run_complete(&mut self) {
        (**self).report_run_complete();
    }
}

/// One call received by a [`CollectingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    /// `report_progress` call.
    Progress(usize),
    /// `report_result` call.
    Result(StepReport),
    /// `report_run_complete` call.
    Complete,
}

/// Sink that keeps every call in arrival order.
///
/// # Examples
///
/// ```
/// use karma_bdd::sink::{CollectingSink, ReportingSink, SinkCall};
///
/// let mut sink = CollectingSink::default();
/// sink.report_progress(1);
/// sink.report_run_complete();
/// assert_eq!(sink.calls(), [SinkCall::Progress(1), SinkCall::Complete]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    calls: Vec<SinkCall>,
}

impl CollectingSink {
    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Result records only, in order.
    pub fn results(&self) -> impl Iterator<Item = &StepReport> {
        self.calls.iter().filter_map(|call| match call {
            SinkCall::Result(report) => Some(report),
            SinkCall::Progress(_) | SinkCall::Complete => None,
        })
    }

    /// Progress totals only, in order.
    #[must_use]
    pub fn progress(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Progress(total) => Some(*total),
                SinkCall::Result(_) | SinkCall::Complete => None,
            })
            .collect()
    }
}

impl ReportingSink for CollectingSink {
    fn report_progress(&mut self, total: usize) {
        self.calls.push(SinkCall::Progress(total));
    }

    fn report_result(&mut self, report: &StepReport) {
        self.calls.push(SinkCall::Result(report.clone()));
    }

    fn report_run_complete(&mut self) {
        self.calls.push(SinkCall::Complete);
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum JsonLine<'a> {
    Info { total: usize },
    Result(&'a StepReport),
    Complete,
}

/// Sink writing one JSON object per call to a writer.
///
/// The first write failure is kept and returned by [`finish`](Self::finish);
/// later calls are ignored once a failure occurred.
///
/// # Examples
///
/// ```
/// use karma_bdd::sink::{JsonLinesSink, ReportingSink};
///
/// let mut sink = JsonLinesSink::new(Vec::new());
/// sink.report_progress(3);
/// sink.report_run_complete();
/// let output = String::from_utf8(sink.finish().unwrap()).unwrap();
/// assert_eq!(output, "{\"type\":\"info\",\"total\":3}\n{\"type\":\"complete\"}\n");
/// ```
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    error: Option<ReportError>,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// Flush the writer and hand it back.
    ///
    /// # Errors
    ///
    /// Returns the first serialisation or I/O failure seen while reporting,
    /// or the failure raised by the final flush.
    pub fn finish(mut self) -> Result<W, ReportError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn emit(&mut self, line: &JsonLine<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = self.write_line(line) {
            log::warn!("failed to write report line: {error}");
            self.error = Some(error);
        }
    }

    fn write_line(&mut self, line: &JsonLine<'_>) -> Result<(), ReportError> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> ReportingSink for JsonLinesSink<W> {
    fn report_progress(&mut self, total: usize) {
        self.emit(&JsonLine::Info { total });
    }

    fn report_result(&mut self, report: &StepReport) {
        self.emit(&JsonLine::Result(report));
    }

    fn report_run_complete(&mut self) {
        self.emit(&JsonLine::Complete);
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests fail fast on unexpected errors"
)]
mod tests {
    use super::*;
    use std::io;

    fn report() -> StepReport {
        StepReport {
            description: "Valid user".into(),
            log: vec!["I log in\nboom".into()],
            suite: vec!["Login".into()],
            success: false,
            skipped: false,
            time: 12,
        }
    }

    #[test]
    fn result_lines_flatten_the_record() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.report_result(&report());
        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(value["type"], "result");
        assert_eq!(value["description"], "Valid user");
        assert_eq!(value["suite"][0], "Login");
        assert_eq!(value["log"][0], "I log in\nboom");
        assert_eq!(value["success"], false);
        assert_eq!(value["time"], 12);
    }

    struct BrokenWriter {
        writes: usize,
    }

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_failure_is_kept() {
        let mut sink = JsonLinesSink::new(BrokenWriter { writes: 0 });
        sink.report_progress(1);
        let attempts = sink.writer.writes;
        sink.report_progress(2);
        assert_eq!(sink.writer.writes, attempts);
        assert!(sink.finish().is_err());
    }

    #[test]
    fn collecting_sink_splits_calls_by_kind() {
        let mut sink = CollectingSink::default();
        sink.report_progress(1);
        sink.report_result(&report());
        sink.report_progress(2);
        assert_eq!(sink.progress(), [1, 2]);
        assert_eq!(sink.results().count(), 1);
    }
}
