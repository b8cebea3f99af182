//! Job identifiers and the events a job emits.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::Sender;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use relief_heightmap::Progress;

use crate::error::JobFailure;

/// Correlation id of a submitted job, unique within a [`crate::Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Severity of a job log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// Everything a job can tell its caller.
///
/// A job emits any number of `Log` and `Progress` events followed by exactly
/// one `Result` or `Error`.
#[derive(Debug, Clone)]
pub enum JobEvent<T> {
    Log {
        level: LogLevel,
        message: String,
        data: Option<Value>,
    },
    Progress {
        percentage: u8,
    },
    Result(T),
    Error(JobFailure),
}

impl<T> JobEvent<T> {
    /// Whether this event ends the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobEvent::Result(_) | JobEvent::Error(_))
    }
}

/// Sending side of one job's event stream.
///
/// Send failures mean the caller dropped its handle; the job still runs to
/// completion and later events are discarded.
#[derive(Debug)]
pub struct JobContext<T> {
    id: JobId,
    events: Sender<JobEvent<T>>,
}

impl<T: Send + 'static> JobContext<T> {
    pub(crate) fn new(id: JobId, events: Sender<JobEvent<T>>) -> Self {
        Self { id, events }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, data: Option<Value>) {
        self.send(JobEvent::Log {
            level,
            message: message.into(),
            data,
        });
    }

    pub fn debug(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Debug, message, Some(data));
    }

    pub fn info(&self, message: impl Into<String>, data: Value) {
        self.log(LogLevel::Info, message, Some(data));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn progress(&self, percentage: u8) {
        self.send(JobEvent::Progress {
            percentage: percentage.min(100),
        });
    }

    /// A [`Progress`] reporter forwarding to this job, skipping repeats.
    pub fn progress_reporter(&self) -> Progress {
        let events = self.events.clone();
        let last = AtomicU8::new(u8::MAX);
        Progress::new(move |percentage, _message| {
            if last.swap(percentage, Ordering::Relaxed) != percentage {
                let _ = events.send(JobEvent::Progress { percentage });
            }
        })
    }

    pub(crate) fn send(&self, event: JobEvent<T>) {
        if self.events.send(event).is_err() {
            trace!("{}: receiver dropped, discarding event", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_reporter_skips_repeated_percentages() {
        let (tx, rx) = channel::<JobEvent<()>>();
        let ctx = JobContext::new(JobId(1), tx);
        let progress = ctx.progress_reporter();

        for p in [0, 0, 10, 10, 10, 50] {
            progress.report(p, "top");
        }
        drop(progress);
        drop(ctx);

        let seen: Vec<u8> = rx
            .iter()
            .filter_map(|e| match e {
                JobEvent::Progress { percentage } => Some(percentage),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![0, 10, 50]);
    }

    #[test]
    fn test_terminal_events() {
        assert!(JobEvent::Result(()).is_terminal());
        assert!(!JobEvent::<()>::Progress { percentage: 3 }.is_terminal());
    }

    #[test]
    fn test_dropped_receiver_is_not_fatal() {
        let (tx, rx) = channel::<JobEvent<()>>();
        drop(rx);
        let ctx = JobContext::new(JobId(2), tx);
        ctx.warn("nobody listening");
        ctx.progress(40);
    }

    #[test]
    fn test_job_id_display() {
        assert_eq!(JobId(7).to_string(), "job#7");
    }
}
