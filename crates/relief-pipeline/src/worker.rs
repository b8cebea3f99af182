//! Background workers.
//!
//! A worker owns one thread and runs one job at a time, in submission order.
//! Requests reach it over a channel tagged with their [`JobId`]; the worker
//! looks the id up in its dispatch table to find where that job's events go.
//! The route is dropped once the terminal event is ready.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, JobFailure, PipelineError, PipelineResult};
use crate::events::{JobContext, JobEvent, JobId};

/// A unit of work a [`Worker`] can run.
pub trait Job: Send + 'static {
    type Output: Send + 'static;
    /// Settings fixed when the worker starts.
    type Settings: Send + 'static;

    /// Runs on the worker thread. Errors and panics become terminal
    /// `Error` events.
    fn run(self, settings: &Self::Settings, ctx: &JobContext<Self::Output>) -> PipelineResult<Self::Output>;
}

type Routes<T> = Arc<Mutex<HashMap<JobId, Sender<JobEvent<T>>>>>;

struct Envelope<J> {
    id: JobId,
    job: J,
}

fn lock<T>(routes: &Mutex<T>) -> MutexGuard<'_, T> {
    routes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A background thread running jobs of type `J`.
pub struct Worker<J: Job> {
    name: &'static str,
    requests: Option<Sender<Envelope<J>>>,
    routes: Routes<J::Output>,
    thread: Option<JoinHandle<()>>,
}

impl<J: Job> Worker<J> {
    pub fn spawn(name: &'static str, settings: J::Settings) -> PipelineResult<Self> {
        let (requests, inbox) = channel::<Envelope<J>>();
        let routes: Routes<J::Output> = Arc::new(Mutex::new(HashMap::new()));
        let table = Arc::clone(&routes);

        let thread = std::thread::Builder::new()
            .name(format!("relief-{name}"))
            .spawn(move || {
                for Envelope { id, job } in inbox {
                    let Some(route) = lock(&table).get(&id).cloned() else {
                        warn!("{} worker: no route for {}, skipping", name, id);
                        continue;
                    };
                    let ctx = JobContext::new(id, route);
                    let terminal = run_job(name, id, job, &settings, &ctx);
                    lock(&table).remove(&id);
                    ctx.send(terminal);
                }
                debug!("{} worker stopped", name);
            })
            .map_err(|source| PipelineError::Io {
                path: format!("<{name} worker thread>").into(),
                source,
            })?;

        Ok(Self {
            name,
            requests: Some(requests),
            routes,
            thread: Some(thread),
        })
    }

    /// Queue `job` under `id`; its events arrive on the returned handle.
    pub fn submit(&self, id: JobId, job: J) -> PipelineResult<JobHandle<J::Output>> {
        let stopped = || PipelineError::WorkerStopped { worker: self.name };
        let requests = self.requests.as_ref().ok_or_else(stopped)?;

        let (events, receiver) = channel();
        lock(&self.routes).insert(id, events);
        if requests.send(Envelope { id, job }).is_err() {
            lock(&self.routes).remove(&id);
            return Err(stopped());
        }
        debug!("{} worker: queued {}", self.name, id);

        Ok(JobHandle { id, events: receiver })
    }

    /// Jobs submitted but not yet finished.
    pub fn pending(&self) -> usize {
        lock(&self.routes).len()
    }
}

impl<J: Job> Drop for Worker<J> {
    fn drop(&mut self) {
        // Closing the request channel lets the thread drain its queue and exit.
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("{} worker thread panicked during shutdown", self.name);
            }
        }
    }
}

impl<J: Job> std::fmt::Debug for Worker<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

fn run_job<J: Job>(
    name: &str,
    id: JobId,
    job: J,
    settings: &J::Settings,
    ctx: &JobContext<J::Output>,
) -> JobEvent<J::Output> {
    info!("{} worker: starting {}", name, id);
    match catch_unwind(AssertUnwindSafe(|| job.run(settings, ctx))) {
        Ok(Ok(output)) => {
            info!("{} worker: {} finished", name, id);
            JobEvent::Result(output)
        }
        Ok(Err(err)) => {
            warn!("{} worker: {} failed: {}", name, id, err);
            JobEvent::Error(JobFailure::from(&err))
        }
        Err(payload) => {
            let err = PipelineError::Panicked {
                message: panic_message(payload.as_ref()),
            };
            warn!("{} worker: {} {}", name, id, err);
            JobEvent::Error(JobFailure::from(&err))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Receiving side of one job.
#[derive(Debug)]
pub struct JobHandle<T> {
    id: JobId,
    events: Receiver<JobEvent<T>>,
}

impl<T> JobHandle<T> {
    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Next event, blocking. `None` once the stream has ended.
    pub fn recv(&self) -> Option<JobEvent<T>> {
        self.events.recv().ok()
    }

    /// Next event, waiting at most `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<JobEvent<T>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block until the job ends, discarding intermediate events.
    pub fn wait(self) -> Result<T, JobFailure> {
        self.wait_with(|_| {})
    }

    /// Block until the job ends, passing every non-terminal event to
    /// `on_event`.
    pub fn wait_with(self, mut on_event: impl FnMut(&JobEvent<T>)) -> Result<T, JobFailure> {
        for event in self.events.iter() {
            match event {
                JobEvent::Result(output) => return Ok(output),
                JobEvent::Error(failure) => return Err(failure),
                other => on_event(&other),
            }
        }
        Err(JobFailure::new(
            ErrorKind::Internal,
            format!("{} ended without a result", self.id),
        ))
    }

    /// Block until the job ends, collecting every event in order.
    pub fn collect(self) -> Vec<JobEvent<T>> {
        let mut events = Vec::new();
        for event in self.events.iter() {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogLevel;

    /// Echoes its input after a log line and a progress tick.
    struct Echo(u32);

    impl Job for Echo {
        type Output = u32;
        type Settings = u32;

        fn run(self, offset: &u32, ctx: &JobContext<u32>) -> PipelineResult<u32> {
            ctx.log(LogLevel::Info, format!("echo {}", self.0), None);
            ctx.progress(50);
            match self.0 {
                0 => Err(PipelineError::WorkerStopped { worker: "inner" }),
                13 => panic!("unlucky"),
                n => Ok(n + offset),
            }
        }
    }

    #[test]
    fn test_events_end_with_result() {
        let worker = Worker::<Echo>::spawn("echo", 100).unwrap();
        let events = worker.submit(JobId(1), Echo(5)).unwrap().collect();

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], JobEvent::Log { level: LogLevel::Info, .. }));
        assert!(matches!(events[1], JobEvent::Progress { percentage: 50 }));
        assert!(matches!(events[2], JobEvent::Result(105)));
    }

    #[test]
    fn test_error_becomes_terminal_event() {
        let worker = Worker::<Echo>::spawn("echo", 0).unwrap();
        let failure = worker.submit(JobId(1), Echo(0)).unwrap().wait().unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Internal);
        assert!(failure.message.contains("inner"));
    }

    #[test]
    fn test_panic_becomes_terminal_event_and_worker_survives() {
        let worker = Worker::<Echo>::spawn("echo", 0).unwrap();
        let failure = worker.submit(JobId(1), Echo(13)).unwrap().wait().unwrap_err();
        assert!(failure.message.contains("unlucky"));

        assert_eq!(worker.submit(JobId(2), Echo(2)).unwrap().wait().unwrap(), 2);
    }

    #[test]
    fn test_queued_jobs_are_routed_by_id() {
        let worker = Worker::<Echo>::spawn("echo", 0).unwrap();
        let handles: Vec<_> = (1..=5)
            .map(|n| worker.submit(JobId(n), Echo(n as u32 * 10)).unwrap())
            .collect();

        // Wait in reverse order; each handle still gets its own result.
        for handle in handles.into_iter().rev() {
            let id = handle.id();
            assert_eq!(handle.wait().unwrap(), id.0 as u32 * 10);
        }
        assert_eq!(worker.pending(), 0);
    }

    #[test]
    fn test_dropped_handle_does_not_block_worker() {
        let worker = Worker::<Echo>::spawn("echo", 1).unwrap();
        drop(worker.submit(JobId(1), Echo(3)).unwrap());
        assert_eq!(worker.submit(JobId(2), Echo(4)).unwrap().wait().unwrap(), 5);
    }
}
