//! Progress reporting for long-running meshing.
//!
//! The mesher reports whole percentages. Each stage owns a band of the
//! 0–100 range and maps its own row count into that band.

/// A progress callback receiving a percentage (0–100) and a stage message.
pub struct Progress {
    callback: Box<dyn Fn(u8, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(u8, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report an absolute percentage; values above 100 are clamped.
    #[inline]
    pub fn report(&self, percent: u8, message: &str) {
        (self.callback)(percent.min(100), message);
    }

    /// Report `done` of `total` steps within the band `[start, end]`.
    #[inline]
    pub fn report_band(&self, done: usize, total: usize, start: u8, end: u8, message: &str) {
        if total == 0 || end < start {
            return;
        }
        let span = usize::from(end - start);
        let offset = (done.min(total) * span) / total;
        self.report(start + offset as u8, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
