//! Progress reporting for one conversion job.

/// One progress tick: `current` of `total` steps done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Forwards progress to a sink, never letting `current` go backwards or past `total`.
pub struct ProgressReporter<'a> {
    sink: &'a mut (dyn FnMut(Progress) + Send),
    current: usize,
    total: usize,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(total: usize, sink: &'a mut (dyn FnMut(Progress) + Send)) -> Self {
        Self {
            sink,
            current: 0,
            total,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn report(&mut self, current: usize, message: impl Into<String>) {
        self.current = current.clamp(self.current, self.total.max(self.current));
        (self.sink)(Progress {
            current: self.current,
            total: self.total,
            message: message.into(),
        });
    }

    /// Report a new message without advancing.
    pub fn note(&mut self, message: impl Into<String>) {
        self.report(self.current, message);
    }
}
