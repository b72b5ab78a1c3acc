use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest a queued task may wait for the host to go idle.
pub const DEFAULT_IDLE_DEADLINE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleTask<T> {
    pub job: T,
    pub deadline: Instant,
}

/// FIFO of deferred jobs. A job becomes runnable when the host reports itself idle or its
/// deadline has passed, whichever happens first.
#[derive(Clone, Debug)]
pub struct IdleQueue<T> {
    tasks: VecDeque<IdleTask<T>>,
    timeout: Duration,
}

impl<T> IdleQueue<T> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tasks: VecDeque::new(),
            timeout,
        }
    }

    /// Queue `job`; returns the instant by which it will run at the latest.
    pub fn push(&mut self, job: T, now: Instant) -> Instant {
        let deadline = now + self.timeout;
        self.tasks.push_back(IdleTask { job, deadline });
        deadline
    }

    /// Pop the front job if it may run now.
    pub fn take_ready(&mut self, now: Instant, host_idle: bool) -> Option<IdleTask<T>> {
        let front = self.tasks.front()?;
        if host_idle || now >= front.deadline {
            self.tasks.pop_front()
        } else {
            None
        }
    }

    /// Deadline of the front job, which bounds how long the host may sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.front().map(|t| t.deadline)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for IdleQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_DEADLINE)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/idle.rs"]
mod tests;
