//! Sliding-window rate limiting.
//!
//! The window remembers the completion times of recent requests. Requests
//! still in flight hold a reservation that counts toward the capacity, so at
//! most `capacity` requests are either running or finished within the last
//! second. Bursts up to `capacity` go through immediately; after that,
//! throughput is held to `capacity` per rolling second.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::sync::Notify;
use tokio::time::{Instant, sleep};

/// Length of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Whether a new send may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A reservation was taken; send now.
    Ready,
    /// A recorded send leaves the window after this long.
    After(Duration),
    /// Every slot is held by an in-flight request.
    WhenReleased,
}

/// Recent completion timestamps, oldest first, plus in-flight reservations.
#[derive(Debug)]
pub struct SlidingWindow {
    capacity: usize,
    sent: VecDeque<Instant>,
    in_flight: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sent: VecDeque::with_capacity(capacity),
            in_flight: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of recorded completions.
    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Takes a reservation if a slot is free at `now`.
    pub fn admit(&mut self, now: Instant) -> Admission {
        while let Some(&oldest) = self.sent.front() {
            if now.saturating_duration_since(oldest) < WINDOW {
                break;
            }
            self.sent.pop_front();
        }

        let occupied = self.sent.len() + self.in_flight;
        if occupied < self.capacity {
            self.in_flight += 1;
            return Admission::Ready;
        }
        if self.in_flight >= self.capacity {
            return Admission::WhenReleased;
        }

        // This many recorded sends have to age out before a slot frees up.
        let to_expire = occupied - self.capacity + 1;
        match self.sent.get(to_expire - 1) {
            Some(&at) => Admission::After(WINDOW.saturating_sub(now.saturating_duration_since(at))),
            None => Admission::WhenReleased,
        }
    }

    /// Turns a reservation into a completion recorded at `at`.
    pub fn complete(&mut self, at: Instant) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.capacity == 0 {
            return;
        }
        while self.sent.len() >= self.capacity {
            self.sent.pop_front();
        }
        self.sent.push_back(at);
    }

    /// Gives a reservation back without recording anything.
    pub fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Sliding window shared by every clone of one client.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<SlidingWindow>,
    freed: Notify,
}

impl RateLimiter {
    pub fn new(queries_per_second: usize) -> Self {
        Self {
            window: Mutex::new(SlidingWindow::new(queries_per_second)),
            freed: Notify::new(),
        }
    }

    fn window(&self) -> MutexGuard<'_, SlidingWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until the window has room and reserves a slot.
    ///
    /// The lock is only held while checking and reserving; the send itself
    /// runs unlocked, so requests on one client overlap up to the capacity.
    pub async fn acquire(&self) -> RateLimitPermit<'_> {
        loop {
            let freed = self.freed.notified();
            tokio::pin!(freed);
            freed.as_mut().enable();

            let admission = self.window().admit(Instant::now());
            match admission {
                Admission::Ready => {
                    return RateLimitPermit {
                        limiter: self,
                        recorded: false,
                    };
                }
                Admission::After(wait) => {
                    debug!("Rate limit reached, waiting {}ms", wait.as_millis());
                    tokio::select! {
                        _ = sleep(wait) => {}
                        _ = &mut freed => {}
                    }
                }
                Admission::WhenReleased => {
                    debug!("All rate limit slots in flight, waiting for one to finish");
                    freed.await;
                }
            }
        }
    }

    /// Number of completions currently in the window.
    pub fn in_window(&self) -> usize {
        self.window().len()
    }

    /// Number of reservations not yet recorded or released.
    pub fn in_flight(&self) -> usize {
        self.window().in_flight()
    }
}

/// A reserved slot for one send.
///
/// Dropping the permit without calling [`record`](Self::record) frees the slot
/// and leaves the recorded timestamps unchanged.
#[derive(Debug)]
pub struct RateLimitPermit<'a> {
    limiter: &'a RateLimiter,
    recorded: bool,
}

impl RateLimitPermit<'_> {
    /// Marks the request as completed now.
    pub fn record(mut self) {
        self.limiter.window().complete(Instant::now());
        self.recorded = true;
    }
}

impl Drop for RateLimitPermit<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.limiter.window().release();
        }
        self.limiter.freed.notify_waiters();
    }
}
