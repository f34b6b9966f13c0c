//! Request pacing shared by every call a `Client` makes.
//!
//! # Design
//! Slots are handed out `1s / rps` apart. Each caller reserves the next free
//! slot under a short lock, then sleeps outside the lock until its slot
//! arrives, so concurrent callers are spaced out without blocking each other
//! on the mutex. The limiter is an ordinary value: every `Client::new` owns a
//! fresh one, and sharing happens only by passing the same `Arc` around.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use log::trace;

use crate::error::{ApiError, Result};

/// The API allows 5 requests per second per base; stay under it.
pub const DEFAULT_RATE_LIMIT: u32 = 4;

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Result<Self> {
        if requests_per_second == 0 {
            return Err(ApiError::InvalidRateLimit);
        }
        Ok(Self {
            interval: Duration::from_secs(1) / requests_per_second,
            next_slot: Mutex::new(Instant::now()),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the caller may send its next request.
    pub fn acquire(&self) {
        let wait = self.reserve(Instant::now());
        if !wait.is_zero() {
            trace!("rate limiter: waiting {wait:?}");
            thread::sleep(wait);
        }
    }

    /// Claim the next slot at or after `now` and return how long to wait for it.
    fn reserve(&self, now: Instant) -> Duration {
        // A poisoned lock only means another caller panicked mid-reserve;
        // the stored instant is still usable.
        let mut next = self
            .next_slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let slot = (*next).max(now);
        *next = slot + self.interval;
        slot - now
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1) / DEFAULT_RATE_LIMIT,
            next_slot: Mutex::new(Instant::now()),
        }
    }
}
