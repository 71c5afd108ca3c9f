use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Sliding-window rate limiter keyed by client IP address.
///
/// Each client gets an ordered window of request timestamps covering at most
/// the trailing window duration. The admission check and the recording of an
/// admitted request happen inside one critical section, so two concurrent
/// requests from the same client can never both spend the same remaining
/// slot. A sliding window (rather than fixed buckets) means a client can
/// never burst twice the nominal rate across a bucket boundary.
///
/// The key is the peer IP, not the full socket address: every connection
/// arrives on a fresh ephemeral port, so limiting per (ip, port) would never
/// limit anything.
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    windows: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window` per client
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a request from `client` at `now` is admitted.
    ///
    /// Evicts timestamps older than the window, then either records `now`
    /// and admits, or rejects without recording. Rejection is terminal for
    /// that request; the server never retries on the client's behalf.
    pub fn admit(&self, client: IpAddr, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        let window = windows.entry(client).or_default();

        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) > self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}
