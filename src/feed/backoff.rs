//! Reconnect state machine with exponential backoff

use super::ConnectionState;
use std::time::Duration;

/// Backoff bounds for connection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Upper bound on the delay
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
        }
    }
}

/// Connection state plus the backoff to apply on the next failure.
///
/// The delay only resets on a successful connect: a session that ends in a
/// read error goes straight back to `Connecting` with whatever delay the last
/// successful connect left behind (the initial one).
#[derive(Debug, Clone)]
pub struct Reconnector {
    policy: BackoffPolicy,
    state: ConnectionState,
    next_delay: Duration,
    failed_attempts: u32,
}

impl Reconnector {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            next_delay: policy.initial_delay,
            failed_attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Delay that the next connect failure will yield
    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Consecutive failed connects since the last success
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    /// Record a failed connect. Returns how long to wait before retrying.
    pub fn on_connect_failed(&mut self) -> Duration {
        let delay = self.next_delay;
        self.failed_attempts += 1;
        self.next_delay = (delay * 2).min(self.policy.max_delay);
        self.state = ConnectionState::Disconnected;
        delay
    }

    pub fn on_connected(&mut self) {
        self.next_delay = self.policy.initial_delay;
        self.failed_attempts = 0;
        self.state = ConnectionState::Listening;
    }

    /// The listening session ended (read error or server close)
    pub fn on_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    pub fn on_stopped(&mut self) {
        self.state = ConnectionState::Stopped;
    }
}

impl Default for Reconnector {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}
