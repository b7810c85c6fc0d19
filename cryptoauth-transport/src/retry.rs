//! Receive retry policy
//!
//! Each receive attempt reports a tagged outcome so the policy can be
//! exercised without a bus.

use crate::error::TransportError;

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attempt<T> {
    /// Attempt produced a value
    Success(T),
    /// Transient failure, try again if attempts remain
    Retryable(TransportError),
    /// Protocol violation, stop immediately
    Fatal(TransportError),
}

impl<T> From<Result<T, TransportError>> for Attempt<T> {
    fn from(result: Result<T, TransportError>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(e) if e.is_retryable() => Attempt::Retryable(e),
            Err(e) => Attempt::Fatal(e),
        }
    }
}

/// Bounded retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    attempts: u8,
}

impl RetryPolicy {
    /// Policy from a configured retry count
    ///
    /// A count of zero still makes one attempt.
    pub fn from_rx_retries(rx_retries: u8) -> Self {
        Self {
            attempts: rx_retries.max(1),
        }
    }

    /// Total attempts this policy allows
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Run `attempt` until it succeeds, fails fatally, or attempts run out
    ///
    /// The closure receives the zero-based attempt number. When attempts
    /// are exhausted the last retryable error is returned.
    pub fn run<T, F>(&self, mut attempt: F) -> Result<T, TransportError>
    where
        F: FnMut(u8) -> Attempt<T>,
    {
        let mut last = TransportError::CommFail;
        for n in 0..self.attempts {
            match attempt(n) {
                Attempt::Success(value) => return Ok(value),
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retryable(e) => {
                    trace!("attempt {} of {} failed", n + 1, self.attempts);
                    last = e;
                }
            }
        }
        Err(last)
    }
}
