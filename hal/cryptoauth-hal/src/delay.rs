//! Blocking delay source
//!
//! Wake recovery, command execution and discovery settle times are all
//! fixed blocking waits with no cancellation.

use embedded_hal::delay::DelayNs;

/// Blocking delay provider
pub trait Delay {
    /// Wait at least `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Wait at least `tens` × 10 microseconds
    fn delay_10us(&mut self, tens: u32) {
        self.delay_us(tens.saturating_mul(10));
    }

    /// Wait at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_us(&mut self, us: u32) {
        T::delay_us(self, us)
    }

    fn delay_10us(&mut self, tens: u32) {
        T::delay_10us(self, tens)
    }

    fn delay_ms(&mut self, ms: u32) {
        T::delay_ms(self, ms)
    }
}

/// Adapter from an `embedded-hal` delay to [`Delay`]
///
/// Lets any board HAL timer implementing
/// [`DelayNs`] drive the transport.
pub struct HalDelay<D> {
    inner: D,
}

impl<D: DelayNs> HalDelay<D> {
    /// Wrap an `embedded-hal` delay
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Release the wrapped delay
    pub fn into_inner(self) -> D {
        self.inner
    }
}

impl<D: DelayNs> Delay for HalDelay<D> {
    fn delay_us(&mut self, us: u32) {
        DelayNs::delay_us(&mut self.inner, us);
    }

    fn delay_ms(&mut self, ms: u32) {
        DelayNs::delay_ms(&mut self.inner, ms);
    }
}
