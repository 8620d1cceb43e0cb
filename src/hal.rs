//! Platform capabilities the driver consumes
//!
//! The byte transport and output pins come straight from `embedded-hal`
//! ([`SpiBus`](embedded_hal::spi::SpiBus), [`OutputPin`](embedded_hal::digital::OutputPin),
//! [`DelayNs`]). `embedded-hal` has no notion of edge-triggered callbacks or
//! of a monotonic clock, so those two capabilities are defined here.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::ErrorType;

/// Handler installed on the DIO0 line. Runs in interrupt context, so it must
/// do as little as possible.
pub type EdgeHandler = Box<dyn FnMut() + Send + 'static>;

/// An input line that can invoke a handler on its rising edge.
///
/// Implementations wrap whatever the platform offers (rppal async interrupts,
/// an EXTI line, a GPIO thread). Installing a new handler replaces the old one.
pub trait InterruptLine: ErrorType {
    /// Installs `handler` for rising edges, or disables the trigger when `None`.
    fn on_rising_edge(&mut self, handler: Option<EdgeHandler>) -> Result<(), Self::Error>;
}

/// Monotonic millisecond clock
pub trait Clock: Send {
    /// Milliseconds elapsed since an arbitrary fixed origin
    fn elapsed_ms(&self) -> u64;
}

/// [`Clock`] backed by [`std::time::Instant`]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    /// Clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn elapsed_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// [`DelayNs`] implementation that parks the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
