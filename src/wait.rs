//! Bounded busy-bit polling.
//!
//! Polling starts in [`WaitState::Polling`] and ends in exactly one of
//! `Ready`, `TimedOut` or `TransportError`. Nothing is retried after a bus
//! failure. Elapsed time is accounted from the poll interval sleeps issued
//! here, so bus transfer time only makes the real wait longer, never shorter.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::constants::MTS4X_POLL_INTERVAL_MS;
use crate::data::Status;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Polling,
    Ready,
    TimedOut,
    TransportError,
}

/// one wait for a status bit (`STATUS_BUSY` or `STATUS_EE_BUSY`) to clear
#[derive(Debug)]
pub struct BusyWait {
    busy_mask: u8,
    timeout_ms: u32,
    elapsed_ms: u32,
    state: WaitState,
}

impl BusyWait {
    pub fn new(busy_mask: u8, timeout_ms: u32) -> Self {
        Self {
            busy_mask,
            timeout_ms,
            elapsed_ms: 0,
            state: WaitState::Polling,
        }
    }

    pub fn state(&self) -> WaitState {
        self.state
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// feed one status read and return the new state
    pub fn observe<E>(&mut self, status: &Result<Status, Error<E>>) -> WaitState {
        if self.state != WaitState::Polling {
            return self.state;
        }
        self.state = match status {
            Err(_) => WaitState::TransportError,
            Ok(status) if status.0 & self.busy_mask == 0 => WaitState::Ready,
            Ok(_) if self.elapsed_ms >= self.timeout_ms => WaitState::TimedOut,
            Ok(_) => WaitState::Polling,
        };
        self.state
    }

    /// poll `read_status` until the busy bit clears, the timeout passes or the bus fails
    pub fn run<D, E, F>(mut self, delayer: &mut D, mut read_status: F) -> Result<(), Error<E>>
    where
        D: DelayNs,
        F: FnMut() -> Result<Status, Error<E>>,
    {
        debug!("in BusyWait::run(mask {:#04x}, timeout {} ms)", self.busy_mask, self.timeout_ms);
        loop {
            let status = read_status();
            match self.observe(&status) {
                WaitState::Polling => {
                    delayer.delay_ms(MTS4X_POLL_INTERVAL_MS);
                    self.elapsed_ms = self.elapsed_ms.saturating_add(MTS4X_POLL_INTERVAL_MS);
                }
                WaitState::Ready => {
                    debug!("  ready after {} ms", self.elapsed_ms);
                    return Ok(());
                }
                WaitState::TimedOut => {
                    debug!("  timed out after {} ms", self.elapsed_ms);
                    return Err(Error::Timeout);
                }
                WaitState::TransportError => {
                    debug!("  status read failed after {} ms", self.elapsed_ms);
                    return status.map(|_| ());
                }
            }
        }
    }
}
