use std::time::Duration;

use crate::chip::PulseCode;
use crate::error::{LedStripError, Result};

/// Hardware transmit channel bound to one data line.
///
/// Implementations:
/// - `rmt::RmtTx`: ESP-IDF RMT peripheral
/// - [`crate::sim::SimChannel`]: in-memory recorder for host tests
///
/// Dropping the channel releases the underlying peripheral.
pub trait PulseTransmitter {
    /// Tick rate the pulse durations are expressed in
    fn tick_hz(&self) -> anyhow::Result<u32>;

    /// Reserve staging for frames of up to `items` codes. Called once when
    /// the device is created; `submit` never allocates afterwards.
    fn reserve(&mut self, items: usize) -> anyhow::Result<()>;

    /// Block until the previous submission has left the wire. `None` waits
    /// forever. Returns `Ok(false)` on timeout.
    fn wait_idle(&mut self, timeout: Option<Duration>) -> anyhow::Result<bool>;

    /// Queue a frame and return without waiting for it to complete
    fn submit(&mut self, frame: &[PulseCode]) -> anyhow::Result<()>;

    /// Queue the latch pulse behind the frame just submitted
    fn submit_reset(&mut self, reset: PulseCode) -> anyhow::Result<()>;
}

/// Sends `frame` followed by `reset`.
///
/// Waits for the channel's previous frame first, so at most one frame is in
/// flight per channel and frames go out in call order. Nothing is submitted
/// if the wait fails, and the reset is skipped if the frame submit fails.
pub fn transmit<T>(
    channel: &mut T,
    frame: &[PulseCode],
    reset: PulseCode,
    timeout: Option<Duration>,
) -> Result<()>
where
    T: PulseTransmitter + ?Sized,
{
    match channel.wait_idle(timeout) {
        Ok(true) => {}
        Ok(false) => return Err(LedStripError::Timeout),
        Err(e) => return Err(LedStripError::Channel(e.context("wait for tx done"))),
    }
    channel
        .submit(frame)
        .map_err(|e| LedStripError::Channel(e.context("submit frame")))?;
    channel
        .submit_reset(reset)
        .map_err(|e| LedStripError::Channel(e.context("submit reset")))?;
    Ok(())
}
