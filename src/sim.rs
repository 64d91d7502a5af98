//! Recording channel backend for host builds and tests.
//!
//! Every channel operation is appended to a shared event log. A frame counts
//! as in flight from `submit` until the next `wait_idle`, and a second
//! `submit` while one is in flight fails, so the log shows the ordering a
//! real peripheral would see.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::bail;

use crate::chip::PulseCode;
use crate::strips::{ChannelBackend, ChannelId, DataLine};
use crate::transmit::PulseTransmitter;

/// APB clock with `clock_divider(1)`
pub const SIM_TICK_HZ: u32 = 80_000_000;
pub const SIM_CHANNELS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    Open { channel: ChannelId, line: DataLine },
    Wait { channel: ChannelId },
    Frame { channel: ChannelId, codes: Vec<PulseCode> },
    Reset { channel: ChannelId, code: PulseCode },
    Close { channel: ChannelId },
}

impl SimEvent {
    pub fn channel(&self) -> ChannelId {
        match self {
            SimEvent::Open { channel, .. }
            | SimEvent::Wait { channel }
            | SimEvent::Frame { channel, .. }
            | SimEvent::Reset { channel, .. }
            | SimEvent::Close { channel } => *channel,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    events: Vec<SimEvent>,
    fail_lines: Vec<DataLine>,
    fail_submit: bool,
    fail_reserve: bool,
    stall: bool,
}

/// Cloneable view of a simulated RMT block. Clones share state.
#[derive(Clone, Debug)]
pub struct SimBackend {
    state: Arc<Mutex<SimState>>,
    channels: usize,
    tick_hz: u32,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new(SIM_CHANNELS, SIM_TICK_HZ)
    }
}

impl SimBackend {
    pub fn new(channels: usize, tick_hz: u32) -> Self {
        Self {
            state: Arc::default(),
            channels,
            tick_hz,
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.state().events.clone()
    }

    pub fn clear_events(&self) {
        self.state().events.clear();
    }

    /// Frames sent on `channel`, oldest first
    pub fn frames(&self, channel: ChannelId) -> Vec<Vec<PulseCode>> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Frame { channel: c, codes } if *c == channel => Some(codes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_frame(&self, channel: ChannelId) -> Option<Vec<PulseCode>> {
        self.frames(channel).pop()
    }

    /// Opening a channel on `line` will fail
    pub fn fail_line(&self, line: DataLine) {
        self.state().fail_lines.push(line);
    }

    /// All frame submits fail while set
    pub fn set_fail_submit(&self, fail: bool) {
        self.state().fail_submit = fail;
    }

    /// Staging reservations fail while set, as when the heap is exhausted
    pub fn set_fail_reserve(&self, fail: bool) {
        self.state().fail_reserve = fail;
    }

    /// A frame in flight never completes while set, so a bounded
    /// `wait_idle` times out. An unbounded wait still sees it complete.
    pub fn set_stall(&self, stall: bool) {
        self.state().stall = stall;
    }
}

impl ChannelBackend for SimBackend {
    type Channel = SimChannel;

    fn channel_count(&self) -> usize {
        self.channels
    }

    fn open(&mut self, channel: ChannelId, line: DataLine) -> anyhow::Result<SimChannel> {
        let mut state = self.state();
        if state.fail_lines.contains(&line) {
            bail!("GPIO{line} cannot be routed to RMT channel {channel}");
        }
        state.events.push(SimEvent::Open { channel, line });
        Ok(SimChannel {
            id: channel,
            tick_hz: self.tick_hz,
            reserved: 0,
            in_flight: false,
            state: self.state.clone(),
        })
    }
}

#[derive(Debug)]
pub struct SimChannel {
    id: ChannelId,
    tick_hz: u32,
    reserved: usize,
    in_flight: bool,
    state: Arc<Mutex<SimState>>,
}

impl SimChannel {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Largest frame `submit` accepts
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

impl PulseTransmitter for SimChannel {
    fn tick_hz(&self) -> anyhow::Result<u32> {
        Ok(self.tick_hz)
    }

    fn reserve(&mut self, items: usize) -> anyhow::Result<()> {
        if lock(&self.state).fail_reserve {
            bail!("cannot reserve {items} items");
        }
        self.reserved = items;
        Ok(())
    }

    fn wait_idle(&mut self, timeout: Option<Duration>) -> anyhow::Result<bool> {
        let mut state = lock(&self.state);
        if state.stall && self.in_flight && timeout.is_some() {
            return Ok(false);
        }
        self.in_flight = false;
        state.events.push(SimEvent::Wait { channel: self.id });
        Ok(true)
    }

    fn submit(&mut self, frame: &[PulseCode]) -> anyhow::Result<()> {
        let mut state = lock(&self.state);
        if state.fail_submit {
            bail!("rmt_write_items parameter error");
        }
        if self.in_flight {
            bail!("channel {} busy", self.id);
        }
        if frame.len() > self.reserved {
            bail!("frame of {} codes exceeds {} reserved", frame.len(), self.reserved);
        }
        self.in_flight = true;
        state.events.push(SimEvent::Frame {
            channel: self.id,
            codes: frame.to_vec(),
        });
        Ok(())
    }

    fn submit_reset(&mut self, reset: PulseCode) -> anyhow::Result<()> {
        lock(&self.state).events.push(SimEvent::Reset {
            channel: self.id,
            code: reset,
        });
        Ok(())
    }
}

impl Drop for SimChannel {
    fn drop(&mut self) {
        lock(&self.state)
            .events
            .push(SimEvent::Close { channel: self.id });
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
