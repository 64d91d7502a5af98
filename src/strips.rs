use std::time::Duration;

use crate::chip::ChipType;
use crate::color::Color;
use crate::config::{ManagerConfig, StripConfig};
use crate::device::Device;
use crate::error::{LedStripError, Result};
use crate::transmit::PulseTransmitter;

/// GPIO number of a strip's data line
pub type DataLine = u8;

/// Index of a hardware transmit channel
pub type ChannelId = u8;

/// Source of transmit channels, e.g. the RMT block of an ESP32.
pub trait ChannelBackend {
    type Channel: PulseTransmitter;

    /// Number of transmit channels the hardware has
    fn channel_count(&self) -> usize;

    /// Configure `channel` to drive `line`. The channel is released when the
    /// returned value is dropped.
    fn open(&mut self, channel: ChannelId, line: DataLine) -> anyhow::Result<Self::Channel>;
}

pub type ErrorHook = Box<dyn FnMut(DeviceHandle, &LedStripError) + Send>;

/// Generational index of a device in [`LedStrips`]. A handle is invalidated
/// by [`LedStrips::remove_device`]; its slot may be reused but the old
/// handle keeps failing with [`LedStripError::StaleHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    index: u32,
    generation: u32,
}

struct Entry<T: PulseTransmitter> {
    channel: ChannelId,
    line: DataLine,
    device: Device<T>,
}

struct Slot<T: PulseTransmitter> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Owns all strips and the pool of transmit channels they are bound to.
///
/// Not internally synchronised: mutating calls take `&mut self`. Each device
/// owns its channel exclusively, so frames for one strip go out in call
/// order.
pub struct LedStrips<B: ChannelBackend> {
    backend: B,
    slots: Vec<Slot<B::Channel>>,
    channel_in_use: Vec<bool>,
    wait_timeout: Option<Duration>,
    on_error: Option<ErrorHook>,
}

impl<B: ChannelBackend> LedStrips<B> {
    pub fn new(backend: B, config: &ManagerConfig) -> Self {
        let channels = config
            .max_channels
            .map_or(backend.channel_count(), |max| max.min(backend.channel_count()))
            .min(usize::from(ChannelId::MAX) + 1);
        log::info!(
            "LedStrips: {channels} channel(s), tx wait timeout {:?}",
            config.wait_timeout()
        );
        Self {
            backend,
            slots: Vec::new(),
            channel_in_use: vec![false; channels],
            wait_timeout: config.wait_timeout(),
            on_error: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Called with every transmit error in addition to logging it
    pub fn set_error_hook<F>(&mut self, hook: F)
    where
        F: FnMut(DeviceHandle, &LedStripError) + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
    }

    /// Binds a free channel to `line` and allocates a zeroed frame buffer
    /// for `length` LEDs. On error the channel goes back to the pool.
    pub fn add_device(
        &mut self,
        line: DataLine,
        chip: ChipType,
        length: u32,
    ) -> Result<DeviceHandle> {
        if length == 0 {
            return Err(LedStripError::InvalidArgument("strip length must be > 0"));
        }
        let channel = self
            .channel_in_use
            .iter()
            .position(|used| !used)
            .ok_or(LedStripError::ChannelsExhausted(self.channel_in_use.len()))?
            as ChannelId;

        let device = self
            .backend
            .open(channel, line)
            .map_err(LedStripError::Channel)
            .and_then(|tx| Device::new(tx, chip, length, self.wait_timeout));
        let device = match device {
            Ok(device) => device,
            Err(e) => {
                log::error!("Add {chip} x{length} on GPIO{line}: {e}");
                return Err(e);
            }
        };
        self.channel_in_use[usize::from(channel)] = true;

        let entry = Entry {
            channel,
            line,
            device,
        };
        let handle = match self.slots.iter().position(|s| s.entry.is_none()) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.entry = Some(entry);
                DeviceHandle {
                    index: index as u32,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                DeviceHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        log::info!("Added {chip} x{length} on GPIO{line} (channel {channel}) -> {handle:?}");
        Ok(handle)
    }

    pub fn add_from_config(&mut self, config: &StripConfig) -> Result<DeviceHandle> {
        log::info!("Strip '{}'", config.name);
        self.add_device(config.data_line, config.chip, config.length)
    }

    /// Releases the device's channel and buffer. Unknown or already removed
    /// handles are ignored.
    pub fn remove_device(&mut self, handle: DeviceHandle) {
        let Some(slot) = self.slot_mut(handle) else {
            log::warn!("Remove {handle:?}: stale handle ignored");
            return;
        };
        let Some(entry) = slot.entry.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.channel_in_use[usize::from(entry.channel)] = false;
        log::info!(
            "Removed {} x{} on GPIO{} (channel {})",
            entry.device.chip(),
            entry.device.strip_length(),
            entry.line,
            entry.channel
        );
    }

    /// See [`Device::set_colors`]. Only a stale handle is an error.
    pub fn set_colors(&mut self, handle: DeviceHandle, colors: &[Color]) -> Result<()> {
        self.device_mut(handle)?.write_colors(colors);
        self.transmit(handle)
    }

    /// See [`Device::set_sequence`]. Fails for a stale handle or an empty
    /// pattern.
    pub fn set_sequence(&mut self, handle: DeviceHandle, pattern: &[Color]) -> Result<()> {
        self.device_mut(handle)?.write_sequence(pattern)?;
        self.transmit(handle)
    }

    pub fn fill(&mut self, handle: DeviceHandle, color: Color) -> Result<()> {
        self.device_mut(handle)?.write_fill(color);
        self.transmit(handle)
    }

    pub fn clear(&mut self, handle: DeviceHandle) -> Result<()> {
        self.fill(handle, Color::OFF)
    }

    pub fn device(&self, handle: DeviceHandle) -> Result<&Device<B::Channel>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
            .map(|e| &e.device)
            .ok_or(LedStripError::StaleHandle)
    }

    pub fn device_mut(&mut self, handle: DeviceHandle) -> Result<&mut Device<B::Channel>> {
        self.slot_mut(handle)
            .and_then(|s| s.entry.as_mut())
            .map(|e| &mut e.device)
            .ok_or(LedStripError::StaleHandle)
    }

    /// Channel bound to `handle`
    pub fn channel_id(&self, handle: DeviceHandle) -> Result<ChannelId> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.entry.as_ref())
            .map(|e| e.channel)
            .ok_or(LedStripError::StaleHandle)
    }

    pub fn handles(&self) -> impl Iterator<Item = DeviceHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, s)| {
            s.entry.as_ref().map(|_| DeviceHandle {
                index: index as u32,
                generation: s.generation,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free_channels(&self) -> usize {
        self.channel_in_use.iter().filter(|used| !**used).count()
    }

    fn slot_mut(&mut self, handle: DeviceHandle) -> Option<&mut Slot<B::Channel>> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
    }

    // Transmit errors are reported, never returned
    fn transmit(&mut self, handle: DeviceHandle) -> Result<()> {
        if let Err(e) = self.device_mut(handle)?.transmit() {
            log::error!("Transmit {handle:?}: {e}");
            if let Some(hook) = self.on_error.as_mut() {
                hook(handle, &e);
            }
        }
        Ok(())
    }
}
