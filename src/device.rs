use std::time::Duration;

use crate::chip::{ChipProfile, ChipType, PulseCode};
use crate::color::Color;
use crate::encoder::{encode, encode_into};
use crate::error::{LedStripError, Result};
use crate::transmit::{transmit, PulseTransmitter};

/// One LED strip on one transmit channel.
///
/// The pulse buffer is allocated once for `strip_length` LEDs and starts out
/// encoding every LED as off. Composition overwrites LED slots in place and
/// the whole buffer is sent on every update, so LEDs not written by a call
/// keep whatever they last showed.
pub struct Device<T: PulseTransmitter> {
    strip_length: usize,
    profile: ChipProfile,
    buffer: Vec<PulseCode>,
    channel: T,
    wait_timeout: Option<Duration>,
}

impl<T: PulseTransmitter> Device<T> {
    pub fn new(
        mut channel: T,
        chip: ChipType,
        strip_length: u32,
        wait_timeout: Option<Duration>,
    ) -> Result<Self> {
        if strip_length == 0 {
            return Err(LedStripError::InvalidArgument("strip length must be > 0"));
        }
        let tick_hz = channel.tick_hz().map_err(LedStripError::Channel)?;
        let profile = ChipProfile::resolve(chip, tick_hz)?;

        let strip_length = strip_length as usize;
        let items = strip_length
            .checked_mul(profile.codes_per_led())
            .ok_or(LedStripError::Allocation(usize::MAX))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(items)
            .map_err(|_| LedStripError::Allocation(items))?;
        // All-zero bits is black on every chip
        buffer.resize(items, profile.zero());
        channel
            .reserve(items)
            .map_err(|e| {
                log::error!("{chip} x{strip_length}: {e:#}");
                LedStripError::Allocation(items)
            })?;

        Ok(Self {
            strip_length,
            profile,
            buffer,
            channel,
            wait_timeout,
        })
    }

    pub fn strip_length(&self) -> usize {
        self.strip_length
    }

    pub fn chip(&self) -> ChipType {
        self.profile.chip()
    }

    pub fn profile(&self) -> &ChipProfile {
        &self.profile
    }

    /// Encoded frame, `strip_length * channel_count * 8` codes
    pub fn buffer(&self) -> &[PulseCode] {
        &self.buffer
    }

    pub fn channel(&self) -> &T {
        &self.channel
    }

    /// One color per LED from the start of the strip. Extra colors are
    /// ignored; LEDs past the end of `colors` are not rewritten but are
    /// retransmitted with their previous contents.
    ///
    /// Transmit errors are logged, not returned. Use [`Device::write_colors`]
    /// and [`Device::transmit`] to observe them.
    pub fn set_colors(&mut self, colors: &[Color]) {
        self.write_colors(colors);
        self.transmit_logged();
    }

    /// Repeats `pattern` along the whole strip. A pattern longer than the
    /// strip is truncated; the last repetition is cut short when the strip
    /// length is not a multiple of the pattern length.
    ///
    /// Fails only for an empty pattern, in which case nothing is sent.
    pub fn set_sequence(&mut self, pattern: &[Color]) -> Result<()> {
        self.write_sequence(pattern)?;
        self.transmit_logged();
        Ok(())
    }

    pub fn fill(&mut self, color: Color) {
        self.write_fill(color);
        self.transmit_logged();
    }

    pub fn clear(&mut self) {
        self.fill(Color::OFF);
    }

    /// Encodes `colors` into the buffer without transmitting
    pub fn write_colors(&mut self, colors: &[Color]) {
        let per_led = self.profile.codes_per_led();
        for (color, slot) in colors.iter().zip(self.buffer.chunks_exact_mut(per_led)) {
            encode_into(color, &self.profile, slot);
        }
    }

    /// Tiles `pattern` into the buffer without transmitting
    pub fn write_sequence(&mut self, pattern: &[Color]) -> Result<()> {
        let seq_len = pattern.len().min(self.strip_length);
        if seq_len == 0 {
            return Err(LedStripError::InvalidArgument("sequence must not be empty"));
        }
        let per_led = self.profile.codes_per_led();
        // Encode each pattern entry once, then copy per tile
        let encoded: Vec<PulseCode> = pattern[..seq_len]
            .iter()
            .flat_map(|c| encode(c, &self.profile))
            .collect();
        // Final chunk is a partial tile when strip_length % seq_len != 0
        for tile in self.buffer.chunks_mut(seq_len * per_led) {
            tile.copy_from_slice(&encoded[..tile.len()]);
        }
        Ok(())
    }

    pub fn write_fill(&mut self, color: Color) {
        let led = encode(&color, &self.profile);
        for slot in self.buffer.chunks_exact_mut(led.len()) {
            slot.copy_from_slice(&led);
        }
    }

    /// Sends the current buffer and the latch pulse, waiting for the previous
    /// frame on this channel first.
    pub fn transmit(&mut self) -> Result<()> {
        log::debug!(
            "{} x{}: transmit {} codes",
            self.profile.chip(),
            self.strip_length,
            self.buffer.len()
        );
        transmit(
            &mut self.channel,
            &self.buffer,
            self.profile.reset(),
            self.wait_timeout,
        )
    }

    fn transmit_logged(&mut self) {
        if let Err(e) = self.transmit() {
            log::error!("{} x{}: {e}", self.profile.chip(), self.strip_length);
        }
    }
}
