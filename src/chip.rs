use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorChannel;
use crate::error::{LedStripError, Result};

// Datasheet timings (ns)
//
// WS2812 https://cdn-shop.adafruit.com/datasheets/WS2812.pdf
// SK6812 https://cdn-shop.adafruit.com/product-files/1138/SK6812+LED+datasheet+.pdf
// SK6812RGBW https://cdn-shop.adafruit.com/product-files/2757/p2757_SK6812RGBW_REV01.pdf
const WS2812: ChipTimings = ChipTimings {
    t0h: 800,
    t0l: 350,
    t1h: 600,
    t1l: 700,
    reset: 50_000,
};
const SK6812: ChipTimings = ChipTimings {
    t0h: 300,
    t0l: 900,
    t1h: 600,
    t1l: 600,
    reset: 80_000,
};
const SK6812_RGBW: ChipTimings = SK6812;

const GRB: &[ColorChannel] = &[ColorChannel::Green, ColorChannel::Red, ColorChannel::Blue];
const GRBW: &[ColorChannel] = &[
    ColorChannel::Green,
    ColorChannel::Red,
    ColorChannel::Blue,
    ColorChannel::White,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChipType {
    #[serde(rename = "WS2812")]
    Ws2812,
    #[serde(rename = "SK6812")]
    Sk6812,
    #[serde(rename = "SK6812RGBW")]
    Sk6812Rgbw,
}

impl ChipType {
    pub const ALL: [ChipType; 3] = [ChipType::Ws2812, ChipType::Sk6812, ChipType::Sk6812Rgbw];

    pub fn timings(self) -> ChipTimings {
        match self {
            ChipType::Ws2812 => WS2812,
            ChipType::Sk6812 => SK6812,
            ChipType::Sk6812Rgbw => SK6812_RGBW,
        }
    }

    /// Physical transmission position -> logical channel
    pub fn channel_order(self) -> &'static [ColorChannel] {
        match self {
            ChipType::Ws2812 | ChipType::Sk6812 => GRB,
            ChipType::Sk6812Rgbw => GRBW,
        }
    }

    pub fn channel_count(self) -> usize {
        self.channel_order().len()
    }

    pub fn name(self) -> &'static str {
        match self {
            ChipType::Ws2812 => "WS2812",
            ChipType::Sk6812 => "SK6812",
            ChipType::Sk6812Rgbw => "SK6812RGBW",
        }
    }
}

impl fmt::Display for ChipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChipType {
    type Err = LedStripError;

    fn from_str(s: &str) -> Result<Self> {
        ChipType::ALL
            .into_iter()
            .find(|chip| chip.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LedStripError::UnknownChip(s.to_string()))
    }
}

/// Protocol durations in nanoseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipTimings {
    pub t0h: u32,
    pub t0l: u32,
    pub t1h: u32,
    pub t1l: u32,
    pub reset: u32,
}

/// One transmission item: `high_ticks` at high level followed by
/// `low_ticks` at low level. A reset pulse has no high phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PulseCode {
    pub high_ticks: u16,
    pub low_ticks: u16,
}

impl PulseCode {
    /// RMT duration fields are 15 bits wide
    pub const MAX_TICKS: u16 = 0x7fff;

    pub const fn new(high_ticks: u16, low_ticks: u16) -> Self {
        Self {
            high_ticks,
            low_ticks,
        }
    }

    pub const fn low(ticks: u16) -> Self {
        Self::new(0, ticks)
    }
}

/// Chip timings resolved to channel ticks. Built once per device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChipProfile {
    chip: ChipType,
    tick_hz: u32,
    zero: PulseCode,
    one: PulseCode,
    reset: PulseCode,
    channel_order: &'static [ColorChannel],
}

impl ChipProfile {
    pub fn resolve(chip: ChipType, tick_hz: u32) -> Result<Self> {
        let t = chip.timings();
        let ticks = |ns: u32, phase: &'static str| -> Result<u16> {
            let invalid = |reason| LedStripError::InvalidProfile {
                chip,
                tick_hz,
                reason,
            };
            // round(ns * hz / 1e9)
            let ticks = (u64::from(ns) * u64::from(tick_hz) + 500_000_000) / 1_000_000_000;
            match ticks {
                0 => Err(invalid(phase)),
                n if n > u64::from(PulseCode::MAX_TICKS) => {
                    Err(invalid("duration exceeds 15 bit tick range"))
                }
                n => Ok(n as u16),
            }
        };

        let zero = PulseCode::new(
            ticks(t.t0h, "T0H rounds to zero ticks")?,
            ticks(t.t0l, "T0L rounds to zero ticks")?,
        );
        let one = PulseCode::new(
            ticks(t.t1h, "T1H rounds to zero ticks")?,
            ticks(t.t1l, "T1L rounds to zero ticks")?,
        );
        let reset = PulseCode::low(ticks(t.reset, "reset rounds to zero ticks")?);
        if zero == one {
            return Err(LedStripError::InvalidProfile {
                chip,
                tick_hz,
                reason: "bit 0 and bit 1 are indistinguishable",
            });
        }

        Ok(Self {
            chip,
            tick_hz,
            zero,
            one,
            reset,
            channel_order: chip.channel_order(),
        })
    }

    pub fn chip(&self) -> ChipType {
        self.chip
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn zero(&self) -> PulseCode {
        self.zero
    }

    pub fn one(&self) -> PulseCode {
        self.one
    }

    pub fn reset(&self) -> PulseCode {
        self.reset
    }

    pub fn channel_order(&self) -> &'static [ColorChannel] {
        self.channel_order
    }

    pub fn channel_count(&self) -> usize {
        self.channel_order.len()
    }

    /// Pulse codes per LED
    pub fn codes_per_led(&self) -> usize {
        self.channel_count() * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // APB clock with clock_divider(1)
    const APB_HZ: u32 = 80_000_000;

    #[test]
    fn test_resolve_ws2812() {
        let p = ChipProfile::resolve(ChipType::Ws2812, APB_HZ).unwrap();
        assert_eq!(p.zero(), PulseCode::new(64, 28));
        assert_eq!(p.one(), PulseCode::new(48, 56));
        assert_eq!(p.reset(), PulseCode::low(4000));
        assert_eq!(p.channel_count(), 3);
        assert_eq!(p.codes_per_led(), 24);
    }

    #[test]
    fn test_resolve_sk6812_rgbw() {
        let p = ChipProfile::resolve(ChipType::Sk6812Rgbw, APB_HZ).unwrap();
        assert_eq!(p.zero(), PulseCode::new(24, 72));
        assert_eq!(p.one(), PulseCode::new(48, 48));
        assert_eq!(p.reset(), PulseCode::low(6400));
        assert_eq!(
            p.channel_order(),
            &[
                ColorChannel::Green,
                ColorChannel::Red,
                ColorChannel::Blue,
                ColorChannel::White
            ]
        );
    }

    #[test]
    fn test_resolve_rejects_slow_clock() {
        // 1 MHz -> T0L = 0.35 ticks
        let err = ChipProfile::resolve(ChipType::Ws2812, 1_000_000).unwrap_err();
        assert!(matches!(err, LedStripError::InvalidProfile { .. }));
        assert!(ChipProfile::resolve(ChipType::Sk6812, 0).is_err());
    }

    #[test]
    fn test_resolve_rejects_tick_overflow() {
        // 80us reset at 1 GHz = 80000 ticks
        let err = ChipProfile::resolve(ChipType::Sk6812, 1_000_000_000).unwrap_err();
        assert!(matches!(err, LedStripError::InvalidProfile { .. }));
    }

    #[test]
    fn test_chip_from_str() {
        assert_eq!("ws2812".parse::<ChipType>().unwrap(), ChipType::Ws2812);
        assert_eq!("SK6812RGBW".parse::<ChipType>().unwrap(), ChipType::Sk6812Rgbw);
        assert!(matches!(
            "APA102".parse::<ChipType>(),
            Err(LedStripError::UnknownChip(_))
        ));
    }

    #[test]
    fn test_profile_channel_order_for_every_chip() {
        for chip in ChipType::ALL {
            let p = ChipProfile::resolve(chip, APB_HZ).unwrap();
            assert_eq!(p.channel_order(), chip.channel_order());
            assert_eq!(p.codes_per_led(), chip.channel_count() * 8);
        }
    }
}
