use core::ops::Index;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Logical color channel. The discriminant is the channel index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    Red = 0,
    Green = 1,
    Blue = 2,
    White = 3,
}

/// RGBW color. `white` is ignored by 3 channel chips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    #[serde(default)]
    pub white: u8,
}

impl Color {
    pub const OFF: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const WARM_WHITE: Color = Color::rgbw(0, 0, 0, 255);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::rgbw(red, green, blue, 0)
    }

    pub const fn rgbw(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    /// Converts hue, saturation, value to RGB
    pub fn from_hsv(h: u32, s: u32, v: u32) -> anyhow::Result<Self> {
        if h > 360 || s > 100 || v > 100 {
            bail!("The given HSV values are not in valid range");
        }
        let s = s as f64 / 100.0;
        let v = v as f64 / 100.0;
        let c = s * v;
        let x = c * (1.0 - (((h as f64 / 60.0) % 2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h {
            0..=59 => (c, x, 0.0),
            60..=119 => (x, c, 0.0),
            120..=179 => (0.0, c, x),
            180..=239 => (0.0, x, c),
            240..=299 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Ok(Self::rgb(
            ((r + m) * 255.0).round() as u8,
            ((g + m) * 255.0).round() as u8,
            ((b + m) * 255.0).round() as u8,
        ))
    }

    /// `steps` fully saturated colors spaced evenly around the hue circle,
    /// starting at red
    pub fn rainbow(steps: u32, v: u32) -> anyhow::Result<Vec<Self>> {
        (0..steps)
            .map(|i| Self::from_hsv(i * 360 / steps, 100, v))
            .collect()
    }

    pub fn channel(&self, channel: ColorChannel) -> u8 {
        self[channel]
    }

    pub fn set_channel(&mut self, channel: ColorChannel, value: u8) {
        match channel {
            ColorChannel::Red => self.red = value,
            ColorChannel::Green => self.green = value,
            ColorChannel::Blue => self.blue = value,
            ColorChannel::White => self.white = value,
        }
    }
}

impl Index<ColorChannel> for Color {
    type Output = u8;

    fn index(&self, channel: ColorChannel) -> &u8 {
        match channel {
            ColorChannel::Red => &self.red,
            ColorChannel::Green => &self.green,
            ColorChannel::Blue => &self.blue,
            ColorChannel::White => &self.white,
        }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, w): (u8, u8, u8, u8)) -> Self {
        Self::rgbw(r, g, b, w)
    }
}
