pub mod chip;
pub mod color;
pub mod config;
pub mod device;
pub mod encoder;
pub mod error;
#[cfg(target_os = "espidf")]
pub mod rmt;
pub mod sim;
pub mod strips;
pub mod transmit;

pub use chip::{ChipProfile, ChipType, PulseCode};
pub use color::{Color, ColorChannel};
pub use config::{ManagerConfig, StripConfig};
pub use device::Device;
pub use error::{LedStripError, Result};
pub use strips::{ChannelBackend, ChannelId, DataLine, DeviceHandle, LedStrips};
pub use transmit::PulseTransmitter;
