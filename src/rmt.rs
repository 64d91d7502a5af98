use std::time::Duration;

use anyhow::bail;
use esp_idf_hal::delay::{TickType, BLOCK};
use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{PinState, TxRmtDriver, CHANNEL0, CHANNEL1, RMT};
use esp_idf_hal::sys::{
    esp, esp_err_t, rmt_item32_t, rmt_wait_tx_done, rmt_write_items, ESP_ERR_TIMEOUT,
};

use crate::chip::PulseCode;
use crate::strips::{ChannelBackend, ChannelId, DataLine};
use crate::transmit::PulseTransmitter;

#[cfg(any(esp32, esp32s2, esp32s3))]
use esp_idf_hal::rmt::{CHANNEL2, CHANNEL3};
#[cfg(esp32)]
use esp_idf_hal::rmt::{CHANNEL4, CHANNEL5, CHANNEL6, CHANNEL7};

#[cfg(esp32)]
const TX_CHANNELS: usize = 8;
#[cfg(any(esp32s2, esp32s3))]
const TX_CHANNELS: usize = 4;
#[cfg(not(any(esp32, esp32s2, esp32s3)))]
const TX_CHANNELS: usize = 2;

/// The RMT block as a pool of TX channels.
///
/// Takes ownership of the `RMT` peripheral so nothing else can configure its
/// channels while strips are bound to them.
pub struct RmtBackend {
    _rmt: RMT,
    config: TransmitConfig,
}

impl RmtBackend {
    // let peripherals = Peripherals::take()?;
    // let backend = RmtBackend::new(peripherals.rmt);
    pub fn new(rmt: RMT) -> Self {
        // 80MHz APB clock, idle low between frames
        let config = TransmitConfig::new()
            .clock_divider(1)
            .idle(Some(PinState::Low));
        Self { _rmt: rmt, config }
    }
}

impl ChannelBackend for RmtBackend {
    type Channel = RmtTx;

    fn channel_count(&self) -> usize {
        TX_CHANNELS
    }

    /// The data line must not be driven by anything else while the strip
    /// exists.
    fn open(&mut self, channel: ChannelId, line: DataLine) -> anyhow::Result<RmtTx> {
        // Safety: `RMT` is owned by the backend and the pool never opens a
        // channel twice, so each CHANNELn below is unique. The caller hands
        // over the GPIO with the data line number.
        let pin = unsafe { AnyOutputPin::new(i32::from(line)) };
        let config = &self.config;
        let tx = unsafe {
            match channel {
                0 => TxRmtDriver::new(CHANNEL0::new(), pin, config)?,
                1 => TxRmtDriver::new(CHANNEL1::new(), pin, config)?,
                #[cfg(any(esp32, esp32s2, esp32s3))]
                2 => TxRmtDriver::new(CHANNEL2::new(), pin, config)?,
                #[cfg(any(esp32, esp32s2, esp32s3))]
                3 => TxRmtDriver::new(CHANNEL3::new(), pin, config)?,
                #[cfg(esp32)]
                4 => TxRmtDriver::new(CHANNEL4::new(), pin, config)?,
                #[cfg(esp32)]
                5 => TxRmtDriver::new(CHANNEL5::new(), pin, config)?,
                #[cfg(esp32)]
                6 => TxRmtDriver::new(CHANNEL6::new(), pin, config)?,
                #[cfg(esp32)]
                7 => TxRmtDriver::new(CHANNEL7::new(), pin, config)?,
                _ => bail!("RMT channel {channel} is not a TX channel"),
            }
        };
        log::info!(
            "RMT channel {channel} on GPIO{line} @ {} Hz",
            tx.counter_clock()?.0
        );
        Ok(RmtTx {
            tx,
            items: Vec::new(),
        })
    }
}

/// One installed RMT TX channel. Dropping it uninstalls the driver.
pub struct RmtTx {
    tx: TxRmtDriver<'static>,
    // Frame items followed by the reset item. Sized once by `reserve` and
    // never grown, so items stay put until the hardware has sent them.
    items: Vec<rmt_item32_t>,
}

impl PulseTransmitter for RmtTx {
    fn tick_hz(&self) -> anyhow::Result<u32> {
        Ok(self.tx.counter_clock()?.0)
    }

    fn wait_idle(&mut self, timeout: Option<Duration>) -> anyhow::Result<bool> {
        let ticks = timeout.map_or(BLOCK, |t| {
            TickType::new_millis(t.as_millis() as u64).ticks()
        });
        let err = unsafe { rmt_wait_tx_done(self.tx.channel(), ticks) };
        if err == ESP_ERR_TIMEOUT as esp_err_t {
            return Ok(false);
        }
        esp!(err)?;
        Ok(true)
    }

    fn reserve(&mut self, items: usize) -> anyhow::Result<()> {
        // One extra for the reset pulse
        let total = items
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("{items} RMT items"))?;
        self.items.try_reserve_exact(total)?;
        Ok(())
    }

    fn submit(&mut self, frame: &[PulseCode]) -> anyhow::Result<()> {
        if frame.len() >= self.items.capacity() {
            bail!(
                "frame of {} codes exceeds {} reserved RMT items",
                frame.len(),
                self.items.capacity()
            );
        }
        self.items.clear();
        // Within capacity, so no reallocation
        self.items
            .extend(frame.iter().map(|c| item(c.high_ticks, c.low_ticks)));
        write_items(&self.tx, &self.items)
    }

    fn submit_reset(&mut self, reset: PulseCode) -> anyhow::Result<()> {
        let start = self.items.len();
        if start >= self.items.capacity() {
            bail!("no RMT item reserved for the reset pulse");
        }
        self.items.push(item(0, reset.low_ticks));
        // rmt_write_items takes the channel semaphore, so this returns once
        // the frame ahead of it is out
        write_items(&self.tx, &self.items[start..])
    }
}

/// `high` ticks at level 1 then `low` ticks at level 0. A zero `high` makes
/// the low phase the first half and ends the item there.
fn item(high: u16, low: u16) -> rmt_item32_t {
    // duration0 [14:0], level0 [15], duration1 [30:16], level1 [31]
    let val = if high == 0 {
        u32::from(low & PulseCode::MAX_TICKS)
    } else {
        u32::from(high & PulseCode::MAX_TICKS)
            | 1 << 15
            | u32::from(low & PulseCode::MAX_TICKS) << 16
    };
    // Safety: plain 32-bit POD, all-zero is a valid item
    let mut item: rmt_item32_t = unsafe { core::mem::zeroed() };
    item.__bindgen_anon_1.val = val;
    item
}

fn write_items(tx: &TxRmtDriver<'_>, items: &[rmt_item32_t]) -> anyhow::Result<()> {
    // Safety: `items` is owned by the RmtTx and is not touched again until
    // the next wait_idle has returned
    esp!(unsafe { rmt_write_items(tx.channel(), items.as_ptr(), items.len() as i32, false) })?;
    Ok(())
}
