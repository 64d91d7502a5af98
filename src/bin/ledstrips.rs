use ledstrips::{ChannelBackend, Color, DeviceHandle, LedStrips, ManagerConfig, StripConfig};

// Strips attached to the board
const STRIPS: &str = r#"[
    { "name": "status", "data_line": 10, "chip": "WS2812", "length": 1 },
    { "name": "shelf", "data_line": 5, "chip": "SK6812RGBW", "length": 30 }
]"#;

const MANAGER: &str = r#"{ "tx_wait_timeout_ms": 1000 }"#;

// Hue steps in the rotating pattern, at 20% brightness
const HUE_STEPS: u32 = 12;
const BRIGHTNESS: u32 = 20;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::peripherals::Peripherals;
    use ledstrips::rmt::RmtBackend;
    use std::time::Duration;

    esp_idf_hal::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("{}", build_info());

    let peripherals = Peripherals::take()?;
    let mut strips = LedStrips::new(
        RmtBackend::new(peripherals.rmt),
        &ManagerConfig::from_json(MANAGER)?,
    );
    let handles = add_strips(&mut strips)?;
    for &h in &handles {
        strips.clear(h)?;
    }

    let mut pattern = Color::rainbow(HUE_STEPS, BRIGHTNESS)?;
    loop {
        log::info!(">> {:?}", pattern[0]);
        for &h in &handles {
            strips.set_sequence(h, &pattern)?;
        }
        pattern.rotate_left(1);
        std::thread::sleep(Duration::from_millis(200));
    }
}

// Host run against the simulated RMT block, printing decoded frames
#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use ledstrips::encoder::decode_frame;
    use ledstrips::sim::SimBackend;

    println!("{}", build_info());

    let backend = SimBackend::default();
    let mut strips = LedStrips::new(backend.clone(), &ManagerConfig::from_json(MANAGER)?);
    let handles = add_strips(&mut strips)?;

    let mut pattern = Color::rainbow(HUE_STEPS, BRIGHTNESS)?;
    for _ in 0..HUE_STEPS {
        for &h in &handles {
            strips.set_sequence(h, &pattern)?;
            let device = strips.device(h)?;
            let channel = strips.channel_id(h)?;
            let frame = backend.last_frame(channel).unwrap_or_default();
            let leds: Vec<_> = decode_frame(&frame, device.profile())
                .unwrap_or_default()
                .iter()
                .map(|c| (c.red, c.green, c.blue, c.white))
                .collect();
            println!(
                "[ch{channel}] {} x{}: {leds:?}",
                device.chip(),
                device.strip_length()
            );
        }
        pattern.rotate_left(1);
    }

    for h in handles {
        strips.remove_device(h);
    }
    Ok(())
}

fn add_strips<B: ChannelBackend>(strips: &mut LedStrips<B>) -> anyhow::Result<Vec<DeviceHandle>> {
    let mut handles = Vec::new();
    for config in StripConfig::list_from_json(STRIPS)? {
        match strips.add_from_config(&config) {
            Ok(h) => handles.push(h),
            Err(e) => log::error!("Strip '{}': {e}", config.name),
        }
    }
    Ok(handles)
}

fn build_info() -> String {
    format!(
        "ledstrips {} [{}@{} {}] built {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_BRANCH"),
        env!("BUILD_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TS")
    )
}
