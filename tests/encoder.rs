mod tests {
    use ledstrips::encoder::{decode, encode};
    use ledstrips::sim::SIM_TICK_HZ;
    use ledstrips::{ChipProfile, ChipType, Color, ColorChannel};

    fn profile(chip: ChipType) -> ChipProfile {
        ChipProfile::resolve(chip, SIM_TICK_HZ).unwrap()
    }

    #[test]
    fn test_round_trip_every_byte() {
        for chip in ChipType::ALL {
            let p = profile(chip);
            for &channel in p.channel_order() {
                for byte in 0..=255_u8 {
                    let mut color = Color::OFF;
                    color.set_channel(channel, byte);
                    let decoded = decode(&encode(&color, &p), &p).unwrap();
                    assert_eq!(decoded[channel], byte, "{chip} {channel:?} {byte:#04x}");
                    assert_eq!(decoded, color);
                }
            }
        }
    }

    #[test]
    fn test_codes_per_color() {
        assert_eq!(encode(&Color::WHITE, &profile(ChipType::Ws2812)).len(), 24);
        assert_eq!(encode(&Color::WHITE, &profile(ChipType::Sk6812)).len(), 24);
        assert_eq!(encode(&Color::WHITE, &profile(ChipType::Sk6812Rgbw)).len(), 32);
    }

    #[test]
    fn test_red_is_sent_second() {
        for chip in [ChipType::Ws2812, ChipType::Sk6812] {
            let p = profile(chip);
            let codes = encode(&Color::rgb(0xff, 0x00, 0x00), &p);
            let expected: Vec<_> = [p.zero(); 8]
                .into_iter()
                .chain([p.one(); 8])
                .chain([p.zero(); 8])
                .collect();
            assert_eq!(codes, expected);
        }
    }

    #[test]
    fn test_white_is_sent_last() {
        let p = profile(ChipType::Sk6812Rgbw);
        let codes = encode(&Color::WARM_WHITE, &p);
        assert!(codes[..24].iter().all(|c| *c == p.zero()));
        assert!(codes[24..].iter().all(|c| *c == p.one()));
        assert_eq!(p.channel_order()[3], ColorChannel::White);
    }

    #[test]
    fn test_bit_pulses_match_datasheet() {
        // WS2812 at 80 MHz: 0 = 0.80us/0.35us, 1 = 0.60us/0.70us
        let p = profile(ChipType::Ws2812);
        assert_eq!((p.zero().high_ticks, p.zero().low_ticks), (64, 28));
        assert_eq!((p.one().high_ticks, p.one().low_ticks), (48, 56));
        assert_eq!(p.reset().high_ticks, 0);
        assert_eq!(p.reset().low_ticks, 4000);
    }
}
