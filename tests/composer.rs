mod tests {
    use ledstrips::encoder::{decode_frame, encode};
    use ledstrips::sim::SimBackend;
    use ledstrips::{ChipType, Color, LedStripError, LedStrips, ManagerConfig};

    const RED: Color = Color::RED;
    const GREEN: Color = Color::GREEN;
    const BLUE: Color = Color::BLUE;

    fn strips() -> (SimBackend, LedStrips<SimBackend>) {
        let backend = SimBackend::default();
        let strips = LedStrips::new(backend.clone(), &ManagerConfig::default());
        (backend, strips)
    }

    fn leds(strips: &LedStrips<SimBackend>, h: ledstrips::DeviceHandle) -> Vec<Color> {
        let d = strips.device(h).unwrap();
        decode_frame(d.buffer(), d.profile()).unwrap()
    }

    #[test]
    fn test_buffer_size() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Sk6812Rgbw, 30).unwrap();
        assert_eq!(strips.device(h).unwrap().buffer().len(), 30 * 4 * 8);
        let h = strips.add_device(6, ChipType::Ws2812, 30).unwrap();
        assert_eq!(strips.device(h).unwrap().buffer().len(), 30 * 3 * 8);
    }

    #[test]
    fn test_set_colors_keeps_tail() {
        let (backend, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Ws2812, 6).unwrap();
        strips.set_colors(h, &[BLUE; 6]).unwrap();
        let before = strips.device(h).unwrap().buffer().to_vec();

        strips.set_colors(h, &[RED, GREEN]).unwrap();
        let after = strips.device(h).unwrap().buffer().to_vec();
        assert_eq!(after[2 * 24..], before[2 * 24..]);
        assert_eq!(leds(&strips, h), vec![RED, GREEN, BLUE, BLUE, BLUE, BLUE]);

        // The whole buffer goes out, tail included
        let channel = strips.channel_id(h).unwrap();
        assert_eq!(backend.last_frame(channel).unwrap(), after);
    }

    #[test]
    fn test_set_colors_first_use_tail_is_off() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Sk6812, 4).unwrap();
        strips.set_colors(h, &[RED]).unwrap();
        assert_eq!(leds(&strips, h), vec![RED, Color::OFF, Color::OFF, Color::OFF]);
    }

    #[test]
    fn test_set_colors_ignores_extra() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Ws2812, 2).unwrap();
        strips.set_colors(h, &[RED, GREEN, BLUE]).unwrap();
        assert_eq!(leds(&strips, h), vec![RED, GREEN]);
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let (backend, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Ws2812, 3).unwrap();
        strips.set_colors(h, &[RED; 3]).unwrap();
        backend.clear_events();

        let err = strips.set_sequence(h, &[]).unwrap_err();
        assert!(matches!(err, LedStripError::InvalidArgument(_)));
        // Nothing written, nothing sent
        assert_eq!(leds(&strips, h), vec![RED; 3]);
        assert!(backend.events().is_empty());
    }

    #[test]
    fn test_sequence_of_strip_length_equals_colors() {
        let pattern = [RED, GREEN, BLUE, Color::WHITE, Color::rgbw(1, 2, 3, 4)];
        for chip in ChipType::ALL {
            let (backend, mut strips) = strips();
            let a = strips.add_device(5, chip, 5).unwrap();
            let b = strips.add_device(6, chip, 5).unwrap();
            strips.set_colors(a, &pattern).unwrap();
            strips.set_sequence(b, &pattern).unwrap();
            assert_eq!(
                strips.device(a).unwrap().buffer(),
                strips.device(b).unwrap().buffer()
            );
            let (ca, cb) = (strips.channel_id(a).unwrap(), strips.channel_id(b).unwrap());
            assert_eq!(backend.last_frame(ca), backend.last_frame(cb));
        }
    }

    #[test]
    fn test_sequence_partial_tile() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Sk6812Rgbw, 7).unwrap();
        strips.set_sequence(h, &[RED, GREEN, BLUE]).unwrap();
        let d = strips.device(h).unwrap();
        assert_eq!(d.buffer().len(), 7 * 32);
        assert_eq!(
            leds(&strips, h),
            vec![RED, GREEN, BLUE, RED, GREEN, BLUE, RED]
        );
    }

    #[test]
    fn test_sequence_tiles_exactly() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Ws2812, 6).unwrap();
        strips.set_sequence(h, &[RED, BLUE]).unwrap();
        assert_eq!(leds(&strips, h), vec![RED, BLUE, RED, BLUE, RED, BLUE]);
    }

    #[test]
    fn test_sequence_slot_layout() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Ws2812, 4).unwrap();
        strips.set_sequence(h, &[GREEN, Color::OFF, BLUE]).unwrap();
        let d = strips.device(h).unwrap();
        let p = d.profile();
        // LED i, position p, bit b -> ((i * 3 + p) * 8) + b
        let slot = |i: usize| &d.buffer()[i * 24..(i + 1) * 24];
        assert_eq!(slot(0), encode(&GREEN, p).as_slice());
        assert_eq!(slot(1), encode(&Color::OFF, p).as_slice());
        assert_eq!(slot(2), encode(&BLUE, p).as_slice());
        assert_eq!(slot(3), encode(&GREEN, p).as_slice());
        assert_eq!(d.buffer()[(3 * 3) * 8], p.one());
    }

    #[test]
    fn test_fill_and_clear() {
        let (_, mut strips) = strips();
        let h = strips.add_device(5, ChipType::Sk6812Rgbw, 3).unwrap();
        strips.fill(h, Color::WARM_WHITE).unwrap();
        assert_eq!(leds(&strips, h), vec![Color::WARM_WHITE; 3]);
        strips.clear(h).unwrap();
        assert_eq!(leds(&strips, h), vec![Color::OFF; 3]);
    }
}
