use crate::chip::{ChipProfile, PulseCode};
use crate::color::Color;

/// Encodes one LED into `profile.codes_per_led()` pulse codes: channels in
/// physical order, MSB first.
pub fn encode(color: &Color, profile: &ChipProfile) -> Vec<PulseCode> {
    let mut codes = vec![PulseCode::default(); profile.codes_per_led()];
    encode_into(color, profile, &mut codes);
    codes
}

/// In-place variant of [`encode`] writing into one LED slot of a frame
/// buffer. Writes the first `profile.codes_per_led()` codes of `slot` and
/// leaves any excess untouched. A shorter slot only receives the channels
/// that fit in it whole.
pub fn encode_into(color: &Color, profile: &ChipProfile, slot: &mut [PulseCode]) {
    let (zero, one) = (profile.zero(), profile.one());
    for (codes, &channel) in slot.chunks_exact_mut(8).zip(profile.channel_order()) {
        let byte = color[channel];
        for (bit, code) in codes.iter_mut().enumerate() {
            *code = if byte & (0x80 >> bit) != 0 { one } else { zero };
        }
    }
}

/// Inverse of [`encode`]. Returns `None` if `codes` has the wrong length or
/// holds a code that is neither the profile's zero nor one pulse.
pub fn decode(codes: &[PulseCode], profile: &ChipProfile) -> Option<Color> {
    if codes.len() != profile.codes_per_led() {
        return None;
    }
    let mut color = Color::OFF;
    for (bits, &channel) in codes.chunks_exact(8).zip(profile.channel_order()) {
        let mut byte = 0_u8;
        for code in bits {
            byte <<= 1;
            match *code {
                c if c == profile.one() => byte |= 1,
                c if c == profile.zero() => {}
                _ => return None,
            }
        }
        color.set_channel(channel, byte);
    }
    Some(color)
}

/// Decodes a whole frame buffer, one color per LED.
pub fn decode_frame(codes: &[PulseCode], profile: &ChipProfile) -> Option<Vec<Color>> {
    let per_led = profile.codes_per_led();
    if codes.len() % per_led != 0 {
        return None;
    }
    codes
        .chunks_exact(per_led)
        .map(|led| decode(led, profile))
        .collect()
}
