//! G.711 companded bytes expanded to linear 16-bit samples.

/// Expand one A-law byte.
pub(super) fn expand_alaw(byte: u8) -> i16 {
    let a = byte ^ 0x55;
    let segment = (a & 0x70) >> 4;
    let mut linear = i32::from(a & 0x0F) << 4;
    linear += if segment == 0 { 8 } else { 0x108 };
    if segment > 1 {
        linear <<= segment - 1;
    }
    // Sign bit set means positive in A-law.
    let linear = if a & 0x80 != 0 { linear } else { -linear };
    linear as i16
}

/// Expand one µ-law byte.
pub(super) fn expand_mulaw(byte: u8) -> i16 {
    let u = !byte;
    let exponent = (u & 0x70) >> 4;
    let magnitude = ((i32::from(u & 0x0F) << 3) + 0x84) << exponent;
    let linear = if u & 0x80 != 0 {
        0x84 - magnitude
    } else {
        magnitude - 0x84
    };
    linear as i16
}
