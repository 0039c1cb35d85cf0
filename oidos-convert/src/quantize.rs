//! Mantissa quantization of exported floats
//!
//! Every computed parameter is stored with a reduced number of significant
//! bits so the compressor that packs the intro sees fewer distinct values.

/// Fixed quantization level for instrument output volume
pub const VOLUME_QUANTIZATION: f32 = 0.65;

/// Fixed quantization level for instrument output panning
pub const PAN_QUANTIZATION: f32 = 0.55;

const NEGATIVE_ZERO: u32 = 0x8000_0000;

/// Bit pattern of a float
#[inline]
pub fn f2i(value: f32) -> u32 {
    value.to_bits()
}

/// Float from a bit pattern
#[inline]
pub fn i2f(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Round `value` to the bit position selected by `level`
///
/// `level` in `0..=1` selects bit `floor(level * 31)` of the IEEE-754
/// representation: 0 keeps the value intact, 1 rounds everything through
/// the sign bit (yielding `+0.0`). Rounding is to nearest at that bit,
/// with the carry propagating into the exponent as needed. Negative zero
/// is normalized to positive zero.
///
/// Non-finite inputs produce unspecified (but non-panicking) results.
pub fn quantize(value: f32, level: f32) -> f32 {
    quantize_knob(value, f64::from(level))
}

/// [`quantize`] with the bit selected from a double-precision knob level
///
/// Song knobs are stored as doubles; narrowing them to `f32` first can
/// land `level * 31` just below an integer and pick the next lower bit.
pub fn quantize_knob(value: f32, level: f64) -> f32 {
    let shift = (level * 31.0).floor().clamp(0.0, 31.0) as u32;
    let bit = 1u32 << shift;
    let mask = bit.wrapping_neg();
    let add = bit >> 1;

    let mut bits = f2i(value).wrapping_add(add) & mask;
    if bits == NEGATIVE_ZERO {
        bits = 0;
    }
    i2f(bits)
}
