//! Tests for instrument parameter transform

use super::*;
use crate::error::InputErrorKind;
use crate::quantize::{f2i, i2f};

/// A plain instrument: no quantization, finite decay, short release
fn base_params() -> InstrumentParams {
    InstrumentParams {
        seed: 0.03,
        modes: 0.4,
        fat: 0.02,
        width: 0.5,
        overtones: 0.1,
        sharpness: 0.8,
        harmonicity: 1.0,
        decaylow: 0.5,
        decayhigh: 0.5,
        filterlow: 0.0,
        fslopelow: 1.0,
        fsweeplow: 0.5,
        filterhigh: 1.0,
        fslopehigh: 1.0,
        fsweephigh: 0.5,
        gain: 0.25,
        attack: 0.0,
        release: 0.0,
        ..Default::default()
    }
}

fn instrument(params: InstrumentParams) -> Instrument {
    Instrument::from_params(1, "Lead", params)
}

#[test]
fn test_title_is_hex_slot() {
    let instr = Instrument::from_params(26, "Bells", InstrumentParams::default());
    assert_eq!(instr.title(), "1A|Bells");
}

#[test]
fn test_param_block_layout() {
    let mut instr = instrument(base_params());
    instr.build_param_block(false).unwrap();
    let block = &instr.paramblock;

    assert_eq!(block.len(), 20);
    assert_eq!(block[0], ParamValue::Int(40));
    assert_eq!(block[1], ParamValue::Int(2));
    assert_eq!(block[2], ParamValue::Int(3));
    assert_eq!(block[3], ParamValue::Int(10));
    assert_eq!(block[4], ParamValue::Float(0.0));
    assert_eq!(block[5], ParamValue::Float(0.5));
    assert_eq!(block[6], ParamValue::Float(1.0));
    assert_eq!(block[7], ParamValue::Float(0.0));
    assert_eq!(block[9], ParamValue::Float(-120.0));
    assert_eq!(block[10], ParamValue::Float(120.0));
    assert_eq!(block[11], ParamValue::Float(0.0));
    assert_eq!(block[13], ParamValue::Float(0.0));
    assert_eq!(block[15], ParamValue::Float(1.0));
    assert_eq!(block[PARAMBLOCK_MAXSAMPLES], ParamValue::Int(instr.maxsamples));
    assert_eq!(block[17], ParamValue::Float(-2.0));
    assert_eq!(block[18], ParamValue::Float(2.0));
    assert_eq!(block[19], ParamValue::Float(128.0 * 128.0));
}

#[test]
fn test_modes_and_fat_floor_at_one() {
    let mut instr = instrument(InstrumentParams {
        modes: 0.0,
        fat: 0.001,
        ..base_params()
    });
    instr.build_param_block(false).unwrap();
    assert_eq!(instr.paramblock[0], ParamValue::Int(1));
    assert_eq!(instr.paramblock[1], ParamValue::Int(1));
}

#[test]
fn test_pan_only_when_song_is_panned() {
    let mut instr = instrument(base_params());
    instr.volume = crate::Volume::new(0.5, 1.5);
    instr.build_param_block(true).unwrap();
    assert_eq!(instr.paramblock.len(), 21);
    // Average gain 1.0, right channel 50% louder
    assert_eq!(instr.paramblock[19], ParamValue::Float(128.0 * 128.0));
    assert_eq!(instr.paramblock[20], ParamValue::Float(0.5));
}

#[test]
fn test_quantization_levels_apply_per_field() {
    let mut instr = instrument(InstrumentParams {
        harmonicity: 0.123,
        q_harmonicity: 1.0,
        sharpness: 0.9,
        q_sharpness: 0.0,
        ..base_params()
    });
    instr.build_param_block(false).unwrap();
    assert_eq!(instr.paramblock[6], ParamValue::Float(0.0));
    let sharpness = (0.9f64 * 5.0 - 4.0) as f32;
    assert_eq!(instr.paramblock[7], ParamValue::Float(sharpness));
}

#[test]
fn test_knob_levels_select_bit_in_double_precision() {
    // 3/31 picks bit 3; narrowed to f32 first it would pick bit 2
    let mut instr = instrument(InstrumentParams {
        decaylow: f64::from(i2f(0x3F00_0005)),
        decayhigh: f64::from(i2f(0x3F00_0005)),
        q_decaylow: 3.0 / 31.0,
        ..base_params()
    });
    instr.build_param_block(false).unwrap();
    let ParamValue::Float(decaylow) = instr.paramblock[5] else {
        panic!("decaylow should be a float");
    };
    assert_eq!(f2i(decaylow), 0x3F00_0008);
}

#[test]
fn test_decay_only_duration() {
    // Release quantized away entirely: only the decay bounds the tail
    let mut instr = instrument(InstrumentParams {
        q_release: 1.0,
        ..base_params()
    });
    instr.maxtime = 1000.0;
    instr.build_param_block(false).unwrap();

    let decaytime = 0.01f64.ln() / 0.5f64.ln() * 4096.0;
    let expected = ((decaytime + 65535.0) as i64) & -65536;
    assert_eq!(instr.maxsamples, expected);
    assert_eq!(instr.maxsamples, 65536);
    assert_eq!(instr.paramblock[17], ParamValue::Float(0.0));
}

#[test]
fn test_release_bounds_sustained_instrument() {
    let mut instr = instrument(InstrumentParams {
        decaylow: 1.0,
        decayhigh: 1.0,
        release: 0.5,
        ..base_params()
    });
    instr.maxtime = 2.0;
    instr.build_param_block(false).unwrap();
    // 2 seconds of note plus 0.5 seconds of release
    assert_eq!(instr.maxsamples, 131072);
}

#[test]
fn test_infinite_duration_rejected() {
    let mut instr = instrument(InstrumentParams {
        decaylow: 1.0,
        decayhigh: 1.0,
        q_release: 1.0,
        ..base_params()
    });
    let err = instr.build_param_block(false).unwrap_err();
    assert_eq!(
        err.kind,
        InputErrorKind::InfiniteDuration("01|Lead".to_string())
    );
}

#[test]
fn test_velocity_quantum() {
    assert_eq!(velocity_quantum(&[127]), 128);
    assert_eq!(velocity_quantum(&[]), 128);
    assert_eq!(velocity_quantum(&[64, 127]), 64);
    assert_eq!(velocity_quantum(&[32, 96]), 32);
    assert_eq!(velocity_quantum(&[48, 127]), 16);
    assert_eq!(velocity_quantum(&[1, 64]), 1);
}

#[test]
fn test_param_value_display() {
    assert_eq!(ParamValue::Int(-3).to_string(), "-3");
    assert_eq!(ParamValue::Float(1.0).to_string(), "0x3F800000");
    assert_eq!(f2i(-2.0), 0xC000_0000);
    assert_eq!(ParamValue::Float(-2.0).to_string(), "0xC0000000");
}

#[test]
fn test_burden() {
    let mut instr = instrument(base_params());
    instr.tones = vec![36, 48];
    instr.maxtime = 1.0;
    instr.build_param_block(false).unwrap();
    assert_eq!(instr.maxsamples, 65536);
    let expected = 40.0 * 2.0 * 2.0 * (instr.maxsamples as f64 / crate::SAMPLERATE);
    assert_eq!(instr.burden(), expected);
    assert_eq!(instr.velocity_bits(), 0);
}
