//! Oidos instruments
//!
//! An [`Instrument`] starts out as the knob vector of one synthesizer slot.
//! While the song is aggregated ([`crate::Music`]) it accumulates the tones,
//! velocities and volume of the tracks that play it, and finally the
//! quantized parameter block that is exported for the engine.

mod params;
mod transform;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use core::fmt;
use hashbrown::HashMap;

use crate::error::Result;
use crate::volume::Volume;

pub use params::{
    INSTRUMENT_PARAM_COUNT, INSTRUMENT_PARAM_NAMES, InstrumentParams, LEGACY_PLUGIN_ID,
    ParamLayout,
};
pub use transform::velocity_quantum;

/// Index of the decay tail length in the parameter block
pub const PARAMBLOCK_MAXSAMPLES: usize = 16;

/// One exported parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f32),
}

impl ParamValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => f64::from(v),
        }
    }
}

impl fmt::Display for ParamValue {
    /// Integers in decimal, floats as their exact bit pattern
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "0x{:08X}", v.to_bits()),
        }
    }
}

/// A synthesizer instrument slot and everything derived from its use
#[derive(Debug, Clone)]
pub struct Instrument {
    /// Slot index in the source song
    pub number: usize,
    pub name: String,
    pub params: InstrumentParams,
    /// Instrument gain, later multiplied by the effective track volume
    pub volume: Volume,

    /// Number of note columns playing this instrument
    pub columns: usize,
    /// Latest note start among those columns, in ticks
    pub latest_note: usize,
    /// Longest note duration in seconds
    pub maxtime: f64,
    /// Decay tail length in samples, rounded up to 65536
    pub maxsamples: i64,
    /// Sample position after which the instrument is silent
    pub end_of_sound: f64,

    pub tones: Vec<i32>,
    pub tone_index: HashMap<i32, usize>,
    pub tone_counts: BTreeMap<i32, usize>,
    pub velocities: Vec<u8>,
    pub velocity_counts: BTreeMap<u8, usize>,
    pub velocity_quantum: u32,

    pub paramblock: Vec<ParamValue>,
}

impl Instrument {
    /// Create an instrument from a stored parameter vector
    pub fn new(number: usize, name: &str, values: &[f64], layout: ParamLayout) -> Result<Self> {
        let title = format_title(number, name);
        let params = InstrumentParams::from_slice(values, layout, &title)?;
        Ok(Self::from_params(number, name, params))
    }

    pub fn from_params(number: usize, name: &str, params: InstrumentParams) -> Self {
        Self {
            number,
            name: name.to_string(),
            params,
            volume: Volume::UNITY,
            columns: 0,
            latest_note: 0,
            maxtime: 0.0,
            maxsamples: 0,
            end_of_sound: 0.0,
            tones: Vec::new(),
            tone_index: HashMap::new(),
            tone_counts: BTreeMap::new(),
            velocities: Vec::new(),
            velocity_counts: BTreeMap::new(),
            velocity_quantum: 128,
            paramblock: Vec::new(),
        }
    }

    /// `"NN|name"` with the slot number in hex
    pub fn title(&self) -> String {
        format_title(self.number, &self.name)
    }

    /// Rough rendering cost: modes × fat × tones × longest tail in seconds
    pub fn burden(&self) -> f64 {
        let modes = self.paramblock.first().map(ParamValue::as_f64).unwrap_or(0.0);
        let fat = self.paramblock.get(1).map(ParamValue::as_f64).unwrap_or(0.0);
        modes * fat * self.tones.len() as f64 * self.longest_seconds()
    }

    /// Decay tail length in seconds
    pub fn longest_seconds(&self) -> f64 {
        self.paramblock
            .get(PARAMBLOCK_MAXSAMPLES)
            .map(ParamValue::as_f64)
            .unwrap_or(0.0)
            / crate::SAMPLERATE
    }

    /// Number of bits the quantized velocities occupy
    pub fn velocity_bits(&self) -> u32 {
        (128 / self.velocity_quantum.max(1)).trailing_zeros()
    }
}

fn format_title(number: usize, name: &str) -> String {
    format!("{:02X}|{}", number, name)
}
