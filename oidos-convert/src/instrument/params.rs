//! Instrument knob vector and its source layouts

use crate::error::{InputError, InputErrorKind, Result};

/// Number of knobs in the current synthesizer parameter layout
pub const INSTRUMENT_PARAM_COUNT: usize = 33;

/// Knob names in engine order
///
/// Only used for documentation and diagnostics; field identity comes from
/// [`InstrumentParams`].
pub const INSTRUMENT_PARAM_NAMES: [&str; INSTRUMENT_PARAM_COUNT] = [
    "seed",
    "modes",
    "fat",
    "width",
    "overtones",
    "sharpness",
    "harmonicity",
    "decaylow",
    "decayhigh",
    "filterlow",
    "fslopelow",
    "fsweeplow",
    "filterhigh",
    "fslopehigh",
    "fsweephigh",
    "gain",
    "attack",
    "release",
    "dummy",
    "q_decaydiff",
    "q_decaylow",
    "q_harmonicity",
    "q_sharpness",
    "q_width",
    "q_f_low",
    "q_fs_low",
    "q_fsw_low",
    "q_f_high",
    "q_fs_high",
    "q_fsw_high",
    "q_gain",
    "q_attack",
    "q_release",
];

/// Plugin identifier of the synthesizer version with a single filter sweep
pub const LEGACY_PLUGIN_ID: &str = "MetaSynth";

/// Shape of the flat parameter vector stored in the song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamLayout {
    /// Separate low/high filter sweeps with their own quantization knobs
    #[default]
    Current,
    /// One shared filter sweep, used for both bands
    Legacy,
}

impl ParamLayout {
    pub fn from_plugin_identifier(identifier: &str) -> Self {
        if identifier == LEGACY_PLUGIN_ID {
            ParamLayout::Legacy
        } else {
            ParamLayout::Current
        }
    }

    /// Map a stored vector onto the current layout
    ///
    /// The legacy layout keeps its shared sweep at index 13 and its shared
    /// sweep quantization at index 29. Both are duplicated into the low
    /// band slots, and the dummy slot is cleared.
    pub fn to_current(self, params: &[f64]) -> Vec<f64> {
        match self {
            ParamLayout::Current => params.to_vec(),
            ParamLayout::Legacy => {
                if params.len() < INSTRUMENT_PARAM_COUNT {
                    return params.to_vec();
                }
                let mut out = Vec::with_capacity(INSTRUMENT_PARAM_COUNT);
                out.extend_from_slice(&params[..11]);
                out.push(params[13]);
                out.extend_from_slice(&params[11..17]);
                out.push(0.0);
                out.extend_from_slice(&params[20..27]);
                out.push(params[29]);
                out.extend_from_slice(&params[27..33]);
                out
            }
        }
    }
}

/// Normalized (`0..1`) knob values of one instrument, in engine order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InstrumentParams {
    pub seed: f64,
    pub modes: f64,
    pub fat: f64,
    pub width: f64,
    pub overtones: f64,
    pub sharpness: f64,
    pub harmonicity: f64,
    pub decaylow: f64,
    pub decayhigh: f64,
    pub filterlow: f64,
    pub fslopelow: f64,
    pub fsweeplow: f64,
    pub filterhigh: f64,
    pub fslopehigh: f64,
    pub fsweephigh: f64,
    pub gain: f64,
    pub attack: f64,
    pub release: f64,
    pub dummy: f64,
    pub q_decaydiff: f64,
    pub q_decaylow: f64,
    pub q_harmonicity: f64,
    pub q_sharpness: f64,
    pub q_width: f64,
    pub q_f_low: f64,
    pub q_fs_low: f64,
    pub q_fsw_low: f64,
    pub q_f_high: f64,
    pub q_fs_high: f64,
    pub q_fsw_high: f64,
    pub q_gain: f64,
    pub q_attack: f64,
    pub q_release: f64,
}

impl InstrumentParams {
    /// Populate from a stored vector in the given layout
    ///
    /// `title` is only used in the error for a short vector.
    pub fn from_slice(values: &[f64], layout: ParamLayout, title: &str) -> Result<Self> {
        let values = layout.to_current(values);
        let head: [f64; INSTRUMENT_PARAM_COUNT] = match values
            .get(..INSTRUMENT_PARAM_COUNT)
            .and_then(|head| head.try_into().ok())
        {
            Some(head) => head,
            None => {
                return Err(InputError::global(InputErrorKind::MissingParameters {
                    name: title.to_string(),
                    expected: INSTRUMENT_PARAM_COUNT,
                    found: values.len(),
                }));
            }
        };
        let [
            seed,
            modes,
            fat,
            width,
            overtones,
            sharpness,
            harmonicity,
            decaylow,
            decayhigh,
            filterlow,
            fslopelow,
            fsweeplow,
            filterhigh,
            fslopehigh,
            fsweephigh,
            gain,
            attack,
            release,
            dummy,
            q_decaydiff,
            q_decaylow,
            q_harmonicity,
            q_sharpness,
            q_width,
            q_f_low,
            q_fs_low,
            q_fsw_low,
            q_f_high,
            q_fs_high,
            q_fsw_high,
            q_gain,
            q_attack,
            q_release,
        ] = head;

        Ok(Self {
            seed,
            modes,
            fat,
            width,
            overtones,
            sharpness,
            harmonicity,
            decaylow,
            decayhigh,
            filterlow,
            fslopelow,
            fsweeplow,
            filterhigh,
            fslopehigh,
            fsweephigh,
            gain,
            attack,
            release,
            dummy,
            q_decaydiff,
            q_decaylow,
            q_harmonicity,
            q_sharpness,
            q_width,
            q_f_low,
            q_fs_low,
            q_fsw_low,
            q_f_high,
            q_fs_high,
            q_fsw_high,
            q_gain,
            q_attack,
            q_release,
        })
    }
}
