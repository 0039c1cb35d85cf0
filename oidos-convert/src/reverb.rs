//! The song-wide reverb effect
//!
//! At most one reverb exists per song. Its raw knobs are turned into engine
//! constants once, at construction.

use crate::SAMPLERATE;
use crate::quantize::quantize_knob;

/// Number of knobs in the reverb plugin
pub const REVERB_PARAM_COUNT: usize = 20;

/// Knob names in plugin order (documentation only)
pub const REVERB_PARAM_NAMES: [&str; REVERB_PARAM_COUNT] = [
    "mix",
    "pan",
    "delaymin",
    "delaymax",
    "delayadd",
    "halftime",
    "filterlow",
    "filterhigh",
    "dampenlow",
    "dampenhigh",
    "n",
    "seed",
    "dummy1",
    "dummy2",
    "dummy3",
    "q_mixpan",
    "q_flow",
    "q_fhigh",
    "q_dlow",
    "q_dhigh",
];

/// Plugin identifiers accepted as the reverb device
pub const REVERB_PLUGIN_IDS: [&str; 2] = ["MetaEffect", "OidosReverb"];

/// Raw reverb knobs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReverbParams {
    pub mix: f64,
    pub pan: f64,
    pub delaymin: f64,
    pub delaymax: f64,
    pub delayadd: f64,
    pub halftime: f64,
    pub filterlow: f64,
    pub filterhigh: f64,
    pub dampenlow: f64,
    pub dampenhigh: f64,
    pub n: f64,
    pub seed: f64,
    pub dummy1: f64,
    pub dummy2: f64,
    pub dummy3: f64,
    pub q_mixpan: f64,
    pub q_flow: f64,
    pub q_fhigh: f64,
    pub q_dlow: f64,
    pub q_dhigh: f64,
}

impl ReverbParams {
    /// Populate positionally; missing knobs read as zero, extras are dropped
    pub fn from_slice(values: &[f64]) -> Self {
        let mut v = [0.0f64; REVERB_PARAM_COUNT];
        for (dst, src) in v.iter_mut().zip(values) {
            *dst = *src;
        }
        let [
            mix,
            pan,
            delaymin,
            delaymax,
            delayadd,
            halftime,
            filterlow,
            filterhigh,
            dampenlow,
            dampenhigh,
            n,
            seed,
            dummy1,
            dummy2,
            dummy3,
            q_mixpan,
            q_flow,
            q_fhigh,
            q_dlow,
            q_dhigh,
        ] = v;
        Self {
            mix,
            pan,
            delaymin,
            delaymax,
            delayadd,
            halftime,
            filterlow,
            filterhigh,
            dampenlow,
            dampenhigh,
            n,
            seed,
            dummy1,
            dummy2,
            dummy3,
            q_mixpan,
            q_flow,
            q_fhigh,
            q_dlow,
            q_dhigh,
        }
    }
}

/// Reverb with its precomputed engine constants
#[derive(Debug, Clone)]
pub struct Reverb {
    pub params: ReverbParams,

    /// Delay bounds in samples, on a 256-sample grid
    pub min_delay: i64,
    pub max_delay: i64,
    pub add_delay: i64,
    pub filter_low: f32,
    pub filter_high: f32,
    pub dampen_low: f32,
    pub dampen_high: f32,
    pub num_delays: i64,
    pub random_seed: i64,
    /// Per-sample decay multiplier
    pub decay_mul: f64,
    pub max_decay: f64,
    /// Output gain per channel (left, right)
    pub volumes: [f32; 2],
}

fn round_knob(x: f64) -> i64 {
    (x * 100.0 + 0.5).floor() as i64
}

fn coefficient(x: f64, level: f64) -> f32 {
    quantize_knob(x.powf(2.0) as f32, level).min(1.0)
}

impl Reverb {
    pub fn new(params: ReverbParams) -> Self {
        let p = &params;
        let min_delay = round_knob(p.delaymin) * 256;
        let max_delay = round_knob(p.delaymax) * 256;
        let add_delay = round_knob(p.delayadd) * 256;
        let num_delays = round_knob(p.n) * 2;
        let random_seed = round_knob(p.seed) * 2048;
        let decay_mul = 2f64.powf(1.0 / (p.halftime * SAMPLERATE));
        let max_decay = decay_mul.powf(-(max_delay as f64));

        let mix = p.mix * 10.0 / (num_delays as f64).sqrt();
        let volumes = [1.0f64, -1.0].map(|s| {
            quantize_knob(
                (mix * (1.0 + s - 2.0 * s * p.pan).sqrt()) as f32,
                p.q_mixpan,
            )
        });
        let filter_low = coefficient(p.filterlow, p.q_flow);
        let filter_high = coefficient(p.filterhigh, p.q_fhigh);
        let dampen_low = coefficient(p.dampenlow, p.q_dlow);
        let dampen_high = coefficient(p.dampenhigh, p.q_dhigh);

        Self {
            min_delay,
            max_delay,
            add_delay,
            filter_low,
            filter_high,
            dampen_low,
            dampen_high,
            num_delays,
            random_seed,
            decay_mul,
            max_decay,
            volumes,
            params,
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self::new(ReverbParams::from_slice(values))
    }
}

impl PartialEq for Reverb {
    /// Two reverbs are the same effect when all raw knobs match
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}
