//! Knob-space to engine-space parameter transform

use crate::error::{InputError, InputErrorKind, Result};
use crate::quantize::{PAN_QUANTIZATION, VOLUME_QUANTIZATION, quantize, quantize_knob};
use crate::{SAMPLERATE, TOTAL_SEMITONES};

use super::{Instrument, ParamValue};

/// Velocity reserved for "full velocity"; exempt from the quantum search
pub const FULL_VELOCITY: u8 = 127;

/// Largest power of two (at most 128) dividing every velocity except 127
pub fn velocity_quantum(velocities: &[u8]) -> u32 {
    let mut quantum = 128u32;
    while quantum > 1 {
        if velocities
            .iter()
            .all(|&v| v == FULL_VELOCITY || u32::from(v) % quantum == 0)
        {
            break;
        }
        quantum /= 2;
    }
    quantum
}

/// Round to nearest, halves up
fn round_knob(x: f64) -> i64 {
    (0.5 + x * 100.0).floor() as i64
}

fn q(value: f64, level: f64) -> f32 {
    quantize_knob(value as f32, level)
}

impl Instrument {
    /// Compute the exported parameter block
    ///
    /// Requires `maxtime`, `volume` and `velocity_quantum` to be set. Also
    /// sets `maxsamples`. Pan is appended only when some instrument in the
    /// song is panned.
    pub fn build_param_block(&mut self, uses_panning: bool) -> Result<()> {
        let p = &self.params;

        let modes = round_knob(p.modes).max(1);
        let fat = round_knob(p.fat).max(1);
        let seed = round_knob(p.seed);
        let overtones = round_knob(p.overtones);

        let decaydiff = p.decayhigh - p.decaylow;
        let decaylow = p.decaylow;
        let harmonicity = p.harmonicity * 2.0 - 1.0;
        let sharpness = p.sharpness * 5.0 - 4.0;
        let width = 100.0 * p.width.powf(5.0);

        let fsweeplow = -(p.fsweeplow - 0.5).powf(3.0) * 100.0 * TOTAL_SEMITONES / SAMPLERATE;
        let fsweephigh = -(p.fsweephigh - 0.5).powf(3.0) * 100.0 * TOTAL_SEMITONES / SAMPLERATE;
        let fslopelow = (1.0 - p.fslopelow).powf(3.0);
        let fslopehigh = -(1.0 - p.fslopehigh).powf(3.0);
        let filterlow = (p.filterlow * 2.0 - 1.0) * TOTAL_SEMITONES;
        let filterhigh = (p.filterhigh * 2.0 - 1.0) * TOTAL_SEMITONES;

        let gain = 4096f64.powf(p.gain - 0.25);
        // Zero means "hold forever"; the engine takes 2.0 as that sentinel
        let attack = if p.attack == 0.0 {
            2.0
        } else {
            1.0 / (p.attack * p.attack) / SAMPLERATE
        };
        let release = -(if p.release == 0.0 {
            2.0
        } else {
            1.0 / p.release / SAMPLERATE
        });

        let decaydiff = q(decaydiff, p.q_decaydiff);
        let decaylow = q(decaylow, p.q_decaylow);
        let harmonicity = q(harmonicity, p.q_harmonicity);
        let sharpness = q(sharpness, p.q_sharpness);
        let width = q(width, p.q_width);
        let filterlow = q(filterlow, p.q_f_low);
        let fslopelow = q(fslopelow, p.q_fs_low);
        let fsweeplow = q(fsweeplow, p.q_fsw_low);
        let filterhigh = q(filterhigh, p.q_f_high);
        let fslopehigh = q(fslopehigh, p.q_fs_high);
        let fsweephigh = q(fsweephigh, p.q_fsw_high);
        let gain = q(gain, p.q_gain);
        let attack = q(attack, p.q_attack);
        let release = q(release, p.q_release);

        self.maxsamples = self.tail_samples(decaylow, decaydiff, release)?;

        let left_volume = self.volume.left * f64::from(self.velocity_quantum) * 128.0;
        let right_volume = self.volume.right * f64::from(self.velocity_quantum) * 128.0;
        let volume = (left_volume + right_volume) / 2.0;
        let pan = if volume == 0.0 {
            0.0
        } else {
            right_volume / volume - 1.0
        };
        let volume = quantize(volume as f32, VOLUME_QUANTIZATION);
        let pan = quantize(pan as f32, PAN_QUANTIZATION);

        let mut block = vec![
            ParamValue::Int(modes),
            ParamValue::Int(fat),
            ParamValue::Int(seed),
            ParamValue::Int(overtones),
            ParamValue::Float(decaydiff),
            ParamValue::Float(decaylow),
            ParamValue::Float(harmonicity),
            ParamValue::Float(sharpness),
            ParamValue::Float(width),
            ParamValue::Float(filterlow),
            ParamValue::Float(filterhigh),
            ParamValue::Float(fslopelow),
            ParamValue::Float(fslopehigh),
            ParamValue::Float(fsweeplow),
            ParamValue::Float(fsweephigh),
            ParamValue::Float(gain),
            ParamValue::Int(self.maxsamples),
            ParamValue::Float(release),
            ParamValue::Float(attack),
            ParamValue::Float(volume),
        ];
        if uses_panning {
            block.push(ParamValue::Float(pan));
        }

        tracing::debug!(
            instrument = %self.title(),
            maxsamples = self.maxsamples,
            quantum = self.velocity_quantum,
            "built parameter block"
        );

        self.paramblock = block;
        Ok(())
    }

    /// Samples until the longest note has faded, rounded up to 65536
    ///
    /// The tail ends at whichever comes first: the modal decay reaching
    /// 1%, or the longest note plus its release. An instrument with
    /// neither is rejected.
    fn tail_samples(&self, decaylow: f32, decaydiff: f32, release: f32) -> Result<i64> {
        let decaylow = f64::from(decaylow);
        let maxdecay = decaylow.max(decaylow + f64::from(decaydiff));
        let release = f64::from(release);

        let releasetime = if release != 0.0 {
            self.maxtime * SAMPLERATE + 1.0 / -release
        } else {
            f64::INFINITY
        };
        let decaytime = if maxdecay <= 0.0 {
            0.0
        } else if maxdecay < 1.0 {
            0.01f64.ln() / maxdecay.ln() * 4096.0
        } else {
            f64::INFINITY
        };

        if releasetime.is_infinite() && decaytime.is_infinite() {
            return Err(InputError::global(InputErrorKind::InfiniteDuration(
                self.title(),
            )));
        }

        Ok(((releasetime.min(decaytime) + 65535.0) as i64) & -65536)
    }
}
