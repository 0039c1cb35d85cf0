//! Song-wide aggregation
//!
//! [`Music::new`] ties validated tracks to their instruments, checks the
//! constraints that span several tracks, and derives everything the
//! exporter needs: instrument order, velocity quanta, tone sets, quantized
//! parameter blocks and buffer sizes.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};

use crate::SAMPLERATE;
use crate::error::{InputError, InputErrorKind, Location, Result};
use crate::instrument::{Instrument, velocity_quantum};
use crate::reverb::Reverb;
use crate::track::Track;
use crate::volume::Volume;

/// Everything the song reader hands over
#[derive(Debug, Clone)]
pub struct MusicInput {
    /// Reverb-bearing tracks first, then dry tracks
    pub tracks: Vec<Track>,
    /// Instrument slots; `None` for empty slots
    pub instruments: Vec<Option<Instrument>>,
    /// Song length in ticks
    pub length: usize,
    /// Seconds per tick
    pub ticklength: f64,
    pub n_reverb_tracks: usize,
    pub reverb: Option<Reverb>,
    pub master_volume: Volume,
}

/// A fully validated song, ready for export
#[derive(Debug, Clone)]
pub struct Music {
    pub tracks: Vec<Track>,
    /// Used instruments, reverb-bearing ones first
    pub instruments: Vec<Instrument>,
    pub length: usize,
    pub ticklength: f64,
    pub n_reverb_tracks: usize,
    pub n_reverb_instruments: usize,
    pub reverb: Option<Reverb>,
    pub master_volume: Volume,

    /// Track indices grouped by instrument, in instrument order
    pub track_order: Vec<usize>,
    /// Some instrument has an asymmetric stereo volume
    pub uses_panning: bool,
    pub max_maxsamples: i64,
    pub max_total_samples: i64,
    /// Sample position at which the last instrument (and reverb) is silent
    pub end_of_sound: f64,

    instrument_index: HashMap<usize, usize>,
}

impl Music {
    pub fn new(input: MusicInput) -> Result<Self> {
        let MusicInput {
            tracks,
            instruments: slots,
            length,
            ticklength,
            n_reverb_tracks,
            reverb,
            master_volume,
        } = input;

        let n_reverb_tracks = n_reverb_tracks.min(tracks.len());
        let (reverb_tracks, dry_tracks) = tracks.split_at(n_reverb_tracks);
        let with_reverb: HashSet<usize> =
            reverb_tracks.iter().filter_map(|t| t.instrument).collect();
        let without_reverb: HashSet<usize> =
            dry_tracks.iter().filter_map(|t| t.instrument).collect();

        for track in &tracks {
            if let Some(number) = track.instrument
                && !matches!(slots.get(number), Some(Some(_)))
            {
                return Err(InputError::new(
                    Location::track(&track.title()),
                    InputErrorKind::UndefinedInstrument(Some(number)),
                ));
            }
        }

        // Reverb-bearing instruments first
        let mut wet = Vec::new();
        let mut dry = Vec::new();
        for instr in slots.into_iter().flatten() {
            let number = instr.number;
            if with_reverb.contains(&number) {
                if without_reverb.contains(&number) {
                    return Err(InputError::global(InputErrorKind::MixedReverbUsage(
                        instr.title(),
                    )));
                }
                wet.push(instr);
            } else if without_reverb.contains(&number) {
                dry.push(instr);
            }
        }
        let n_reverb_instruments = wet.len();
        let mut instruments = wet;
        instruments.extend(dry);

        // Track order, volumes and velocities
        let mut track_order = Vec::new();
        let mut uses_panning = false;
        for instr in &mut instruments {
            let mut velocities = Vec::new();
            let mut volume: Option<Volume> = None;
            for (ti, track) in tracks.iter().enumerate() {
                if track.instrument != Some(instr.number) {
                    continue;
                }
                track_order.push(ti);
                instr.columns += 1;
                instr.latest_note = instr.latest_note.max(track.latest_note);

                let v = track.volume * master_volume;
                if volume.is_some_and(|prev| prev != v) {
                    return Err(InputError::new(
                        Location::track(&track.title()),
                        InputErrorKind::VolumeMismatch,
                    ));
                }
                volume = Some(v);
                velocities.extend(track.tavs.iter().map(|&(_, velocity)| velocity));
            }
            if let Some(volume) = volume {
                instr.volume *= volume;
            }
            velocities.sort_unstable();
            velocities.dedup();
            instr.velocity_quantum = velocity_quantum(&velocities);
            instr.velocities = velocities;
            uses_panning |= instr.volume.is_panned();
        }

        // Tones, parameter blocks and buffer sizes
        let mut max_maxsamples = 0;
        let mut max_total_samples = 0;
        let mut end_of_sound: f64 = 0.0;
        for instr in &mut instruments {
            let mut tone_counts = BTreeMap::new();
            let mut velocity_counts = BTreeMap::new();
            let mut maxtime: f64 = 0.0;
            for track in tracks
                .iter()
                .filter(|t| t.instrument == Some(instr.number))
            {
                maxtime = maxtime.max(track.max_length as f64 * ticklength);
                for note in &track.notes {
                    if let (Some(tone), Some(velocity)) = (note.tone(), note.velocity()) {
                        *tone_counts.entry(tone).or_insert(0) += 1;
                        *velocity_counts.entry(velocity).or_insert(0) += 1;
                    }
                }
            }
            instr.maxtime = maxtime;
            instr.tones = tone_counts.keys().copied().collect();
            instr.tone_index = instr
                .tones
                .iter()
                .enumerate()
                .map(|(i, &tone)| (tone, i))
                .collect();
            instr.tone_counts = tone_counts;
            instr.velocity_counts = velocity_counts;

            instr.build_param_block(uses_panning)?;

            instr.end_of_sound =
                instr.latest_note as f64 * ticklength * SAMPLERATE + instr.maxsamples as f64;
            if with_reverb.contains(&instr.number)
                && let Some(reverb) = &reverb
            {
                instr.end_of_sound += reverb.params.halftime * 10.0 * SAMPLERATE;
            }

            max_maxsamples = max_maxsamples.max(instr.maxsamples);
            max_total_samples = max_total_samples.max(instr.maxsamples * instr.tones.len() as i64);
            end_of_sound = end_of_sound.max(instr.end_of_sound);
        }

        let instrument_index = instruments
            .iter()
            .enumerate()
            .map(|(i, instr)| (instr.number, i))
            .collect();

        tracing::debug!(
            instruments = instruments.len(),
            reverb_instruments = n_reverb_instruments,
            tracks = tracks.len(),
            uses_panning,
            "aggregated music"
        );

        Ok(Self {
            tracks,
            instruments,
            length,
            ticklength,
            n_reverb_tracks,
            n_reverb_instruments,
            reverb,
            master_volume,
            track_order,
            uses_panning,
            max_maxsamples,
            max_total_samples,
            end_of_sound,
            instrument_index,
        })
    }

    /// Instrument by source slot number
    pub fn instrument(&self, number: usize) -> Option<&Instrument> {
        self.instrument_index
            .get(&number)
            .map(|&i| &self.instruments[i])
    }

    /// Tracks in export order
    pub fn ordered_tracks(&self) -> impl Iterator<Item = &Track> {
        self.track_order.iter().map(|&ti| &self.tracks[ti])
    }

    pub fn samples_per_tick(&self) -> i64 {
        (self.ticklength * SAMPLERATE) as i64
    }

    /// Song length or the end of the last tail, whichever is later
    pub fn total_samples(&self) -> f64 {
        (self.length as f64 * self.ticklength * SAMPLERATE).max(self.end_of_sound)
    }

    /// Sum of all instrument burdens
    pub fn total_burden(&self) -> f64 {
        self.instruments.iter().map(Instrument::burden).sum()
    }
}

#[cfg(test)]
mod tests;
