//! Tests for song-wide aggregation

use super::*;
use crate::error::InputErrorKind;
use crate::instrument::{InstrumentParams, ParamValue};
use crate::note::Note;
use crate::track::TrackHeader;

fn params() -> InstrumentParams {
    InstrumentParams {
        modes: 0.4,
        fat: 0.02,
        harmonicity: 1.0,
        decaylow: 0.5,
        decayhigh: 0.5,
        filterhigh: 1.0,
        fslopelow: 1.0,
        fslopehigh: 1.0,
        fsweeplow: 0.5,
        fsweephigh: 0.5,
        gain: 0.25,
        ..Default::default()
    }
}

fn slots(numbers: &[usize]) -> Vec<Option<Instrument>> {
    let max = numbers.iter().copied().max().unwrap_or(0);
    let mut slots = vec![None; max + 1];
    for &n in numbers {
        slots[n] = Some(Instrument::from_params(n, &format!("Instr{}", n), params()));
    }
    slots
}

fn track(number: usize, instrument: usize, volume: Volume, velocities: &[u8]) -> Track {
    let mut notes = Vec::new();
    for (i, &velocity) in velocities.iter().enumerate() {
        notes.push(Note::play(i * 8, 0, 0, i * 8, 48, instrument, velocity));
        notes.push(Note::off(i * 8 + 4, 0, 0, i * 8 + 4));
    }
    let header = TrackHeader {
        number,
        column: 1,
        name: format!("Track{}", number),
        volume,
    };
    Track::new(header, notes).unwrap()
}

fn input(tracks: Vec<Track>, instruments: Vec<Option<Instrument>>, n_reverb: usize) -> MusicInput {
    let reverb = (n_reverb > 0).then(|| Reverb::from_slice(&[0.5, 0.5, 0.1, 0.2, 0.05, 0.5]));
    MusicInput {
        tracks,
        instruments,
        length: 64,
        ticklength: 0.125,
        n_reverb_tracks: n_reverb,
        reverb,
        master_volume: Volume::UNITY,
    }
}

#[test]
fn test_reverb_instruments_come_first() {
    let tracks = vec![
        track(0, 2, Volume::UNITY, &[127]),
        track(1, 1, Volume::UNITY, &[127]),
    ];
    let music = Music::new(input(tracks, slots(&[1, 2, 3]), 1)).unwrap();

    let order: Vec<usize> = music.instruments.iter().map(|i| i.number).collect();
    assert_eq!(order, vec![2, 1]);
    assert_eq!(music.n_reverb_instruments, 1);
    assert_eq!(music.track_order, vec![0, 1]);
    assert!(music.instrument(3).is_none());
    assert_eq!(music.instrument(1).map(|i| i.columns), Some(1));
}

#[test]
fn test_track_order_groups_by_instrument() {
    let tracks = vec![
        track(0, 1, Volume::UNITY, &[127]),
        track(1, 2, Volume::UNITY, &[127]),
        track(2, 1, Volume::UNITY, &[127]),
    ];
    let music = Music::new(input(tracks, slots(&[1, 2]), 0)).unwrap();
    assert_eq!(music.track_order, vec![0, 2, 1]);
    let names: Vec<&str> = music.ordered_tracks().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Track0", "Track2", "Track1"]);
    assert_eq!(music.instrument(1).map(|i| i.columns), Some(2));
}

#[test]
fn test_mixed_reverb_usage_rejected() {
    let tracks = vec![
        track(0, 1, Volume::UNITY, &[127]),
        track(1, 1, Volume::UNITY, &[127]),
    ];
    let err = Music::new(input(tracks, slots(&[1]), 1)).unwrap_err();
    assert_eq!(
        err.kind,
        InputErrorKind::MixedReverbUsage("01|Instr1".to_string())
    );
}

#[test]
fn test_volume_mismatch_rejected() {
    let tracks = vec![
        track(0, 1, Volume::UNITY, &[127]),
        track(1, 1, Volume::gain(0.5), &[127]),
    ];
    let err = Music::new(input(tracks, slots(&[1]), 0)).unwrap_err();
    assert_eq!(err.kind, InputErrorKind::VolumeMismatch);
    assert_eq!(err.location, Location::track("Track1, column 1"));
}

#[test]
fn test_undefined_instrument_rejected() {
    let tracks = vec![track(0, 4, Volume::UNITY, &[127])];
    let err = Music::new(input(tracks, slots(&[1]), 0)).unwrap_err();
    assert_eq!(err.kind, InputErrorKind::UndefinedInstrument(Some(4)));
}

#[test]
fn test_velocity_quantum_scales_volume() {
    let tracks = vec![track(0, 1, Volume::UNITY, &[64, 127])];
    let music = Music::new(input(tracks, slots(&[1]), 0)).unwrap();
    let instr = &music.instruments[0];
    assert_eq!(instr.velocity_quantum, 64);
    assert_eq!(instr.velocities, vec![64, 127]);
    assert_eq!(instr.paramblock[19], ParamValue::Float(64.0 * 128.0));
}

#[test]
fn test_full_velocity_only() {
    let tracks = vec![track(0, 1, Volume::UNITY, &[127, 127])];
    let music = Music::new(input(tracks, slots(&[1]), 0)).unwrap();
    let instr = &music.instruments[0];
    assert_eq!(instr.velocity_quantum, 128);
    assert_eq!(instr.tones, vec![48]);
    assert_eq!(instr.tone_counts.get(&48), Some(&2));
    assert_eq!(instr.velocity_counts.get(&127), Some(&2));
}

#[test]
fn test_panning_extends_every_block() {
    let tracks = vec![
        track(0, 1, Volume::new(0.5, 1.0), &[127]),
        track(1, 2, Volume::UNITY, &[127]),
    ];
    let music = Music::new(input(tracks, slots(&[1, 2]), 0)).unwrap();
    assert!(music.uses_panning);
    assert!(music.instruments.iter().all(|i| i.paramblock.len() == 21));
}

#[test]
fn test_no_panning_keeps_short_blocks() {
    let tracks = vec![track(0, 1, Volume::gain(0.5), &[127])];
    let music = Music::new(input(tracks, slots(&[1]), 0)).unwrap();
    assert!(!music.uses_panning);
    assert_eq!(music.instruments[0].paramblock.len(), 20);
}

#[test]
fn test_sizes_and_timing() {
    let tracks = vec![track(0, 1, Volume::UNITY, &[127, 100])];
    let music = Music::new(input(tracks, slots(&[1]), 0)).unwrap();
    let instr = &music.instruments[0];

    // 4 ticks of 0.125 s
    assert_eq!(instr.maxtime, 0.5);
    assert_eq!(instr.maxsamples, 65536);
    assert_eq!(instr.latest_note, 8);
    assert_eq!(music.max_maxsamples, 65536);
    assert_eq!(music.max_total_samples, 65536);
    assert_eq!(instr.end_of_sound, 8.0 * 0.125 * SAMPLERATE + 65536.0);
    assert_eq!(music.samples_per_tick(), 5512);
    assert_eq!(music.total_samples(), 64.0 * 0.125 * SAMPLERATE);
}

#[test]
fn test_reverb_tail_extends_end_of_sound() {
    let tracks = vec![track(0, 1, Volume::UNITY, &[127])];
    let music = Music::new(input(tracks, slots(&[1]), 1)).unwrap();
    let instr = &music.instruments[0];
    let dry = instr.latest_note as f64 * 0.125 * SAMPLERATE + instr.maxsamples as f64;
    assert_eq!(instr.end_of_sound, dry + 0.5 * 10.0 * SAMPLERATE);
    assert_eq!(music.end_of_sound, instr.end_of_sound);
}
