//! Shared test fixtures

use crate::instrument::{Instrument, ParamLayout};
use crate::note::Note;
use crate::track::{Track, TrackHeader};
use crate::volume::Volume;

/// Knobs of a plain lead: finite decay, no quantization
pub(crate) const LEAD_PARAMS: [f64; 33] = [
    0.03, 0.4, 0.02, 0.5, 0.1, 0.8, 1.0, 0.5, 0.5, 0.0, 1.0, 0.5, 1.0, 1.0, 0.5, 0.25, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

pub(crate) fn lead(number: usize) -> Instrument {
    match Instrument::new(number, "Lead", &LEAD_PARAMS, ParamLayout::Current) {
        Ok(instr) => instr,
        Err(err) => panic!("fixture instrument: {}", err),
    }
}

/// Instrument slots with a lead at each of `numbers`
pub(crate) fn slots(numbers: &[usize]) -> Vec<Option<Instrument>> {
    let max = numbers.iter().copied().max().unwrap_or(0);
    let mut slots = vec![None; max + 1];
    for &n in numbers {
        slots[n] = Some(lead(n));
    }
    slots
}

/// Column playing `instrument`; each event is `(line, tone)`, `None` is off
///
/// All events sit in sequence position `line / 16`, pattern 0.
pub(crate) fn column(name: &str, instrument: usize, events: &[(usize, Option<i32>)]) -> Track {
    let notes = events
        .iter()
        .map(|&(line, tone)| match tone {
            Some(tone) => Note::play(line, line / 16, 0, line % 16, tone, instrument, 127),
            None => Note::off(line, line / 16, 0, line % 16),
        })
        .collect();
    let header = TrackHeader {
        number: 0,
        column: 1,
        name: name.to_string(),
        volume: Volume::UNITY,
    };
    match Track::new(header, notes) {
        Ok(track) => track,
        Err(err) => panic!("fixture track: {}", err),
    }
}
