//! Beat-position sync sidecar
//!
//! For visuals synced to the music: per track and per tick, the beat at
//! which the most recent note started.

use crate::music::Music;

/// Sidecar format version
pub const SYNC_VERSION: u32 = 1;

/// Per track (in song order), per tick, the beat of the latest note-on
///
/// Ticks before the first note-on carry `init_delta`.
pub fn track_deltas(music: &Music, init_delta: f32, lines_per_beat: f32) -> Vec<Vec<f32>> {
    let beats_per_line = 1.0 / f64::from(lines_per_beat);
    music
        .tracks
        .iter()
        .map(|track| {
            let mut deltas = Vec::with_capacity(music.length);
            let mut delta = init_delta;
            let mut notes = track.notes.iter().peekable();
            for tick in 0..music.length {
                while let Some(note) = notes.next_if(|n| n.line <= tick) {
                    if !note.is_off() {
                        delta = (tick as f64 * beats_per_line) as f32;
                    }
                }
                deltas.push(delta);
            }
            deltas
        })
        .collect()
}

/// Encode the sidecar: a little-endian `u32` header `[version, bytes per
/// track, total body bytes]` followed by the per-track `f32` values
pub fn encode_sync(music: &Music) -> Vec<u8> {
    let deltas = track_deltas(music, 0.0, 1.0);
    let track_bytes = music.length * 4;

    let mut data = Vec::with_capacity(12 + deltas.len() * track_bytes);
    data.extend_from_slice(&SYNC_VERSION.to_le_bytes());
    data.extend_from_slice(&(track_bytes as u32).to_le_bytes());
    data.extend_from_slice(&((deltas.len() * track_bytes) as u32).to_le_bytes());
    for value in deltas.iter().flatten() {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}
