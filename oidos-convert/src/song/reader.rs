//! Song records to [`Music`]

use crate::error::{InputError, InputErrorKind, Location, Result};
use crate::instrument::{Instrument, ParamLayout};
use crate::music::{Music, MusicInput};
use crate::note::{Note, parse_instrument, parse_tone, parse_velocity};
use crate::reverb::{REVERB_PLUGIN_IDS, Reverb};
use crate::track::{Track, TrackHeader, normalize_notes};
use crate::volume::Volume;

use super::{DeviceChain, NoteCell, SongRecord};

const NOTE_OFF: &str = "OFF";
const EMPTY_NOTE: &str = "---";
const EMPTY_FIELD: &str = "..";

static EMPTY_CELL: NoteCell = NoteCell {
    note: String::new(),
    instrument: String::new(),
    volume: String::new(),
    panning: String::new(),
    delay: String::new(),
};

/// Validate a song and aggregate it into [`Music`]
pub fn build_music(song: &SongRecord) -> Result<Music> {
    let first_pattern = match song.sequence.first() {
        Some(entry) => entry.pattern,
        None => return Err(InputError::global(InputErrorKind::EmptySequence)),
    };

    let lines_per_minute = song.timing.lines_per_minute();
    if song.timing.engine_version.is_some_and(|v| v >= 4) {
        tracing::info!("New timing format: {} ticks per minute", lines_per_minute as i64);
    } else {
        tracing::info!("Old timing format: {} ticks per minute", lines_per_minute as i64);
    }
    let ticklength = song.timing.ticklength();

    let mut length = 0;
    for entry in &song.sequence {
        length += pattern_lines(song, entry.pattern)?;
    }

    let instruments = read_instruments(song)?;
    let (tracks, n_reverb_tracks, reverb) = read_tracks(song, &instruments, first_pattern)?;

    let master_volume = song.master.pre() * song.master.post();

    Music::new(MusicInput {
        tracks,
        instruments,
        length,
        ticklength,
        n_reverb_tracks,
        reverb,
        master_volume,
    })
}

fn pattern_lines(song: &SongRecord, pattern: usize) -> Result<usize> {
    song.patterns
        .get(pattern)
        .map(|p| p.lines)
        .ok_or_else(|| InputError::global(InputErrorKind::UnknownPattern(pattern)))
}

fn read_instruments(song: &SongRecord) -> Result<Vec<Option<Instrument>>> {
    song.instruments
        .iter()
        .enumerate()
        .map(|(number, record)| {
            if record.parameters.is_empty() {
                return Ok(None);
            }
            let layout = ParamLayout::from_plugin_identifier(&record.plugin);
            let mut instr = Instrument::new(number, &record.name, &record.parameters, layout)?;
            instr.volume = Volume::gain(record.volume);
            Ok(Some(instr))
        })
        .collect()
}

/// Reverb-bearing tracks first, the count of those, and the song reverb
fn read_tracks(
    song: &SongRecord,
    instruments: &[Option<Instrument>],
    first_pattern: usize,
) -> Result<(Vec<Track>, usize, Option<Reverb>)> {
    let mut reverb_tracks = Vec::new();
    let mut dry_tracks = Vec::new();
    let mut reverb = None;

    for (number, record) in song.tracks.iter().enumerate() {
        if !record.active {
            continue;
        }
        let name = record.name.as_str();
        let (volume, devices) = track_volume(song, &record.devices, name)?;

        for (ci, &column_active) in record.columns.iter().enumerate() {
            if !column_active {
                continue;
            }
            let column = ci + 1;
            let notes = extract_notes(song, number, column, name, first_pattern)?;

            let mut sounding = false;
            for note in notes.iter().filter(|n| !n.is_off()) {
                if let Some(slot) = note.instrument()
                    && !matches!(instruments.get(slot), Some(Some(_)))
                {
                    return Err(InputError::new(
                        Location::line(name, column, note.pattern, note.pattern_line),
                        InputErrorKind::UndefinedInstrument(Some(slot)),
                    ));
                }
                sounding = true;
            }
            if !sounding {
                continue;
            }

            let header = TrackHeader {
                number,
                column,
                name: name.to_string(),
                volume,
            };
            let track = Track::new(header, notes)?;
            if devices.active_plugin().is_some() {
                reverb_tracks.push(track);
            } else {
                dry_tracks.push(track);
            }
        }

        reverb = pickup_reverb(devices, reverb, name)?;
    }

    for send_track in &song.send_tracks {
        if !send_track.devices.plugins.is_empty() {
            reverb = pickup_reverb(&send_track.devices, reverb, &send_track.name)?;
        }
    }

    let n_reverb_tracks = reverb_tracks.len();
    reverb_tracks.extend(dry_tracks);
    Ok((reverb_tracks, n_reverb_tracks, reverb))
}

/// Effective track volume and the device chain the signal ends up in
///
/// Follows active sends through their destination send tracks. Sends are
/// only allowed when they mute the source and the chain has no plugin.
fn track_volume<'a>(
    song: &'a SongRecord,
    devices: &'a DeviceChain,
    name: &str,
) -> Result<(Volume, &'a DeviceChain)> {
    let mut devices = devices;
    let mut volume = devices.mixer.pre();
    let mut hops = 0;
    while let Some(send) = devices.active_send() {
        if devices.active_plugin().is_some() {
            return Err(InputError::new(
                Location::track(name),
                InputErrorKind::ReverbAndSend,
            ));
        }
        if !send.mute_source {
            return Err(InputError::new(
                Location::track(name),
                InputErrorKind::SendWithoutMuteSource,
            ));
        }
        let Some(dest) = song.send_tracks.get(send.destination) else {
            return Err(InputError::new(
                Location::track(name),
                InputErrorKind::UnknownSendTrack(send.destination),
            ));
        };
        hops += 1;
        if hops > song.send_tracks.len() {
            return Err(InputError::new(Location::track(name), InputErrorKind::SendLoop));
        }
        volume *= send.gain();
        devices = &dest.devices;
        volume *= devices.mixer.pre();
    }
    volume *= devices.mixer.post();
    Ok((volume, devices))
}

fn pickup_reverb(devices: &DeviceChain, reverb: Option<Reverb>, name: &str) -> Result<Option<Reverb>> {
    if devices.plugins.len() > 1 {
        return Err(InputError::new(
            Location::track(name),
            InputErrorKind::MultiplePluginDevices,
        ));
    }
    let Some(plugin) = devices.active_plugin() else {
        return Ok(reverb);
    };
    if !REVERB_PLUGIN_IDS.contains(&plugin.identifier.as_str()) {
        return Err(InputError::new(
            Location::track(name),
            InputErrorKind::UnknownPluginDevice(plugin.identifier.clone()),
        ));
    }

    let found = Reverb::from_slice(&plugin.parameters);
    if let Some(earlier) = &reverb
        && *earlier != found
    {
        return Err(InputError::new(
            Location::track(name),
            InputErrorKind::ConflictingReverb,
        ));
    }
    Ok(Some(found))
}

/// Whether a cell field holds a value
fn is_set(text: &str, allow_zero: bool) -> bool {
    let text = text.trim();
    !(text.is_empty() || text == EMPTY_FIELD || (allow_zero && text == "00"))
}

/// All notes of one column over the whole sequence, normalized
fn extract_notes(
    song: &SongRecord,
    track: usize,
    column: usize,
    name: &str,
    first_pattern: usize,
) -> Result<Vec<Note>> {
    let mut notes = Vec::new();
    let mut outside_pattern = 0;
    let mut pattern_top = 0;
    let mut prev_instrument: Option<&str> = None;

    for (songpos, entry) in song.sequence.iter().enumerate() {
        let pattern = entry.pattern;
        let Some(record) = song.patterns.get(pattern) else {
            return Err(InputError::global(InputErrorKind::UnknownPattern(pattern)));
        };
        let nlines = record.lines;

        if entry.muted_tracks.contains(&track) {
            notes.push(Note::off(pattern_top, songpos, pattern, 0));
            pattern_top += nlines;
            continue;
        }

        let lines = record.tracks.get(track).map(|t| t.lines.as_slice()).unwrap_or(&[]);
        for line in lines {
            if line.index >= nlines {
                outside_pattern += 1;
                continue;
            }
            let at = Location::line(name, column, pattern, line.index);
            let cell = line.columns.get(column - 1).unwrap_or(&EMPTY_CELL);

            let note_text = cell.note.trim();
            if !note_text.is_empty() && note_text != EMPTY_NOTE {
                let abs_line = pattern_top + line.index;
                if note_text == NOTE_OFF {
                    notes.push(Note::off(abs_line, songpos, pattern, line.index));
                } else {
                    let instrument_text = match cell.instrument.trim() {
                        "" | EMPTY_FIELD => match prev_instrument {
                            Some(prev) => prev,
                            None => {
                                return Err(InputError::new(
                                    at,
                                    InputErrorKind::UnspecifiedInstrument,
                                ));
                            }
                        },
                        text => text,
                    };
                    prev_instrument = Some(instrument_text);

                    let Some(tone) = parse_tone(note_text) else {
                        return Err(InputError::new(
                            at,
                            InputErrorKind::IllegalNote(note_text.to_string()),
                        ));
                    };
                    let instrument = parse_instrument(instrument_text, &at)?;
                    let velocity = parse_velocity(&cell.volume, &at)?;
                    notes.push(Note::play(
                        abs_line, songpos, pattern, line.index, tone, instrument, velocity,
                    ));
                }
            }

            if is_set(&cell.panning, false) {
                return Err(InputError::new(at, InputErrorKind::PanningColumnUsed));
            }
            if is_set(&cell.delay, true) {
                return Err(InputError::new(at, InputErrorKind::DelayColumnUsed));
            }
            if line.effects.iter().any(|e| is_set(e, true)) {
                return Err(InputError::new(at, InputErrorKind::EffectColumnUsed));
            }
        }
        pattern_top += nlines;
    }

    if outside_pattern > 0 {
        tracing::info!(
            " * Track '{}': {} note{} outside patterns ignored",
            name,
            outside_pattern,
            if outside_pattern > 1 { "s" } else { "" }
        );
    }

    Ok(normalize_notes(notes, first_pattern))
}
