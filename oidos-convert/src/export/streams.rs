//! Per-track note streams
//!
//! Both streams walk each track's notes in export order and emit one
//! value per segment, split into rows at every new sequence position.
//! Tracks with a singular note length leave out their offs: the player
//! derives each note's end from the fixed length instead.

use crate::music::Music;
use crate::note::Note;
use crate::track::Track;

use super::{AsmWriter, DB};

/// Steps above this are written as a two-byte escape
const MAX_SHORT_STEP: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NoteStream {
    /// Ticks from each event to the next
    Lengths,
    /// Voice of each event, `0` for silence
    Samples,
}

impl NoteStream {
    fn section(self) -> &'static str {
        match self {
            NoteStream::Lengths => "notelen",
            NoteStream::Samples => "notesamp",
        }
    }

    fn table(self) -> &'static str {
        match self {
            NoteStream::Lengths => "_NoteLengths",
            NoteStream::Samples => "_NoteSamples",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            NoteStream::Lengths => "L_",
            NoteStream::Samples => "S_",
        }
    }

    /// Row closing each track
    fn terminator(self) -> &'static [i64] {
        match self {
            NoteStream::Lengths => &[0],
            NoteStream::Samples => &[],
        }
    }

    /// Values for the segment starting at `prev`
    ///
    /// `next` is `None` once the track is exhausted.
    fn segment(self, track: &Track, prev: (usize, &Note), next: Option<&Note>) -> Vec<i64> {
        match self {
            NoteStream::Lengths => next.map(|n| length_data(prev.1, n)).unwrap_or_default(),
            NoteStream::Samples => sample_data(track, prev.0, prev.1),
        }
    }
}

/// Distance between two events; long steps escape to `[-1 - hi, lo]`
pub(crate) fn length_data(prev: &Note, next: &Note) -> Vec<i64> {
    let step = next.line.saturating_sub(prev.line);
    if step > MAX_SHORT_STEP {
        vec![-1 - (step >> 8) as i64, (step & 0xFF) as i64]
    } else {
        vec![step as i64]
    }
}

/// `0` for an off, else one plus the voice index of the note
pub(crate) fn sample_data(track: &Track, index: usize, note: &Note) -> Vec<i64> {
    if note.is_off() {
        return vec![0];
    }
    vec![1 + track.voice_of(index).unwrap_or_default() as i64]
}

/// One data row of a note stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StreamRow {
    /// `(songpos, pattern)` the row starts at; `None` before the first note
    pub position: Option<(usize, usize)>,
    pub values: Vec<i64>,
}

/// Values of one track's stream, grouped into one row per sequence position
pub(crate) fn track_rows(track: &Track, stream: NoteStream) -> Vec<StreamRow> {
    let compact = track.stride().is_some();
    let mut rows = Vec::new();
    let mut position = None;
    let mut values = Vec::new();
    let mut prev: Option<(usize, &Note)> = None;

    for (index, note) in track.notes.iter().enumerate() {
        if compact && note.is_off() && note.line > 0 {
            continue;
        }
        if let Some(p) = prev {
            values.extend(stream.segment(track, p, Some(note)));
        }
        let boundary = match prev {
            None => !note.is_off(),
            Some((_, p)) => note.songpos != p.songpos,
        };
        if boundary {
            rows.push(StreamRow {
                position,
                values: core::mem::take(&mut values),
            });
            position = Some((note.songpos, note.pattern));
        }
        prev = Some((index, note));
    }
    if let Some(p) = prev {
        values.extend(stream.segment(track, p, None));
    }
    rows.push(StreamRow { position, values });
    rows
}

/// Write the stream of every track in export order
pub(crate) fn write_note_lists(w: &mut AsmWriter, music: &Music, stream: NoteStream) {
    w.section(stream.section(), 1);
    w.label(stream.table());
    for track in music.ordered_tracks() {
        w.comment(&track.title());
        w.label(&format!(
            "{}{}_{}",
            stream.prefix(),
            track.label_name(),
            track.column
        ));
        for row in track_rows(track, stream) {
            if let Some((songpos, pattern)) = row.position {
                w.comment(&format!("Position {}, pattern {}", songpos, pattern));
            }
            w.data_row(DB, &row.values);
        }
        w.data_row(DB, stream.terminator());
        w.blank();
    }
}
