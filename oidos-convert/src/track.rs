//! Monophonic note columns
//!
//! A [`Track`] is one note column of one sequencer track, flattened over the
//! whole pattern sequence. Walking consecutive note pairs gives the
//! segments the engine plays: each sounding note lasts until the next event
//! in the column.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;

use crate::error::{InputError, InputErrorKind, Location, Result};
use crate::note::{Note, NoteEvent};
use crate::volume::Volume;

/// A (tone, velocity) pair: one distinct voice a track requests
pub type Tav = (i32, u8);

/// Identity of a note column
#[derive(Debug, Clone)]
pub struct TrackHeader {
    /// Sequencer track index in the source song
    pub number: usize,
    /// 1-based note column
    pub column: usize,
    pub name: String,
    /// Effective mixer volume of the track (without master)
    pub volume: Volume,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub number: usize,
    pub column: usize,
    pub name: String,
    pub volume: Volume,
    pub notes: Vec<Note>,

    /// The one instrument played by this column, if any note sounds
    pub instrument: Option<usize>,
    /// Index into `notes` of each sounding note, to the voice it plays
    pub notemap: HashMap<usize, Tav>,
    /// Distinct voices, sorted by (tone, velocity)
    pub tavs: Vec<Tav>,
    /// Dense index of each voice in `tavs`
    pub tav_repr: HashMap<Tav, usize>,
    /// Histogram of segment durations in ticks
    pub note_lengths: BTreeMap<usize, usize>,
    /// The only segment duration, when all segments are equally long
    pub singular_length: Option<usize>,
    pub max_length: usize,
    /// Start of the last sounding note, in ticks
    pub latest_note: usize,
}

/// Bring a column into canonical form
///
/// A column must start with a note at line 0; if it does not, an off is
/// inserted there, attributed to `first_pattern`. Runs of offs collapse to
/// their first element.
pub fn normalize_notes(notes: Vec<Note>, first_pattern: usize) -> Vec<Note> {
    let mut out = Vec::with_capacity(notes.len() + 1);
    let mut off = match notes.first() {
        Some(first) if first.line == 0 => false,
        _ => {
            out.push(Note::off(0, 0, first_pattern, 0));
            true
        }
    };
    for note in notes {
        if note.is_off() {
            if !off {
                out.push(note);
                off = true;
            }
        } else {
            out.push(note);
            off = false;
        }
    }
    out
}

impl Track {
    /// Validate a normalized column and derive its voices and durations
    pub fn new(header: TrackHeader, notes: Vec<Note>) -> Result<Self> {
        let TrackHeader {
            number,
            column,
            name,
            volume,
        } = header;

        let mut instrument = None;
        let mut notemap = HashMap::new();
        let mut note_lengths = BTreeMap::new();
        let mut max_length = 0;
        let mut latest_note = 0;

        for (index, pair) in notes.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let NoteEvent::Play {
                tone,
                instrument: prev_instrument,
                velocity,
            } = prev.event
            else {
                continue;
            };
            let at = || Location::line(&name, column, prev.pattern, prev.pattern_line);

            let Some(prev_instrument) = prev_instrument else {
                return Err(InputError::new(
                    at(),
                    InputErrorKind::UndefinedInstrument(None),
                ));
            };
            if instrument.is_some_and(|current| current != prev_instrument) {
                return Err(InputError::new(at(), InputErrorKind::MultipleInstruments));
            }
            instrument = Some(prev_instrument);

            let Ok(length) = usize::try_from(next.line as i64 - prev.line as i64) else {
                return Err(InputError::new(
                    Location::pattern(&name, column, prev.pattern),
                    InputErrorKind::ReversedNoteOrder {
                        from: prev.pattern_line,
                        to: next.pattern_line,
                    },
                ));
            };
            let Some(tone) = tone else {
                return Err(InputError::new(at(), InputErrorKind::TonelessNote));
            };

            latest_note = latest_note.max(prev.line);
            max_length = max_length.max(length);
            notemap.insert(index, (tone, velocity));
            *note_lengths.entry(length).or_insert(0) += 1;
        }

        if let Some(last) = notes.last()
            && !last.is_off()
        {
            return Err(InputError::new(
                Location::line(&name, column, last.pattern, last.pattern_line),
                InputErrorKind::UnterminatedNote,
            ));
        }

        let singular_length = if note_lengths.len() == 1 {
            note_lengths.keys().next().copied()
        } else {
            None
        };

        let tavs: Vec<Tav> = notemap
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let tav_repr = tavs.iter().enumerate().map(|(i, &tav)| (tav, i)).collect();

        Ok(Self {
            number,
            column,
            name,
            volume,
            notes,
            instrument,
            notemap,
            tavs,
            tav_repr,
            note_lengths,
            singular_length,
            max_length,
            latest_note,
        })
    }

    /// `"name, column N"`
    pub fn title(&self) -> String {
        format!("{}, column {}", self.name, self.column)
    }

    /// Track name reduced to characters valid in an assembler label
    pub fn label_name(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect()
    }

    /// Voice index (0-based) of the sounding note at `index`
    pub fn voice_of(&self, index: usize) -> Option<usize> {
        self.notemap
            .get(&index)
            .and_then(|tav| self.tav_repr.get(tav))
            .copied()
    }

    /// Number of notes that play `tav`
    pub fn tav_note_count(&self, tav: Tav) -> usize {
        self.notemap.values().filter(|&&t| t == tav).count()
    }

    /// Singular length as a stride, ignoring a degenerate zero
    pub(crate) fn stride(&self) -> Option<usize> {
        self.singular_length.filter(|&l| l != 0)
    }
}
