//! Note events of a single note column

use crate::error::{InputError, InputErrorKind, Location, Result};

/// Velocity used when a note has no (or an unreadable) volume column
pub const DEFAULT_VELOCITY: u8 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// What happens at a note position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteEvent {
    Off,
    Play {
        /// Semitone index (`octave * 12 + pitch class`)
        tone: Option<i32>,
        /// Instrument slot
        instrument: Option<usize>,
        /// 1..=127
        velocity: u8,
    },
}

/// One event in a note column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Absolute time in ticks
    pub line: usize,
    /// Position in the pattern sequence
    pub songpos: usize,
    /// Source pattern (diagnostics and position markers)
    pub pattern: usize,
    /// Line within the source pattern (diagnostics)
    pub pattern_line: usize,
    pub event: NoteEvent,
}

impl Note {
    pub fn off(line: usize, songpos: usize, pattern: usize, pattern_line: usize) -> Self {
        Self {
            line,
            songpos,
            pattern,
            pattern_line,
            event: NoteEvent::Off,
        }
    }

    pub fn play(
        line: usize,
        songpos: usize,
        pattern: usize,
        pattern_line: usize,
        tone: i32,
        instrument: usize,
        velocity: u8,
    ) -> Self {
        Self {
            line,
            songpos,
            pattern,
            pattern_line,
            event: NoteEvent::Play {
                tone: Some(tone),
                instrument: Some(instrument),
                velocity,
            },
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self.event, NoteEvent::Off)
    }

    pub fn tone(&self) -> Option<i32> {
        match self.event {
            NoteEvent::Off => None,
            NoteEvent::Play { tone, .. } => tone,
        }
    }

    pub fn instrument(&self) -> Option<usize> {
        match self.event {
            NoteEvent::Off => None,
            NoteEvent::Play { instrument, .. } => instrument,
        }
    }

    pub fn velocity(&self) -> Option<u8> {
        match self.event {
            NoteEvent::Off => None,
            NoteEvent::Play { velocity, .. } => Some(velocity),
        }
    }
}

/// Tone of a tracker note name such as `"C-4"` or `"F#2"`
///
/// Returns `None` for anything that is not a note name.
pub fn parse_tone(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    if bytes.len() != 3 {
        return None;
    }
    let base = match bytes[0] {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return None,
    };
    let sharp = match bytes[1] {
        b'#' => 1,
        b'-' => 0,
        _ => return None,
    };
    let octave = (bytes[2] as char).to_digit(10)? as i32;
    Some(octave * 12 + base + sharp)
}

/// Note name of a tone, the inverse of [`parse_tone`]
pub fn note_name(tone: i32) -> String {
    format!("{}{}", NOTE_NAMES[tone.rem_euclid(12) as usize], tone.div_euclid(12))
}

/// Velocity from a volume column cell
///
/// Empty cells mean full velocity. Cells that are not hex fall back to
/// full velocity with a warning. Hex values outside `1..=127` are an error.
pub fn parse_velocity(text: &str, location: &Location) -> Result<u8> {
    let text = text.trim();
    if text.is_empty() || text == ".." {
        return Ok(DEFAULT_VELOCITY);
    }
    match u32::from_str_radix(text, 16) {
        Ok(v) if (1..=127).contains(&v) => Ok(v as u8),
        Ok(_) => Err(InputError::new(
            location.clone(),
            InputErrorKind::IllegalVelocity,
        )),
        Err(_) => {
            tracing::warn!("{}: Illegal velocity value '{}'", location, text);
            Ok(DEFAULT_VELOCITY)
        }
    }
}

/// Instrument slot from an instrument column cell (hex)
pub fn parse_instrument(text: &str, location: &Location) -> Result<usize> {
    usize::from_str_radix(text.trim(), 16).map_err(|_| {
        InputError::new(
            location.clone(),
            InputErrorKind::IllegalInstrument(text.to_string()),
        )
    })
}
