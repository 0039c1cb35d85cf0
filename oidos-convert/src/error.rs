//! Input error types
//!
//! Every validation failure in a conversion is an [`InputError`]: a closed
//! [`InputErrorKind`] plus the [`Location`] in the source song that caused
//! it. None of them are recoverable; the conversion is aborted as a whole.

use core::fmt;

/// Result alias used throughout the converter
pub type Result<T> = core::result::Result<T, InputError>;

/// Position in the source song an error refers to
///
/// All parts are optional. Song-wide errors (reverb conflicts, instrument
/// duration) carry an empty location and name the offender in the kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub track: Option<String>,
    pub column: Option<usize>,
    pub pattern: Option<usize>,
    pub line: Option<usize>,
}

impl Location {
    /// Location naming only a track
    pub fn track(name: &str) -> Self {
        Self {
            track: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Location of a single pattern line in a note column
    pub fn line(name: &str, column: usize, pattern: usize, line: usize) -> Self {
        Self {
            track: Some(name.to_string()),
            column: Some(column),
            pattern: Some(pattern),
            line: Some(line),
        }
    }

    /// Location of a pattern in a note column, without a specific line
    pub fn pattern(name: &str, column: usize, pattern: usize) -> Self {
        Self {
            track: Some(name.to_string()),
            column: Some(column),
            pattern: Some(pattern),
            line: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.track.is_none() && self.column.is_none() && self.pattern.is_none() && self.line.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            Ok(())
        };
        if let Some(track) = &self.track {
            sep(f)?;
            write!(f, "Track '{}'", track)?;
        }
        if let Some(column) = self.column {
            sep(f)?;
            write!(f, "column {}", column)?;
        }
        if let Some(pattern) = self.pattern {
            sep(f)?;
            write!(f, "pattern {}", pattern)?;
        }
        if let Some(line) = self.line {
            sep(f)?;
            write!(f, "line {}", line)?;
        }
        Ok(())
    }
}

/// The fixed set of ways a song can be rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputErrorKind {
    #[error("Note not terminated (insert OFF)")]
    UnterminatedNote,
    #[error("More than one instrument in track")]
    MultipleInstruments,
    #[error("Reversed note order from line {from} to {to}")]
    ReversedNoteOrder { from: usize, to: usize },
    #[error("Toneless note")]
    TonelessNote,
    #[error("Undefined instrument")]
    UndefinedInstrument(Option<usize>),
    #[error("Unspecified instrument")]
    UnspecifiedInstrument,
    #[error("Illegal instrument number '{0}'")]
    IllegalInstrument(String),
    #[error("Illegal note '{0}'")]
    IllegalNote(String),
    #[error("Illegal velocity value")]
    IllegalVelocity,
    #[error("Panning column used")]
    PanningColumnUsed,
    #[error("Delay column used")]
    DelayColumnUsed,
    #[error("Effect column used")]
    EffectColumnUsed,
    #[error("has more than one plugin device")]
    MultiplePluginDevices,
    #[error("has an unknown plugin device '{0}'")]
    UnknownPluginDevice(String),
    #[error("has different reverb from an earlier track")]
    ConflictingReverb,
    #[error("uses both reverb and send")]
    ReverbAndSend,
    #[error("uses send without Mute Source")]
    SendWithoutMuteSource,
    #[error("sends to unknown send track {0}")]
    UnknownSendTrack(usize),
    #[error("has a send chain that loops")]
    SendLoop,
    #[error("has different volume/panning than previous tracks with same instrument")]
    VolumeMismatch,
    #[error("Pattern sequence refers to unknown pattern {0}")]
    UnknownPattern(usize),
    #[error("Pattern sequence is empty")]
    EmptySequence,
    #[error("Instrument '{0}' is used both with and without reverb")]
    MixedReverbUsage(String),
    #[error("Instrument '{0}' has infinite duration")]
    InfiniteDuration(String),
    #[error("Instrument '{name}' has {found} parameters, expected at least {expected}")]
    MissingParameters {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A fatal problem with the input song
#[derive(Debug, Clone, PartialEq)]
pub struct InputError {
    pub location: Location,
    pub kind: InputErrorKind,
}

impl InputError {
    pub fn new(location: Location, kind: InputErrorKind) -> Self {
        Self { location, kind }
    }

    /// Error that is not tied to a position in the song
    pub fn global(kind: InputErrorKind) -> Self {
        Self {
            location: Location::default(),
            kind,
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            return write!(f, "{}", self.kind);
        }
        // Track-level kinds read as a sentence continuing the track name
        if self.location.column.is_none() {
            return write!(f, "{} {}", self.location, self.kind);
        }
        write!(f, "{}: {}", self.location, self.kind)
    }
}

// The kind is already part of the message, so it is not reported as a source
impl std::error::Error for InputError {}
