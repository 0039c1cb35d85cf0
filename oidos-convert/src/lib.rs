//! Oidos-convert: tracker song converter for the Oidos synthesizer
//!
//! Turns a tracker project (patterns, note columns, synthesizer knob
//! settings and one reverb) into the compact data the Oidos 4k/8k intro
//! player is assembled with.
//!
//! # Pipeline
//!
//! 1. [`song::build_music`] reads the project records, validates every
//!    note column and follows the mixer and send chains
//! 2. [`Music::new`] groups tracks by instrument, derives velocity quanta
//!    and tone sets, and computes each instrument's quantized parameters
//! 3. [`export`] renders the NASM listing; [`encode_sync`] the optional
//!    beat-position sidecar; [`format_report`] the statistics
//!
//! # Usage
//!
//! ```ignore
//! use oidos_convert::{ExportContext, SongRecord, build_music, export};
//!
//! let record: SongRecord = toml::from_str(&std::fs::read_to_string("song.toml")?)?;
//! let music = build_music(&record)?;
//! let listing = export(&music, &ExportContext::now("song.toml"));
//! ```

mod error;
mod export;
mod instrument;
mod music;
mod note;
mod quantize;
mod report;
mod reverb;
mod sync;
mod track;
mod volume;

pub mod song;

#[cfg(test)]
mod fixtures;

pub use error::{InputError, InputErrorKind, Location, Result};
pub use export::{AsmWriter, ExportContext, export};
pub use instrument::{
    INSTRUMENT_PARAM_COUNT, INSTRUMENT_PARAM_NAMES, Instrument, InstrumentParams,
    LEGACY_PLUGIN_ID, PARAMBLOCK_MAXSAMPLES, ParamLayout, ParamValue, velocity_quantum,
};
pub use music::{Music, MusicInput};
pub use note::{DEFAULT_VELOCITY, Note, NoteEvent, note_name, parse_tone};
pub use quantize::{
    PAN_QUANTIZATION, VOLUME_QUANTIZATION, f2i, i2f, quantize, quantize_knob,
};
pub use report::{BURDEN_PER_SECOND, format_report};
pub use reverb::{REVERB_PARAM_COUNT, REVERB_PARAM_NAMES, REVERB_PLUGIN_IDS, Reverb, ReverbParams};
pub use song::{SongRecord, build_music};
pub use sync::{SYNC_VERSION, encode_sync, track_deltas};
pub use track::{Tav, Track, TrackHeader, normalize_notes};
pub use volume::Volume;

/// Output sample rate of the player
pub const SAMPLERATE: f64 = 44100.0;

/// Semitone range of the synthesizer filters
pub const TOTAL_SEMITONES: f64 = 120.0;
