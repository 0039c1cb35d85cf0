//! Song project records
//!
//! A plain record graph mirroring what a tracker project contains: timing,
//! pattern sequence, patterns with note cells, instrument slots with their
//! synthesizer knobs, and the device chains of sequencer, send and master
//! tracks. Records deserialize from TOML or JSON; [`build_music`] turns
//! them into a validated [`crate::Music`].

mod reader;


use serde::{Deserialize, Serialize};

pub use reader::build_music;

use crate::volume::Volume;

/// Whole song project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SongRecord {
    pub timing: Timing,
    #[serde(default)]
    pub sequence: Vec<SequenceEntry>,
    #[serde(default)]
    pub patterns: Vec<PatternRecord>,
    /// Instrument slots; a slot without parameters is empty
    #[serde(default)]
    pub instruments: Vec<InstrumentRecord>,
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
    #[serde(default)]
    pub send_tracks: Vec<SendTrackRecord>,
    #[serde(default)]
    pub master: MixerRecord,
}

/// Global tempo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    pub bpm: f64,
    #[serde(default = "default_lines_per_beat")]
    pub lines_per_beat: f64,
    #[serde(default = "default_ticks_per_line")]
    pub ticks_per_line: f64,
    /// Playback engine version. Version 4 and later derive the tick rate
    /// from lines per beat, earlier ones from ticks per line.
    #[serde(default)]
    pub engine_version: Option<u32>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            lines_per_beat: default_lines_per_beat(),
            ticks_per_line: default_ticks_per_line(),
            engine_version: None,
        }
    }
}

fn default_lines_per_beat() -> f64 {
    4.0
}

fn default_ticks_per_line() -> f64 {
    6.0
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_center() -> f64 {
    0.5
}

fn default_columns() -> Vec<bool> {
    vec![true]
}

impl Timing {
    /// Ticks (pattern lines) per minute
    pub fn lines_per_minute(&self) -> f64 {
        if self.engine_version.is_some_and(|v| v >= 4) {
            self.bpm * self.lines_per_beat
        } else {
            self.bpm * 24.0 / self.ticks_per_line
        }
    }

    /// Seconds per tick
    pub fn ticklength(&self) -> f64 {
        60.0 / self.lines_per_minute()
    }
}

/// One position of the pattern sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceEntry {
    pub pattern: usize,
    /// Sequencer track indices muted at this position
    #[serde(default)]
    pub muted_tracks: Vec<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Number of lines
    pub lines: usize,
    /// One entry per sequencer track
    #[serde(default)]
    pub tracks: Vec<PatternTrackRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternTrackRecord {
    /// Non-empty lines only
    #[serde(default)]
    pub lines: Vec<LineRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineRecord {
    pub index: usize,
    #[serde(default)]
    pub columns: Vec<NoteCell>,
    /// Effect column numbers
    #[serde(default)]
    pub effects: Vec<String>,
}

/// A note column cell, as the tracker displays it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteCell {
    /// `"C-4"`, `"OFF"`, `"---"` or empty
    pub note: String,
    /// Hex slot or `".."`
    pub instrument: String,
    /// Hex velocity or `".."`
    pub volume: String,
    pub panning: String,
    pub delay: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentRecord {
    #[serde(default)]
    pub name: String,
    /// Synthesizer plugin identifier
    #[serde(default)]
    pub plugin: String,
    #[serde(default)]
    pub parameters: Vec<f64>,
    /// Plugin output volume
    #[serde(default = "default_one")]
    pub volume: f64,
}

impl Default for InstrumentRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            plugin: String::new(),
            parameters: Vec::new(),
            volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Active state of each visible note column
    #[serde(default = "default_columns")]
    pub columns: Vec<bool>,
    #[serde(default)]
    pub devices: DeviceChain,
}

impl Default for TrackRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            active: true,
            columns: default_columns(),
            devices: DeviceChain::default(),
        }
    }
}

/// Devices on a sequencer or send track
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceChain {
    #[serde(default)]
    pub mixer: MixerRecord,
    #[serde(default)]
    pub send: Option<SendRecord>,
    #[serde(default)]
    pub plugins: Vec<PluginRecord>,
}

impl DeviceChain {
    /// The effect plugin, when present and switched on
    pub fn active_plugin(&self) -> Option<&PluginRecord> {
        self.plugins.first().filter(|p| p.active)
    }

    /// The send device, when present and switched on
    pub fn active_send(&self) -> Option<&SendRecord> {
        self.send.as_ref().filter(|s| s.active)
    }
}

/// Track mixer: pre and post volume and panning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerRecord {
    #[serde(default = "default_one")]
    pub volume: f64,
    #[serde(default = "default_center")]
    pub panning: f64,
    #[serde(default = "default_one")]
    pub post_volume: f64,
    #[serde(default = "default_center")]
    pub post_panning: f64,
}

impl Default for MixerRecord {
    fn default() -> Self {
        Self {
            volume: 1.0,
            panning: 0.5,
            post_volume: 1.0,
            post_panning: 0.5,
        }
    }
}

impl MixerRecord {
    /// Pre-send gain
    pub fn pre(&self) -> Volume {
        Volume::gain(self.volume) * Volume::panning(self.panning)
    }

    /// Post-send gain
    pub fn post(&self) -> Volume {
        Volume::gain(self.post_volume) * Volume::panning(self.post_panning)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRecord {
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_one")]
    pub amount: f64,
    #[serde(default = "default_center")]
    pub pan: f64,
    #[serde(default)]
    pub mute_source: bool,
    /// Send track index
    pub destination: usize,
}

impl SendRecord {
    pub fn gain(&self) -> Volume {
        Volume::gain(self.amount) * Volume::panning(self.pan)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRecord {
    pub identifier: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub parameters: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendTrackRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub devices: DeviceChain,
}
