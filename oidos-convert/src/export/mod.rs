//! Assembly listing writer
//!
//! Produces the NASM include file the Oidos player is assembled with:
//! song-wide `%define`s, one parameter block and tone list per instrument,
//! one voice table per track, and per-track note length and note voice
//! streams.

mod streams;


use core::fmt::Display;

use chrono::NaiveDateTime;

use crate::music::Music;
use crate::quantize::f2i;

use streams::NoteStream;

/// Data directive for byte rows
const DB: &str = "db";
/// Data directive for dword rows
const DD: &str = "dd";

/// Terminator of an instrument tone list, before adding the column count
const TONE_LIST_END: i64 = -129;
/// Terminator of a track voice table
const VOICE_TABLE_END: i64 = -128;

/// Where a listing came from, for its header line
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Name of the converted song file
    pub source_name: String,
    pub timestamp: NaiveDateTime,
}

impl ExportContext {
    pub fn new(source_name: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            source_name: source_name.into(),
            timestamp,
        }
    }

    /// Context stamped with the local wall clock
    pub fn now(source_name: impl Into<String>) -> Self {
        Self::new(source_name, chrono::Local::now().naive_local())
    }
}

/// Append-only builder for NASM source text
#[derive(Debug, Default)]
pub struct AsmWriter {
    out: String,
}

impl AsmWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw line
    pub fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// `%define NAME value`
    pub fn define(&mut self, name: &str, value: impl Display) {
        self.line(&format!("%define {} {}", name, value));
    }

    /// `%define NAME` without a value
    pub fn define_flag(&mut self, name: &str) {
        self.line(&format!("%define {}", name));
    }

    /// `%define NAME value` with the name padded to a fixed column
    pub fn define_aligned(&mut self, name: &str, value: impl Display) {
        self.line(&format!("%define {:<19} {}", name, value));
    }

    /// Float constant as its bit pattern, with the value as a comment
    pub fn define_float_bits(&mut self, name: &str, value: f32) {
        self.define_aligned(
            name,
            format_args!("0x{:08X} ; {:.9}", f2i(value), f64::from(value)),
        );
    }

    /// Start a data section, followed by a blank line
    pub fn section(&mut self, name: &str, align: usize) {
        self.line(&format!("\n\tsection {} data align={}", name, align));
        self.blank();
    }

    pub fn label(&mut self, label: &str) {
        self.line(&format!("{}:", label));
    }

    pub fn comment(&mut self, text: &str) {
        self.line(&format!("\t; {}", text));
    }

    /// Comma-separated data row; nothing is written for an empty row
    pub fn data_row<T: Display>(&mut self, directive: &str, values: &[T]) {
        if values.is_empty() {
            return;
        }
        let row = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.line(&format!("\t{}\t{}", directive, row));
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Round a sample count up to the next multiple of 65536
///
/// Exact multiples still grow by one block.
fn round_up(samples: f64) -> i64 {
    ((samples as i64) & -0x10000) + 0x10000
}

/// Render the complete listing for `music`
pub fn export(music: &Music, context: &ExportContext) -> String {
    let mut w = AsmWriter::new();

    write_header(&mut w, music, context);
    write_instrument_params(&mut w, music);
    write_instrument_tones(&mut w, music);
    write_track_data(&mut w, music);
    streams::write_note_lists(&mut w, music, NoteStream::Lengths);
    streams::write_note_lists(&mut w, music, NoteStream::Samples);

    tracing::debug!(
        instruments = music.instruments.len(),
        tracks = music.track_order.len(),
        "exported listing"
    );
    w.finish()
}

fn write_header(w: &mut AsmWriter, music: &Music, context: &ExportContext) {
    w.line(&format!(
        "; Music converted from {} {}",
        context.source_name,
        context.timestamp.format("%Y-%m-%d %H:%M:%S")
    ));
    w.blank();
    w.define("MUSIC_LENGTH", music.length);
    w.define("TOTAL_SAMPLES", round_up(music.total_samples()));
    w.define(
        "MAX_TOTAL_INSTRUMENT_SAMPLES",
        round_up(music.max_total_samples as f64),
    );
    w.blank();
    w.define("SAMPLES_PER_TICK", music.samples_per_tick());
    w.define("TICKS_PER_SECOND", format_args!("{:.9}", 1.0 / music.ticklength));
    w.blank();
    w.define("NUM_TRACKS_WITH_REVERB", music.n_reverb_instruments);
    w.define(
        "NUM_TRACKS_WITHOUT_REVERB",
        music.instruments.len() - music.n_reverb_instruments,
    );

    if music.n_reverb_instruments > 0
        && let Some(reverb) = &music.reverb
    {
        w.blank();
        w.define_aligned("REVERB_NUM_DELAYS", reverb.num_delays);
        w.define_aligned("REVERB_MIN_DELAY", reverb.min_delay);
        w.define_aligned("REVERB_MAX_DELAY", reverb.max_delay);
        w.define_aligned("REVERB_ADD_DELAY", reverb.add_delay);
        w.define_aligned("REVERB_RANDOMSEED", reverb.random_seed);
        w.define_aligned("REVERB_MAX_DECAY", format_args!("{:.9}", reverb.max_decay));
        w.define_aligned("REVERB_DECAY_MUL", format_args!("{:.9}", reverb.decay_mul));
        w.define_float_bits("REVERB_FILTER_HIGH", reverb.filter_high);
        w.define_float_bits("REVERB_FILTER_LOW", reverb.filter_low);
        w.define_float_bits("REVERB_DAMPEN_HIGH", reverb.dampen_high);
        w.define_float_bits("REVERB_DAMPEN_LOW", reverb.dampen_low);
        w.define_float_bits("REVERB_VOLUME_LEFT", reverb.volumes[0]);
        w.define_float_bits("REVERB_VOLUME_RIGHT", reverb.volumes[1]);
    }

    if music.uses_panning {
        w.blank();
        w.define_flag("USES_PANNING");
    }
}

fn instrument_label(number: usize) -> String {
    format!(".i{:02}", number)
}

fn write_instrument_params(w: &mut AsmWriter, music: &Music) {
    w.blank();
    w.section("iparam", 4);
    w.label("_InstrumentParams");
    for instr in &music.instruments {
        w.label(&instrument_label(instr.number));
        w.comment(&instr.title());
        w.data_row(DD, &instr.paramblock);
    }
    w.blank();
}

fn write_instrument_tones(w: &mut AsmWriter, music: &Music) {
    w.blank();
    w.section("itones", 1);
    w.label("_InstrumentTones");
    for instr in &music.instruments {
        w.label(&instrument_label(instr.number));
        w.comment(&instr.title());

        let mut row = Vec::with_capacity(instr.tones.len() + 1);
        let mut prev_tone = 0;
        for &tone in &instr.tones {
            row.push(i64::from(tone - prev_tone));
            prev_tone = tone;
        }
        row.push(TONE_LIST_END + instr.columns as i64);
        w.data_row(DB, &row);
    }
}

fn write_track_data(w: &mut AsmWriter, music: &Music) {
    w.blank();
    w.section("trdata", 1);
    w.label("_TrackData");
    for track in music.ordered_tracks() {
        let Some(instr) = track.instrument.and_then(|n| music.instrument(n)) else {
            continue;
        };
        w.label(&format!(".t_{}_{}", track.label_name(), track.column));
        w.comment(&track.title());

        let quantum = i64::from(instr.velocity_quantum);
        let mut row = vec![track.stride().unwrap_or(0) as i64];
        let mut prev_tone_id = 0;
        for &(tone, velocity) in &track.tavs {
            let tone_id = instr.tone_index.get(&tone).copied().unwrap_or_default() as i64;
            let level = (i64::from(velocity) + quantum / 2) / quantum;
            row.push(tone_id - prev_tone_id);
            row.push(level);
            prev_tone_id = tone_id;
        }
        row.push(VOICE_TABLE_END);
        w.data_row(DB, &row);
    }
}
