//! Conversion statistics
//!
//! A human-readable summary printed after conversion: what every
//! instrument and track contributes, and an estimate of the synthesis
//! time the player will need before the music can start.

use core::fmt::Write;

use crate::music::Music;
use crate::note::note_name;

/// Burden units a fast CPU renders per second
pub const BURDEN_PER_SECOND: f64 = 5000.0;

const YELLOW: u8 = 33;
const RED: u8 = 31;
const CYAN: u8 = 36;
const GREEN: u8 = 32;
const BLUE: u8 = 34;
const MAGENTA: u8 = 35;

#[derive(Debug, Clone, Copy)]
struct Palette {
    ansi: bool,
}

impl Palette {
    fn paint(self, color: u8, text: impl core::fmt::Display) -> String {
        if self.ansi {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn times(self) -> String {
        self.paint(BLUE, "x")
    }
}

/// Render the statistics of `music`, optionally with ANSI colours
pub fn format_report(music: &Music, ansi: bool) -> String {
    let c = Palette { ansi };
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Music length: {} ticks at {:.2} ticks per minute",
        music.length,
        60.0 / music.ticklength
    );

    let mut total_burden = 0.0;
    let mut current = None;
    for (ti, track) in music.ordered_tracks().enumerate() {
        if music.n_reverb_tracks > 0 && ti == 0 {
            let _ = writeln!(out, "\nTracks with reverb:");
        }
        if music.n_reverb_tracks > 0 && ti == music.n_reverb_tracks {
            let _ = writeln!(out, "\nTracks without reverb:");
        }

        if track.instrument != current {
            current = track.instrument;
            if let Some(instr) = track.instrument.and_then(|n| music.instrument(n)) {
                let modes = instr.paramblock.first().map_or(0.0, |p| p.as_f64());
                let fat = instr.paramblock.get(1).map_or(0.0, |p| p.as_f64());
                let longest = instr.longest_seconds();
                let burden = instr.burden();
                total_burden += burden;

                let _ = writeln!(out);
                let _ = writeln!(out, "{}", c.paint(GREEN, instr.title()));
                let x = c.times();
                let _ = writeln!(
                    out,
                    " Burden:     modes {x} fat {x} tones {x} longest = {} {x} {} {x} {} {x} {:.3} = {}",
                    modes,
                    fat,
                    instr.tones.len(),
                    longest,
                    c.paint(MAGENTA, format_args!("{:.0}", burden)),
                );

                let mut tones = String::new();
                for tone in &instr.tones {
                    let count = instr.tone_counts.get(tone).copied().unwrap_or(0);
                    let _ = write!(tones, " {}:{}", c.paint(YELLOW, note_name(*tone)), count);
                }
                let _ = writeln!(out, " Tones:     {}", tones);

                let mut velocities = String::new();
                for velocity in &instr.velocities {
                    let count = instr.velocity_counts.get(velocity).copied().unwrap_or(0);
                    let _ = write!(
                        velocities,
                        " {}:{}",
                        c.paint(RED, format_args!("{:02X}", velocity)),
                        count
                    );
                }
                let bits = c.paint(RED, format_args!("({} bits)", instr.velocity_bits()));
                let _ = writeln!(out, " Velocities:{} {}", velocities, bits);
            }
        }

        let _ = writeln!(out, " {}", c.paint(GREEN, track.title()));

        let mut lengths = String::new();
        for (length, count) in &track.note_lengths {
            let _ = write!(lengths, " {}:{}", c.paint(CYAN, length), count);
        }
        let _ = writeln!(out, "  Lengths:  {}", lengths);

        let mut notes = String::new();
        for &(tone, velocity) in &track.tavs {
            let _ = write!(
                notes,
                " {}/{}:{}",
                c.paint(YELLOW, note_name(tone)),
                c.paint(RED, format_args!("{:02X}", velocity)),
                track.tav_note_count((tone, velocity))
            );
        }
        let _ = writeln!(out, "  Notes:    {}", notes);
    }

    let seconds = (total_burden / BURDEN_PER_SECOND).round() as i64;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total burden: {} (approximately {} on a fast CPU)",
        c.paint(MAGENTA, format_args!("{:.0}", total_burden)),
        c.paint(MAGENTA, format_args!("{}m{:02}s", seconds / 60, seconds % 60)),
    );
    out
}
