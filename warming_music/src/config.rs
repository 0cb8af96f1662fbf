// Run configuration.
//
// Everything the pipeline needs beyond the source path lives in
// `SonifyConfig`: output naming, tempo, velocity, the note range, the
// missing-value token, the overflow policy, and the averaging step and note
// duration of each resolution. The sequencer takes it by value at
// construction; there is no global state.
//
// Configs can be loaded from JSON. Every field has a default
// (`#[serde(default)]`), so a file only names what it changes:
//
//   { "tempo_bpm": 160, "velocity": 112, "min_note": 24, "max_note": 96 }
//
// Defaults: base name `just_warming_up`, 120 BPM, velocity 100, notes 0..127,
// monthly/yearly/decade steps and durations of 1, 12 and 120.

use crate::bucket::OverflowPolicy;
use crate::error::{Result, SonifyError};
use crate::midi::{MAX_DURATION_BEATS, MIN_TEMPO_BPM};
use crate::reader::DEFAULT_MISSING_SENTINEL;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_OUTPUT_BASE: &str = "just_warming_up";
pub const DEFAULT_TEMPO_BPM: u16 = 120;
pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_MIN_NOTE: i32 = 0;
pub const DEFAULT_MAX_NOTE: i32 = 127;

/// Highest note number or velocity representable in MIDI.
pub const MIDI_MAX: i32 = 127;

/// How one resolution condenses the series and how long each note lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    /// Readings averaged into one note.
    pub step: usize,
    /// Note length in beats.
    pub duration: u32,
}

impl ResolutionSettings {
    pub const fn new(step: usize, duration: u32) -> Self {
        ResolutionSettings { step, duration }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SonifyConfig {
    /// Output files are named `<output_base>_<resolution>.mid`.
    pub output_base: String,
    pub tempo_bpm: u16,
    pub velocity: u8,
    /// Lowest note index produced.
    pub min_note: i32,
    /// Upper end of the note range. Only reached under `OverflowPolicy::Clamp`.
    pub max_note: i32,
    pub missing_sentinel: String,
    pub overflow: OverflowPolicy,
    pub monthly: ResolutionSettings,
    pub yearly: ResolutionSettings,
    pub decade: ResolutionSettings,
}

impl Default for SonifyConfig {
    fn default() -> Self {
        SonifyConfig {
            output_base: DEFAULT_OUTPUT_BASE.to_string(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            velocity: DEFAULT_VELOCITY,
            min_note: DEFAULT_MIN_NOTE,
            max_note: DEFAULT_MAX_NOTE,
            missing_sentinel: DEFAULT_MISSING_SENTINEL.to_string(),
            overflow: OverflowPolicy::Drop,
            monthly: ResolutionSettings::new(1, 1),
            yearly: ResolutionSettings::new(12, 12),
            decade: ResolutionSettings::new(120, 120),
        }
    }
}

impl SonifyConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| SonifyError::io(path, e))?;
        serde_json::from_str(&data).map_err(|source| SonifyError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every field against what the pipeline and MIDI can express.
    pub fn validate(&self) -> Result<()> {
        if self.output_base.is_empty() {
            return Err(SonifyError::invalid("output base name is empty"));
        }
        if self.tempo_bpm < MIN_TEMPO_BPM {
            return Err(SonifyError::invalid(format!(
                "tempo {} BPM is below the MIDI minimum of {MIN_TEMPO_BPM}",
                self.tempo_bpm
            )));
        }
        if i32::from(self.velocity) > MIDI_MAX {
            return Err(SonifyError::invalid(format!(
                "velocity {} exceeds {MIDI_MAX}",
                self.velocity
            )));
        }
        if self.min_note < 0 || self.max_note > MIDI_MAX {
            return Err(SonifyError::invalid(format!(
                "note range {}..{} outside 0..{MIDI_MAX}",
                self.min_note, self.max_note
            )));
        }
        if self.max_note <= self.min_note {
            return Err(SonifyError::invalid(format!(
                "min note {} must be below max note {}",
                self.min_note, self.max_note
            )));
        }
        for (name, settings) in [
            ("monthly", self.monthly),
            ("yearly", self.yearly),
            ("decade", self.decade),
        ] {
            if settings.step == 0 || settings.duration == 0 {
                return Err(SonifyError::invalid(format!(
                    "{name} step and duration must both be at least 1"
                )));
            }
            if settings.duration > MAX_DURATION_BEATS {
                return Err(SonifyError::invalid(format!(
                    "{name} duration {} exceeds {MAX_DURATION_BEATS} beats",
                    settings.duration
                )));
            }
        }
        Ok(())
    }
}
