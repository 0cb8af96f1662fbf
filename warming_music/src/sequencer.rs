// Pipeline orchestration: read -> downsample -> normalize -> bucketize -> encode.
//
// A `Sequencer` owns a validated `SonifyConfig` and renders one or more
// `Resolution`s per call. Each resolution is a one-shot pipeline that moves
// strictly forward through the `Stage`s; the first failing stage aborts it.
// `Mode::All` runs monthly, yearly and decade in that order, each re-reading
// the source, and stops at the first failure.
//
// `render` is the pure part (series in, notes out) and is deterministic: the
// same series and config always produce the same index sequence. `run` adds
// the file I/O around it. A file is written only after its whole sequence has
// been computed and encoded.

use crate::bucket::{OverflowPolicy, assign};
use crate::config::{ResolutionSettings, SonifyConfig};
use crate::downsample::average;
use crate::error::{Result, SonifyError};
use crate::midi::{NoteEvent, events_from_indices, write_midi};
use crate::normalize::build_thresholds;
use crate::reader::{Series, TableLayout, read_path};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// One output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Monthly,
    Yearly,
    Decade,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Monthly, Resolution::Yearly, Resolution::Decade];

    pub fn name(self) -> &'static str {
        match self {
            Resolution::Monthly => "monthly",
            Resolution::Yearly => "yearly",
            Resolution::Decade => "decade",
        }
    }

    /// Output path for this resolution: `<base>_<name>.mid`.
    pub fn output_path(self, base: &str) -> PathBuf {
        PathBuf::from(format!("{base}_{}.mid", self.name()))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to render: a single resolution or all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Monthly,
    Yearly,
    Decade,
    All,
}

impl Mode {
    /// Map the numeric selector (0 monthly, 1 yearly, 2 decade, 3 all).
    pub fn from_selector(selector: i64) -> Result<Self> {
        match selector {
            0 => Ok(Mode::Monthly),
            1 => Ok(Mode::Yearly),
            2 => Ok(Mode::Decade),
            3 => Ok(Mode::All),
            other => Err(SonifyError::invalid(format!(
                "unknown mode selector {other} (expected 0-3)"
            ))),
        }
    }

    pub fn resolutions(self) -> &'static [Resolution] {
        match self {
            Mode::Monthly => &[Resolution::Monthly],
            Mode::Yearly => &[Resolution::Yearly],
            Mode::Decade => &[Resolution::Decade],
            Mode::All => &[Resolution::Monthly, Resolution::Yearly, Resolution::Decade],
        }
    }
}

impl FromStr for Mode {
    type Err = SonifyError;

    /// Accepts either the numeric selector or a mode name.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(selector) = s.parse::<i64>() {
            return Mode::from_selector(selector);
        }
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Mode::Monthly),
            "yearly" => Ok(Mode::Yearly),
            "decade" => Ok(Mode::Decade),
            "all" => Ok(Mode::All),
            other => Err(SonifyError::invalid(format!("unknown mode '{other}'"))),
        }
    }
}

/// Pipeline stages, in the order a resolution passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Downsampling,
    Normalizing,
    Bucketizing,
    Encoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reading => "reading",
            Stage::Downsampling => "downsampling",
            Stage::Normalizing => "normalizing",
            Stage::Bucketizing => "bucketizing",
            Stage::Encoding => "encoding",
        };
        f.write_str(name)
    }
}

/// In-memory result of rendering one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub resolution: Resolution,
    /// The series after averaging.
    pub values: Vec<f64>,
    pub indices: Vec<i32>,
    /// Positions in `values` that exceeded every threshold.
    pub overflowed: Vec<usize>,
    pub events: Vec<NoteEvent>,
}

/// A file written by `Sequencer::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub resolution: Resolution,
    pub path: PathBuf,
    pub notes: usize,
    pub overflowed: usize,
}

pub struct Sequencer {
    config: SonifyConfig,
}

impl Sequencer {
    /// Build a sequencer, rejecting configs the pipeline cannot honour.
    pub fn new(config: SonifyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Sequencer { config })
    }

    pub fn config(&self) -> &SonifyConfig {
        &self.config
    }

    pub fn settings(&self, resolution: Resolution) -> ResolutionSettings {
        match resolution {
            Resolution::Monthly => self.config.monthly,
            Resolution::Yearly => self.config.yearly,
            Resolution::Decade => self.config.decade,
        }
    }

    fn layout(&self) -> TableLayout {
        TableLayout::with_sentinel(self.config.missing_sentinel.clone())
    }

    /// Turn a series into notes for one resolution. No I/O.
    pub fn render(&self, resolution: Resolution, series: &Series) -> Result<Rendering> {
        let settings = self.settings(resolution);

        debug!(stage = %Stage::Downsampling, %resolution, step = settings.step);
        let values = average(series.values(), settings.step)?;
        if values.is_empty() {
            return Err(SonifyError::invalid(format!(
                "{resolution}: {} readings do not fill a single window of {}",
                series.len(),
                settings.step
            )));
        }

        debug!(stage = %Stage::Normalizing, %resolution, values = values.len());
        let table = build_thresholds(&values, self.config.min_note, self.config.max_note)?;

        debug!(stage = %Stage::Bucketizing, %resolution, policy = %self.config.overflow);
        let assignment = assign(&values, &table, self.config.overflow);
        if !assignment.overflowed.is_empty() {
            let action = match self.config.overflow {
                OverflowPolicy::Drop => "dropped",
                OverflowPolicy::Clamp => "clamped",
            };
            warn!(
                %resolution,
                positions = ?assignment.overflowed,
                "{} value(s) above the top threshold {action}",
                assignment.overflowed.len()
            );
        }

        let events = events_from_indices(
            &assignment.indices,
            settings.duration,
            self.config.velocity,
        )?;
        Ok(Rendering {
            resolution,
            values,
            indices: assignment.indices,
            overflowed: assignment.overflowed,
            events,
        })
    }

    /// Read `source`, render `resolution`, and write its MIDI file.
    pub fn run_resolution(&self, resolution: Resolution, source: &Path) -> Result<RenderReport> {
        info!(%resolution, source = %source.display(), "creating sequence");

        debug!(stage = %Stage::Reading, %resolution);
        let series = read_path(source, &self.layout())?;
        let rendering = self.render(resolution, &series)?;

        debug!(stage = %Stage::Encoding, %resolution, notes = rendering.events.len());
        let path = resolution.output_path(&self.config.output_base);
        write_midi(&rendering.events, self.config.tempo_bpm, resolution.name(), &path)?;

        info!(path = %path.display(), notes = rendering.indices.len(), "created");
        Ok(RenderReport {
            resolution,
            path,
            notes: rendering.indices.len(),
            overflowed: rendering.overflowed.len(),
        })
    }

    /// Render every resolution `mode` names, in order, stopping at the first
    /// failure.
    pub fn run(&self, mode: Mode, source: &Path) -> Result<Vec<RenderReport>> {
        info!(?mode, "performing");
        mode.resolutions()
            .iter()
            .map(|&resolution| self.run_resolution(resolution, source))
            .collect()
    }
}

/// Entry point mirroring the numeric dispatch: resolve `selector`, build a
/// sequencer from `config`, and run it against `source`.
pub fn run(selector: i64, source: &Path, config: SonifyConfig) -> Result<Vec<RenderReport>> {
    let mode = Mode::from_selector(selector)?;
    Sequencer::new(config)?.run(mode, source)
}
