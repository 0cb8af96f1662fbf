// Just Warming Up: surface-temperature sonification.
//
// Turns a GISTEMP-style table of monthly temperature anomalies into MIDI note
// sequences at monthly, yearly and decade resolution. Each resolution is a
// short deterministic pipeline: read the readings, average them over fixed
// windows, map the value range linearly onto a note range, bucket every value
// to a note, and write the notes back to back as a single-track MIDI file.
//
// Architecture:
// - error.rs: `SonifyError` taxonomy (parse / invalid argument / I/O)
// - config.rs: `SonifyConfig`, JSON-loadable run parameters and defaults
// - reader.rs: CSV table -> `Series` of finite readings, sentinel cells skipped
// - downsample.rs: block averaging over complete windows
// - normalize.rs: `ThresholdTable` from a series' min/max and the note range
// - bucket.rs: value -> note index, with the `OverflowPolicy` for values
//   above every threshold
// - midi.rs: `NoteEvent`s -> Standard MIDI File bytes
// - sequencer.rs: `Mode`/`Resolution` dispatch and pipeline orchestration
// - logging.rs: `tracing-subscriber` setup for the binary
//
// Output is deterministic: identical input and config give identical files.

pub mod bucket;
pub mod config;
pub mod downsample;
pub mod error;
pub mod logging;
pub mod midi;
pub mod normalize;
pub mod reader;
pub mod sequencer;

pub use config::SonifyConfig;
pub use error::{Result, SonifyError};
pub use sequencer::{Mode, RenderReport, Resolution, Sequencer, run};
