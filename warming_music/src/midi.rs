// MIDI output from note events.
//
// Converts a list of `NoteEvent`s into a Standard MIDI File (SMF) with a
// single track: a track name, a tempo event at tick 0, one NoteOn/NoteOff
// pair per event on channel 0, and an end-of-track marker. Event times are in
// beats (quarter notes) and map to ticks at `TICKS_PER_QUARTER`.
//
// Notes follow each other back to back, so a NoteOff and the next NoteOn
// usually share a tick; the NoteOff is always written first.
//
// The file is serialised into memory and written in one call, so a failed
// encode never leaves a file behind.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 0.

use crate::config::MIDI_MAX;
use crate::error::{Result, SonifyError};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 960;

/// Largest delta-time a track event can carry.
const MAX_DELTA_TICKS: u32 = (1 << 28) - 1;

/// Largest tempo meta value (microseconds per quarter note, 24 bits).
const MAX_TEMPO_MICROSECONDS: u32 = (1 << 24) - 1;

/// Slowest tempo whose quarter note fits the 24-bit tempo field
/// (60_000_000 / 4 = 15_000_000 us, 60_000_000 / 3 = 20_000_000 us).
pub const MIN_TEMPO_BPM: u16 = 4;

/// Longest note, in beats, whose length fits a single delta-time.
pub const MAX_DURATION_BEATS: u32 = MAX_DELTA_TICKS / TICKS_PER_QUARTER as u32;

/// One timed note, ready for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub note: i32,
    /// Start time in beats.
    pub start: u32,
    /// Length in beats.
    pub duration: u32,
    pub velocity: u8,
}

/// Lay out `indices` back to back: the note at position `p` starts at beat
/// `p * duration`. Fails if a start time does not fit in `u32` beats.
pub fn events_from_indices(
    indices: &[i32],
    duration: u32,
    velocity: u8,
) -> Result<Vec<NoteEvent>> {
    indices
        .iter()
        .zip(0u32..)
        .map(|(&note, position)| {
            let start = position.checked_mul(duration).ok_or_else(|| {
                SonifyError::invalid(format!(
                    "note {position} of {duration} beats starts past the end of the timeline"
                ))
            })?;
            Ok(NoteEvent {
                note,
                start,
                duration,
                velocity,
            })
        })
        .collect()
}

/// Encode events into SMF bytes.
pub fn encode(events: &[NoteEvent], tempo_bpm: u16, track_name: &str) -> Result<Vec<u8>> {
    let smf = events_to_smf(events, tempo_bpm, track_name.as_bytes())?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)
        .map_err(|e| SonifyError::io("<in-memory MIDI buffer>", e))?;
    Ok(buf)
}

/// Encode events and write them to `path`.
pub fn write_midi(
    events: &[NoteEvent],
    tempo_bpm: u16,
    track_name: &str,
    path: &Path,
) -> Result<()> {
    let buf = encode(events, tempo_bpm, track_name)?;
    std::fs::write(path, &buf).map_err(|e| SonifyError::io(path, e))?;
    Ok(())
}

fn to_u7(value: i32, what: &str) -> Result<u7> {
    if (0..=MIDI_MAX).contains(&value) {
        Ok(u7::new(value as u8))
    } else {
        Err(SonifyError::invalid(format!(
            "{what} {value} outside MIDI range 0..={MIDI_MAX}"
        )))
    }
}

/// Convert events to an in-memory single-track SMF.
fn events_to_smf<'a>(
    events: &[NoteEvent],
    tempo_bpm: u16,
    track_name: &'a [u8],
) -> Result<Smf<'a>> {
    let tempo_microseconds = 60_000_000u32
        .checked_div(u32::from(tempo_bpm))
        .filter(|&us| us <= MAX_TEMPO_MICROSECONDS)
        .ok_or_else(|| {
            SonifyError::invalid(format!(
                "tempo {tempo_bpm} BPM is below the MIDI minimum of {MIN_TEMPO_BPM}"
            ))
        })?;

    // (absolute tick, is NoteOn, message); NoteOff sorts before NoteOn.
    let mut timed: Vec<(u64, bool, MidiMessage)> = Vec::with_capacity(events.len() * 2);
    for event in events {
        let key = to_u7(event.note, "note")?;
        let vel = to_u7(i32::from(event.velocity), "velocity")?;
        let on_tick = u64::from(event.start) * u64::from(TICKS_PER_QUARTER);
        let off_tick = on_tick + u64::from(event.duration) * u64::from(TICKS_PER_QUARTER);
        timed.push((on_tick, true, MidiMessage::NoteOn { key, vel }));
        let off = MidiMessage::NoteOff {
            key,
            vel: u7::new(0),
        };
        timed.push((off_tick, false, off));
    }
    timed.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

    let mut track: Track<'a> = Vec::with_capacity(timed.len() + 3);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(track_name)),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });

    let channel = u4::new(0);
    let mut last_tick = 0u64;
    for (tick, _, message) in timed {
        let delta = tick - last_tick;
        if delta > u64::from(MAX_DELTA_TICKS) {
            return Err(SonifyError::invalid(format!(
                "gap of {delta} ticks does not fit in a MIDI delta time"
            )));
        }
        track.push(TrackEvent {
            delta: u28::new(delta as u32),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    smf.tracks.push(track);
    Ok(smf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_events(track: &Track<'_>) -> Vec<(u32, MidiMessage)> {
        let mut tick = 0u32;
        let mut out = Vec::new();
        for event in track {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = event.kind {
                out.push((tick, message));
            }
        }
        out
    }

    #[test]
    fn test_events_are_back_to_back() {
        let events = events_from_indices(&[60, 62, 64], 12, 90).unwrap();
        let starts: Vec<u32> = events.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![0, 12, 24]);
        assert!(events.iter().all(|e| e.duration == 12 && e.velocity == 90));
    }

    #[test]
    fn test_single_track_with_tempo() {
        let events = events_from_indices(&[60, 64], 1, 100).unwrap();
        let smf = events_to_smf(&events, 120, b"monthly").unwrap();
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(tempo_of(&smf), Some(500_000));
        assert!(matches!(
            smf.tracks[0].last().map(|e| e.kind),
            Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
        ));
    }

    #[test]
    fn test_note_off_precedes_next_note_on() {
        let events = events_from_indices(&[60, 67], 2, 100).unwrap();
        let smf = events_to_smf(&events, 120, b"t").unwrap();
        let notes = note_events(&smf.tracks[0]);
        let ticks: Vec<u32> = notes.iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, vec![0, 1920, 1920, 3840]);
        assert!(matches!(
            notes[1].1,
            MidiMessage::NoteOff { key, .. } if key.as_int() == 60
        ));
        assert!(matches!(
            notes[2].1,
            MidiMessage::NoteOn { key, .. } if key.as_int() == 67
        ));
    }

    #[test]
    fn test_out_of_range_note_rejected() {
        let events = events_from_indices(&[128], 1, 100).unwrap();
        assert!(matches!(
            events_to_smf(&events, 120, b"t"),
            Err(SonifyError::InvalidArgument(_))
        ));
    }

    fn tempo_of(smf: &Smf<'_>) -> Option<u32> {
        smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        })
    }

    #[test]
    fn test_tempo_below_24_bit_range_rejected() {
        for bpm in [0, 1, 2, 3] {
            assert!(
                matches!(encode(&[], bpm, "t"), Err(SonifyError::InvalidArgument(_))),
                "{bpm} BPM should be rejected"
            );
        }
    }

    #[test]
    fn test_slowest_tempo_written_exactly() {
        let events = events_from_indices(&[60], 1, 100).unwrap();
        let bytes = encode(&events, MIN_TEMPO_BPM, "t").unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(tempo_of(&smf), Some(15_000_000));
    }

    #[test]
    fn test_start_overflow_is_error() {
        let result = events_from_indices(&[60; 1000], 5_000_000, 100);
        assert!(matches!(result, Err(SonifyError::InvalidArgument(_))));
    }

    #[test]
    fn test_longest_note_fits_delta() {
        let events = events_from_indices(&[60, 62], MAX_DURATION_BEATS, 100).unwrap();
        let bytes = encode(&events, 120, "t").unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let notes = note_events(&smf.tracks[0]);
        let expected = MAX_DURATION_BEATS * u32::from(TICKS_PER_QUARTER);
        assert_eq!(notes[1].0, expected);
        assert_eq!(notes[3].0, 2 * expected);
    }

    #[test]
    fn test_encoded_bytes_parse_back() {
        let events = events_from_indices(&[24, 30, 96], 120, 112).unwrap();
        let bytes = encode(&events, 160, "decade").unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        let ons = note_events(&smf.tracks[0])
            .into_iter()
            .filter(|(_, m)| matches!(m, MidiMessage::NoteOn { .. }))
            .count();
        assert_eq!(ons, 3);
    }
}
