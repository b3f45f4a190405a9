//! Read note sequences from MIDI files and write sequences back out.
//!
//! Reading keeps only note-on events with non-zero velocity, which is all
//! the network analysis needs. Writing produces a single-track SMF with
//! evenly spaced notes.

use std::path::Path;

use anyhow::{Context, Result};
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::corpus::preprocess::atomic_write;
use crate::corpus::CorpusError;

/// Ticks per quarter note in written files.
const TICKS_PER_QUARTER: u16 = 480;

/// Note-on pitches (velocity > 0) of every track, track by track.
pub fn note_sequence_from_bytes(data: &[u8]) -> Result<Vec<i32>> {
    let smf = Smf::parse(data).map_err(|e| anyhow::anyhow!("Failed to parse MIDI: {}", e))?;

    let mut notes = Vec::new();
    for track in &smf.tracks {
        for event in track {
            if let TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, vel },
                ..
            } = event.kind
            {
                if vel.as_int() > 0 {
                    notes.push(key.as_int() as i32);
                }
            }
        }
    }
    Ok(notes)
}

/// Read a MIDI file and return its note-on pitches.
pub fn read_note_sequence(path: &Path) -> Result<Vec<i32>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MIDI file: {}", path.display()))?;
    note_sequence_from_bytes(&data).with_context(|| format!("Invalid MIDI file: {}", path.display()))
}

/// Layout of a written solo.
#[derive(Debug, Clone)]
pub struct SoloMidiOptions {
    pub track_name: String,
    pub tempo_bpm: u32,
    /// Length of every note in beats
    pub note_beats: f64,
    pub velocity: u8,
    pub channel: u8,
}

impl Default for SoloMidiOptions {
    fn default() -> Self {
        Self {
            track_name: "Generated Solo".to_string(),
            tempo_bpm: 120,
            note_beats: 0.5,
            velocity: 100,
            channel: 0,
        }
    }
}

/// Microseconds per beat as a 24-bit tempo value.
fn tempo_value(bpm: u32) -> Result<u24, CorpusError> {
    if bpm == 0 {
        return Err(CorpusError::TempoOutOfRange(bpm));
    }
    u24::try_from(60_000_000 / bpm).ok_or(CorpusError::TempoOutOfRange(bpm))
}

/// Note length in ticks as a 28-bit delta time, at least one tick.
fn note_length_value(beats: f64) -> Result<u28, CorpusError> {
    let ticks = (beats * TICKS_PER_QUARTER as f64).round().max(1.0);
    if ticks > u28::max_value().as_int() as f64 {
        return Err(CorpusError::NoteLengthOutOfRange(beats));
    }
    Ok(u28::new(ticks as u32))
}

/// Build an in-memory single-track SMF. Notes play back to back.
pub fn sequence_to_smf<'a>(notes: &[i32], options: &'a SoloMidiOptions) -> Result<Smf<'a>> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let channel = u4::new(options.channel.min(15));
    let velocity = u7::new(options.velocity.min(127));
    let tempo = tempo_value(options.tempo_bpm)?;
    let note_ticks = note_length_value(options.note_beats)?;

    let mut track: Track<'a> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(options.track_name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(tempo)),
        },
    ];

    for &note in notes {
        let key = u8::try_from(note)
            .ok()
            .filter(|k| *k <= 127)
            .ok_or(CorpusError::NoteOutOfRange(note))?;
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key: u7::new(key), vel: velocity },
            },
        });
        track.push(TrackEvent {
            delta: note_ticks,
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(0) },
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    Ok(smf)
}

/// Write `notes` to `path` as a single-track MIDI file.
pub fn write_note_sequence(notes: &[i32], path: &Path, options: &SoloMidiOptions) -> Result<()> {
    let smf = sequence_to_smf(notes, options)?;
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to encode MIDI: {}", e))?;
    atomic_write(path, &buf)
        .with_context(|| format!("Failed to write MIDI file: {}", path.display()))?;
    log::info!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}
