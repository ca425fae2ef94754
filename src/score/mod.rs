//! Score model
//!
//! Owned, in-memory representation of a Standard MIDI File: a header
//! (format + time division) and an ordered list of tracks, each an ordered
//! list of events carrying a relative tick delta.
//!
//! Decoding and encoding go through `midly` (see [`smf`]); everything else in
//! the crate works on these owned types so scores can be filtered, cloned and
//! shipped across worker threads freely.

mod smf;

pub use midly::{Format, Header, MidiMessage, SmpteTime, Timing};

use thiserror::Error;

/// Largest delta a track event can carry on the wire (28-bit VLQ).
pub const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// The General MIDI percussion channel (channel 10 in 1-indexed terms)
pub const DRUM_CHANNEL: u8 = 9;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("midi parse error: {0}")]
    Parse(String),
    #[error("midi write error: {0}")]
    Write(String),
    #[error("delta of {delta} ticks in track {track} exceeds the 28-bit limit")]
    DeltaOverflow { track: usize, delta: u32 },
}

pub type Result<T> = std::result::Result<T, ScoreError>;

/// A multi-track score
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub header: Header,
    pub tracks: Vec<Track>,
}

/// One track: events in playback order, each timed relative to its predecessor
pub type Track = Vec<Event>;

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub delta: u32, // Ticks since the previous event in the same track
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Channel voice message (note on/off, program change, controllers...)
    Channel { channel: u8, message: MidiMessage },
    Meta(MetaEvent),
    SysEx(Vec<u8>),
    Escape(Vec<u8>),
}

/// Owned mirror of `midly::MetaMessage`
#[derive(Debug, Clone, PartialEq)]
pub enum MetaEvent {
    TrackNumber(Option<u16>),
    Text(Vec<u8>),
    Copyright(Vec<u8>),
    TrackName(Vec<u8>),
    InstrumentName(Vec<u8>),
    Lyric(Vec<u8>),
    Marker(Vec<u8>),
    CuePoint(Vec<u8>),
    ProgramName(Vec<u8>),
    DeviceName(Vec<u8>),
    MidiChannel(u8),
    MidiPort(u8),
    EndOfTrack,
    /// Microseconds per quarter note
    Tempo(u32),
    SmpteOffset(SmpteTime),
    /// (numerator, log2 denominator, clocks per click, 32nds per quarter)
    TimeSignature(u8, u8, u8, u8),
    KeySignature(i8, bool),
    SequencerSpecific(Vec<u8>),
    Unknown(u8, Vec<u8>),
}

impl Score {
    /// Create an empty Format 1 score with metrical timing
    pub fn new(ticks_per_beat: u16) -> Self {
        Score {
            header: Header::new(Format::Parallel, Timing::Metrical(ticks_per_beat.into())),
            tracks: Vec::new(),
        }
    }

    /// Decode SMF bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        smf::decode(bytes)
    }

    /// Encode as SMF bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        smf::encode(self)
    }

    /// Iterate over every event of every track
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.tracks.iter().flat_map(|track| track.iter())
    }
}

impl Event {
    pub fn new(delta: u32, kind: EventKind) -> Self {
        Event { delta, kind }
    }

    pub fn channel(delta: u32, channel: u8, message: MidiMessage) -> Self {
        Event::new(delta, EventKind::Channel { channel, message })
    }

    pub fn meta(delta: u32, meta: MetaEvent) -> Self {
        Event::new(delta, EventKind::Meta(meta))
    }

    pub fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> Self {
        Event::channel(
            delta,
            channel,
            MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        )
    }

    pub fn note_off(delta: u32, channel: u8, key: u8) -> Self {
        Event::channel(
            delta,
            channel,
            MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        )
    }

    pub fn program_change(delta: u32, channel: u8, program: u8) -> Self {
        Event::channel(
            delta,
            channel,
            MidiMessage::ProgramChange {
                program: program.into(),
            },
        )
    }
}

impl EventKind {
    /// The MIDI channel this event addresses; `None` for meta/sysex events
    pub fn channel(&self) -> Option<u8> {
        match self {
            EventKind::Channel { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    /// Program number if this is a program change
    pub fn program_change(&self) -> Option<(u8, u8)> {
        match self {
            EventKind::Channel {
                channel,
                message: MidiMessage::ProgramChange { program },
            } => Some((*channel, program.as_int())),
            _ => None,
        }
    }

    /// True for a note-on that actually sounds (velocity above zero).
    /// A note-on with velocity 0 is a note-off by MIDI convention.
    pub fn is_sounding_note_on(&self) -> bool {
        matches!(
            self,
            EventKind::Channel {
                message: MidiMessage::NoteOn { vel, .. },
                ..
            } if vel.as_int() > 0
        )
    }
}

/// Absolute tick time of every event in a track (running sum of deltas)
pub fn absolute_times(track: &[Event]) -> Vec<u64> {
    let mut tick = 0u64;
    track
        .iter()
        .map(|event| {
            tick += event.delta as u64;
            tick
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_times() {
        let track = vec![
            Event::meta(0, MetaEvent::Tempo(500_000)),
            Event::note_on(10, 0, 60, 64),
            Event::note_off(480, 0, 60),
            Event::meta(0, MetaEvent::EndOfTrack),
        ];
        assert_eq!(absolute_times(&track), vec![0, 10, 490, 490]);
    }

    #[test]
    fn test_event_channel() {
        assert_eq!(Event::note_on(0, 3, 60, 64).kind.channel(), Some(3));
        assert_eq!(Event::meta(0, MetaEvent::EndOfTrack).kind.channel(), None);
        assert_eq!(EventKind::SysEx(vec![0x7E]).channel(), None);
    }

    #[test]
    fn test_sounding_note_on() {
        assert!(Event::note_on(0, 0, 60, 1).kind.is_sounding_note_on());
        // Velocity 0 note-on is a note-off
        assert!(!Event::note_on(0, 0, 60, 0).kind.is_sounding_note_on());
        assert!(!Event::note_off(0, 0, 60).kind.is_sounding_note_on());
        assert!(!Event::program_change(0, 0, 1).kind.is_sounding_note_on());
    }

    #[test]
    fn test_program_change_accessor() {
        assert_eq!(Event::program_change(0, 4, 33).kind.program_change(), Some((4, 33)));
        assert_eq!(Event::note_on(0, 4, 60, 64).kind.program_change(), None);
    }
}
