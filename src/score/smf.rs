use super::{Event, EventKind, MetaEvent, Result, Score, ScoreError, MAX_DELTA};
use midly::{MetaMessage, Smf, TrackEvent, TrackEventKind};

/// Parse SMF bytes into an owned Score
pub fn decode(bytes: &[u8]) -> Result<Score> {
    let smf = Smf::parse(bytes).map_err(|e| ScoreError::Parse(e.to_string()))?;

    let tracks = smf
        .tracks
        .iter()
        .map(|track| track.iter().map(event_from_midly).collect())
        .collect();

    Ok(Score {
        header: smf.header,
        tracks,
    })
}

/// Serialize a Score to SMF bytes
pub fn encode(score: &Score) -> Result<Vec<u8>> {
    let mut tracks = Vec::with_capacity(score.tracks.len());
    for (index, track) in score.tracks.iter().enumerate() {
        let mut events = Vec::with_capacity(track.len());
        for event in track {
            if event.delta > MAX_DELTA {
                return Err(ScoreError::DeltaOverflow {
                    track: index,
                    delta: event.delta,
                });
            }
            events.push(TrackEvent {
                delta: event.delta.into(),
                kind: kind_to_midly(&event.kind),
            });
        }
        tracks.push(events);
    }

    let smf = Smf {
        header: score.header,
        tracks,
    };

    let mut out = Vec::new();
    smf.write(&mut out)
        .map_err(|e| ScoreError::Write(e.to_string()))?;
    Ok(out)
}

fn event_from_midly(event: &TrackEvent) -> Event {
    let kind = match event.kind {
        TrackEventKind::Midi { channel, message } => EventKind::Channel {
            channel: channel.as_int(),
            message,
        },
        TrackEventKind::SysEx(data) => EventKind::SysEx(data.to_vec()),
        TrackEventKind::Escape(data) => EventKind::Escape(data.to_vec()),
        TrackEventKind::Meta(ref meta) => EventKind::Meta(meta_from_midly(meta)),
    };
    Event {
        delta: event.delta.as_int(),
        kind,
    }
}

fn meta_from_midly(meta: &MetaMessage) -> MetaEvent {
    match *meta {
        MetaMessage::TrackNumber(n) => MetaEvent::TrackNumber(n),
        MetaMessage::Text(t) => MetaEvent::Text(t.to_vec()),
        MetaMessage::Copyright(t) => MetaEvent::Copyright(t.to_vec()),
        MetaMessage::TrackName(t) => MetaEvent::TrackName(t.to_vec()),
        MetaMessage::InstrumentName(t) => MetaEvent::InstrumentName(t.to_vec()),
        MetaMessage::Lyric(t) => MetaEvent::Lyric(t.to_vec()),
        MetaMessage::Marker(t) => MetaEvent::Marker(t.to_vec()),
        MetaMessage::CuePoint(t) => MetaEvent::CuePoint(t.to_vec()),
        MetaMessage::ProgramName(t) => MetaEvent::ProgramName(t.to_vec()),
        MetaMessage::DeviceName(t) => MetaEvent::DeviceName(t.to_vec()),
        MetaMessage::MidiChannel(c) => MetaEvent::MidiChannel(c.as_int()),
        MetaMessage::MidiPort(p) => MetaEvent::MidiPort(p.as_int()),
        MetaMessage::EndOfTrack => MetaEvent::EndOfTrack,
        MetaMessage::Tempo(t) => MetaEvent::Tempo(t.as_int()),
        MetaMessage::SmpteOffset(s) => MetaEvent::SmpteOffset(s),
        MetaMessage::TimeSignature(n, d, c, b) => MetaEvent::TimeSignature(n, d, c, b),
        MetaMessage::KeySignature(sf, minor) => MetaEvent::KeySignature(sf, minor),
        MetaMessage::SequencerSpecific(d) => MetaEvent::SequencerSpecific(d.to_vec()),
        MetaMessage::Unknown(ty, d) => MetaEvent::Unknown(ty, d.to_vec()),
    }
}

fn kind_to_midly(kind: &EventKind) -> TrackEventKind<'_> {
    match kind {
        EventKind::Channel { channel, message } => TrackEventKind::Midi {
            channel: (*channel).into(),
            message: *message,
        },
        EventKind::SysEx(data) => TrackEventKind::SysEx(data),
        EventKind::Escape(data) => TrackEventKind::Escape(data),
        EventKind::Meta(meta) => TrackEventKind::Meta(meta_to_midly(meta)),
    }
}

fn meta_to_midly(meta: &MetaEvent) -> MetaMessage<'_> {
    match meta {
        MetaEvent::TrackNumber(n) => MetaMessage::TrackNumber(*n),
        MetaEvent::Text(t) => MetaMessage::Text(t),
        MetaEvent::Copyright(t) => MetaMessage::Copyright(t),
        MetaEvent::TrackName(t) => MetaMessage::TrackName(t),
        MetaEvent::InstrumentName(t) => MetaMessage::InstrumentName(t),
        MetaEvent::Lyric(t) => MetaMessage::Lyric(t),
        MetaEvent::Marker(t) => MetaMessage::Marker(t),
        MetaEvent::CuePoint(t) => MetaMessage::CuePoint(t),
        MetaEvent::ProgramName(t) => MetaMessage::ProgramName(t),
        MetaEvent::DeviceName(t) => MetaMessage::DeviceName(t),
        MetaEvent::MidiChannel(c) => MetaMessage::MidiChannel((*c).into()),
        MetaEvent::MidiPort(p) => MetaMessage::MidiPort((*p).into()),
        MetaEvent::EndOfTrack => MetaMessage::EndOfTrack,
        MetaEvent::Tempo(t) => MetaMessage::Tempo((*t).into()),
        MetaEvent::SmpteOffset(s) => MetaMessage::SmpteOffset(*s),
        MetaEvent::TimeSignature(n, d, c, b) => MetaMessage::TimeSignature(*n, *d, *c, *b),
        MetaEvent::KeySignature(sf, minor) => MetaMessage::KeySignature(*sf, *minor),
        MetaEvent::SequencerSpecific(d) => MetaMessage::SequencerSpecific(d),
        MetaEvent::Unknown(ty, d) => MetaMessage::Unknown(*ty, d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_score() -> Score {
        let mut score = Score::new(480);
        score.tracks.push(vec![
            Event::meta(0, MetaEvent::Tempo(500_000)),
            Event::meta(0, MetaEvent::TimeSignature(4, 2, 24, 8)),
            Event::meta(0, MetaEvent::EndOfTrack),
        ]);
        score.tracks.push(vec![
            Event::meta(0, MetaEvent::TrackName(b"Piano".to_vec())),
            Event::program_change(0, 0, 0),
            Event::note_on(0, 0, 60, 64),
            Event::note_off(480, 0, 60),
            Event::meta(0, MetaEvent::EndOfTrack),
        ]);
        score
    }

    #[test]
    fn test_encode_writes_format_1_header() {
        let bytes = encode(&sample_score()).expect("Failed to encode score");

        assert_eq!(&bytes[0..4], b"MThd");
        // Format 1
        assert_eq!(bytes[8], 0x00);
        assert_eq!(bytes[9], 0x01);
        // Two tracks
        assert_eq!(bytes[10], 0x00);
        assert_eq!(bytes[11], 0x02);
    }

    #[test]
    fn test_decode_recovers_encoded_score() {
        let score = sample_score();
        let bytes = encode(&score).expect("Failed to encode score");
        let decoded = decode(&bytes).expect("Failed to decode score");

        assert_eq!(decoded, score);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"definitely not a midi file");
        assert!(matches!(result, Err(ScoreError::Parse(_))));
    }

    #[test]
    fn test_encode_rejects_oversized_delta() {
        let mut score = Score::new(480);
        score.tracks.push(vec![Event::meta(MAX_DELTA + 1, MetaEvent::EndOfTrack)]);

        let result = encode(&score);
        assert!(matches!(
            result,
            Err(ScoreError::DeltaOverflow { track: 0, .. })
        ));
    }
}
