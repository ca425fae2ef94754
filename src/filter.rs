//! Channel filtering
//!
//! Produces a copy of a score that keeps only the events addressed to a set
//! of channels, plus every channel-less event (meta, sysex). Absolute timing
//! of the retained events is preserved exactly: the delta of every dropped
//! event is carried forward into the next event that is kept.

use crate::score::{Event, Score, Track};
use std::collections::BTreeSet;

/// Keep only events on `keep` channels (and all channel-less events).
///
/// Track 0 is always retained since it anchors tempo and time signature;
/// any other track is retained only if it still holds at least one event.
pub fn filter_by_channels(score: &Score, keep: &BTreeSet<u8>) -> Score {
    let tracks = score
        .tracks
        .iter()
        .enumerate()
        .filter_map(|(index, track)| {
            let filtered = filter_track(track, keep);
            (index == 0 || !filtered.is_empty()).then_some(filtered)
        })
        .collect();

    Score {
        header: score.header,
        tracks,
    }
}

/// Filter one track, folding skipped deltas into the next retained event
fn filter_track(track: &[Event], keep: &BTreeSet<u8>) -> Track {
    let mut pending = 0u32;
    let mut out = Vec::with_capacity(track.len());

    for event in track {
        let retained = match event.kind.channel() {
            Some(channel) => keep.contains(&channel),
            None => true,
        };

        if retained {
            out.push(Event {
                delta: event.delta.saturating_add(pending),
                kind: event.kind.clone(),
            });
            pending = 0;
        } else {
            pending = pending.saturating_add(event.delta);
        }
    }

    out
}
