//! Channel analysis
//!
//! Scans a score once to learn which program each channel plays and how many
//! sounding notes it has, then folds that into per-group channel sets and
//! per-group activity flags.

use crate::classify::{ClassifierProfile, InstrumentGroup, GROUP_COUNT};
use crate::score::{Score, DRUM_CHANNEL};
use std::collections::{BTreeMap, BTreeSet};

/// Number of MIDI channels
pub const CHANNEL_COUNT: usize = 16;

/// What a channel is playing as far as classification is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelProgram {
    Program(u8),
    /// General MIDI percussion; carries no program
    Drum,
}

/// Channel -> program, last program change wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    programs: BTreeMap<u8, ChannelProgram>,
}

impl ChannelMap {
    /// Program for a channel, `None` if the channel never saw a program change
    pub fn get(&self, channel: u8) -> Option<ChannelProgram> {
        self.programs.get(&channel).copied()
    }
}

/// Sounding note-on count per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelActivity {
    counts: [u32; CHANNEL_COUNT],
}

impl ChannelActivity {
    pub fn count(&self, channel: u8) -> u32 {
        self.counts.get(channel as usize).copied().unwrap_or(0)
    }

    fn record(&mut self, channel: u8) {
        if let Some(count) = self.counts.get_mut(channel as usize) {
            *count = count.saturating_add(1);
        }
    }
}

/// Build the channel map and per-channel activity for a score
pub fn analyze(score: &Score) -> (ChannelMap, ChannelActivity) {
    let mut programs = BTreeMap::new();
    let mut activity = ChannelActivity::default();

    for event in score.events() {
        if let Some((channel, program)) = event.kind.program_change() {
            programs.insert(channel, ChannelProgram::Program(program));
        }
        if event.kind.is_sounding_note_on() {
            if let Some(channel) = event.kind.channel() {
                activity.record(channel);
            }
        }
    }

    // Channel 9 is percussion in GM no matter what program it is given
    programs.insert(DRUM_CHANNEL, ChannelProgram::Drum);

    (ChannelMap { programs }, activity)
}

/// Channel sets and activity flags for all six groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment {
    channels: [BTreeSet<u8>; GROUP_COUNT],
    active: [bool; GROUP_COUNT],
}

impl GroupAssignment {
    /// Channels belonging to a group
    pub fn channels(&self, group: InstrumentGroup) -> &BTreeSet<u8> {
        &self.channels[group.index()]
    }

    /// True if at least one channel of the group plays a sounding note
    pub fn is_active(&self, group: InstrumentGroup) -> bool {
        self.active[group.index()]
    }

    /// Active groups in canonical order
    pub fn active_groups(&self) -> Vec<InstrumentGroup> {
        InstrumentGroup::ALL
            .iter()
            .copied()
            .filter(|g| self.is_active(*g))
            .collect()
    }
}

/// Classify all sixteen channels and derive group membership and activity.
///
/// Every channel lands in exactly one group. A channel without any program
/// change classifies with no program, which falls back to Keys/Piano+Synth
/// (program 0 is the GM power-on default and lands there too).
pub fn build_groups(
    channel_map: &ChannelMap,
    activity: &ChannelActivity,
    profile: ClassifierProfile,
) -> GroupAssignment {
    let mut channels: [BTreeSet<u8>; GROUP_COUNT] = Default::default();
    let mut note_totals = [0u64; GROUP_COUNT];

    for channel in 0..CHANNEL_COUNT as u8 {
        let group = match channel_map.get(channel) {
            Some(ChannelProgram::Drum) => profile.classify(None, true),
            Some(ChannelProgram::Program(program)) => profile.classify(Some(program), false),
            None => profile.classify(None, false),
        };
        channels[group.index()].insert(channel);
        note_totals[group.index()] += activity.count(channel) as u64;
    }

    let active = note_totals.map(|total| total > 0);
    GroupAssignment { channels, active }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{Event, MetaEvent};
    use InstrumentGroup::*;

    fn score_with(track: Vec<Event>) -> Score {
        let mut score = Score::new(480);
        score.tracks.push(vec![Event::meta(0, MetaEvent::EndOfTrack)]);
        score.tracks.push(track);
        score
    }

    #[test]
    fn test_last_program_change_wins() {
        let score = score_with(vec![
            Event::program_change(0, 2, 24),
            Event::note_on(0, 2, 60, 90),
            Event::program_change(480, 2, 33),
        ]);
        let (map, activity) = analyze(&score);

        assert_eq!(map.get(2), Some(ChannelProgram::Program(33)));
        assert_eq!(activity.count(2), 1);
    }

    #[test]
    fn test_drum_channel_forced() {
        let score = score_with(vec![Event::program_change(0, 9, 40)]);
        let (map, _) = analyze(&score);

        assert_eq!(map.get(9), Some(ChannelProgram::Drum));
    }

    #[test]
    fn test_zero_velocity_note_on_is_not_activity() {
        let score = score_with(vec![
            Event::note_on(0, 1, 60, 0),
            Event::note_off(10, 1, 60),
            Event::note_on(10, 3, 62, 100),
            Event::note_on(0, 3, 64, 100),
        ]);
        let (_, activity) = analyze(&score);

        assert_eq!(activity.count(1), 0);
        assert_eq!(activity.count(3), 2);
    }

    #[test]
    fn test_groups_partition_all_channels() {
        let score = score_with(vec![
            Event::program_change(0, 0, 0),
            Event::program_change(0, 1, 40),
            Event::program_change(0, 2, 33),
        ]);
        let (map, activity) = analyze(&score);
        let groups = build_groups(&map, &activity, ClassifierProfile::Standard);

        let mut seen = BTreeSet::new();
        for group in InstrumentGroup::ALL {
            for ch in groups.channels(group) {
                assert!(seen.insert(*ch), "channel {} in two groups", ch);
            }
        }
        assert_eq!(seen.len(), CHANNEL_COUNT);

        assert_eq!(groups.channels(Drums), &BTreeSet::from([9]));
        assert_eq!(groups.channels(Bass), &BTreeSet::from([2]));
        assert_eq!(groups.channels(Ensemble), &BTreeSet::from([1]));
        assert!(groups.channels(Keys).contains(&0));
        // Channels with no program change fall back to keys
        assert!(groups.channels(Keys).contains(&15));
    }

    #[test]
    fn test_activity_requires_sounding_notes() {
        let score = score_with(vec![
            Event::program_change(0, 0, 0),
            Event::program_change(0, 1, 40),
            Event::note_on(0, 1, 60, 80),
        ]);
        let (map, activity) = analyze(&score);
        let groups = build_groups(&map, &activity, ClassifierProfile::Standard);

        assert!(groups.is_active(Ensemble));
        assert!(!groups.is_active(Keys)); // program set but never played
        assert_eq!(groups.active_groups(), vec![Ensemble]);
    }

    #[test]
    fn test_profile_changes_assignment() {
        let score = score_with(vec![Event::program_change(0, 4, 115), Event::note_on(0, 4, 60, 80)]);
        let (map, activity) = analyze(&score);

        let standard = build_groups(&map, &activity, ClassifierProfile::Standard);
        let extended = build_groups(&map, &activity, ClassifierProfile::Extended);

        assert!(standard.channels(Keys).contains(&4));
        assert!(extended.channels(Drums).contains(&4));
        assert_eq!(extended.active_groups(), vec![Drums]);
    }
}
