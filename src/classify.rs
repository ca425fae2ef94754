//! Instrument group taxonomy and program classification
//!
//! Every channel of a score lands in exactly one of six fixed instrument
//! groups. The group order is the order in which cumulative layers are built
//! (drums first, ensemble last) and never changes between songs.
//!
//! Classification is a priority-ordered table of program ranges: the first
//! rule whose ranges contain the program wins, and programs that match no
//! rule fall back to Keys/Piano+Synth. Two tables exist:
//!
//! - **Standard**: the six-group table used for published builds.
//! - **Extended**: additionally folds percussive programs 112-119 into drums
//!   and programs 96-111 (synth effects, ethnic) into the ensemble group.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// One of the six fixed instrument groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrumentGroup {
    Drums,
    Bass,
    BrassWind,
    Keys,
    Guitar,
    Ensemble,
}

/// Number of instrument groups
pub const GROUP_COUNT: usize = 6;

impl InstrumentGroup {
    /// All groups in canonical (layering) order
    pub const ALL: [InstrumentGroup; GROUP_COUNT] = [
        InstrumentGroup::Drums,
        InstrumentGroup::Bass,
        InstrumentGroup::BrassWind,
        InstrumentGroup::Keys,
        InstrumentGroup::Guitar,
        InstrumentGroup::Ensemble,
    ];

    /// Stable index 0-5
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name, as shown by the front-end
    pub fn name(self) -> &'static str {
        match self {
            InstrumentGroup::Drums => "Drums+Perc",
            InstrumentGroup::Bass => "Bass",
            InstrumentGroup::BrassWind => "Brass/Wind",
            InstrumentGroup::Keys => "Keys/Piano+Synth",
            InstrumentGroup::Guitar => "Guitar",
            InstrumentGroup::Ensemble => "Ensemble+Choir+Strings",
        }
    }

    /// Filesystem-safe stem for the group's audio file
    pub fn slug(self) -> &'static str {
        match self {
            InstrumentGroup::Drums => "group-1-drums",
            InstrumentGroup::Bass => "group-2-bass",
            InstrumentGroup::BrassWind => "group-3-brass-wind",
            InstrumentGroup::Keys => "group-4-keys-piano-synth",
            InstrumentGroup::Guitar => "group-5-guitar",
            InstrumentGroup::Ensemble => "group-6-ensemble-choir-strings",
        }
    }
}

impl fmt::Display for InstrumentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classification rule: programs in any of `ranges` belong to `group`
#[derive(Debug)]
pub struct ProgramRule {
    pub group: InstrumentGroup,
    pub ranges: &'static [RangeInclusive<u8>],
}

/// Group for programs no rule claims, and for channels with no program
pub const FALLBACK_GROUP: InstrumentGroup = InstrumentGroup::Keys;

/// Standard table, in priority order
pub const STANDARD_RULES: &[ProgramRule] = &[
    // Timpani and Orchestra Hit sound percussive off the drum channel
    ProgramRule { group: InstrumentGroup::Drums, ranges: &[47..=47, 55..=55] },
    ProgramRule { group: InstrumentGroup::Bass, ranges: &[32..=39] },
    ProgramRule { group: InstrumentGroup::BrassWind, ranges: &[56..=71] },
    ProgramRule { group: InstrumentGroup::Keys, ranges: &[0..=23, 80..=95] },
    ProgramRule { group: InstrumentGroup::Guitar, ranges: &[24..=31] },
    ProgramRule { group: InstrumentGroup::Ensemble, ranges: &[40..=54] },
];

/// Extended table, in priority order
pub const EXTENDED_RULES: &[ProgramRule] = &[
    ProgramRule { group: InstrumentGroup::Drums, ranges: &[47..=47, 55..=55, 112..=119] },
    ProgramRule { group: InstrumentGroup::Bass, ranges: &[32..=39] },
    ProgramRule { group: InstrumentGroup::BrassWind, ranges: &[56..=71] },
    ProgramRule { group: InstrumentGroup::Keys, ranges: &[0..=23, 80..=95] },
    ProgramRule { group: InstrumentGroup::Guitar, ranges: &[24..=31] },
    ProgramRule { group: InstrumentGroup::Ensemble, ranges: &[40..=54, 96..=111] },
];

/// Which program table to classify with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierProfile {
    #[default]
    Standard,
    Extended,
}

impl ClassifierProfile {
    pub fn rules(self) -> &'static [ProgramRule] {
        match self {
            ClassifierProfile::Standard => STANDARD_RULES,
            ClassifierProfile::Extended => EXTENDED_RULES,
        }
    }

    /// Classify a program. `is_drum` wins over everything; an absent program
    /// falls back to Keys/Piano+Synth.
    pub fn classify(self, program: Option<u8>, is_drum: bool) -> InstrumentGroup {
        if is_drum {
            return InstrumentGroup::Drums;
        }
        let Some(program) = program else {
            return FALLBACK_GROUP;
        };
        self.rules()
            .iter()
            .find(|rule| rule.ranges.iter().any(|range| range.contains(&program)))
            .map(|rule| rule.group)
            .unwrap_or(FALLBACK_GROUP)
    }
}

impl FromStr for ClassifierProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ClassifierProfile::Standard),
            "extended" => Ok(ClassifierProfile::Extended),
            other => Err(format!("unknown classifier profile: {}", other)),
        }
    }
}

/// Classify with the standard table
pub fn classify(program: Option<u8>, is_drum: bool) -> InstrumentGroup {
    ClassifierProfile::Standard.classify(program, is_drum)
}
