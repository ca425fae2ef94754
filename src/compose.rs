//! Layer composition
//!
//! Turns one score into per-group audio and cumulative layers:
//!
//! 1. Analyze channels and assign them to the six instrument groups
//! 2. For every group (in parallel): filter the score to the group's
//!    channels, synthesize raw audio, encode `<group-slug>.mp3`. Silent
//!    groups are rendered too so every song exposes all six files.
//! 3. Fold over the groups in canonical order, growing the set of raw
//!    renders of the *active* groups; each active group adds one
//!    `layer-<n>.mp3` mixing everything accumulated so far.
//!
//! Layer `n` is therefore always the mix of the first `n` active groups in
//! canonical order, and the number of layers equals the number of active
//! groups.

use crate::analysis::{analyze, build_groups, GroupAssignment};
use crate::classify::{ClassifierProfile, InstrumentGroup};
use crate::filter::filter_by_channels;
use crate::render::{Encoder, RawAudio, Result, Synthesizer};
use crate::score::Score;
use log::debug;
use rayon::prelude::*;
use std::path::Path;

/// Knobs for composing a song
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComposeOptions {
    pub profile: ClassifierProfile,
    /// Trim every encoded file to this many seconds
    pub duration: Option<f64>,
}

/// One group's standalone audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutput {
    pub group: InstrumentGroup,
    pub present: bool,
    pub file_name: String,
}

/// One cumulative layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOutput {
    /// 1-based, dense
    pub number: usize,
    /// Groups mixed into this layer, in canonical order
    pub groups: Vec<InstrumentGroup>,
    pub file_name: String,
}

/// Everything produced for one song
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongLayers {
    pub groups: Vec<GroupOutput>,
    pub layers: Vec<LayerOutput>,
}

/// File name of a group's standalone audio
pub fn group_file_name(group: InstrumentGroup) -> String {
    format!("{}.mp3", group.slug())
}

/// File name of the n-th cumulative layer
pub fn layer_file_name(number: usize) -> String {
    format!("layer-{}.mp3", number)
}

/// Render all groups and layers of `score`.
///
/// Intermediate files (filtered scores, raw audio) go under `scratch`, one
/// subdirectory per group; encoded files go directly into `out_dir`.
pub fn compose_song(
    score: &Score,
    synth: &dyn Synthesizer,
    encoder: &dyn Encoder,
    scratch: &Path,
    out_dir: &Path,
    options: &ComposeOptions,
) -> Result<SongLayers> {
    let (channel_map, activity) = analyze(score);
    let assignment = build_groups(&channel_map, &activity, options.profile);

    for group in InstrumentGroup::ALL {
        debug!(
            "  {} (active: {}): channels {:?}",
            group,
            assignment.is_active(group),
            assignment.channels(group)
        );
    }

    let raws = render_groups(score, &assignment, synth, encoder, scratch, out_dir, options)?;

    let groups = InstrumentGroup::ALL
        .iter()
        .map(|group| GroupOutput {
            group: *group,
            present: assignment.is_active(*group),
            file_name: group_file_name(*group),
        })
        .collect();

    let layers = mix_layers(&assignment, &raws, encoder, out_dir, options)?;

    Ok(SongLayers { groups, layers })
}

/// Filter, synthesize and encode every group; returns raw renders indexed
/// by group
fn render_groups(
    score: &Score,
    assignment: &GroupAssignment,
    synth: &dyn Synthesizer,
    encoder: &dyn Encoder,
    scratch: &Path,
    out_dir: &Path,
    options: &ComposeOptions,
) -> Result<Vec<RawAudio>> {
    InstrumentGroup::ALL
        .par_iter()
        .map(|group| -> Result<RawAudio> {
            let workdir = scratch.join(group.slug());
            std::fs::create_dir_all(&workdir)?;

            let filtered = filter_by_channels(score, assignment.channels(*group));
            let raw = synth.render(&filtered, &workdir.join(format!("{}.wav", group.slug())))?;
            encoder.encode(
                std::slice::from_ref(&raw),
                options.duration,
                &out_dir.join(group_file_name(*group)),
            )?;
            Ok(raw)
        })
        .collect()
}

/// Build cumulative layers from the active groups' raw renders
fn mix_layers(
    assignment: &GroupAssignment,
    raws: &[RawAudio],
    encoder: &dyn Encoder,
    out_dir: &Path,
    options: &ComposeOptions,
) -> Result<Vec<LayerOutput>> {
    let mut running: Vec<RawAudio> = Vec::new();
    let mut members: Vec<InstrumentGroup> = Vec::new();
    let mut layers: Vec<LayerOutput> = Vec::new();

    for group in assignment.active_groups() {
        running.push(raws[group.index()].clone());
        members.push(group);

        let layer = LayerOutput {
            number: layers.len() + 1,
            groups: members.clone(),
            file_name: layer_file_name(layers.len() + 1),
        };
        debug!("  layer {}: {:?}", layer.number, layer.groups);
        encoder.encode(&running, options.duration, &out_dir.join(&layer.file_name))?;
        layers.push(layer);
    }

    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{EncodedAudio, RenderError};
    use crate::score::{Event, MetaEvent};
    use std::sync::Mutex;

    /// Records calls without touching the filesystem
    #[derive(Default)]
    struct Recorder {
        rendered: Mutex<Vec<Vec<u8>>>,
        encoded: Mutex<Vec<(Vec<String>, String)>>,
    }

    impl Synthesizer for Recorder {
        fn render(&self, score: &Score, out: &Path) -> Result<RawAudio> {
            let channels: Vec<u8> = score.events().filter_map(|e| e.kind.channel()).collect();
            self.rendered.lock().unwrap().push(channels);
            Ok(RawAudio::new(out))
        }
    }

    impl Encoder for Recorder {
        fn encode(&self, inputs: &[RawAudio], _duration: Option<f64>, out: &Path) -> Result<EncodedAudio> {
            let names = inputs
                .iter()
                .map(|i| i.path().file_stem().unwrap().to_string_lossy().into_owned())
                .collect();
            let out_name = out.file_name().unwrap().to_string_lossy().into_owned();
            self.encoded.lock().unwrap().push((names, out_name));
            Ok(EncodedAudio::new(out))
        }
    }

    struct FailingSynth;

    impl Synthesizer for FailingSynth {
        fn render(&self, _score: &Score, _out: &Path) -> Result<RawAudio> {
            Err(RenderError::NoInputs)
        }
    }

    fn two_group_score() -> Score {
        let mut score = Score::new(480);
        score.tracks.push(vec![Event::meta(0, MetaEvent::Tempo(500_000))]);
        score.tracks.push(vec![
            Event::program_change(0, 0, 0),
            Event::program_change(0, 1, 40),
            Event::note_on(0, 0, 60, 90),
            Event::note_on(0, 1, 67, 90),
        ]);
        score
    }

    #[test]
    fn test_layers_follow_active_groups() {
        let scratch = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        let song = compose_song(
            &two_group_score(),
            &recorder,
            &recorder,
            scratch.path(),
            Path::new("/out"),
            &ComposeOptions::default(),
        )
        .expect("compose should succeed");

        assert_eq!(song.groups.len(), 6);
        let present: Vec<bool> = song.groups.iter().map(|g| g.present).collect();
        assert_eq!(present, vec![false, false, false, true, false, true]);

        assert_eq!(song.layers.len(), 2);
        assert_eq!(song.layers[0].groups, vec![InstrumentGroup::Keys]);
        assert_eq!(
            song.layers[1].groups,
            vec![InstrumentGroup::Keys, InstrumentGroup::Ensemble]
        );
        assert_eq!(song.layers[1].file_name, "layer-2.mp3");

        // Six standalone encodes plus two layer mixes
        let encoded = recorder.encoded.lock().unwrap();
        assert_eq!(encoded.len(), 8);
        let layer2 = encoded
            .iter()
            .find(|(_, out)| out == "layer-2.mp3")
            .expect("layer-2 encoded");
        assert_eq!(
            layer2.0,
            vec!["group-4-keys-piano-synth", "group-6-ensemble-choir-strings"]
        );
    }

    #[test]
    fn test_every_group_rendered_even_if_silent() {
        let scratch = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        compose_song(
            &two_group_score(),
            &recorder,
            &recorder,
            scratch.path(),
            Path::new("/out"),
            &ComposeOptions::default(),
        )
        .expect("compose should succeed");

        assert_eq!(recorder.rendered.lock().unwrap().len(), 6);
        for group in InstrumentGroup::ALL {
            assert!(scratch.path().join(group.slug()).is_dir());
        }
    }

    #[test]
    fn test_render_failure_aborts_song() {
        let scratch = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();

        let result = compose_song(
            &two_group_score(),
            &FailingSynth,
            &recorder,
            scratch.path(),
            Path::new("/out"),
            &ComposeOptions::default(),
        );

        assert!(result.is_err());
        assert!(recorder
            .encoded
            .lock()
            .unwrap()
            .iter()
            .all(|(_, out)| !out.starts_with("layer-")));
    }

    /// (channel, program) that lands in each group, in canonical order
    const REPRESENTATIVES: [(u8, Option<u8>); 6] = [
        (9, None),
        (2, Some(33)),
        (3, Some(56)),
        (0, Some(0)),
        (4, Some(24)),
        (1, Some(40)),
    ];

    /// Program changes on every representative channel, notes only on the
    /// groups whose bit is set in `mask`
    fn score_for_mask(mask: u8) -> Score {
        let mut track = Vec::new();
        for (channel, program) in REPRESENTATIVES {
            if let Some(program) = program {
                track.push(Event::program_change(0, channel, program));
            }
        }
        for (bit, (channel, _)) in REPRESENTATIVES.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                track.push(Event::note_on(10, *channel, 60, 90));
                track.push(Event::note_off(240, *channel, 60));
            }
        }
        track.push(Event::meta(0, MetaEvent::EndOfTrack));

        let mut score = Score::new(480);
        score.tracks.push(vec![Event::meta(0, MetaEvent::Tempo(500_000))]);
        score.tracks.push(track);
        score
    }

    #[test]
    fn test_layers_are_active_prefixes_for_every_pattern() {
        for mask in 0u8..64 {
            let scratch = tempfile::tempdir().unwrap();
            let recorder = Recorder::default();

            let song = compose_song(
                &score_for_mask(mask),
                &recorder,
                &recorder,
                scratch.path(),
                Path::new("/out"),
                &ComposeOptions::default(),
            )
            .expect("compose should succeed");

            let active: Vec<InstrumentGroup> = InstrumentGroup::ALL
                .iter()
                .copied()
                .filter(|g| mask & (1 << g.index()) != 0)
                .collect();

            let present: Vec<bool> = song.groups.iter().map(|g| g.present).collect();
            let expected_present: Vec<bool> =
                InstrumentGroup::ALL.iter().map(|g| active.contains(g)).collect();
            assert_eq!(present, expected_present, "mask {:06b}", mask);

            assert_eq!(song.layers.len(), active.len(), "mask {:06b}", mask);
            for (i, layer) in song.layers.iter().enumerate() {
                assert_eq!(layer.number, i + 1);
                assert_eq!(layer.file_name, format!("layer-{}.mp3", i + 1));
                assert_eq!(layer.groups, active[..=i].to_vec(), "mask {:06b}", mask);
            }

            // Each layer mix is fed exactly the raw renders of its groups
            let encoded = recorder.encoded.lock().unwrap();
            for layer in &song.layers {
                let (inputs, _) = encoded
                    .iter()
                    .find(|(_, out)| *out == layer.file_name)
                    .expect("layer encoded");
                let slugs: Vec<&str> = layer.groups.iter().map(|g| g.slug()).collect();
                assert_eq!(inputs, &slugs, "mask {:06b}", mask);
            }
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(group_file_name(InstrumentGroup::Drums), "group-1-drums.mp3");
        assert_eq!(layer_file_name(3), "layer-3.mp3");
    }
}
