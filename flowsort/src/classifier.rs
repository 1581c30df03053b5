//! # Frame classification

use crate::prelude::v1::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Granularity of the classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifyBy {
    /// Label frames by the directory's mean motion.
    #[default]
    Folder,
    /// Label frames by the motion of the pairs they belong to.
    Frame,
}

impl std::str::FromStr for ClassifyBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "frame" => Ok(Self::Frame),
            _ => Err(Error::Config(format!(
                "unknown classification mode `{s}`, expected `folder` or `frame`"
            ))),
        }
    }
}

/// Label of every frame in a directory, in frame order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameClassification {
    labels: Vec<(PathBuf, Label)>,
}

impl FrameClassification {
    fn from_moving(frames: &FrameSequence, moving: &BTreeSet<usize>) -> Self {
        let labels = frames
            .frames()
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let label = if moving.contains(&i) {
                    Label::Moving
                } else {
                    Label::Still
                };
                (path.clone(), label)
            })
            .collect();

        Self { labels }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Label)> + '_ {
        self.labels.iter().map(|(p, l)| (p.as_path(), *l))
    }

    /// Frames carrying the given label, in frame order.
    pub fn with_label(&self, label: Label) -> impl Iterator<Item = &Path> + '_ {
        self.iter()
            .filter(move |(_, l)| *l == label)
            .map(|(p, _)| p)
    }
}

#[cfg(test)]
impl FrameClassification {
    /// Label of a frame, if it belongs to the classified directory.
    pub fn label_of(&self, frame: &Path) -> Option<Label> {
        self.labels
            .iter()
            .find(|(p, _)| p == frame)
            .map(|(_, l)| *l)
    }

    /// Labels in frame order.
    pub fn labels(&self) -> Vec<Label> {
        self.labels.iter().map(|(_, l)| *l).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Label every frame of a directory.
///
/// In [`ClassifyBy::Folder`] mode a moving directory has all of its frames labelled moving. A
/// still directory has only the two frames of its highest motion pair labelled moving, so that
/// a single motion event is never lost among the still frames.
///
/// In [`ClassifyBy::Frame`] mode both frames of every pair exceeding `motion_threshold` are
/// labelled moving. A frame stays moving if any of its pairs is moving.
///
/// # Arguments
///
/// * `mode` - classification granularity.
/// * `frames` - frames of the directory.
/// * `summary` - motion summary of `frames`.
/// * `pairs` - scores of the valid frame pairs.
/// * `motion_threshold` - motion above which a pair is moving.
pub fn classify(
    mode: ClassifyBy,
    frames: &FrameSequence,
    summary: &DirectoryMotionSummary,
    pairs: &[PairScore],
    motion_threshold: f32,
) -> FrameClassification {
    let mut moving = BTreeSet::new();

    match mode {
        ClassifyBy::Folder => match summary.label {
            Label::Moving => moving.extend(0..frames.len()),
            Label::Still => {
                if let Some(max_pair) = summary.max_pair {
                    let (a, b) = max_pair.frames();
                    moving.insert(a);
                    moving.insert(b);
                }
            }
        },
        ClassifyBy::Frame => {
            for pair in pairs.iter().filter(|p| p.sample.value() > motion_threshold) {
                let (a, b) = pair.frames();
                moving.insert(a);
                moving.insert(b);
            }
        }
    }

    FrameClassification::from_moving(frames, &moving)
}
