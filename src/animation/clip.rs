// Animation clip data
// Keyframe tracks decoded from the model file, read-only at playback time

use super::interpolation::{keyframe_span, lerp_vec3};
use nalgebra_glm as glm;
use serde::Serialize;

/// Intrinsic loop style of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopStyle {
    Repeat,
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    CubicSpline,
}

#[derive(Debug, Clone)]
pub enum TrackValues {
    Translation(Vec<glm::Vec3>),
    Rotation(Vec<glm::Quat>),
    Scale(Vec<glm::Vec3>),
}

/// Sampled value of one track at one point in time
#[derive(Debug, Clone, Copy)]
pub enum TrackSample {
    Translation(glm::Vec3),
    Rotation(glm::Quat),
    Scale(glm::Vec3),
}

/// One animated property of one node
#[derive(Debug, Clone)]
pub struct Track {
    pub node: usize,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample the track at `time`, holding the first/last key outside the keyed range.
    pub fn sample(&self, time: f32) -> Option<TrackSample> {
        let (i0, i1, t) = keyframe_span(&self.times, time)?;
        let t = match self.interpolation {
            Interpolation::Step => 0.0,
            // Tangents are dropped at decode time, the keyed values are blended linearly
            Interpolation::Linear | Interpolation::CubicSpline => t,
        };

        let sample = match &self.values {
            TrackValues::Translation(v) => {
                TrackSample::Translation(lerp_vec3(v.get(i0)?, v.get(i1)?, t))
            }
            TrackValues::Scale(v) => TrackSample::Scale(lerp_vec3(v.get(i0)?, v.get(i1)?, t)),
            TrackValues::Rotation(v) => {
                let (a, b) = (v.get(i0)?, v.get(i1)?);
                TrackSample::Rotation(if t == 0.0 {
                    *a
                } else {
                    glm::quat_slerp(a, b, t)
                })
            }
        };
        Some(sample)
    }
}

/// A named, time-bounded unit of animation
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub loop_style: LoopStyle,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Build a clip whose duration spans its longest track.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks.iter().map(Track::end_time).fold(0.0, f32::max);
        Self {
            name: name.into(),
            duration,
            loop_style: LoopStyle::Repeat,
            tracks,
        }
    }

    /// Clip with no tracks, used where only timing matters.
    pub fn empty(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            loop_style: LoopStyle::Repeat,
            tracks: Vec::new(),
        }
    }
}

/// Index of the clip with exactly this name
pub fn find_by_name(clips: &[AnimationClip], name: &str) -> Option<usize> {
    clips.iter().position(|clip| clip.name == name)
}

/// Serializable clip summary, printed by `--list-clips`
#[derive(Debug, Clone, Serialize)]
pub struct ClipInfo {
    pub name: String,
    pub duration: f32,
    pub loop_style: LoopStyle,
    pub tracks: usize,
}

impl From<&AnimationClip> for ClipInfo {
    fn from(clip: &AnimationClip) -> Self {
        Self {
            name: clip.name.clone(),
            duration: clip.duration,
            loop_style: clip.loop_style,
            tracks: clip.tracks.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_track() -> Track {
        Track {
            node: 0,
            interpolation: Interpolation::Linear,
            times: vec![0.0, 1.0, 2.0],
            values: TrackValues::Translation(vec![
                glm::vec3(0.0, 0.0, 0.0),
                glm::vec3(2.0, 0.0, 0.0),
                glm::vec3(2.0, 4.0, 0.0),
            ]),
        }
    }

    #[test]
    fn duration_spans_longest_track() {
        let mut short = translation_track();
        short.times = vec![0.0, 0.5, 0.75];
        let clip = AnimationClip::new("01_Idle", vec![short, translation_track()]);
        assert_eq!(clip.duration, 2.0);
        assert_eq!(clip.loop_style, LoopStyle::Repeat);
    }

    #[test]
    fn linear_sample_between_keys() {
        let Some(TrackSample::Translation(v)) = translation_track().sample(1.5) else {
            panic!("expected translation sample");
        };
        assert_eq!(v, glm::vec3(2.0, 2.0, 0.0));
    }

    #[test]
    fn step_sample_holds_previous_key() {
        let mut track = translation_track();
        track.interpolation = Interpolation::Step;
        let Some(TrackSample::Translation(v)) = track.sample(0.9) else {
            panic!("expected translation sample");
        };
        assert_eq!(v, glm::vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn sample_past_end_holds_last_key() {
        let Some(TrackSample::Translation(v)) = translation_track().sample(10.0) else {
            panic!("expected translation sample");
        };
        assert_eq!(v, glm::vec3(2.0, 4.0, 0.0));
    }

    #[test]
    fn find_by_name_is_exact() {
        let clips = vec![
            AnimationClip::empty("02_Taunt", 1.0),
            AnimationClip::empty("03_Victory_Pose", 2.0),
        ];
        assert_eq!(find_by_name(&clips, "03_Victory_Pose"), Some(1));
        assert_eq!(find_by_name(&clips, "03_victory_pose"), None);
        assert_eq!(find_by_name(&clips, "Taunt"), None);
    }
}
