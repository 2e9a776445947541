// Pose blending
// Weighted accumulation of sampled clips over the rest pose

use super::clip::{AnimationClip, TrackSample};
use super::interpolation::{compose_trs, lerp_vec3};
use nalgebra_glm as glm;

/// Local transform of one scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotation: glm::quat_identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }

    pub fn matrix(&self) -> glm::Mat4 {
        compose_trs(&self.translation, &self.rotation, &self.scale)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Running weighted mix of one property.
/// The first sample is taken as-is, later ones are mixed in by weight / cumulative weight.
#[derive(Debug, Clone, Copy)]
struct Accumulator<T> {
    value: T,
    weight: f32,
}

impl<T: Copy> Accumulator<T> {
    fn accumulate(slot: &mut Option<Self>, sample: T, weight: f32, mix: impl Fn(&T, &T, f32) -> T) {
        match slot {
            None => {
                *slot = Some(Self {
                    value: sample,
                    weight,
                })
            }
            Some(acc) => {
                acc.weight += weight;
                acc.value = mix(&acc.value, &sample, weight / acc.weight);
            }
        }
    }

    /// Fill the missing weight with the rest value.
    fn resolve(slot: Option<Self>, rest: T, mix: impl Fn(&T, &T, f32) -> T) -> T {
        match slot {
            None => rest,
            Some(acc) if acc.weight < 1.0 => mix(&acc.value, &rest, 1.0 - acc.weight),
            Some(acc) => acc.value,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct NodeAccumulator {
    translation: Option<Accumulator<glm::Vec3>>,
    rotation: Option<Accumulator<glm::Quat>>,
    scale: Option<Accumulator<glm::Vec3>>,
}

fn slerp(a: &glm::Quat, b: &glm::Quat, t: f32) -> glm::Quat {
    glm::quat_slerp(a, b, t)
}

/// Sample each `(clip, time, weight)` and blend the results over `rest`.
/// Nodes no clip animates keep their rest transform.
pub fn blend_pose<'c>(
    weighted: impl IntoIterator<Item = (&'c AnimationClip, f32, f32)>,
    rest: &[NodeTransform],
) -> Vec<NodeTransform> {
    let mut accumulators = vec![NodeAccumulator::default(); rest.len()];

    for (clip, time, weight) in weighted {
        for track in &clip.tracks {
            let Some(acc) = accumulators.get_mut(track.node) else {
                continue;
            };
            match track.sample(time) {
                Some(TrackSample::Translation(v)) => {
                    Accumulator::accumulate(&mut acc.translation, v, weight, lerp_vec3)
                }
                Some(TrackSample::Rotation(q)) => {
                    Accumulator::accumulate(&mut acc.rotation, q, weight, slerp)
                }
                Some(TrackSample::Scale(v)) => {
                    Accumulator::accumulate(&mut acc.scale, v, weight, lerp_vec3)
                }
                None => {}
            }
        }
    }

    rest.iter()
        .zip(accumulators)
        .map(|(rest, acc)| NodeTransform {
            translation: Accumulator::resolve(acc.translation, rest.translation, lerp_vec3),
            rotation: Accumulator::resolve(acc.rotation, rest.rotation, slerp),
            scale: Accumulator::resolve(acc.scale, rest.scale, lerp_vec3),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::{Interpolation, Track, TrackValues};

    fn slide(name: &str, x: f32) -> AnimationClip {
        AnimationClip::new(
            name,
            vec![Track {
                node: 0,
                interpolation: Interpolation::Step,
                times: vec![0.0, 1.0],
                values: TrackValues::Translation(vec![glm::vec3(x, 0.0, 0.0); 2]),
            }],
        )
    }

    #[test]
    fn full_weight_replaces_rest() {
        let clip = slide("a", 4.0);
        let pose = blend_pose([(&clip, 0.5, 1.0)], &[NodeTransform::identity()]);
        assert_eq!(pose[0].translation, glm::vec3(4.0, 0.0, 0.0));
    }

    #[test]
    fn partial_weight_mixes_in_rest() {
        let clip = slide("a", 4.0);
        let pose = blend_pose([(&clip, 0.5, 0.25)], &[NodeTransform::identity()]);
        assert_eq!(pose[0].translation, glm::vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn two_clips_blend_by_weight() {
        let a = slide("a", 0.0);
        let b = slide("b", 2.0);
        let pose = blend_pose([(&a, 0.0, 0.5), (&b, 0.0, 0.5)], &[NodeTransform::identity()]);
        assert_eq!(pose[0].translation, glm::vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn untouched_nodes_keep_rest() {
        let clip = slide("a", 4.0);
        let mut moved = NodeTransform::identity();
        moved.scale = glm::vec3(2.0, 2.0, 2.0);
        let pose = blend_pose([(&clip, 0.0, 1.0)], &[NodeTransform::identity(), moved]);
        assert_eq!(pose[1], moved);
    }

    #[test]
    fn tracks_for_missing_nodes_are_ignored() {
        let mut clip = slide("a", 4.0);
        clip.tracks[0].node = 9;
        let pose = blend_pose([(&clip, 0.0, 1.0)], &[NodeTransform::identity()]);
        assert_eq!(pose[0], NodeTransform::identity());
    }
}
