use super::model::{LoadedModel, MeshData, MeshPrimitive, SceneNode, SkinData};
use crate::animation::clip::{Interpolation, Track, TrackValues};
use crate::animation::{AnimationClip, NodeTransform};
use crate::error::ViewerError;
use gltf::animation::util::ReadOutputs;
use nalgebra_glm as glm;
use std::path::Path;

/// Decode a glTF or GLB document. External buffers resolve against `base`.
pub fn decode_model(bytes: &[u8], base: Option<&Path>) -> Result<LoadedModel, ViewerError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let nodes = decode_nodes(&document);
    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|node| node.index()).collect(),
        None => nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
            .collect(),
    };

    let meshes = document
        .meshes()
        .map(|mesh| decode_mesh(&mesh, &buffers))
        .collect();

    let skins = document
        .skins()
        .map(|skin| {
            let joints: Vec<usize> = skin.joints().map(|joint| joint.index()).collect();
            let reader = skin.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
            let inverse_bind = match reader.read_inverse_bind_matrices() {
                Some(matrices) => matrices.map(|m| glm::Mat4::from(m)).collect(),
                None => vec![glm::Mat4::identity(); joints.len()],
            };
            SkinData {
                joints,
                inverse_bind,
            }
        })
        .collect();

    let clips: Vec<AnimationClip> = document
        .animations()
        .enumerate()
        .map(|(index, animation)| decode_clip(index, &animation, &buffers))
        .collect();

    for (i, clip) in clips.iter().enumerate() {
        if clips[..i].iter().any(|other| other.name == clip.name) {
            log::warn!("Duplicate clip name `{}`, only the first is selectable", clip.name);
        }
    }

    Ok(LoadedModel {
        nodes,
        roots,
        meshes,
        skins,
        clips,
    })
}

fn decode_nodes(document: &gltf::Document) -> Vec<SceneNode> {
    let mut nodes: Vec<SceneNode> = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            SceneNode {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("node_{}", node.index())),
                parent: None,
                children: node.children().map(|child| child.index()).collect(),
                rest: NodeTransform {
                    translation: glm::Vec3::from(translation),
                    rotation: glm::quat(rotation[0], rotation[1], rotation[2], rotation[3]),
                    scale: glm::Vec3::from(scale),
                },
                mesh: node.mesh().map(|mesh| mesh.index()),
                skin: node.skin().map(|skin| skin.index()),
            }
        })
        .collect();

    for parent in 0..nodes.len() {
        for child in nodes[parent].children.clone() {
            if let Some(node) = nodes.get_mut(child) {
                node.parent = Some(parent);
            }
        }
    }

    nodes
}

fn decode_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> MeshData {
    let mut primitives = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!(
                "Skipping {:?} primitive of mesh {}",
                primitive.mode(),
                mesh.index()
            );
            continue;
        }

        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            log::warn!("Mesh {} has a primitive without positions", mesh.index());
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let normals = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => compute_normals(&positions, &indices),
        };

        primitives.push(MeshPrimitive {
            joints: reader.read_joints(0).map(|j| j.into_u16().collect()),
            weights: reader.read_weights(0).map(|w| w.into_f32().collect()),
            base_color: primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor(),
            positions,
            normals,
            indices,
        });
    }

    MeshData {
        name: mesh.name().unwrap_or_default().to_string(),
        primitives,
    }
}

/// Area-weighted vertex normals for meshes that ship without them
fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![glm::Vec3::zeros(); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            glm::Vec3::from(positions[a]),
            glm::Vec3::from(positions[b]),
            glm::Vec3::from(positions[c]),
        );
        let face = glm::cross(&(pb - pa), &(pc - pa));
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| {
            if n.norm() > f32::EPSILON {
                let n = n.normalize();
                [n.x, n.y, n.z]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

fn decode_clip(
    index: usize,
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> AnimationClip {
    let name = animation
        .name()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{}", index));

    let mut tracks = Vec::new();
    for channel in animation.channels() {
        let reader = channel.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs()) else {
            continue;
        };

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };
        let values = match outputs {
            ReadOutputs::Translations(it) => TrackValues::Translation(keyed_values(
                it.map(glm::Vec3::from).collect(),
                interpolation,
            )),
            ReadOutputs::Scales(it) => TrackValues::Scale(keyed_values(
                it.map(glm::Vec3::from).collect(),
                interpolation,
            )),
            ReadOutputs::Rotations(it) => TrackValues::Rotation(keyed_values(
                it.into_f32()
                    .map(|q| glm::quat_normalize(&glm::quat(q[0], q[1], q[2], q[3])))
                    .collect(),
                interpolation,
            )),
            ReadOutputs::MorphTargetWeights(_) => continue,
        };

        tracks.push(Track {
            node: channel.target().node().index(),
            interpolation,
            times: inputs.collect(),
            values,
        });
    }

    AnimationClip::new(name, tracks)
}

/// Cubic-spline outputs come as (in-tangent, value, out-tangent) triples; keep the values.
fn keyed_values<T: Copy>(values: Vec<T>, interpolation: Interpolation) -> Vec<T> {
    match interpolation {
        Interpolation::CubicSpline => values.chunks_exact(3).map(|triple| triple[1]).collect(),
        _ => values,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::TrackSample;

    #[test]
    fn sample_glb_decodes_clips_in_file_order() {
        let model = decode_model(&fixtures::sample_glb(), None).unwrap();
        assert_eq!(model.clip_names(), vec!["01_Idle", "02_Taunt", "animation_2"]);
        for clip in &model.clips {
            assert!((clip.duration - 1.5).abs() < 1e-6, "{}", clip.name);
        }
        assert_eq!(model.clips[2].tracks[0].interpolation, Interpolation::Step);
    }

    #[test]
    fn hierarchy_and_rest_pose() {
        let model = decode_model(&fixtures::sample_glb(), None).unwrap();
        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[1].name, "child");
        assert_eq!(model.nodes[1].rest.translation, glm::vec3(0.0, 1.0, 0.0));
        assert_eq!(model.nodes[0].mesh, Some(0));
    }

    #[test]
    fn unindexed_triangle_gets_indices_and_normals() {
        let model = decode_model(&fixtures::sample_glb(), None).unwrap();
        let primitive = &model.meshes[0].primitives[0];
        assert_eq!(primitive.indices, vec![0, 1, 2]);
        assert!(!primitive.is_skinned());
        for normal in &primitive.normals {
            assert!((normal[2] - 1.0).abs() < 1e-6);
        }
        assert_eq!(primitive.base_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn decoded_track_samples_between_keys() {
        let model = decode_model(&fixtures::sample_glb(), None).unwrap();
        match model.clips[0].tracks[0].sample(0.75) {
            Some(TrackSample::Translation(v)) => {
                assert!((v - glm::vec3(0.0, 1.0, 0.0)).norm() < 1e-5)
            }
            other => panic!("unexpected sample {:?}", other),
        }
    }

    #[test]
    fn cubic_spline_keeps_middle_values() {
        let values = vec![0, 1, 2, 10, 11, 12];
        assert_eq!(keyed_values(values.clone(), Interpolation::CubicSpline), vec![1, 11]);
        assert_eq!(keyed_values(values.clone(), Interpolation::Linear), values);
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let err = decode_model(b"not a model", None).unwrap_err();
        assert!(matches!(err, ViewerError::Gltf(_)));
    }
}
