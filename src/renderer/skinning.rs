// CPU skinning
// Rebuilds the model's world-space vertices from a posed hierarchy every frame

use crate::asset::{LoadedModel, MeshPrimitive};
use crate::renderer::vertex::Vertex;
use nalgebra_glm as glm;

/// Primitives in draw order: (node, mesh, primitive)
fn drawn_primitives(model: &LoadedModel) -> impl Iterator<Item = (usize, &MeshPrimitive)> {
    model.nodes.iter().enumerate().flat_map(move |(index, node)| {
        node.mesh
            .and_then(|mesh| model.meshes.get(mesh))
            .into_iter()
            .flat_map(move |mesh| mesh.primitives.iter().map(move |p| (index, p)))
    })
}

/// Index buffer matching the vertex order of [`skin_vertices`]
pub fn model_indices(model: &LoadedModel) -> Vec<u32> {
    let mut indices = Vec::new();
    let mut base = 0u32;
    for (_, primitive) in drawn_primitives(model) {
        indices.extend(primitive.indices.iter().map(|i| base + i));
        base += primitive.positions.len() as u32;
    }
    indices
}

/// Write world-space vertices for `globals` into `out`.
/// Skinned primitives use their joints, the rest follow their node.
pub fn skin_vertices(model: &LoadedModel, globals: &[glm::Mat4], out: &mut Vec<Vertex>) {
    out.clear();

    for (node_index, primitive) in drawn_primitives(model) {
        let node = &model.nodes[node_index];
        let joint_matrices = match (node.skin, primitive.is_skinned()) {
            (Some(skin), true) => Some(model.joint_matrices(skin, globals)),
            _ => None,
        };
        let node_matrix = globals
            .get(node_index)
            .copied()
            .unwrap_or_else(glm::Mat4::identity);
        let color = [
            primitive.base_color[0],
            primitive.base_color[1],
            primitive.base_color[2],
        ];

        for (i, position) in primitive.positions.iter().enumerate() {
            let matrix = match &joint_matrices {
                Some(joints) => blend_joints(primitive, i, joints),
                None => node_matrix,
            };
            let p = matrix * glm::vec4(position[0], position[1], position[2], 1.0);
            let n = primitive.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
            let n = matrix * glm::vec4(n[0], n[1], n[2], 0.0);
            let n = glm::vec3(n.x, n.y, n.z);
            let n = if n.norm() > f32::EPSILON {
                n.normalize()
            } else {
                glm::vec3(0.0, 1.0, 0.0)
            };

            out.push(Vertex {
                position: [p.x, p.y, p.z],
                normal: [n.x, n.y, n.z],
                color,
            });
        }
    }
}

fn blend_joints(primitive: &MeshPrimitive, vertex: usize, joints: &[glm::Mat4]) -> glm::Mat4 {
    let (Some(indices), Some(weights)) = (
        primitive.joints.as_ref().and_then(|j| j.get(vertex)),
        primitive.weights.as_ref().and_then(|w| w.get(vertex)),
    ) else {
        return glm::Mat4::identity();
    };

    let mut matrix = glm::Mat4::zeros();
    let mut total = 0.0;
    for (&joint, &weight) in indices.iter().zip(weights.iter()) {
        if weight <= 0.0 {
            continue;
        }
        if let Some(joint_matrix) = joints.get(joint as usize) {
            matrix += joint_matrix * weight;
            total += weight;
        }
    }

    if total <= f32::EPSILON {
        glm::Mat4::identity()
    } else {
        matrix / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::NodeTransform;
    use crate::asset::{MeshData, SceneNode, SkinData};

    fn node(mesh: Option<usize>, skin: Option<usize>, children: Vec<usize>) -> SceneNode {
        SceneNode {
            name: String::new(),
            parent: None,
            children,
            rest: NodeTransform::identity(),
            mesh,
            skin,
        }
    }

    fn triangle(skinned: bool) -> MeshPrimitive {
        MeshPrimitive {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            joints: skinned.then(|| vec![[0, 0, 0, 0]; 3]),
            weights: skinned.then(|| vec![[1.0, 0.0, 0.0, 0.0]; 3]),
            indices: vec![0, 1, 2],
            base_color: [0.5, 0.25, 1.0, 1.0],
        }
    }

    fn model(skinned: bool) -> LoadedModel {
        LoadedModel {
            nodes: vec![
                node(Some(0), skinned.then_some(0), vec![1]),
                node(None, None, vec![]),
            ],
            roots: vec![0],
            meshes: vec![MeshData {
                name: "tri".to_string(),
                primitives: vec![triangle(skinned), triangle(skinned)],
            }],
            skins: vec![SkinData {
                joints: vec![1],
                inverse_bind: vec![glm::Mat4::identity()],
            }],
            clips: Vec::new(),
        }
    }

    #[test]
    fn indices_are_rebased_per_primitive() {
        assert_eq!(model_indices(&model(false)), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn rigid_mesh_follows_its_node() {
        let model = model(false);
        let mut pose = model.rest_pose();
        pose[0].translation = glm::vec3(0.0, 0.0, 3.0);
        let globals = model.global_transforms(&pose);

        let mut out = Vec::new();
        skin_vertices(&model, &globals, &mut out);
        assert_eq!(out.len(), 6);
        assert_eq!(out[1].position, [1.0, 0.0, 3.0]);
        assert_eq!(out[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(out[1].color, [0.5, 0.25, 1.0]);
    }

    #[test]
    fn skinned_mesh_follows_its_joint() {
        let model = model(true);
        let mut pose = model.rest_pose();
        pose[1].translation = glm::vec3(2.0, 0.0, 0.0);
        let globals = model.global_transforms(&pose);

        let mut out = Vec::new();
        skin_vertices(&model, &globals, &mut out);
        assert_eq!(out[2].position, [2.0, 1.0, 0.0]);
    }

    #[test]
    fn zero_weights_fall_back_to_identity() {
        let mut primitive = triangle(true);
        primitive.weights = Some(vec![[0.0; 4]; 3]);
        let joints = [glm::translation(&glm::vec3(5.0, 0.0, 0.0))];
        assert_eq!(blend_joints(&primitive, 0, &joints), glm::Mat4::identity());
    }
}
