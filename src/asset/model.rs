use crate::animation::{AnimationClip, NodeTransform};
use nalgebra_glm as glm;

/// Node of the decoded scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub rest: NodeTransform,
    pub mesh: Option<usize>,
    pub skin: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub joints: Option<Vec<[u16; 4]>>,
    pub weights: Option<Vec<[f32; 4]>>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

impl MeshPrimitive {
    pub fn is_skinned(&self) -> bool {
        self.joints.is_some() && self.weights.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<MeshPrimitive>,
}

#[derive(Debug, Clone, Default)]
pub struct SkinData {
    /// Node index of each joint, in joint-index order
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<glm::Mat4>,
}

/// Everything decoded from one model file
#[derive(Debug, Clone, Default)]
pub struct LoadedModel {
    pub nodes: Vec<SceneNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub skins: Vec<SkinData>,
    pub clips: Vec<AnimationClip>,
}

impl LoadedModel {
    pub fn rest_pose(&self) -> Vec<NodeTransform> {
        self.nodes.iter().map(|node| node.rest).collect()
    }

    pub fn clip_names(&self) -> Vec<&str> {
        self.clips.iter().map(|clip| clip.name.as_str()).collect()
    }

    /// World matrix of every node for the given local pose, walking down from the roots.
    pub fn global_transforms(&self, local: &[NodeTransform]) -> Vec<glm::Mat4> {
        let mut globals = vec![glm::Mat4::identity(); self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(usize, glm::Mat4)> = self
            .roots
            .iter()
            .map(|&root| (root, glm::Mat4::identity()))
            .collect();

        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            // A node reached twice means a cycle or shared child; keep the first placement
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let transform = local.get(index).copied().unwrap_or(node.rest);
            let global = parent * transform.matrix();
            globals[index] = global;
            stack.extend(node.children.iter().map(|&child| (child, global)));
        }

        globals
    }

    /// Joint matrices of `skin` (global joint transform times inverse bind).
    pub fn joint_matrices(&self, skin: usize, globals: &[glm::Mat4]) -> Vec<glm::Mat4> {
        let Some(skin) = self.skins.get(skin) else {
            return Vec::new();
        };
        skin.joints
            .iter()
            .enumerate()
            .map(|(i, &joint)| {
                let global = globals.get(joint).copied().unwrap_or_else(glm::Mat4::identity);
                let inverse_bind = skin
                    .inverse_bind
                    .get(i)
                    .copied()
                    .unwrap_or_else(glm::Mat4::identity);
                global * inverse_bind
            })
            .collect()
    }
}
