// Scene graph
// Lights, the ground plane and the loaded model hierarchy

use crate::animation::NodeTransform;
use crate::asset::LoadedModel;
use crate::settings::{DisplaySettings, LightSettings};
use nalgebra_glm as glm;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
}

impl DirectionalLight {
    /// Unit vector from the origin toward the light
    pub fn direction(&self) -> [f32; 3] {
        let v = glm::Vec3::from(self.position);
        if v.norm() <= f32::EPSILON {
            return [0.0, 1.0, 0.0];
        }
        let v = v.normalize();
        [v.x, v.y, v.z]
    }
}

/// Square ground plane centered at the origin in the XZ plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ground {
    pub size: f32,
    pub color: [f32; 3],
}

impl Ground {
    /// Corner positions and the two upward-facing triangles
    pub fn quad(&self) -> ([[f32; 3]; 4], [u32; 6]) {
        let h = self.size * 0.5;
        (
            [[-h, 0.0, -h], [h, 0.0, -h], [h, 0.0, h], [-h, 0.0, h]],
            [0, 2, 1, 0, 3, 2],
        )
    }
}

pub struct Scene {
    pub clear_color: [f32; 3],
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub ground: Ground,
    model: Option<LoadedModel>,
    rest_pose: Vec<NodeTransform>,
}

impl Scene {
    pub fn new(display: &DisplaySettings, lights: &LightSettings) -> Self {
        Self {
            clear_color: display.clear_color,
            ambient: AmbientLight {
                color: lights.ambient_color,
                intensity: lights.ambient_intensity,
            },
            directional: DirectionalLight {
                color: lights.directional_color,
                intensity: lights.directional_intensity,
                position: lights.directional_position,
            },
            ground: Ground {
                size: display.ground_size,
                color: display.ground_color,
            },
            model: None,
            rest_pose: Vec::new(),
        }
    }

    pub fn set_model(&mut self, model: LoadedModel) {
        self.rest_pose = model.rest_pose();
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn rest_pose(&self) -> &[NodeTransform] {
        &self.rest_pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SceneNode;

    fn scene() -> Scene {
        Scene::new(&DisplaySettings::default(), &LightSettings::default())
    }

    #[test]
    fn defaults_build_the_demo_scene() {
        let scene = scene();
        assert_eq!(scene.clear_color, [0.933, 0.933, 0.933]);
        assert_eq!(scene.directional.position, [100.0, 100.0, 0.0]);
        assert_eq!(scene.ground.size, 15.0);
        assert!(scene.model().is_none());

        let d = scene.directional.direction();
        assert!((d[0] - d[1]).abs() < 1e-6 && d[2] == 0.0);
    }

    #[test]
    fn ground_spans_its_size_and_faces_up() {
        let (corners, indices) = scene().ground.quad();
        assert_eq!(corners[2], [7.5, 0.0, 7.5]);

        let p = |i: u32| glm::Vec3::from(corners[i as usize]);
        for tri in indices.chunks(3) {
            let n = glm::cross(&(p(tri[1]) - p(tri[0])), &(p(tri[2]) - p(tri[0])));
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn set_model_captures_rest_pose() {
        let mut scene = scene();
        let mut rest = NodeTransform::identity();
        rest.translation = glm::vec3(0.0, 2.0, 0.0);
        scene.set_model(LoadedModel {
            nodes: vec![SceneNode {
                name: "root".to_string(),
                parent: None,
                children: Vec::new(),
                rest,
                mesh: None,
                skin: None,
            }],
            roots: vec![0],
            ..LoadedModel::default()
        });
        assert_eq!(scene.rest_pose(), &[rest]);
    }
}
