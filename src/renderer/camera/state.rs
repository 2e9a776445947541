use crate::settings::CameraSettings;
use nalgebra_glm as glm;

/// Orbit camera around a target, Y up
#[derive(Debug, Clone)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub default_yaw: f32,
    pub default_pitch: f32,
    pub default_distance: f32,
    pub default_target: [f32; 3],
}

impl CameraState {
    pub fn new(yaw: f32, pitch: f32, distance: f32, target: [f32; 3]) -> Self {
        let defaults = CameraSettings::default();
        Self {
            yaw,
            pitch,
            distance,
            target,
            fov_degrees: defaults.fov_degrees,
            near: defaults.near,
            far: defaults.far,
            aspect: 1.0,
            min_distance: defaults.min_distance,
            max_distance: defaults.max_distance,
            default_yaw: yaw,
            default_pitch: pitch,
            default_distance: distance,
            default_target: target,
        }
    }

    /// Orbit that puts the eye at `settings.position` looking at `settings.target`
    pub fn from_settings(settings: &CameraSettings) -> Self {
        let offset = glm::Vec3::from(settings.position) - glm::Vec3::from(settings.target);
        let distance = offset.norm().max(f32::EPSILON);
        let yaw = offset.x.atan2(offset.z);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();

        let mut state = Self::new(yaw, pitch, distance, settings.target);
        state.fov_degrees = settings.fov_degrees;
        state.near = settings.near;
        state.far = settings.far;
        state.min_distance = settings.min_distance;
        state.max_distance = settings.max_distance;
        state
    }

    pub fn reset(&mut self) {
        self.yaw = self.default_yaw;
        self.pitch = self.default_pitch;
        self.distance = self.default_distance;
        self.target = self.default_target;
        self.clamp_distance();
    }

    pub fn clamp_distance(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn eye(&self) -> glm::Vec3 {
        let target = glm::Vec3::from(self.target);
        target
            + glm::vec3(
                self.pitch.cos() * self.yaw.sin(),
                self.pitch.sin(),
                self.pitch.cos() * self.yaw.cos(),
            ) * self.distance
    }

    pub fn view(&self) -> glm::Mat4 {
        glm::look_at(
            &self.eye(),
            &glm::Vec3::from(self.target),
            &glm::vec3(0.0, 1.0, 0.0),
        )
    }

    pub fn projection(&self) -> glm::Mat4 {
        glm::perspective_rh_zo(self.aspect, self.fov_degrees.to_radians(), self.near, self.far)
    }

    pub fn view_proj(&self) -> glm::Mat4 {
        self.projection() * self.view()
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}
