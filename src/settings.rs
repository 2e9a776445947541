use crate::CONFY_APP_NAME;
use crate::animation::{AnimationClip, AnimationController, ControllerConfig, ControllerMode};
use crate::error::ViewerError;

use serde::{Deserialize, Serialize};

/// confy writes the defaults out when the file does not exist yet
fn load_or_default<T>(name: &str) -> T
where
    T: Serialize + serde::de::DeserializeOwned + Default,
{
    confy::load(CONFY_APP_NAME, name).unwrap_or_else(|e| {
        log::warn!("Using default {} settings: {}", name, e);
        T::default()
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub model_path: String,
    pub clear_color: [f32; 3],
    pub ground_size: f32,
    pub ground_color: [f32; 3],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            model_path: "assets/character.gltf".to_string(),
            clear_color: [0.933, 0.933, 0.933],
            ground_size: 15.0,
            ground_color: [0.933, 0.933, 0.933],
        }
    }
}

impl DisplaySettings {
    pub fn load() -> Self {
        load_or_default("display")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightSettings {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_color: [f32; 3],
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.45,
            directional_color: [1.0, 1.0, 1.0],
            directional_intensity: 0.8,
            directional_position: [100.0, 100.0, 0.0],
        }
    }
}

impl LightSettings {
    pub fn load() -> Self {
        load_or_default("lights")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [9.0, 15.0, 15.0],
            target: [0.0, 0.0, 0.0],
            min_distance: 10.0,
            max_distance: 20.0,
        }
    }
}

impl CameraSettings {
    pub fn load() -> Self {
        load_or_default("camera")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSettings {
    pub mode: ControllerMode,
    pub default_clip: String,
    pub alternate_clips: (String, String),
    pub fade_duration: f32,
    pub alternate_interval: f32,
    pub playback_speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        let config = ControllerConfig::default();
        Self {
            mode: config.mode,
            default_clip: "01_Idle".to_string(),
            alternate_clips: config.alternate_clips,
            fade_duration: config.fade_duration,
            alternate_interval: config.alternate_interval,
            playback_speed: config.playback_speed,
        }
    }
}

impl AnimationSettings {
    pub fn load() -> Self {
        load_or_default("animation")
    }

    /// Clip the controller starts on; the first alternation clip in auto mode
    pub fn starting_clip(&self) -> &str {
        match self.mode {
            ControllerMode::Manual => &self.default_clip,
            ControllerMode::AutoAlternate => &self.alternate_clips.0,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            mode: self.mode,
            fade_duration: self.fade_duration,
            warp: true,
            alternate_interval: self.alternate_interval,
            alternate_clips: self.alternate_clips.clone(),
            playback_speed: self.playback_speed,
        }
    }

    /// Controller for a freshly loaded clip list, already playing its starting clip.
    /// A model without the starting clip (or without any clips) fails here.
    pub fn start_controller(
        &self,
        clips: Vec<AnimationClip>,
    ) -> Result<AnimationController, ViewerError> {
        let mut controller = AnimationController::new(clips, self.controller_config());
        controller.initialize(self.starting_clip())?;
        Ok(controller)
    }
}

// Aggregate struct for convenience
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub lights: LightSettings,
    pub camera: CameraSettings,
    pub animation: AnimationSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            display: DisplaySettings::load(),
            lights: LightSettings::load(),
            camera: CameraSettings::load(),
            animation: AnimationSettings::load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.display.ground_size, 15.0);
        assert_eq!(settings.lights.directional_position, [100.0, 100.0, 0.0]);
        assert_eq!(settings.camera.position, [9.0, 15.0, 15.0]);
        assert_eq!(
            (settings.camera.min_distance, settings.camera.max_distance),
            (10.0, 20.0)
        );
    }

    #[test]
    fn controller_config_follows_animation_settings() {
        let mut animation = AnimationSettings::default();
        animation.mode = ControllerMode::AutoAlternate;
        animation.alternate_interval = 3.0;

        let config = animation.controller_config();
        assert_eq!(config.mode, ControllerMode::AutoAlternate);
        assert_eq!(config.alternate_interval, 3.0);
        assert_eq!(config.fade_duration, 1.0);
        assert!(config.warp);
        assert_eq!(animation.starting_clip(), "01_Idle");
    }

    #[test]
    fn manual_mode_starts_on_default_clip() {
        let animation = AnimationSettings {
            default_clip: "02_Taunt".to_string(),
            ..AnimationSettings::default()
        };
        assert_eq!(animation.starting_clip(), "02_Taunt");
    }

    #[test]
    fn start_controller_plays_starting_clip() {
        let clips = vec![
            AnimationClip::empty("01_Idle", 2.0),
            AnimationClip::empty("02_Taunt", 1.5),
        ];
        let controller = AnimationSettings::default().start_controller(clips).unwrap();
        assert_eq!(controller.current_clip(), Some("01_Idle"));
    }

    #[test]
    fn model_without_clips_reports_missing_default() {
        let err = AnimationSettings::default()
            .start_controller(Vec::new())
            .err()
            .unwrap();
        assert!(matches!(err, ViewerError::ClipNotFound { ref name } if name == "01_Idle"));
    }

    #[test]
    fn auto_mode_without_second_clip_fails_to_start() {
        let animation = AnimationSettings {
            mode: ControllerMode::AutoAlternate,
            ..AnimationSettings::default()
        };
        let err = animation
            .start_controller(vec![AnimationClip::empty("01_Idle", 2.0)])
            .err()
            .unwrap();
        assert!(matches!(err, ViewerError::ClipNotFound { ref name } if name == "02_Taunt"));
    }
}
