// Animation system module
// Clips, playback slots, the mixer that blends them and the crossfade controller

pub mod action;
pub mod clip;
pub mod controller;
pub mod interpolation;
pub mod mixer;
pub mod pose;

pub use action::{AnimationAction, LoopMode};
pub use clip::{AnimationClip, ClipInfo, LoopStyle, find_by_name};
pub use controller::{
    AnimationController, ControllerConfig, ControllerMode, ControllerPhase, ControllerState,
};
pub use mixer::{ActionId, AnimationMixer, FinishedEvent};
pub use pose::NodeTransform;
