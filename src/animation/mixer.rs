// Animation mixer
// Owns the playback slots of one model and blends them into a pose

use super::action::{AnimationAction, LoopMode, Ramp};
use super::clip::{AnimationClip, LoopStyle};
use super::pose::{NodeTransform, blend_pose};

pub type ActionId = usize;

/// Emitted once when a play-once slot reaches its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedEvent {
    pub action: ActionId,
    pub clip: usize,
}

pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
    time: f32,
    pub time_scale: f32,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            time: 0.0,
            time_scale: 1.0,
        }
    }

    /// Slot for `clip`, created on first use and reused afterwards.
    pub fn clip_action(&mut self, clip: usize, clips: &[AnimationClip]) -> Option<ActionId> {
        if let Some(id) = self.existing_action(clip) {
            return Some(id);
        }

        let source = clips.get(clip)?;
        let loop_mode = match source.loop_style {
            LoopStyle::Repeat => LoopMode::Repeat,
            LoopStyle::Once => LoopMode::Once,
        };
        self.actions
            .push(AnimationAction::new(clip, source.duration, loop_mode));
        Some(self.actions.len() - 1)
    }

    pub fn existing_action(&self, clip: usize) -> Option<ActionId> {
        self.actions.iter().position(|a| a.clip() == clip)
    }

    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id)
    }

    pub fn actions(&self) -> impl Iterator<Item = (ActionId, &AnimationAction)> {
        self.actions.iter().enumerate()
    }

    /// True once any slot has been bound for playback
    pub fn has_scheduled_actions(&self) -> bool {
        self.actions.iter().any(AnimationAction::is_scheduled)
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn play(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id) {
            action.running = true;
        }
    }

    pub fn stop(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id) {
            action.running = false;
            action.reset();
        }
    }

    pub fn stop_all_action(&mut self) {
        for id in 0..self.actions.len() {
            self.stop(id);
        }
    }

    pub fn fade_in(&mut self, id: ActionId, duration: f32) {
        self.schedule_fading(id, duration, 0.0, 1.0);
    }

    /// Fade from the slot's present fade level down to zero.
    pub fn fade_out(&mut self, id: ActionId, duration: f32) {
        let now = self.time;
        let Some(action) = self.actions.get(id) else {
            return;
        };
        if !action.enabled {
            return;
        }
        let from = action.weight_fade.map_or(1.0, |fade| fade.value_at(now));
        self.schedule_fading(id, duration, from, 0.0);
    }

    /// Ramp the slot's time scale from `start` to `end` over `duration`.
    pub fn warp(&mut self, id: ActionId, start: f32, end: f32, duration: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(id) {
            let base = if action.time_scale != 0.0 {
                action.time_scale
            } else {
                1.0
            };
            action.time_warp = Some(Ramp::new(now, duration, start / base, end / base));
        }
    }

    /// Fade `from` out while fading `to` in. With `warp`, both time scales are
    /// ramped so the clips progress in proportion to their durations.
    pub fn cross_fade(&mut self, from: ActionId, to: ActionId, duration: f32, warp: bool) {
        if from == to {
            return;
        }

        self.fade_out(from, duration);
        self.fade_in(to, duration);

        if warp {
            let (Some(fade_out), Some(fade_in)) = (self.actions.get(from), self.actions.get(to))
            else {
                return;
            };
            let out_duration = fade_out.clip_duration();
            let in_duration = fade_in.clip_duration();
            if out_duration <= 0.0 || in_duration <= 0.0 {
                return;
            }

            self.warp(from, 1.0, out_duration / in_duration, duration);
            self.warp(to, in_duration / out_duration, 1.0, duration);
        }
    }

    /// Advance mixer time and every bound slot; returns the slots that finished.
    pub fn update(&mut self, delta: f32) -> Vec<FinishedEvent> {
        let delta = delta * self.time_scale;
        self.time += delta;
        let time = self.time;

        let mut finished = Vec::new();
        for (id, action) in self.actions.iter_mut().enumerate() {
            if !action.running {
                continue;
            }
            if action.update(time, delta) {
                finished.push(FinishedEvent {
                    action: id,
                    clip: action.clip(),
                });
            }
        }
        finished
    }

    /// Blend all weighted slots over the rest pose.
    pub fn pose(&self, clips: &[AnimationClip], rest: &[NodeTransform]) -> Vec<NodeTransform> {
        let weighted = self
            .actions
            .iter()
            .filter(|a| a.running && a.effective_weight() > 0.0)
            .filter_map(|a| Some((clips.get(a.clip())?, a.time, a.effective_weight())));
        blend_pose(weighted, rest)
    }

    fn schedule_fading(&mut self, id: ActionId, duration: f32, from: f32, to: f32) {
        let now = self.time;
        if let Some(action) = self.actions.get_mut(id) {
            action.weight_fade = Some(Ramp::new(now, duration, from, to));
        }
    }
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips() -> Vec<AnimationClip> {
        vec![
            AnimationClip::empty("01_Idle", 2.0),
            AnimationClip::empty("02_Taunt", 4.0),
        ]
    }

    #[test]
    fn clip_action_is_cached_per_clip() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let a = mixer.clip_action(1, &clips);
        let b = mixer.clip_action(1, &clips);
        assert_eq!(a, b);
        assert_eq!(mixer.actions().count(), 1);
        assert_eq!(mixer.clip_action(7, &clips), None);
    }

    #[test]
    fn update_without_bound_slots_only_moves_time() {
        let mut mixer = AnimationMixer::new();
        assert!(mixer.update(0.5).is_empty());
        assert_eq!(mixer.time(), 0.5);
        assert!(!mixer.has_scheduled_actions());
    }

    #[test]
    fn cross_fade_blends_weights_evenly() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let idle = mixer.clip_action(0, &clips).unwrap();
        let taunt = mixer.clip_action(1, &clips).unwrap();
        mixer.play(idle);
        mixer.play(taunt);
        mixer.cross_fade(idle, taunt, 1.0, false);

        mixer.update(0.5);
        assert_eq!(mixer.action(idle).unwrap().effective_weight(), 0.5);
        assert_eq!(mixer.action(taunt).unwrap().effective_weight(), 0.5);

        mixer.update(0.5);
        assert!(!mixer.action(idle).unwrap().enabled);
        assert_eq!(mixer.action(taunt).unwrap().effective_weight(), 1.0);
        assert!(!mixer.action(taunt).unwrap().is_fading());
    }

    #[test]
    fn warped_cross_fade_scales_playback() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let idle = mixer.clip_action(0, &clips).unwrap();
        let taunt = mixer.clip_action(1, &clips).unwrap();
        mixer.play(idle);
        mixer.play(taunt);
        mixer.cross_fade(idle, taunt, 1.0, true);

        // Outgoing 2s clip ramps towards half speed, incoming 4s clip starts at double speed
        let idle_warp = mixer.action(idle).unwrap().time_warp.unwrap();
        let taunt_warp = mixer.action(taunt).unwrap().time_warp.unwrap();
        assert_eq!((idle_warp.from, idle_warp.to), (1.0, 0.5));
        assert_eq!((taunt_warp.from, taunt_warp.to), (2.0, 1.0));

        mixer.update(1.0);
        assert_eq!(mixer.action(taunt).unwrap().time_scale, 1.0);
    }

    #[test]
    fn once_slot_reports_finished_once() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let idle = mixer.clip_action(0, &clips).unwrap();
        mixer.action_mut(idle).unwrap().set_loop(LoopMode::Once).clamp_when_finished = true;
        mixer.play(idle);

        assert!(mixer.update(1.0).is_empty());
        assert_eq!(
            mixer.update(1.5),
            vec![FinishedEvent {
                action: idle,
                clip: 0
            }]
        );
        assert!(mixer.update(1.0).is_empty());
        assert_eq!(mixer.action(idle).unwrap().time, 2.0);
    }

    #[test]
    fn fade_out_starts_from_present_level() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let taunt = mixer.clip_action(1, &clips).unwrap();
        mixer.play(taunt);
        mixer.fade_in(taunt, 1.0);
        mixer.update(0.25);

        mixer.fade_out(taunt, 1.0);
        let fade = mixer.action(taunt).unwrap().weight_fade.unwrap();
        assert_eq!((fade.from, fade.to), (0.25, 0.0));
    }

    #[test]
    fn stop_all_unbinds_slots() {
        let clips = clips();
        let mut mixer = AnimationMixer::new();
        let idle = mixer.clip_action(0, &clips).unwrap();
        mixer.play(idle);
        mixer.update(0.5);
        mixer.stop_all_action();
        assert!(!mixer.has_scheduled_actions());
        assert_eq!(mixer.action(idle).unwrap().time, 0.0);
    }
}
