// Animation slot: one clip bound to a playback instance

use super::interpolation::lerp_f32;

/// Loop mode of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    Repeat,
    Once,
}

/// Linear ramp over mixer time, used for weight fades and time-scale warps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start: f32,
    pub end: f32,
    pub from: f32,
    pub to: f32,
}

impl Ramp {
    pub fn new(start: f32, duration: f32, from: f32, to: f32) -> Self {
        Self {
            start,
            end: start + duration.max(0.0),
            from,
            to,
        }
    }

    pub fn value_at(&self, time: f32) -> f32 {
        if time >= self.end {
            self.to
        } else if time <= self.start {
            self.from
        } else {
            lerp_f32(self.from, self.to, (time - self.start) / (self.end - self.start))
        }
    }

    pub fn is_complete(&self, time: f32) -> bool {
        time >= self.end
    }
}

/// Playback instance of a clip.
///
/// Slots are owned by the mixer and addressed by [`ActionId`](super::mixer::ActionId).
/// Time is in seconds of clip time; fades and warps are in seconds of mixer time.
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: usize,
    clip_duration: f32,
    pub time: f32,
    pub time_scale: f32,
    pub weight: f32,
    pub loop_mode: LoopMode,
    pub clamp_when_finished: bool,
    pub enabled: bool,
    pub paused: bool,
    pub(super) running: bool,
    pub(super) weight_fade: Option<Ramp>,
    pub(super) time_warp: Option<Ramp>,
    effective_weight: f32,
    effective_time_scale: f32,
}

impl AnimationAction {
    pub(super) fn new(clip: usize, clip_duration: f32, loop_mode: LoopMode) -> Self {
        Self {
            clip,
            clip_duration,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode,
            clamp_when_finished: false,
            enabled: true,
            paused: false,
            running: false,
            weight_fade: None,
            time_warp: None,
            effective_weight: 0.0,
            effective_time_scale: 1.0,
        }
    }

    pub fn clip(&self) -> usize {
        self.clip
    }

    pub fn clip_duration(&self) -> f32 {
        self.clip_duration
    }

    /// Rewind to time zero and clear any fade or warp.
    pub fn reset(&mut self) -> &mut Self {
        self.paused = false;
        self.enabled = true;
        self.time = 0.0;
        self.stop_fading();
        self.stop_warping();
        self
    }

    pub fn set_loop(&mut self, loop_mode: LoopMode) -> &mut Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn stop_fading(&mut self) -> &mut Self {
        self.weight_fade = None;
        self
    }

    pub fn stop_warping(&mut self) -> &mut Self {
        self.time_warp = None;
        self
    }

    /// Bound into the mixer's active set
    pub fn is_scheduled(&self) -> bool {
        self.running
    }

    pub fn is_fading(&self) -> bool {
        self.weight_fade.is_some()
    }

    /// Weight applied to the pose during the last update
    pub fn effective_weight(&self) -> f32 {
        self.effective_weight
    }

    pub fn effective_time_scale(&self) -> f32 {
        self.effective_time_scale
    }

    /// Advance the slot by `delta` seconds of mixer time ending at `mixer_time`.
    /// Returns true when a play-once slot reached its end during this step.
    pub(super) fn update(&mut self, mixer_time: f32, delta: f32) -> bool {
        if !self.enabled {
            self.update_weight(mixer_time);
            return false;
        }

        let time_scale = self.update_time_scale(mixer_time);
        let finished = self.update_time(delta * time_scale);
        self.update_weight(mixer_time);
        finished
    }

    fn update_weight(&mut self, mixer_time: f32) -> f32 {
        let mut weight = 0.0;

        if self.enabled {
            weight = self.weight;

            if let Some(fade) = self.weight_fade {
                weight *= fade.value_at(mixer_time);

                if fade.is_complete(mixer_time) {
                    self.stop_fading();
                    if fade.to == 0.0 {
                        // Faded out completely
                        self.enabled = false;
                    }
                }
            }
        }

        self.effective_weight = weight;
        weight
    }

    fn update_time_scale(&mut self, mixer_time: f32) -> f32 {
        let mut time_scale = 0.0;

        if !self.paused {
            time_scale = self.time_scale;

            if let Some(warp) = self.time_warp {
                time_scale *= warp.value_at(mixer_time);

                if warp.is_complete(mixer_time) {
                    self.stop_warping();
                    if time_scale == 0.0 {
                        self.paused = true;
                    } else {
                        self.time_scale = time_scale;
                    }
                }
            }
        }

        self.effective_time_scale = time_scale;
        time_scale
    }

    fn update_time(&mut self, delta: f32) -> bool {
        if delta == 0.0 {
            return false;
        }

        let duration = self.clip_duration;
        let time = self.time + delta;

        match self.loop_mode {
            LoopMode::Once => {
                if time >= duration {
                    self.time = duration;
                } else if time < 0.0 {
                    self.time = 0.0;
                } else {
                    self.time = time;
                    return false;
                }

                if self.clamp_when_finished {
                    self.paused = true;
                } else {
                    self.enabled = false;
                }
                true
            }
            LoopMode::Repeat => {
                self.time = if duration > 0.0 {
                    time.rem_euclid(duration)
                } else {
                    0.0
                };
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(loop_mode: LoopMode, duration: f32) -> AnimationAction {
        let mut action = AnimationAction::new(0, duration, loop_mode);
        action.running = true;
        action
    }

    #[test]
    fn ramp_interpolates_and_clamps() {
        let ramp = Ramp::new(2.0, 1.0, 0.0, 1.0);
        assert_eq!(ramp.value_at(1.0), 0.0);
        assert_eq!(ramp.value_at(2.5), 0.5);
        assert_eq!(ramp.value_at(4.0), 1.0);
        assert!(ramp.is_complete(3.0));
    }

    #[test]
    fn repeat_wraps_time() {
        let mut action = playing(LoopMode::Repeat, 2.0);
        assert!(!action.update(2.5, 2.5));
        assert_eq!(action.time, 0.5);
        assert!(action.enabled);
    }

    #[test]
    fn once_with_clamp_pauses_on_final_pose() {
        let mut action = playing(LoopMode::Once, 1.0);
        action.clamp_when_finished = true;

        assert!(action.update(1.5, 1.5));
        assert_eq!(action.time, 1.0);
        assert!(action.paused);
        assert!(action.enabled);
        assert_eq!(action.effective_weight(), 1.0);

        // Paused slots do not finish again
        assert!(!action.update(2.0, 0.5));
        assert_eq!(action.time, 1.0);
    }

    #[test]
    fn once_without_clamp_disables() {
        let mut action = playing(LoopMode::Once, 1.0);
        assert!(action.update(1.0, 1.0));
        assert!(!action.enabled);
        assert_eq!(action.effective_weight(), 0.0);
    }

    #[test]
    fn fade_out_to_zero_disables() {
        let mut action = playing(LoopMode::Repeat, 4.0);
        action.weight_fade = Some(Ramp::new(0.0, 1.0, 1.0, 0.0));

        action.update(0.5, 0.5);
        assert_eq!(action.effective_weight(), 0.5);
        assert!(action.enabled);

        action.update(1.0, 0.5);
        assert_eq!(action.effective_weight(), 0.0);
        assert!(!action.enabled);
        assert!(!action.is_fading());
    }

    #[test]
    fn warp_settles_on_final_time_scale() {
        let mut action = playing(LoopMode::Repeat, 10.0);
        action.time_warp = Some(Ramp::new(0.0, 1.0, 2.0, 1.0));

        action.update(0.5, 0.5);
        assert_eq!(action.effective_time_scale(), 1.5);
        assert_eq!(action.time, 0.75);

        action.update(1.0, 0.5);
        assert_eq!(action.effective_time_scale(), 1.0);
        assert_eq!(action.time_scale, 1.0);
        assert!(action.time_warp.is_none());
    }

    #[test]
    fn reset_clears_fade_and_rewinds() {
        let mut action = playing(LoopMode::Once, 1.0);
        action.time = 0.7;
        action.paused = true;
        action.enabled = false;
        action.weight_fade = Some(Ramp::new(0.0, 1.0, 0.0, 1.0));

        action.reset();
        assert_eq!(action.time, 0.0);
        assert!(!action.paused);
        assert!(action.enabled);
        assert!(!action.is_fading());
    }
}
