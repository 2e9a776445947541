// Animation controller
// Crossfade state machine on top of the mixer: manual one-shot selection
// returning to idle, or timed alternation between two looping clips.

use super::action::LoopMode;
use super::clip::{AnimationClip, find_by_name};
use super::mixer::{ActionId, AnimationMixer, FinishedEvent};
use super::pose::NodeTransform;
use crate::clock::FrameTime;
use crate::error::ViewerError;
use serde::{Deserialize, Serialize};

/// Operating strategy, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerMode {
    /// User picks clips; each plays once then blends back to idle
    Manual,
    /// Timer toggles between two looping clips
    AutoAlternate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    pub mode: ControllerMode,
    pub fade_duration: f32,
    pub warp: bool,
    pub alternate_interval: f32,
    pub alternate_clips: (String, String),
    pub playback_speed: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mode: ControllerMode::Manual,
            fade_duration: 1.0,
            warp: true,
            alternate_interval: 5.5,
            alternate_clips: ("01_Idle".to_string(), "02_Taunt".to_string()),
            playback_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// No clip bound yet
    Unbound,
    Idle,
    /// Crossfade in flight; `returning` when blending back to idle
    Transitioning { returning: bool },
    OneShotPlaying,
    PlayingA,
    PlayingB,
}

/// Snapshot of the controller's clip bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub current_clip: Option<String>,
    pub pending_clip: Option<String>,
    pub last_transition_time: f32,
}

pub struct AnimationController {
    clips: Vec<AnimationClip>,
    mixer: AnimationMixer,
    config: ControllerConfig,
    phase: ControllerPhase,
    idle: Option<ActionId>,
    current: Option<ActionId>,
    pending: Option<ActionId>,
    one_shot: Option<ActionId>,
    alternate: Option<(ActionId, ActionId)>,
    elapsed: f32,
    last_transition: f32,
    /// Frame clock reading at which controller time started counting
    clock_origin: Option<f32>,
}

impl AnimationController {
    pub fn new(clips: Vec<AnimationClip>, config: ControllerConfig) -> Self {
        let mut mixer = AnimationMixer::new();
        mixer.time_scale = config.playback_speed;

        Self {
            clips,
            mixer,
            config,
            phase: ControllerPhase::Unbound,
            idle: None,
            current: None,
            pending: None,
            one_shot: None,
            alternate: None,
            elapsed: 0.0,
            last_transition: 0.0,
            clock_origin: None,
        }
    }

    /// Bind `default_clip` as the looping idle slot and start it.
    /// In auto-alternate mode both alternation clips must exist as well.
    pub fn initialize(&mut self, default_clip: &str) -> Result<(), ViewerError> {
        let clip = self.lookup(default_clip)?;
        let pair = match self.config.mode {
            ControllerMode::Manual => None,
            ControllerMode::AutoAlternate => {
                let (a, b) = &self.config.alternate_clips;
                Some((self.lookup(a)?, self.lookup(b)?))
            }
        };

        self.mixer.stop_all_action();
        let idle = self.bind(clip)?;
        self.restart(idle, LoopMode::Repeat, false);

        self.alternate = match pair {
            Some((a, b)) => Some((self.bind(a)?, self.bind(b)?)),
            None => None,
        };

        self.idle = Some(idle);
        self.current = Some(idle);
        self.pending = None;
        self.one_shot = None;
        self.last_transition = self.elapsed;
        self.clock_origin = None;
        self.phase = match self.alternate {
            None => ControllerPhase::Idle,
            Some((_, b)) if b == idle => ControllerPhase::PlayingB,
            Some(_) => ControllerPhase::PlayingA,
        };

        log::info!("Animation controller started on '{}' ({:?})", default_clip, self.config.mode);
        Ok(())
    }

    /// Crossfade into `name` as a play-once clip that holds its last pose.
    /// Unknown names are reported and leave playback untouched.
    pub fn select_clip(&mut self, name: &str) -> Result<(), ViewerError> {
        if self.config.mode != ControllerMode::Manual {
            log::warn!("Ignoring selection of '{}': controller is auto-alternating", name);
            return Err(ViewerError::SelectionDisabled);
        }

        let clip = self.lookup(name).inspect_err(|e| log::warn!("{}", e))?;
        let Some(current) = self.current else {
            log::warn!("Ignoring selection of '{}': no default clip bound", name);
            return Err(ViewerError::NotInitialized);
        };
        let incoming = self.bind(clip)?;

        // A transition already in flight is replaced, its target fades out with the rest
        let outgoing = self.pending.unwrap_or(current);
        self.restart(incoming, LoopMode::Once, true);
        self.cross_fade_into(outgoing, incoming);

        self.pending = Some(incoming);
        self.one_shot = Some(incoming);
        self.last_transition = self.elapsed;
        self.phase = ControllerPhase::Transitioning { returning: false };
        log::info!("Selected animation '{}'", name);

        self.settle();
        Ok(())
    }

    /// Blend back to the idle clip after a play-once slot completed.
    /// Returns false when `event` does not belong to the one-shot in flight,
    /// so a completed one-shot is handled exactly once.
    pub fn on_clip_finished(&mut self, event: FinishedEvent) -> bool {
        let (Some(one_shot), Some(idle)) = (self.one_shot, self.idle) else {
            log::debug!("Finished event for slot {} with no one-shot in flight", event.action);
            return false;
        };
        if event.action != one_shot {
            return false;
        }

        log::debug!("'{}' finished, returning to idle", self.clip_name(one_shot).unwrap_or("?"));

        self.one_shot = None;
        self.current = Some(one_shot);
        self.restart(idle, LoopMode::Repeat, false);
        self.cross_fade_into(one_shot, idle);

        self.pending = Some(idle);
        self.last_transition = self.elapsed;
        self.phase = ControllerPhase::Transitioning { returning: true };

        self.settle();
        true
    }

    /// Auto-alternate step: advance the frame, then switch clips once
    /// `alternate_interval` seconds have passed since the last switch.
    ///
    /// `elapsed` is read from the frame clock, which may have been running
    /// long before `initialize`. The first tick after initialization pins
    /// the clock reading that matches controller time, and later ticks are
    /// measured against it.
    pub fn tick(&mut self, elapsed: f32, delta: f32) {
        self.advance_frame(delta);
        let origin = *self.clock_origin.get_or_insert(elapsed - self.elapsed);
        self.elapsed = elapsed - origin;
        let elapsed = self.elapsed;

        let Some((a, b)) = self.alternate else {
            return;
        };
        if elapsed - self.last_transition < self.config.alternate_interval {
            return;
        }
        let Some(active) = self.pending.or(self.current) else {
            return;
        };

        let (target, phase) = if active == a {
            (b, ControllerPhase::PlayingB)
        } else {
            (a, ControllerPhase::PlayingA)
        };

        self.restart(target, LoopMode::Repeat, false);
        self.cross_fade_into(active, target);

        self.pending = Some(target);
        self.last_transition = elapsed;
        self.phase = phase;
        log::info!("Alternating to '{}'", self.clip_name(target).unwrap_or("?"));

        self.settle();
    }

    /// Advance every slot by `delta`, then run transition bookkeeping.
    /// Does nothing until a clip has been bound.
    pub fn advance_frame(&mut self, delta: f32) {
        if !self.mixer.has_scheduled_actions() {
            return;
        }

        self.elapsed += delta;
        for event in self.mixer.update(delta) {
            self.on_clip_finished(event);
        }
        self.settle();
    }

    /// Per-frame entry point used by the render loop.
    pub fn update(&mut self, frame: FrameTime) {
        match self.config.mode {
            ControllerMode::Manual => self.advance_frame(frame.delta),
            ControllerMode::AutoAlternate => self.tick(frame.elapsed, frame.delta),
        }
    }

    /// Blended node transforms for the current frame.
    pub fn pose(&self, rest: &[NodeTransform]) -> Vec<NodeTransform> {
        self.mixer.pose(&self.clips, rest)
    }

    pub fn state(&self) -> ControllerState {
        ControllerState {
            current_clip: self.current_clip().map(str::to_string),
            pending_clip: self.pending_clip().map(str::to_string),
            last_transition_time: self.last_transition,
        }
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn mode(&self) -> ControllerMode {
        self.config.mode
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current.and_then(|id| self.clip_name(id))
    }

    pub fn pending_clip(&self) -> Option<&str> {
        self.pending.and_then(|id| self.clip_name(id))
    }

    /// Clip the controller is playing or blending towards
    pub fn active_clip(&self) -> Option<&str> {
        self.pending.or(self.current).and_then(|id| self.clip_name(id))
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    fn lookup(&self, name: &str) -> Result<usize, ViewerError> {
        find_by_name(&self.clips, name).ok_or_else(|| ViewerError::clip_not_found(name))
    }

    fn bind(&mut self, clip: usize) -> Result<ActionId, ViewerError> {
        self.mixer.clip_action(clip, &self.clips).ok_or_else(|| {
            ViewerError::clip_not_found(self.clips.get(clip).map_or("?", |c| c.name.as_str()))
        })
    }

    fn clip_name(&self, id: ActionId) -> Option<&str> {
        let clip = self.mixer.action(id)?.clip();
        self.clips.get(clip).map(|c| c.name.as_str())
    }

    /// Rewind a slot to time zero with the given looping and start it.
    fn restart(&mut self, id: ActionId, loop_mode: LoopMode, clamp: bool) {
        if let Some(action) = self.mixer.action_mut(id) {
            action.reset().set_loop(loop_mode).clamp_when_finished = clamp;
        }
        self.mixer.play(id);
    }

    /// Crossfade `from` into `to`; every other visible slot fades out alongside.
    fn cross_fade_into(&mut self, from: ActionId, to: ActionId) {
        let fade = self.config.fade_duration;
        self.mixer.cross_fade(from, to, fade, self.config.warp);

        let others: Vec<ActionId> = self
            .mixer
            .actions()
            .filter(|(id, a)| *id != from && *id != to && a.is_scheduled() && a.enabled)
            .map(|(id, _)| id)
            .collect();
        for id in others {
            self.mixer.fade_out(id, fade);
        }
    }

    /// Promote the pending clip once its fade-in has completed.
    fn settle(&mut self) {
        let Some(pending) = self.pending else {
            return;
        };
        if self.mixer.action(pending).is_some_and(|a| a.is_fading()) {
            return;
        }

        self.current = Some(pending);
        self.pending = None;

        if self.config.mode == ControllerMode::Manual {
            self.phase = if self.one_shot.is_some() {
                ControllerPhase::OneShotPlaying
            } else {
                ControllerPhase::Idle
            };
        }
    }
}
