//! Playback controller
//!
//! A deterministic scheduler over the pure frame function. The controller owns
//! its `PlaybackState` exclusively; every mutation goes through one of its
//! public operations.
//!
//! # States
//! ```text
//! Idle ──play──▶ Playing ──pause──▶ Paused ──play──▶ Playing
//!   any ──stop──▶ Stopped (frame 0 emitted) ──play──▶ Playing
//!   any ──seek──▶ same state (clamped frame emitted)
//! ```
//!
//! `next_tick` is the only record of a scheduled advancement. `pause` and `stop`
//! clear it before returning, so no tick can fire from a cancelled schedule.
//! The controller does not own a clock: callers drive it with [`poll`] (or
//! [`poll_at`] with an explicit instant), and
//! [`PlaybackDriver`](crate::simulation::PlaybackDriver) does so on a worker
//! thread.
//!
//! [`poll`]: PlaybackController::poll
//! [`poll_at`]: PlaybackController::poll_at

use crate::simulation::config::PlaybackParams;
use crate::simulation::sequencer::{Frame, FrameCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Frames computed ahead in one batch when playback reaches an uncached frame
const PREFETCH_WINDOW: usize = 32;

/// Playback state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Created, nothing played yet
    #[default]
    Idle,
    /// Advancing on a schedule
    Playing,
    /// Holding the current frame
    Paused,
    /// Reset to frame 0
    Stopped,
}

/// Position and speed of one playback view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Frame currently shown, always in `[0, total_frames)`
    pub current_frame_index: usize,
    /// Number of frames in the loop
    pub total_frames: usize,
    /// True while advancing
    pub is_playing: bool,
    /// Effective speed multiplier (always within the configured range)
    pub speed_multiplier: f32,
}

/// Consumer of emitted frames
///
/// Any `FnMut(Arc<Frame>) + Send` closure is a sink.
pub trait FrameSink: Send {
    /// Receive the frame that just became current
    fn on_frame(&mut self, frame: Arc<Frame>);
}

impl<F> FrameSink for F
where
    F: FnMut(Arc<Frame>) + Send,
{
    fn on_frame(&mut self, frame: Arc<Frame>) {
        self(frame);
    }
}

/// Playback controller for one simulation view
#[derive(Debug)]
pub struct PlaybackController<S: FrameSink> {
    cache: FrameCache,
    params: PlaybackParams,
    sink: S,
    state: PlaybackState,
    status: PlaybackStatus,
    next_tick: Option<Instant>,
}

impl<S: FrameSink> PlaybackController<S> {
    /// Create an idle controller at frame 0
    ///
    /// # Arguments
    ///
    /// * `cache` - Frame cache over the run's sequencer
    /// * `params` - Tick interval and speed range (validated with the config)
    /// * `sink` - Receiver of emitted frames
    pub fn new(cache: FrameCache, params: PlaybackParams, sink: S) -> Self {
        let state = PlaybackState {
            current_frame_index: 0,
            total_frames: cache.total_frames().max(1),
            is_playing: false,
            speed_multiplier: params.clamp_speed(1.0),
        };
        info!(
            "Playback controller: {} frames, {}ms base interval",
            state.total_frames, params.base_interval_ms
        );
        Self {
            cache,
            params,
            sink,
            state,
            status: PlaybackStatus::Idle,
            next_tick: None,
        }
    }

    /// Start or resume playback now
    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    /// Start or resume playback, scheduling the first tick one interval after `now`
    ///
    /// No-op while already playing.
    pub fn play_at(&mut self, now: Instant) {
        if self.status == PlaybackStatus::Playing {
            return;
        }
        debug!(
            "Play from frame {} ({:?})",
            self.state.current_frame_index, self.status
        );
        self.status = PlaybackStatus::Playing;
        self.state.is_playing = true;
        self.next_tick = Some(now + self.tick_interval());
    }

    /// Pause playback, keeping the current frame
    ///
    /// Only acts while playing. The pending tick is cancelled before returning.
    pub fn pause(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        self.next_tick = None;
        self.status = PlaybackStatus::Paused;
        self.state.is_playing = false;
        debug!("Paused at frame {}", self.state.current_frame_index);
    }

    /// Stop playback, reset to frame 0 and emit it
    pub fn stop(&mut self) {
        self.next_tick = None;
        self.status = PlaybackStatus::Stopped;
        self.state.is_playing = false;
        self.state.current_frame_index = 0;
        debug!("Stopped");
        self.emit();
    }

    /// Jump to a frame and emit it
    ///
    /// The index is clamped to `[0, total_frames)`; play/pause status and any
    /// pending tick are unchanged.
    pub fn seek(&mut self, index: i64) {
        let last = self.state.total_frames - 1;
        let clamped = usize::try_from(index.max(0)).map_or(last, |i| i.min(last));
        if i64::try_from(clamped).ok() != Some(index) {
            debug!("Seek to {} clamped to {}", index, clamped);
        }
        self.state.current_frame_index = clamped;
        self.emit();
    }

    /// Set the speed multiplier, clamped to the configured range
    ///
    /// Takes effect from the next scheduled tick.
    ///
    /// # Returns
    ///
    /// The effective speed
    pub fn set_speed(&mut self, speed: f32) -> f32 {
        let effective = self.params.clamp_speed(speed);
        if effective != speed {
            debug!("Speed {} clamped to {}", speed, effective);
        }
        self.state.speed_multiplier = effective;
        effective
    }

    /// Interval between ticks at the current speed
    pub fn tick_interval(&self) -> Duration {
        self.params.tick_interval(self.state.speed_multiplier)
    }

    /// Deadline of the scheduled tick, if any
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Fire the scheduled tick if it is due now
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Fire the scheduled tick if it is due at `now`
    ///
    /// At most one tick fires per call. The next tick is scheduled one interval
    /// after the fired deadline, or after `now` if playback fell behind.
    ///
    /// # Returns
    ///
    /// `true` if a tick fired
    pub fn poll_at(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.next_tick else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.tick();
        let interval = self.tick_interval();
        let next = deadline + interval;
        self.next_tick = Some(if next > now { next } else { now + interval });
        true
    }

    fn tick(&mut self) {
        let next = (self.state.current_frame_index + 1) % self.state.total_frames;
        if !self.cache.contains(next) {
            let end = (next + PREFETCH_WINDOW).min(self.state.total_frames);
            self.cache.prefetch(next..end);
        }
        self.state.current_frame_index = next;
        self.emit();
    }

    fn emit(&mut self) {
        let frame = self.cache.get(self.state.current_frame_index);
        debug!(
            "Frame {} t={:.2}s p={:.3}",
            frame.frame_index, *frame.time_s, *frame.scalars.max_pressure_bar
        );
        self.sink.on_frame(frame);
    }

    /// Current frame, computed on a cache miss
    pub fn current_frame(&mut self) -> Arc<Frame> {
        self.cache.get(self.state.current_frame_index)
    }

    /// Snapshot of the playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Current state machine state
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Frame cache driving this controller
    pub fn cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Frame sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable frame sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
