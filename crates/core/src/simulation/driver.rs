//! Threaded playback driver
//!
//! Runs one [`PlaybackController`] on a dedicated worker thread. The worker
//! owns the controller outright; the [`PlaybackHandle`] talks to it over an
//! mpsc channel. The worker blocks in `recv_timeout` until either a command
//! arrives or the next tick is due, so commands and ticks are strictly
//! serialized. Every command is acknowledged with a snapshot taken after it was
//! applied: once `pause()` or `stop()` returns, no further tick can fire.

use crate::core_types::error::{BlastSimError, Result};
use crate::simulation::playback::{FrameSink, PlaybackController, PlaybackState, PlaybackStatus};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Playback position and status after a command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    /// Playback state
    pub state: PlaybackState,
    /// State machine state
    pub status: PlaybackStatus,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Play,
    Pause,
    Stop,
    Seek(i64),
    SetSpeed(f32),
    Snapshot,
    Shutdown,
}

struct Request {
    command: Command,
    ack: Sender<PlaybackSnapshot>,
}

/// Spawns playback workers
pub struct PlaybackDriver;

impl PlaybackDriver {
    /// Move a controller onto a new worker thread
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::Io`] if the thread cannot be spawned.
    pub fn spawn<S>(controller: PlaybackController<S>) -> Result<PlaybackHandle<S>>
    where
        S: FrameSink + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("blast-playback".to_string())
            .spawn(move || run_worker(controller, &rx))?;
        info!("Playback worker started");
        Ok(PlaybackHandle {
            commands: tx,
            worker: Some(worker),
        })
    }
}

fn snapshot<S: FrameSink>(controller: &PlaybackController<S>) -> PlaybackSnapshot {
    PlaybackSnapshot {
        state: controller.state(),
        status: controller.status(),
    }
}

fn run_worker<S: FrameSink>(
    mut controller: PlaybackController<S>,
    requests: &Receiver<Request>,
) -> PlaybackController<S> {
    loop {
        let request = match controller.next_tick() {
            Some(deadline) => {
                match requests.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(request) => Some(request),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match requests.recv() {
                Ok(request) => Some(request),
                Err(_) => break,
            },
        };

        let Some(Request { command, ack }) = request else {
            controller.poll();
            continue;
        };

        match command {
            Command::Play => controller.play(),
            Command::Pause => controller.pause(),
            Command::Stop => controller.stop(),
            Command::Seek(index) => controller.seek(index),
            Command::SetSpeed(speed) => {
                controller.set_speed(speed);
            }
            Command::Snapshot => {}
            Command::Shutdown => {
                controller.pause();
                let _ = ack.send(snapshot(&controller));
                debug!("Playback worker shutting down");
                return controller;
            }
        }
        let _ = ack.send(snapshot(&controller));
        controller.poll();
    }
    debug!("Playback handle dropped, worker exiting");
    controller
}

/// Handle to a running playback worker
///
/// Dropping the handle shuts the worker down and joins it.
pub struct PlaybackHandle<S: FrameSink + 'static> {
    commands: Sender<Request>,
    worker: Option<JoinHandle<PlaybackController<S>>>,
}

impl<S: FrameSink + 'static> PlaybackHandle<S> {
    fn send(&self, command: Command) -> Result<PlaybackSnapshot> {
        let (ack, reply) = mpsc::channel();
        self.commands
            .send(Request { command, ack })
            .map_err(|_| BlastSimError::PlaybackStopped)?;
        reply.recv().map_err(|_| BlastSimError::PlaybackStopped)
    }

    /// Start or resume playback
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn play(&self) -> Result<PlaybackSnapshot> {
        self.send(Command::Play)
    }

    /// Pause playback; no tick fires after this returns
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn pause(&self) -> Result<PlaybackSnapshot> {
        self.send(Command::Pause)
    }

    /// Stop playback and reset to frame 0
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn stop(&self) -> Result<PlaybackSnapshot> {
        self.send(Command::Stop)
    }

    /// Jump to a frame (clamped)
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn seek(&self, index: i64) -> Result<PlaybackSnapshot> {
        self.send(Command::Seek(index))
    }

    /// Set the speed multiplier (clamped)
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn set_speed(&self, speed: f32) -> Result<PlaybackSnapshot> {
        self.send(Command::SetSpeed(speed))
    }

    /// Current playback position and status
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker has exited.
    pub fn snapshot(&self) -> Result<PlaybackSnapshot> {
        self.send(Command::Snapshot)
    }

    /// Stop the worker and take the controller back
    ///
    /// # Errors
    ///
    /// Returns [`BlastSimError::PlaybackStopped`] if the worker panicked.
    pub fn shutdown(mut self) -> Result<PlaybackController<S>> {
        let _ = self.send(Command::Shutdown);
        let worker = self.worker.take().ok_or(BlastSimError::PlaybackStopped)?;
        worker.join().map_err(|_| BlastSimError::PlaybackStopped)
    }
}

impl<S: FrameSink + 'static> Drop for PlaybackHandle<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.send(Command::Shutdown);
            if worker.join().is_err() {
                warn!("Playback worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::ExplosiveSpec;
    use crate::simulation::config::SimulationConfig;
    use crate::simulation::sequencer::{Frame, FrameCache, FrameSequencer};
    use std::sync::Arc;

    fn spawn_with_channel() -> (PlaybackHandle<impl FrameSink + 'static>, Receiver<usize>) {
        let config = SimulationConfig::default();
        let sequencer = FrameSequencer::new(ExplosiveSpec::reference(), &config).unwrap();
        let (tx, rx) = mpsc::channel();
        let controller = PlaybackController::new(
            FrameCache::from_sequencer(sequencer),
            config.playback,
            move |frame: Arc<Frame>| {
                let _ = tx.send(frame.frame_index);
            },
        );
        (PlaybackDriver::spawn(controller).unwrap(), rx)
    }

    #[test]
    fn test_commands_are_acknowledged() {
        let (handle, frames) = spawn_with_channel();
        let snap = handle.seek(9999).unwrap();
        assert_eq!(snap.state.current_frame_index, 249);
        assert_eq!(snap.status, PlaybackStatus::Idle);
        assert_eq!(frames.recv().unwrap(), 249);

        let snap = handle.set_speed(10.0).unwrap();
        assert_eq!(snap.state.speed_multiplier, 3.0);

        let snap = handle.stop().unwrap();
        assert_eq!(snap.status, PlaybackStatus::Stopped);
        assert_eq!(snap.state.current_frame_index, 0);
        assert_eq!(frames.recv().unwrap(), 0);
    }

    #[test]
    fn test_shutdown_returns_controller() {
        let (handle, _frames) = spawn_with_channel();
        handle.seek(12).unwrap();
        let controller = handle.shutdown().unwrap();
        assert_eq!(controller.state().current_frame_index, 12);
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }
}
