//! The recognition loop
//!
//! One dedicated thread that drains the frame channel and drives
//! engine -> mapper -> executor. The pause flag is consulted twice per
//! frame's worth of work: once before the engine sees audio (paused frames
//! are dropped, not queued, since stale audio has no value after resume), and
//! again immediately before every single action dispatch, so a toggle that
//! lands mid-transcript takes effect before the next action rather than the
//! next frame.
//!
//! Failure policy: only a dead frame source stops the loop. Engine failures
//! mean "no transcript for that frame"; executor failures are logged
//! per-command and the rest of the sequence still runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError};
use tracing::{debug, info, trace, warn};

use crate::controller::ToggleController;
use crate::engine::{AudioFrame, SpeechEngine};
use crate::error::{ExecutionError, PipelineError};
use crate::executor::ActionExecutor;
use crate::mapper::{CommandMapper, ControlRequest};

const DEFAULT_POLL: Duration = Duration::from_millis(100);

pub struct RecognitionLoop<E, X> {
    frames: Receiver<AudioFrame>,
    engine: E,
    mapper: CommandMapper,
    executor: X,
    controller: Arc<ToggleController>,
    running: Arc<AtomicBool>,
    poll: Duration,
}

impl<E: SpeechEngine, X: ActionExecutor> RecognitionLoop<E, X> {
    pub fn new(
        frames: Receiver<AudioFrame>,
        engine: E,
        mapper: CommandMapper,
        executor: X,
        controller: Arc<ToggleController>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            frames,
            engine,
            mapper,
            executor,
            controller,
            running,
            poll: DEFAULT_POLL,
        }
    }

    /// Bound on the blocking frame read, so the stop signal is observed
    /// promptly even when the microphone goes quiet.
    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Run until the stop signal drops or the frame source dies. The current
    /// iteration always completes; no action is aborted mid-dispatch.
    pub fn run(mut self) -> Result<(), PipelineError> {
        info!("recognition loop started");

        while self.running.load(Ordering::SeqCst) {
            let frame = match self.frames.recv_timeout(self.poll) {
                Ok(frame) => frame,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("recognition loop stopped: frame source gone");
                    return Err(PipelineError::Device(
                        "audio frame source disconnected".into(),
                    ));
                }
            };

            if !self.controller.current_state().is_active() {
                trace!(seq = frame.seq, "paused, frame dropped");
                continue;
            }

            let events = match self.engine.accept_frame(&frame) {
                Ok(events) => events,
                Err(e) => {
                    warn!(seq = frame.seq, error = %e, "recognition failed, frame skipped");
                    continue;
                }
            };

            for event in events {
                if !event.is_final || event.text.is_empty() {
                    continue;
                }
                self.dispatch_transcript(&event.text);
            }
        }

        info!("recognition loop stopped");
        Ok(())
    }

    fn dispatch_transcript(&mut self, text: &str) {
        let outcome = self.mapper.map(text);
        debug!(text, actions = outcome.actions.len(), "transcript mapped");

        for command in &outcome.actions {
            // Re-check right before dispatch. A transcript may have
            // finalized from audio captured just before a pause; once
            // paused, nothing more reaches the executor.
            if !self.controller.current_state().is_active() {
                debug!("paused mid-transcript, remaining commands dropped");
                break;
            }
            match self.executor.execute(command) {
                Ok(()) => {}
                Err(ExecutionError::NoTarget) => {
                    warn!(%command, "no focused target, command skipped");
                }
                Err(e) => {
                    warn!(%command, error = %e, "command failed");
                }
            }
        }

        // Control requests apply even if a concurrent pause gated the
        // actions above: a spoken shutdown is still a shutdown.
        match outcome.control {
            Some(ControlRequest::PauseListening) => {
                info!("pause requested by voice");
                self.controller.pause();
            }
            Some(ControlRequest::Shutdown) => {
                info!("shutdown requested by voice");
                self.running.store(false, Ordering::SeqCst);
            }
            None => {}
        }
    }
}
