//! End-to-end pipeline tests with deterministic fakes
//!
//! A replay engine stands in for whisper and a recording executor stands in
//! for enigo, so these exercise the real loop, controller, and mapper across
//! threads without a microphone or a focused window.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use voxkey::{
    ActionCommand, ActionExecutor, AudioFrame, CommandMapper, ExecutionError, Lexicon,
    ListenState, RecognitionError, RecognitionLoop, SpeechEngine, ToggleController,
    TranscriptEvent,
};

/// Emits the next scripted transcript after every `every` frames it is
/// actually fed. Frames dropped while paused are never seen here, which is
/// exactly what the no-stale-audio tests rely on.
struct ReplayEngine {
    transcripts: Vec<&'static str>,
    every: usize,
    seen: Arc<AtomicUsize>,
    emitted: usize,
}

impl ReplayEngine {
    fn new(transcripts: Vec<&'static str>, every: usize, seen: Arc<AtomicUsize>) -> Self {
        Self {
            transcripts,
            every,
            seen,
            emitted: 0,
        }
    }
}

impl SpeechEngine for ReplayEngine {
    fn accept_frame(
        &mut self,
        _frame: &AudioFrame,
    ) -> Result<Vec<TranscriptEvent>, RecognitionError> {
        let seen = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if seen % self.every == 0 {
            if let Some(text) = self.transcripts.get(self.emitted) {
                self.emitted += 1;
                return Ok(vec![TranscriptEvent::final_text(*text)]);
            }
        }
        Ok(Vec::new())
    }
}

struct RecordingExecutor {
    log: Arc<Mutex<Vec<ActionCommand>>>,
}

impl ActionExecutor for RecordingExecutor {
    fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutionError> {
        self.log.lock().unwrap().push(command.clone());
        Ok(())
    }
}

struct Pipeline {
    tx: flume::Sender<AudioFrame>,
    controller: Arc<ToggleController>,
    running: Arc<AtomicBool>,
    log: Arc<Mutex<Vec<ActionCommand>>>,
    frames_seen: Arc<AtomicUsize>,
    next_seq: u64,
    handle: thread::JoinHandle<Result<(), voxkey::PipelineError>>,
}

impl Pipeline {
    fn start(transcripts: Vec<&'static str>, every: usize, initial: ListenState) -> Self {
        let controller = Arc::new(ToggleController::new(initial));
        let running = Arc::new(AtomicBool::new(true));
        let log = Arc::new(Mutex::new(Vec::new()));
        let frames_seen = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = flume::bounded(64);

        let rec = RecognitionLoop::new(
            rx,
            ReplayEngine::new(transcripts, every, Arc::clone(&frames_seen)),
            CommandMapper::new(Lexicon::builtin()),
            RecordingExecutor {
                log: Arc::clone(&log),
            },
            Arc::clone(&controller),
            Arc::clone(&running),
        )
        .with_poll_interval(Duration::from_millis(20));
        let handle = thread::spawn(move || rec.run());

        Self {
            tx,
            controller,
            running,
            log,
            frames_seen,
            next_seq: 0,
            handle,
        }
    }

    fn send_frames(&mut self, count: usize) {
        for _ in 0..count {
            self.tx
                .send(AudioFrame::new(self.next_seq, vec![0.0; 480]))
                .unwrap();
            self.next_seq += 1;
        }
    }

    fn commands(&self) -> Vec<ActionCommand> {
        self.log.lock().unwrap().clone()
    }

    fn stop(self) {
        self.running.store(false, Ordering::SeqCst);
        self.handle.join().unwrap().unwrap();
    }
}

fn wait_for(cond: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_pause_drops_audio_and_resume_has_no_stale_text() {
    let mut pipeline = Pipeline::start(vec!["hello world", "back again"], 5, ListenState::Active);

    // First utterance flows through.
    pipeline.send_frames(5);
    let log = Arc::clone(&pipeline.log);
    assert!(wait_for(
        || log.lock().unwrap().len() == 1,
        Duration::from_secs(2)
    ));
    assert_eq!(
        pipeline.commands(),
        vec![ActionCommand::TypeText("hello world".into())]
    );

    // Paused: frames are dropped before the engine, not queued.
    pipeline.controller.pause();
    pipeline.send_frames(5);
    let tx = pipeline.tx.clone();
    assert!(wait_for(|| tx.is_empty(), Duration::from_secs(2)));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pipeline.frames_seen.load(Ordering::SeqCst), 5);
    assert_eq!(pipeline.commands().len(), 1);

    // Resume: dispatch works again, and nothing stale from the paused
    // interval flushes; the next transcript comes from fresh audio only.
    pipeline.controller.resume();
    pipeline.send_frames(5);
    let log = Arc::clone(&pipeline.log);
    assert!(wait_for(
        || log.lock().unwrap().len() == 2,
        Duration::from_secs(2)
    ));
    assert_eq!(
        pipeline.commands(),
        vec![
            ActionCommand::TypeText("hello world".into()),
            ActionCommand::TypeText("back again".into()),
        ]
    );
    assert_eq!(pipeline.frames_seen.load(Ordering::SeqCst), 10);

    pipeline.stop();
}

#[test]
fn test_toggle_storm_settles_and_pipeline_survives() {
    let mut pipeline = Pipeline::start(vec!["still here"], 5, ListenState::Active);

    const SURFACES: usize = 4;
    const FLIPS: usize = 10;
    let togglers: Vec<_> = (0..SURFACES)
        .map(|_| {
            let controller = Arc::clone(&pipeline.controller);
            thread::spawn(move || {
                for _ in 0..FLIPS {
                    controller.toggle();
                }
            })
        })
        .collect();
    for t in togglers {
        t.join().unwrap();
    }

    // Even number of flips from Active: back to Active, none lost.
    assert_eq!(pipeline.controller.current_state(), ListenState::Active);
    assert_eq!(
        pipeline.controller.transition_count(),
        (SURFACES * FLIPS) as u64
    );

    // And the loop still dispatches afterwards.
    pipeline.send_frames(5);
    let log = Arc::clone(&pipeline.log);
    assert!(wait_for(
        || log.lock().unwrap().len() == 1,
        Duration::from_secs(2)
    ));
    assert_eq!(
        pipeline.commands(),
        vec![ActionCommand::TypeText("still here".into())]
    );

    pipeline.stop();
}

#[test]
fn test_start_paused_types_nothing_until_resumed() {
    let mut pipeline = Pipeline::start(vec!["first words"], 5, ListenState::Paused);

    pipeline.send_frames(5);
    let tx = pipeline.tx.clone();
    assert!(wait_for(|| tx.is_empty(), Duration::from_secs(2)));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pipeline.frames_seen.load(Ordering::SeqCst), 0);
    assert!(pipeline.commands().is_empty());

    pipeline.controller.resume();
    pipeline.send_frames(5);
    let log = Arc::clone(&pipeline.log);
    assert!(wait_for(
        || log.lock().unwrap().len() == 1,
        Duration::from_secs(2)
    ));

    pipeline.stop();
}
