//! Global hotkey control surface
//!
//! Double-tap of the Meta key toggles listening. The surface has exactly the
//! two obligations every control surface has: call `toggle()` on the user
//! gesture, and subscribe to reflect state changes in its own presentation
//! (here, a log line; this surface has no richer indicator).
//!
//! `rdev::listen` never returns on its own; the running flag makes the
//! callback inert after shutdown so no toggle fires into a torn-down
//! pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rdev::{Event, EventType, Key, listen};
use tracing::{debug, error, info};

use crate::controller::{SubscriptionId, ToggleController};

pub struct HotkeyConfig {
    /// Maximum gap between the two taps, in milliseconds.
    pub double_tap_threshold_ms: u64,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            double_tap_threshold_ms: 400,
        }
    }
}

/// Handle for tearing the surface down.
pub struct HotkeySurface {
    running: Arc<AtomicBool>,
    subscription: SubscriptionId,
}

impl HotkeySurface {
    pub fn shutdown(&self, controller: &ToggleController) {
        self.running.store(false, Ordering::SeqCst);
        controller.unsubscribe(self.subscription);
    }
}

pub fn start_hotkey_listener(
    controller: Arc<ToggleController>,
    config: HotkeyConfig,
) -> HotkeySurface {
    let subscription =
        controller.subscribe(|state| info!(%state, "listening state changed"));

    let running = Arc::new(AtomicBool::new(true));
    let running_cb = Arc::clone(&running);
    let ctrl = Arc::clone(&controller);

    thread::spawn(move || {
        let threshold = Duration::from_millis(config.double_tap_threshold_ms);
        let mut last_release: Option<Instant> = None;
        let mut meta_pressed = false;
        // A chord like Cmd+C must not count as a tap.
        let mut other_key_with_meta = false;

        let callback = move |event: Event| {
            if !running_cb.load(Ordering::SeqCst) {
                return;
            }

            match event.event_type {
                EventType::KeyPress(key) => match key {
                    Key::MetaLeft | Key::MetaRight => {
                        meta_pressed = true;
                        other_key_with_meta = false;
                    }
                    _ => {
                        if meta_pressed {
                            other_key_with_meta = true;
                        }
                    }
                },
                EventType::KeyRelease(key) => {
                    if matches!(key, Key::MetaLeft | Key::MetaRight) {
                        if meta_pressed && !other_key_with_meta {
                            let now = Instant::now();
                            let is_double = last_release
                                .is_some_and(|last| now.duration_since(last) < threshold);
                            if is_double {
                                debug!("double-tap detected");
                                ctrl.toggle();
                                last_release = None;
                            } else {
                                last_release = Some(now);
                            }
                        }
                        meta_pressed = false;
                    }
                }
                _ => {}
            }
        };

        // Blocks for the life of the process.
        if let Err(e) = listen(callback) {
            error!(?e, "hotkey listener error");
        }
    });

    HotkeySurface {
        running,
        subscription,
    }
}
