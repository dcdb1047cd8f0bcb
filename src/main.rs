use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use voxkey::config::{Config, TypingMethod};
use voxkey::controller::{ListenState, ToggleController};
use voxkey::executor::{ActionExecutor, DryRunExecutor, InputMethod};
use voxkey::lexicon::{CommandToken, Lexicon};

#[derive(Parser)]
#[command(name = "voxkey", about = "Hands-free dictation: speech to keystrokes")]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Whisper model path (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// Engine language hint, e.g. "en" or "fr" (overrides config)
    #[arg(long)]
    language: Option<String>,

    /// Typing method: "direct" or "clipboard" (overrides config)
    #[arg(long)]
    input_method: Option<String>,

    /// Start with listening paused
    #[arg(long)]
    paused: bool,

    /// Log commands instead of injecting them
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the spoken command table
    Lexicon,
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Lexicon)) {
        let config = Config::load(&cli.config);
        print_lexicon(&build_lexicon(&config));
        return Ok(());
    }

    run(cli)
}

/// Built-ins first, then user extras. Registration order is the tie-break,
/// so extras can add phrases but never redefine a built-in.
fn build_lexicon(config: &Config) -> Lexicon {
    let mut lexicon = Lexicon::builtin();
    for extra in &config.lexicon.extra {
        if !lexicon.register(&extra.phrase, CommandToken::Literal(extra.text.clone())) {
            tracing::warn!(phrase = %extra.phrase, "duplicate lexicon phrase ignored");
        }
    }
    lexicon
}

fn print_lexicon(lexicon: &Lexicon) {
    println!("{} spoken commands:\n", lexicon.len());
    for (phrase, token) in lexicon.iter() {
        println!("  {:24} {:?}", phrase, token);
    }
    println!("\nAlso: \"press <modifiers> <key>\", e.g. \"press control alt delete\".");
}

fn make_executor(
    dry_run: bool,
    method: InputMethod,
) -> anyhow::Result<Box<dyn ActionExecutor>> {
    if dry_run {
        return Ok(Box::new(DryRunExecutor::new()));
    }
    #[cfg(feature = "typing")]
    {
        Ok(Box::new(voxkey::executor::EnigoExecutor::new(method)?))
    }
    #[cfg(not(feature = "typing"))]
    {
        let _ = method;
        tracing::warn!("built without the typing feature; commands will only be logged");
        Ok(Box::new(DryRunExecutor::new()))
    }
}

#[cfg(all(feature = "audio-io", feature = "whisper"))]
fn run(cli: Cli) -> anyhow::Result<()> {
    use std::thread;

    use voxkey::capture::run_capture;
    use voxkey::engine::SAMPLE_RATE;
    use voxkey::mapper::CommandMapper;
    use voxkey::recognition::RecognitionLoop;
    use voxkey::transcriber::{SegmenterConfig, WhisperTranscriber};

    let config = Config::load(&cli.config);
    let lexicon = build_lexicon(&config);

    let model_path = cli.model.unwrap_or_else(|| config.engine.model_path.clone());
    let language = cli.language.clone().or_else(|| config.engine.language.clone());
    let method = match cli.input_method.as_deref() {
        Some(s) => InputMethod::from_str(s),
        None => match config.typing.method {
            TypingMethod::Direct => InputMethod::Direct,
            TypingMethod::Clipboard => InputMethod::Clipboard,
        },
    };

    let initial = if cli.paused {
        ListenState::Paused
    } else {
        ListenState::Active
    };
    let controller = Arc::new(ToggleController::new(initial));
    let running = Arc::new(AtomicBool::new(true));

    let r = Arc::clone(&running);
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))?;

    let engine = WhisperTranscriber::new(
        &model_path,
        language,
        SegmenterConfig {
            silence_ms: config.audio.silence_ms,
            max_utterance_secs: config.audio.max_utterance_secs,
        },
    )?;
    let executor = make_executor(cli.dry_run, method)?;

    // Capture thread owns the device; frames flow over this channel.
    let frame_samples = (SAMPLE_RATE * config.audio.frame_ms as usize) / 1000;
    let (frame_tx, frame_rx) = flume::bounded(256);
    let capture_running = Arc::clone(&running);
    let capture_handle = thread::spawn(move || {
        if let Err(e) = run_capture(frame_tx, capture_running, frame_samples) {
            tracing::error!(error = %e, "audio capture failed");
        }
    });

    #[cfg(feature = "hotkey")]
    let hotkey_surface = config.hotkey.enabled.then(|| {
        voxkey::hotkey::start_hotkey_listener(
            Arc::clone(&controller),
            voxkey::hotkey::HotkeyConfig {
                double_tap_threshold_ms: config.hotkey.double_tap_ms,
            },
        )
    });

    // The hotkey surface carries its own state subscription; without one,
    // main still reflects state changes in the log.
    #[cfg(feature = "hotkey")]
    let standalone_log = hotkey_surface.is_none();
    #[cfg(not(feature = "hotkey"))]
    let standalone_log = true;
    if standalone_log {
        controller.subscribe(|state| info!(%state, "listening state changed"));
    }

    info!(
        state = %controller.current_state(),
        "voxkey ready. Double-tap the meta key to toggle listening, or say \"stop listening\""
    );

    let rec = RecognitionLoop::new(
        frame_rx,
        engine,
        CommandMapper::new(lexicon),
        executor,
        Arc::clone(&controller),
        Arc::clone(&running),
    );
    let loop_handle = thread::spawn(move || rec.run());

    let loop_result = match loop_handle.join() {
        Ok(result) => result,
        Err(_) => anyhow::bail!("recognition loop panicked"),
    };
    running.store(false, Ordering::SeqCst);

    #[cfg(feature = "hotkey")]
    if let Some(surface) = hotkey_surface {
        surface.shutdown(&controller);
    }

    let _ = capture_handle.join();

    loop_result?;
    Ok(())
}

#[cfg(not(all(feature = "audio-io", feature = "whisper")))]
fn run(_cli: Cli) -> anyhow::Result<()> {
    anyhow::bail!("voxkey was built without the audio-io/whisper features; nothing to run")
}
