//! Flick transitions demo - replays a touch script through the home screen
//! state engine and reports state changes
//!
//! Frames are driven by a 16ms calloop timer. State events go to the log, or
//! to stdout as JSON lines with `--json`.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flick_transitions::anim::FRAME_INTERVAL_MS;
use flick_transitions::config::TransitionConfig;
use flick_transitions::demo::{DemoRunner, Script};
use flick_transitions::system::{HapticSink, LedVibrator, TracingHaptics};

/// Give up on scripts that never settle
const RUN_LIMIT: Duration = Duration::from_secs(120);

#[derive(Parser, Debug)]
#[command(name = "flick-transitions")]
#[command(about = "Replay touch scripts through the Flick home screen transitions", long_about = None)]
struct Args {
    /// Transition config (default: ~/.local/state/flick/transitions.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Touch script to replay (default: built-in swipe and hold)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Print state events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    debug: bool,
}

struct App {
    runner: DemoRunner,
    started: Instant,
    signal: LoopSignal,
    json: bool,
}

impl App {
    fn frame(&mut self) -> TimeoutAction {
        let now_ms = self.started.elapsed().as_millis() as u64;
        let running = self.runner.step(now_ms);
        self.flush_events();

        if !running || self.started.elapsed() > RUN_LIMIT {
            if running {
                tracing::warn!("Script did not settle within {:?}, stopping", RUN_LIMIT);
            }
            self.signal.stop();
            return TimeoutAction::Drop;
        }
        TimeoutAction::ToDuration(Duration::from_millis(FRAME_INTERVAL_MS))
    }

    fn flush_events(&self) {
        for event in self.runner.take_events() {
            if self.json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to encode event {:?}: {}", event, e),
                }
            } else {
                info!(?event, "state event");
            }
        }
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics before crashing
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Ok(home) = std::env::var("HOME") {
            let crash_log = format!("{}/.local/state/flick/crash.log", home);
            if let Ok(mut f) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                use std::io::Write;
                let _ = writeln!(f, "[{}] PANIC: {}", chrono::Local::now(), panic_info);
            }
        }
    }));

    // Log directory (~/.local/state/flick or /tmp/flick)
    let log_dir = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("flick");
    std::fs::create_dir_all(&log_dir).ok();

    let args = Args::parse();

    let file_appender = rolling::daily(&log_dir, "transitions.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Quiet by default, verbose with --debug
    let default_filter = if args.debug {
        "debug,flick_transitions=debug"
    } else {
        "warn,flick_transitions=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = TransitionConfig::load(args.config.as_deref())
        .context("Failed to load transition config")?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let script = match &args.script {
        Some(path) => Script::load(path)
            .with_context(|| format!("Failed to load script {}", path.display()))?,
        None => Script::swipe_and_hold(&config.display),
    };

    let haptics: Rc<dyn HapticSink> = match LedVibrator::find() {
        Some(vibrator) => Rc::new(vibrator),
        None => {
            info!("No vibrator found, haptics go to the log");
            Rc::new(TracingHaptics)
        }
    };

    info!(log_path = %log_dir.display(), "Flick transitions demo starting");

    let mut event_loop: EventLoop<App> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let mut app = App {
        runner: DemoRunner::new(&config, script, haptics),
        started: Instant::now(),
        signal: event_loop.get_signal(),
        json: args.json,
    };

    event_loop
        .handle()
        .insert_source(Timer::immediate(), |_, _, app: &mut App| app.frame())
        .map_err(|e| anyhow::anyhow!("Failed to insert frame timer: {}", e.error))?;

    event_loop
        .run(None, &mut app, |_| {})
        .context("Event loop failed")?;

    let snapshot = app.runner.snapshot();
    if app.json {
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    info!(state = %app.runner.current_state(), ?snapshot, "demo finished");
    Ok(())
}
