use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{self, Clear, ClearType},
};
use glam::Vec2;
use starchart::color::Rgba;
use starchart::config::{ClearMode, Config, InputBinding};
use starchart::effects::Effect;
use starchart::effects::landing::LandingEffect;
use starchart::effects::starfield::StarfieldEffect;
use starchart::surface::{FrameBuffer, Surface};
use starchart::terminal::{self as term, TerminalGuard};
use std::fs::File;
use std::io::{BufWriter, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const FIXED_DT: f32 = 1.0 / 60.0;
const TOAST_TIME: Duration = Duration::from_secs(3);
const TOAST_COLOR: Rgba = Rgba::new(255, 215, 0, 0.9);

/// Navigable terminal starfield with clickable constellations.
#[derive(Parser, Debug)]
#[command(name = "starchart", version)]
#[command(after_help = "Controls:
  drag with the mouse or hold the arrow keys to pan
  click a constellation label to open it

Press 'q', ESC, or Ctrl+C to exit")]
struct Cli {
    /// Scene to run
    #[arg(value_enum, default_value = "explorer")]
    effect: EffectArg,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Background color as hex (e.g., --bg-color 1a1b26)
    #[arg(long = "bg-color", value_name = "RRGGBB")]
    bg_color: Option<String>,

    /// Clear the frame fully or leave motion trails
    #[arg(long = "clear-mode", value_enum)]
    clear_mode: Option<ClearModeArg>,

    /// Wash opacity for the trail clear mode
    #[arg(long = "trail-alpha", value_name = "ALPHA", default_value_t = 0.1)]
    trail_alpha: f32,

    /// Fixed seed for a reproducible sky
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Which controls pan the camera
    #[arg(long, value_enum)]
    input: Option<InputArg>,

    /// Quit and print the route when a constellation is clicked
    #[arg(long)]
    exit_on_navigate: bool,

    /// Log file (default: starchart.log in the temp dir)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EffectArg {
    /// Pannable sky with named constellations
    Explorer,
    /// Clustered ambience with drifting sparks
    Landing,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClearModeArg {
    Solid,
    Trail,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputArg {
    Drag,
    Keys,
    Both,
}

impl From<InputArg> for InputBinding {
    fn from(arg: InputArg) -> Self {
        match arg {
            InputArg::Drag => InputBinding::Drag,
            InputArg::Keys => InputBinding::Keys,
            InputArg::Both => InputBinding::Both,
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// File config with CLI flags layered on top.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(hex) = &cli.bg_color {
        config.render.background =
            Rgba::parse_hex(hex).context("expected format: RRGGBB (e.g., 1a1b26)")?;
    }
    if let Some(mode) = cli.clear_mode {
        let clear = match mode {
            ClearModeArg::Solid => ClearMode::Solid,
            ClearModeArg::Trail => ClearMode::Trail {
                alpha: cli.trail_alpha,
            },
        };
        match cli.effect {
            EffectArg::Explorer => config.render.clear = clear,
            EffectArg::Landing => config.landing.clear = clear,
        }
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(input) = cli.input {
        config.viewport.input = input.into();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

struct Toast {
    text: String,
    until: Instant,
}

/// Run `E` until the user quits. Returns the route when navigation ended the run.
fn run_effect<E: Effect>(config: &Config, exit_on_navigate: bool) -> Result<Option<String>> {
    let guard = TerminalGuard::enter().context("failed to set up the terminal")?;
    if config.viewport.input.keys() && !guard.keyboard_enhanced() {
        info!(
            hold_ticks = config.viewport.key_hold_ticks,
            "no key release events, arrow key holds time out"
        );
    }
    let mut out = BufWriter::with_capacity(1024 * 64, stdout());
    let scale = config.render.pixel_scale;

    let (cols, rows) = terminal::size()?;
    let mut frame = FrameBuffer::new(cols, rows, scale);
    let mut effect = frame.as_ref().and_then(|f| {
        let (w, h) = f.size();
        E::new(config, w, h)
    });
    if effect.is_none() {
        warn!(cols, rows, "no drawable area, waiting for a resize");
    }

    let mut toast: Option<Toast> = None;
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            if term::is_exit(&event) {
                break;
            }
            match &event {
                Event::Resize(cols, rows) => {
                    match frame.as_mut() {
                        Some(f) => f.resize(*cols, *rows),
                        None => frame = FrameBuffer::new(*cols, *rows, scale),
                    }
                    if let Some(f) = frame.as_ref() {
                        let (w, h) = f.size();
                        match effect.as_mut() {
                            Some(e) => e.resize(w, h),
                            None => effect = E::new(config, w, h),
                        }
                    }
                    execute!(out, Clear(ClearType::All))?;
                }
                _ => {
                    if let (Some(f), Some(e)) = (frame.as_ref(), effect.as_mut()) {
                        if let Some(input) = term::translate_event(&event, f) {
                            let mut navigated: Option<String> = None;
                            let mut navigate = |route: &str| navigated = Some(route.to_string());
                            e.handle_input(&input, &mut navigate);

                            if let Some(route) = navigated {
                                info!(%route, "navigation requested");
                                if exit_on_navigate {
                                    return Ok(Some(route));
                                }
                                toast = Some(Toast {
                                    text: format!("-> {route}"),
                                    until: Instant::now() + TOAST_TIME,
                                });
                            }
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let (Some(f), Some(e)) = (frame.as_mut(), effect.as_mut()) else {
            std::thread::sleep(Duration::from_millis(16));
            continue;
        };

        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            e.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        e.render(f);
        if toast.as_ref().is_some_and(|t| now >= t.until) {
            toast = None;
        }
        if let Some(t) = &toast {
            let (w, h) = f.size();
            f.fill_text(&t.text, Vec2::new(w / 2.0, h - 2.0 * f.scale()), TOAST_COLOR);
        }
        f.present(&mut out)?;
    }

    Ok(None)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("starchart.log"));
    init_logging(&log_path)?;

    let config = build_config(&cli)?;
    info!(effect = ?cli.effect, seed = ?config.seed, "starting");

    let route = match cli.effect {
        EffectArg::Explorer => run_effect::<StarfieldEffect>(&config, cli.exit_on_navigate),
        EffectArg::Landing => run_effect::<LandingEffect>(&config, cli.exit_on_navigate),
    }?;

    // The terminal is restored by now, so stdout is ours again.
    if let Some(route) = route {
        println!("{route}");
    }
    Ok(())
}
