//! An infinite, draggable grid of pets for the terminal.
//!
//! Drag with the mouse (or scroll, or use the arrow keys) to move around;
//! let go mid-drag to fling the grid.  Click pets to hear, stamp or burst
//! them.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::time::MissedTickBehavior;

use crate::app::{
    asset_runtime::spawn_preload,
    event::{spawn_event_reader, AppEvent},
    handler,
    state::AppState,
};
use crate::config::AppConfig;
use crate::core::behavior::ItemCatalog;
use crate::core::clock::{Clock, SystemClock};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "An infinite, draggable grid of pets")]
struct Cli {
    /// Directory holding the pet images (`01.png` … `24.png`).
    #[arg(default_value = "pets")]
    assets_dir: PathBuf,

    /// Columns in the logical grid.
    #[arg(long)]
    cols: Option<usize>,

    /// Edge length of the duplicated tile block (odd).
    #[arg(long)]
    tiles: Option<usize>,

    /// Turn off springs and entrance animations.
    #[arg(long)]
    reduced_motion: bool,

    /// Frame rate of the physics and render loop.
    #[arg(long)]
    fps: Option<u32>,

    /// Seed for per-item physics variation and bursts.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(cols) = self.cols {
            config.tuning.layout.cols = cols;
        }
        if let Some(tiles) = self.tiles {
            config.tuning.layout.tiles = tiles;
        }
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        if self.reduced_motion {
            config.display.reduced_motion = true;
        }
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (only emits when RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // never pollute stdout
        .init();

    let cli = Cli::parse();

    // ── configuration ─────────────────────────────────────────
    let mut config = AppConfig::load();
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }
    if cli.save_config {
        let path = config.save()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let catalog = ItemCatalog::builtin(&cli.assets_dir);
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(items = catalog.len(), seed, dir = %cli.assets_dir.display(), "starting");

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let fps = config.display.fps;
    let mut state = AppState::new(
        catalog,
        config,
        Rect::new(0, 0, size.width, size.height),
        seed,
    );

    // ── async channels ────────────────────────────────────────
    let mut events = spawn_event_reader();
    let (preload, mut asset_rx) = spawn_preload(state.catalog.paths());
    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let clock = SystemClock;

    // ── event loop ────────────────────────────────────────────
    let result: Result<()> = async {
        loop {
            // ── draw first ─────────────────────────────────────
            let now = clock.now();
            state.prepare_thumbnails();
            terminal.draw(|frame| ui::draw(frame, &state, now))?;
            if state.overlay.take_bell() {
                let backend = terminal.backend_mut();
                backend.write_all(b"\x07")?;
                backend.flush()?;
            }

            tokio::select! {
                biased;

                Some(event) = events.recv() => {
                    let now = clock.now();
                    match event {
                        AppEvent::Key(k) => handler::handle_key(&mut state, k, now),
                        AppEvent::Mouse(m) => handler::handle_mouse(&mut state, m, now),
                        AppEvent::Resize(w, h) => state.resize(w, h, now),
                    }
                }

                Some(update) = asset_rx.recv() => {
                    // Drain everything queued before redrawing.
                    let now = clock.now();
                    state.apply_asset_update(update, now);
                    while let Ok(update) = asset_rx.try_recv() {
                        state.apply_asset_update(update, now);
                    }
                }

                _ = frames.tick() => {
                    state.tick(clock.now());
                }
            }

            if state.should_quit {
                break;
            }
        }
        Ok(())
    }
    .await;

    // ── teardown ──────────────────────────────────────────────
    state.shutdown();
    preload.request_cancel();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
