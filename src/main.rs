//! modseq - a vim-modal terminal step sequencer
//!
//! Entry point: terminal setup, the main event loop, and teardown.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use modseq::app::App;
use modseq::audio::engine::AudioEngine;
use modseq::input;
use modseq::ui;

/// modseq - vim-modal terminal step sequencer
#[derive(Parser, Debug)]
#[command(name = "modseq")]
#[command(about = "A vim-modal terminal step sequencer", long_about = None)]
struct Args {
    /// Project name or path to open/create
    #[arg(default_value = "untitled")]
    project: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize audio before touching the terminal
    let (mut audio_engine, audio_handle) =
        AudioEngine::new().context("failed to initialize audio")?;

    // Opening the project can fail fatally (corrupt file, future version)
    let mut app = App::new(&args.project, audio_handle)
        .with_context(|| format!("failed to open project '{}'", args.project))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Key release events are needed for hold-to-preview; not every
    // terminal supports the enhancement
    let keyboard_enhancement = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut audio_engine);

    // Flush pending autosave and stop audio before restoring the terminal
    app.shutdown();

    disable_raw_mode()?;
    if keyboard_enhancement {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    audio_engine: &mut AudioEngine,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Drain all pending events (prevents input queue buildup during
        // slow renders)
        while event::poll(Duration::from_millis(10))? {
            match event::read()? {
                Event::Key(key_event) => {
                    if input::handle_key(key_event, app) {
                        return Ok(());
                    }
                }
                Event::Resize(width, height) => {
                    app.on_resize(width, height);
                }
                _ => {}
            }
        }

        let now = Instant::now();
        let delta = now - last_tick;
        last_tick = now;

        // Transport timing and autosave polling
        app.tick(delta);

        // Decode samples / spawn voices for queued commands; failures are
        // non-fatal and land in the event log
        for err in audio_engine.process_commands() {
            app.event_log.error(err.to_string());
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
