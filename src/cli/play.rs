//! Terminal player
//!
//! Runs the game headless at its fixed tick rate. Each frame is recorded and
//! printed whenever it changes. Typed input stands in for the mouse: a number
//! clicks that option, an empty line clicks outside every option.

use crate::audio::{SilentSink, loop_players};
use crate::config::GameConfig;
use crate::game::{Game, Host};
use crate::input::InputState;
use crate::layout::Monospace;
use crate::loader::{FileSystemAssetRepository, load_blocking};
use crate::render::RecordingSurface;
use crate::scene::TextScene;
use crate::session::Session;
use crate::types::{Point, Rect};
use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info};
use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};

/// Somewhere no option is ever drawn
const EMPTY_CLICK: Point = Point::new(0, 0);

/// Load the configured game and play it in the terminal
pub fn run_play(config: GameConfig) -> anyhow::Result<()> {
    let repository = FileSystemAssetRepository::new(config.assets.clone());
    let assets = load_blocking(&repository, &config.assets.locale)?;
    let tracks = assets.manifest.tracks.clone();
    let session = Session::from_assets(assets, &config)?;

    let players = loop_players(&tracks, &config.audio, |track| {
        debug!("[Audio] '{}' -> silent sink", track.path.display());
        Box::new(SilentSink::default())
    });
    let measure = Monospace::default();
    let scene = TextScene::new(
        session,
        config.display.clone(),
        Box::new(measure),
        players,
    )?;
    let mut game = Game::new(Box::new(scene));
    let mut host = TerminalHost::new(config.tick_rate, spawn_stdin_reader()?);

    println!("=== cloister ===");
    println!();
    println!("Controls:");
    println!("  Enter: continue");
    println!("  1-9:   select option");
    println!("  q:     quit");
    println!();

    let frame_time = Duration::from_secs_f64(1.0 / config.tick_rate);
    let cell_width = measure.cell_width.round() as i32;
    let mut last_frame = Frame::default();
    loop {
        let started = Instant::now();
        game.update(&mut host)?;
        if host.quit {
            println!("Goodbye!");
            return Ok(());
        }

        let mut surface = RecordingSurface::new();
        game.draw(&mut surface);
        host.targets = game.scene().targets();

        let frame = Frame::capture(&surface, cell_width);
        if frame != last_frame {
            frame.print(host.targets.len());
            last_frame = frame;
        }

        if game.scene().is_finished() {
            println!();
            println!("== THE END ==");
            return Ok(());
        }
        thread::sleep(frame_time.saturating_sub(started.elapsed()));
    }
}

/// Feed stdin lines to the game loop without blocking it
fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (sender, receiver) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("cloister_stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(receiver)
}

/// Host that turns typed lines into clicks
struct TerminalHost {
    rate: f64,
    lines: Receiver<String>,
    targets: Vec<Rect>,
    quit: bool,
}

impl TerminalHost {
    fn new(rate: f64, lines: Receiver<String>) -> Self {
        Self {
            rate,
            lines,
            targets: Vec::new(),
            quit: false,
        }
    }

    fn interpret(&mut self, line: &str) -> InputState {
        let line = line.trim();
        if line == "q" {
            self.quit = true;
            return InputState::default();
        }
        if line.is_empty() {
            return InputState::click(EMPTY_CLICK);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=self.targets.len()).contains(&n) => {
                InputState::click(self.targets[n - 1].center())
            }
            _ if self.targets.is_empty() => {
                println!("Press Enter to continue or 'q' to quit.");
                InputState::default()
            }
            _ => {
                println!("Enter 1-{}, or 'q' to quit.", self.targets.len());
                InputState::default()
            }
        }
    }
}

impl Host for TerminalHost {
    fn tick_rate(&self) -> f64 {
        self.rate
    }

    fn input(&mut self) -> InputState {
        match self.lines.try_recv() {
            Ok(line) => self.interpret(&line),
            Err(TryRecvError::Empty) => InputState::default(),
            Err(TryRecvError::Disconnected) => {
                info!("[Input] stdin closed");
                self.quit = true;
                InputState::default()
            }
        }
    }
}

/// What a frame shows, in terminal terms
#[derive(Debug, Default, PartialEq)]
struct Frame {
    images: Vec<String>,
    rows: Vec<String>,
}

impl Frame {
    fn capture(surface: &RecordingSurface, cell_width: i32) -> Self {
        Self {
            images: surface.images.iter().map(|(name, _)| name.clone()).collect(),
            rows: surface.text_rows(cell_width),
        }
    }

    fn print(&self, options: usize) {
        println!();
        println!("[{}]", self.images.join(" | "));
        for row in &self.rows {
            println!("{row}");
        }
        if options > 0 {
            println!("(1-{options} to choose)");
        }
    }
}
