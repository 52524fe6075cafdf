//! Root of the host-driven game loop

use crate::error::SessionError;
use crate::input::{InputState, Tick};
use crate::render::Surface;
use crate::types::Rect;
use log::info;
use std::sync::OnceLock;

/// A screen the game can show
pub trait Scene {
    /// Advance one tick; an error ends the game
    fn update(&mut self, tick: &Tick) -> Result<(), SessionError>;

    fn draw(&mut self, surface: &mut dyn Surface);

    /// Map the outer window size to the logical screen size
    fn layout(&self, outer_width: u32, outer_height: u32) -> (u32, u32);

    /// True once the scene has nothing left to show
    fn is_finished(&self) -> bool {
        false
    }

    /// Clickable areas in display order, for hosts without a pointer
    fn targets(&self) -> Vec<Rect> {
        Vec::new()
    }
}

/// The loop driving the game: supplies ticks and input
pub trait Host {
    /// Fixed ticks per second
    fn tick_rate(&self) -> f64;

    fn input(&mut self) -> InputState;
}

/// Forwards the host's calls to the current scene
pub struct Game {
    scene: Box<dyn Scene>,
    tick_rate: OnceLock<f64>,
}

impl Game {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            tick_rate: OnceLock::new(),
        }
    }

    /// Tick rate read on the first update, if any
    pub fn tick_rate(&self) -> Option<f64> {
        self.tick_rate.get().copied()
    }

    pub fn update(&mut self, host: &mut dyn Host) -> Result<(), SessionError> {
        let rate = *self.tick_rate.get_or_init(|| {
            let rate = host.tick_rate();
            info!("[Game] running at {rate} ticks per second");
            rate
        });
        let tick = Tick {
            input: host.input(),
            rate,
        };
        self.scene.update(&tick)
    }

    pub fn draw(&mut self, surface: &mut dyn Surface) {
        self.scene.draw(surface);
    }

    pub fn layout(&self, outer_width: u32, outer_height: u32) -> (u32, u32) {
        self.scene.layout(outer_width, outer_height)
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn change_scene(&mut self, scene: Box<dyn Scene>) {
        self.scene = scene;
    }
}
