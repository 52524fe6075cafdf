//! Game configuration
//!
//! Loaded from JSON. Every section has defaults, so a config file only needs
//! the fields it changes.

use crate::types::{Color, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub assets: AssetConfig,
    pub dialogue: DialogueConfig,
    pub display: DisplayConfig,
    pub audio: AudioConfig,
    /// Ticks per second used by the headless host
    pub tick_rate: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            assets: AssetConfig::default(),
            dialogue: DialogueConfig::default(),
            display: DisplayConfig::default(),
            audio: AudioConfig::default(),
            tick_rate: 60.0,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file; relative asset paths resolve against its directory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        let mut config = Self::from_json_str(&json)?;
        if let Some(base) = path.parent() {
            config.assets.resolve_against(base);
        }
        Ok(config)
    }

    /// Apply `CLOISTER_LOCALE` and `CLOISTER_ENTRY_NODE` overrides
    pub fn apply_env(&mut self) {
        if let Ok(locale) = std::env::var("CLOISTER_LOCALE") {
            self.assets.locale = locale;
        }
        if let Ok(entry) = std::env::var("CLOISTER_ENTRY_NODE") {
            self.dialogue.entry_node = entry;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(self.tick_rate > 0.0) {
            anyhow::bail!("tick_rate must be positive (got {})", self.tick_rate);
        }
        if self.display.dialogue_box.is_empty() {
            anyhow::bail!("display.dialogue_box must not be empty");
        }
        if self.audio.fade_in_secs < 0.0 {
            anyhow::bail!("audio.fade_in_secs must not be negative");
        }
        Ok(())
    }
}

/// Where the compiled program, string table and manifest live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub program: PathBuf,
    pub strings: PathBuf,
    pub manifest: PathBuf,
    pub locale: String,
}

impl AssetConfig {
    pub fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.program, &mut self.strings, &mut self.manifest] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gamedata/Main.json"),
            strings: PathBuf::from("gamedata/Main-Lines.csv"),
            manifest: PathBuf::from("gamedata/manifest.json"),
            locale: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    pub entry_node: String,
    /// Inserted between consecutive lines of one prompt
    pub line_separator: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            entry_node: "Start".to_string(),
            line_separator: "\n".to_string(),
        }
    }
}

/// Screen layout of the text scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub logical_width: u32,
    pub logical_height: u32,
    pub dialogue_box: Rect,
    pub background_offset: Point,
    /// Portraits are centred on this point
    pub portrait_center: Point,
    pub text_color: Color,
    pub highlight_color: Color,
    pub option_prefix: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            logical_width: 800,
            logical_height: 600,
            dialogue_box: Rect::new(146 + 5, 430 + 12, 146 + 517, 430 + 163),
            background_offset: Point::new(141, 0),
            portrait_center: Point::new(400, 300),
            text_color: Color::WHITE,
            highlight_color: Color::CYAN,
            option_prefix: "> ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub fade_in_secs: f64,
    /// Volume on a 0..=128 scale for tracks without their own entry
    pub default_volume: i32,
    pub tracks: HashMap<String, TrackConfig>,
}

impl AudioConfig {
    pub fn track(&self, name: &str) -> TrackConfig {
        self.tracks.get(name).cloned().unwrap_or(TrackConfig {
            volume: self.default_volume,
            autoplay: false,
        })
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fade_in_secs: 5.0,
            default_volume: 64,
            tracks: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackConfig {
    pub volume: i32,
    #[serde(default)]
    pub autoplay: bool,
}
