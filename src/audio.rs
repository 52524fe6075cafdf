//! Looping background audio
//!
//! Script commands only flip a per-track flag. The render thread owns the
//! actual players and reconciles them with the flags once per tick, which is
//! also where fade-in, looping and volume keys are handled.

use crate::config::AudioConfig;
use crate::error::SessionError;
use crate::input::Tick;
use crate::loader::TrackAsset;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Rewind when a track is this close to its end
const LOOP_REWIND_MARGIN: Duration = Duration::from_millis(19);

/// Maximum volume on the 0..=128 scale
pub const MAX_VOLUME: i32 = 128;

/// Playback backend for one decoded track
pub trait AudioSink {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    fn position(&self) -> Duration;
    fn rewind(&mut self) -> Result<(), String>;
    /// Volume in 0.0..=1.0
    fn set_volume(&mut self, volume: f64);
}

/// Which loops the script wants playing
#[derive(Debug, Default)]
pub struct LoopFlags {
    flags: HashMap<String, AtomicBool>,
}

impl LoopFlags {
    /// Register tracks with their initial playing state
    pub fn new<'a>(tracks: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let flags = tracks
            .into_iter()
            .map(|(name, playing)| (name.to_string(), AtomicBool::new(playing)))
            .collect();
        Self { flags }
    }

    /// Returns false if no track has this name
    pub fn start(&self, name: &str) -> bool {
        self.set(name, true)
    }

    /// Returns false if no track has this name
    pub fn stop(&self, name: &str) -> bool {
        self.set(name, false)
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    fn set(&self, name: &str, playing: bool) -> bool {
        match self.flags.get(name) {
            Some(flag) => {
                flag.store(playing, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    duration_secs: f64,
    elapsed_secs: f64,
}

/// A track that loops while its flag is set
pub struct LoopPlayer {
    name: String,
    sink: Box<dyn AudioSink>,
    length: Duration,
    volume: i32,
    fade_in_secs: f64,
    fade: Option<Fade>,
    loops_completed: u32,
}

impl LoopPlayer {
    pub fn new(
        name: impl Into<String>,
        sink: Box<dyn AudioSink>,
        length: Duration,
        volume: i32,
        fade_in_secs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            sink,
            length,
            volume: volume.clamp(0, MAX_VOLUME),
            fade_in_secs,
            fade: None,
            loops_completed: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn loops_completed(&self) -> u32 {
        self.loops_completed
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Bring the sink in line with the script's flag and advance bookkeeping
    pub fn update(&mut self, wanted: bool, tick: &Tick) -> Result<(), SessionError> {
        if !wanted {
            if self.sink.is_playing() {
                info!("[Audio] stopping '{}'", self.name);
                self.sink.pause();
            }
            self.fade = None;
            return Ok(());
        }

        if !self.sink.is_playing() {
            info!("[Audio] starting '{}'", self.name);
            self.sink.play();
            if self.fade_in_secs > 0.0 {
                self.fade = Some(Fade {
                    duration_secs: self.fade_in_secs,
                    elapsed_secs: 0.0,
                });
            }
        }

        if self.length.saturating_sub(self.sink.position()) <= LOOP_REWIND_MARGIN {
            self.sink.rewind().map_err(|message| SessionError::Audio {
                track: self.name.clone(),
                message,
            })?;
            self.loops_completed += 1;
            debug!("[Audio] '{}' looped ({})", self.name, self.loops_completed);
            self.sink.play();
        }

        self.update_volume(tick);
        Ok(())
    }

    fn update_volume(&mut self, tick: &Tick) {
        if tick.input.volume_down {
            self.volume -= 1;
        }
        if tick.input.volume_up {
            self.volume += 1;
        }
        self.volume = self.volume.clamp(0, MAX_VOLUME);

        let level = f64::from(self.volume) / f64::from(MAX_VOLUME);
        let scale = match self.fade.as_mut() {
            Some(fade) => {
                fade.elapsed_secs += 1.0 / tick.rate;
                (fade.elapsed_secs / fade.duration_secs).min(1.0)
            }
            None => 1.0,
        };
        if scale >= 1.0 {
            self.fade = None;
        }
        self.sink.set_volume(scale * level);
    }
}

/// One player per manifest track, using the configured volumes
pub fn loop_players(
    tracks: &[TrackAsset],
    config: &AudioConfig,
    mut open: impl FnMut(&TrackAsset) -> Box<dyn AudioSink>,
) -> Vec<LoopPlayer> {
    tracks
        .iter()
        .map(|track| {
            LoopPlayer::new(
                track.name.clone(),
                open(track),
                Duration::from_secs_f64(track.length_secs.max(0.0)),
                config.track(&track.name).volume,
                config.fade_in_secs,
            )
        })
        .collect()
}

/// Sink that plays nothing; it only remembers what it was told
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SilentSink {
    pub playing: bool,
    pub volume: f64,
    pub position: Duration,
    pub rewinds: u32,
}

impl AudioSink for SilentSink {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn rewind(&mut self) -> Result<(), String> {
        self.position = Duration::ZERO;
        self.rewinds += 1;
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use std::sync::{Arc, Mutex};

    /// Shares its state with the test so it can be inspected after boxing
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<SilentSink>>);

    impl AudioSink for SharedSink {
        fn play(&mut self) {
            self.0.lock().unwrap().play();
        }
        fn pause(&mut self) {
            self.0.lock().unwrap().pause();
        }
        fn is_playing(&self) -> bool {
            self.0.lock().unwrap().is_playing()
        }
        fn position(&self) -> Duration {
            self.0.lock().unwrap().position()
        }
        fn rewind(&mut self) -> Result<(), String> {
            self.0.lock().unwrap().rewind()
        }
        fn set_volume(&mut self, volume: f64) {
            self.0.lock().unwrap().set_volume(volume);
        }
    }

    fn tick(input: InputState) -> Tick {
        Tick { input, rate: 10.0 }
    }

    fn player(sink: &SharedSink, volume: i32, fade_in_secs: f64) -> LoopPlayer {
        LoopPlayer::new(
            "music",
            Box::new(sink.clone()),
            Duration::from_secs(30),
            volume,
            fade_in_secs,
        )
    }

    #[test]
    fn flags_track_known_loops_only() {
        let flags = LoopFlags::new([("music", true), ("snoring", false)]);
        assert!(flags.is_playing("music"));
        assert!(flags.start("snoring"));
        assert!(flags.is_playing("snoring"));
        assert!(flags.stop("music"));
        assert!(!flags.is_playing("music"));
        assert!(!flags.start("choir"));
        assert!(!flags.is_playing("choir"));
    }

    #[test]
    fn fade_in_ramps_volume_over_ticks() {
        let sink = SharedSink::default();
        let mut player = player(&sink, 128, 1.0);

        player.update(true, &tick(InputState::default())).unwrap();
        assert!(sink.0.lock().unwrap().playing);
        assert!((sink.0.lock().unwrap().volume - 0.1).abs() < 1e-9);

        for _ in 0..10 {
            player.update(true, &tick(InputState::default())).unwrap();
        }
        assert!((sink.0.lock().unwrap().volume - 1.0).abs() < 1e-9);
        assert!(!player.is_fading());
    }

    #[test]
    fn stop_flag_pauses_sink() {
        let sink = SharedSink::default();
        let mut player = player(&sink, 64, 0.0);

        player.update(true, &tick(InputState::default())).unwrap();
        assert!((sink.0.lock().unwrap().volume - 0.5).abs() < 1e-9);

        player.update(false, &tick(InputState::default())).unwrap();
        assert!(!sink.0.lock().unwrap().playing);
    }

    #[test]
    fn rewinds_near_the_end() {
        let sink = SharedSink::default();
        sink.0.lock().unwrap().position = Duration::from_millis(29_990);
        let mut player = player(&sink, 64, 0.0);

        player.update(true, &tick(InputState::default())).unwrap();
        assert_eq!(sink.0.lock().unwrap().rewinds, 1);
        assert_eq!(player.loops_completed(), 1);
        assert!(sink.0.lock().unwrap().playing);
    }

    #[test]
    fn players_take_configured_volume() {
        let tracks = [
            TrackAsset {
                name: "music".to_string(),
                path: "music.ogg".into(),
                length_secs: 30.0,
            },
            TrackAsset {
                name: "snoring".to_string(),
                path: "snoring.ogg".into(),
                length_secs: 4.0,
            },
        ];
        let mut config = AudioConfig::default();
        config.tracks.insert(
            "music".to_string(),
            crate::config::TrackConfig {
                volume: 10,
                autoplay: true,
            },
        );

        let players = loop_players(&tracks, &config, |_| Box::new(SilentSink::default()));
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].volume(), 10);
        assert_eq!(players[1].volume(), config.default_volume);
    }

    #[test]
    fn volume_keys_are_clamped() {
        let sink = SharedSink::default();
        let mut player = player(&sink, 128, 0.0);
        let up = InputState {
            volume_up: true,
            ..Default::default()
        };

        player.update(true, &tick(up)).unwrap();
        assert_eq!(player.volume(), MAX_VOLUME);

        let down = InputState {
            volume_down: true,
            ..Default::default()
        };
        player.update(true, &tick(down)).unwrap();
        assert_eq!(player.volume(), 127);
    }
}
