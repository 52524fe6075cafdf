//! Plays small games end to end: files on disk through loader, session,
//! scene and game loop.

use cloister::audio::loop_players;
use cloister::loader::load_blocking;
use cloister::{
    FileSystemAssetRepository, Game, GameConfig, Host, InputState, Monospace, RecordingSurface,
    Scene, Session, SessionError, SilentSink, TextScene,
};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const MANIFEST: &str = r#"{
    "ui_frame": { "name": "ui", "path": "ui-scaled.png", "width": 800, "height": 600 },
    "default_background": "barracks",
    "backgrounds": [
        { "name": "barracks", "path": "barracks.png", "width": 517, "height": 600 },
        { "name": "great_hall", "path": "hall_background.png", "width": 517, "height": 600 }
    ],
    "portraits": [
        { "name": "berthilde", "path": "berthilde.png", "width": 240, "height": 400 }
    ],
    "tracks": [
        { "name": "music", "path": "flute.ogg", "length_secs": 40.0 }
    ]
}"#;

const LINES: &str = "id,text,file,node,lineNumber\n\
    line:hello,Hello,Main,Start,1\n\
    line:a,Go to the hall,Main,Start,2\n\
    line:b,Stay in bed,Main,Start,3\n\
    line:hall,\"The hall is cold, and empty.\",Main,Start,5\n\
    line:bed,You sleep.,Main,Start,7\n\
    line:later,Later...,Main,Hall,1\n";

/// Start -> options; A goes to the hall node via a wait, B ends quietly
const PROGRAM: &str = r#"{
    "name": "Main",
    "nodes": {
        "Start": {
            "name": "Start",
            "labels": { "hall": 5, "bed": 11 },
            "instructions": [
                { "op": "run_command", "text": "loopStart music" },
                { "op": "run_line", "line_id": "line:hello" },
                { "op": "add_option", "line_id": "line:a", "destination": "hall" },
                { "op": "add_option", "line_id": "line:b", "destination": "bed" },
                { "op": "show_options" },
                { "op": "run_command", "text": "background great_hall" },
                { "op": "run_command", "text": "char berthilde" },
                { "op": "run_line", "line_id": "line:hall" },
                { "op": "run_command", "text": "wait" },
                { "op": "push_string", "value": "Hall" },
                { "op": "run_node" },
                { "op": "run_command", "text": "loopStop music" },
                { "op": "run_line", "line_id": "line:bed" },
                { "op": "stop" }
            ]
        },
        "Hall": {
            "name": "Hall",
            "instructions": [
                { "op": "run_line", "line_id": "line:later" },
                { "op": "stop" }
            ]
        }
    }
}"#;

fn write_game(name: &str, program: &str) -> GameConfig {
    let dir = std::env::temp_dir().join(format!("cloister-it-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Main.json"), program).unwrap();
    fs::write(dir.join("Main-Lines.csv"), LINES).unwrap();
    fs::write(dir.join("manifest.json"), MANIFEST).unwrap();
    fs::write(
        dir.join("game.json"),
        r#"{
            "assets": {
                "program": "Main.json",
                "strings": "Main-Lines.csv",
                "manifest": "manifest.json"
            },
            "audio": { "fade_in_secs": 0.5 }
        }"#,
    )
    .unwrap();
    GameConfig::load(&dir.join("game.json")).unwrap()
}

fn new_game(config: &GameConfig) -> Game {
    let repository = FileSystemAssetRepository::new(config.assets.clone());
    let assets = load_blocking(&repository, &config.assets.locale).unwrap();
    let players = loop_players(&assets.manifest.tracks, &config.audio, |_| {
        Box::new(SilentSink::default())
    });
    let session = Session::from_assets(assets, config).unwrap();
    let scene = TextScene::new(
        session,
        config.display.clone(),
        Box::new(Monospace::default()),
        players,
    )
    .unwrap();
    Game::new(Box::new(scene))
}

/// A host that replays queued inputs, one per tick
#[derive(Default)]
struct Scripted {
    inputs: VecDeque<InputState>,
}

impl Host for Scripted {
    fn tick_rate(&self) -> f64 {
        60.0
    }

    fn input(&mut self) -> InputState {
        self.inputs.pop_front().unwrap_or_default()
    }
}

struct Driver {
    game: Game,
    host: Scripted,
    frame: RecordingSurface,
}

impl Driver {
    fn new(config: &GameConfig) -> Self {
        Self {
            game: new_game(config),
            host: Scripted::default(),
            frame: RecordingSurface::new(),
        }
    }

    fn tick(&mut self) -> Result<(), SessionError> {
        self.game.update(&mut self.host)?;
        self.frame = RecordingSurface::new();
        self.game.draw(&mut self.frame);
        Ok(())
    }

    fn rows(&self) -> Vec<String> {
        self.frame.text_rows(7)
    }

    /// Tick until `done` holds on the latest frame
    fn run_until(&mut self, what: &str, done: impl Fn(&Self) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            self.tick().unwrap();
            if done(self) {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {what}: {:?}", self.rows());
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn click_option(&mut self, n: usize) {
        let target = self.game.scene().targets()[n].center();
        self.host.inputs.push_back(InputState::click(target));
    }

    fn click_anywhere(&mut self) {
        self.host
            .inputs
            .push_back(InputState::click(cloister::types::Point::new(0, 0)));
    }
}

fn images(frame: &RecordingSurface) -> Vec<&str> {
    frame.images.iter().map(|(name, _)| name.as_str()).collect()
}

#[test]
fn first_option_leads_through_wait_to_next_node() {
    let mut driver = Driver::new(&write_game("hall", PROGRAM));

    driver.run_until("options", |d| d.game.scene().targets().len() == 2);
    assert_eq!(
        driver.rows(),
        vec!["Hello", "> Go to the hall", "> Stay in bed"]
    );
    assert_eq!(images(&driver.frame), vec!["barracks", "ui"]);

    driver.click_option(0);
    driver.run_until("hall text", |d| {
        d.rows() == vec!["The hall is cold, and empty.".to_string()]
    });
    assert_eq!(images(&driver.frame), vec!["great_hall", "berthilde", "ui"]);
    assert!(driver.game.scene().targets().is_empty());

    // a click only counts once the interpreter is inside the wait
    let deadline = Instant::now() + Duration::from_secs(5);
    while !driver.game.scene().is_finished() {
        assert!(Instant::now() < deadline, "wait was never released");
        driver.click_anywhere();
        driver.tick().unwrap();
        thread::sleep(Duration::from_millis(1));
    }
    driver.tick().unwrap();
    assert_eq!(driver.rows(), vec!["Later..."]);
}

#[test]
fn second_option_ends_quietly() {
    let mut driver = Driver::new(&write_game("bed", PROGRAM));
    driver.run_until("options", |d| d.game.scene().targets().len() == 2);

    // the repeat targets the same option list and must be dropped
    driver.click_option(1);
    driver.click_option(1);
    driver.run_until("end", |d| d.game.scene().is_finished());
    driver.tick().unwrap();
    assert_eq!(driver.rows(), vec!["You sleep."]);
    assert_eq!(images(&driver.frame), vec!["barracks", "ui"]);
}

#[test]
fn clicks_before_options_do_not_pick_one() {
    let mut driver = Driver::new(&write_game("early", PROGRAM));
    for _ in 0..5 {
        driver.click_anywhere();
    }
    driver.run_until("options", |d| {
        d.host.inputs.is_empty() && d.game.scene().targets().len() == 2
    });
    for _ in 0..10 {
        driver.tick().unwrap();
    }
    assert_eq!(driver.game.scene().targets().len(), 2);
    assert!(!driver.game.scene().is_finished());
}

#[test]
fn script_faults_surface_from_update() {
    let broken = PROGRAM.replace("background great_hall", "background moon");
    let mut driver = Driver::new(&write_game("fault", &broken));
    driver.run_until("options", |d| d.game.scene().targets().len() == 2);

    driver.click_option(0);
    let deadline = Instant::now() + Duration::from_secs(5);
    let err = loop {
        match driver.tick() {
            Err(err) => break err,
            Ok(()) => assert!(Instant::now() < deadline, "fault never surfaced"),
        }
        thread::sleep(Duration::from_millis(1));
    };
    assert!(err.to_string().contains("script"));
    assert!(driver.game.scene().is_finished());
}

#[test]
fn missing_files_fail_loading() {
    let config = write_game("missing", PROGRAM);
    fs::remove_file(&config.assets.strings).unwrap();
    let repository = FileSystemAssetRepository::new(config.assets.clone());
    assert!(load_blocking(&repository, "en-US").is_err());
    assert!(Path::new(&config.assets.program).exists());
}
