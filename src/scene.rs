//! The text scene: background, portrait, dialogue box and clickable options

use crate::audio::LoopPlayer;
use crate::config::DisplayConfig;
use crate::dialogue::{ChoiceDelivery, DialogueHandle, NodeView};
use crate::error::SessionError;
use crate::game::Scene;
use crate::input::Tick;
use crate::layout::{Feed, Measure, TextStyle, draw_in_box};
use crate::render::Surface;
use crate::runtime::DialogueRunner;
use crate::session::Session;
use crate::types::{Point, Rect};
use log::{debug, info};
use std::sync::Arc;

/// Clickable area of one option, valid for the option list `seq`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceRegion {
    pub bounds: Rect,
    pub index: usize,
    pub seq: u64,
}

pub struct TextScene {
    session: Arc<Session>,
    dialogue: DialogueHandle,
    runner: DialogueRunner,
    display: DisplayConfig,
    measure: Box<dyn Measure>,
    players: Vec<LoopPlayer>,
    /// Rebuilt on every draw
    regions: Vec<ChoiceRegion>,
    highlighted: Option<usize>,
    finished: bool,
}

impl TextScene {
    /// Start the session's dialogue and present it
    pub fn new(
        session: Arc<Session>,
        display: DisplayConfig,
        measure: Box<dyn Measure>,
        players: Vec<LoopPlayer>,
    ) -> Result<Self, SessionError> {
        let (dialogue, runner) = session.start_dialogue()?;
        Ok(Self {
            session,
            dialogue,
            runner,
            display,
            measure,
            players,
            regions: Vec::new(),
            highlighted: None,
            finished: false,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn dialogue(&self) -> &DialogueHandle {
        &self.dialogue
    }

    pub fn choice_regions(&self) -> &[ChoiceRegion] {
        &self.regions
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn players(&self) -> &[LoopPlayer] {
        &self.players
    }

    /// Close the session and wait for the interpreter thread to exit
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        self.dialogue.close();
        self.runner.join().unwrap_or(Ok(()))
    }

    fn region_at(&self, cursor: Point) -> Option<ChoiceRegion> {
        self.regions
            .iter()
            .find(|region| region.bounds.contains(cursor))
            .copied()
    }
}

impl Scene for TextScene {
    fn update(&mut self, tick: &Tick) -> Result<(), SessionError> {
        if let Some(result) = self.runner.poll() {
            self.finished = true;
            result?;
            info!("[Scene] dialogue finished");
        }

        for player in &mut self.players {
            let wanted = self.session.loops().is_playing(player.name());
            player.update(wanted, tick)?;
        }

        let cursor = tick.input.cursor;
        let hovered = self.region_at(cursor);
        self.highlighted = hovered.map(|region| region.index);

        if tick.input.primary_released {
            let delivery = match hovered {
                Some(region) => {
                    debug!("[Scene] clicked option {} (seq {})", region.index, region.seq);
                    self.dialogue.submit_choice(region.seq, region.index)
                }
                None => ChoiceDelivery::Dropped,
            };
            // a click that picked an option does not also advance a later wait
            if delivery == ChoiceDelivery::Dropped {
                self.dialogue.signal_click();
            }
        }
        Ok(())
    }

    fn draw(&mut self, surface: &mut dyn Surface) {
        let stage = self.session.stage();
        surface.draw_image(&stage.background(), self.display.background_offset);
        if let Some(portrait) = stage.portrait() {
            let center = self.display.portrait_center;
            let at = Point::new(
                center.x - portrait.width as i32 / 2,
                center.y - portrait.height as i32 / 2,
            );
            surface.draw_image(&portrait, at);
        }
        surface.draw_image(stage.ui_frame(), Point::new(0, 0));

        let node = self.dialogue.current_node();
        let bounds = self.display.dialogue_box;
        let measure = &*self.measure;
        let mut feed = Feed::new(bounds.min, measure.line_height());

        let prompt_style = TextStyle {
            measure,
            color: self.display.text_color,
        };
        draw_in_box(&mut feed, &node.prompt, bounds, &prompt_style, surface);
        feed.line_break();

        self.regions.clear();
        for (index, choice) in node.choices.iter().enumerate() {
            feed.line_break();
            let color = if self.highlighted == Some(index) {
                self.display.highlight_color
            } else {
                self.display.text_color
            };
            let text = format!("{}{}", self.display.option_prefix, choice);
            let mut used = draw_in_box(
                &mut feed,
                &text,
                bounds,
                &TextStyle { measure, color },
                surface,
            );
            used.max.x = bounds.max.x;
            self.regions.push(ChoiceRegion {
                bounds: used,
                index,
                seq: node.seq,
            });
        }
    }

    fn layout(&self, _outer_width: u32, _outer_height: u32) -> (u32, u32) {
        (self.display.logical_width, self.display.logical_height)
    }

    /// True once an update has collected the interpreter's result
    fn is_finished(&self) -> bool {
        self.finished
    }

    fn targets(&self) -> Vec<Rect> {
        self.regions.iter().map(|region| region.bounds).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{LoopFlags, SilentSink};
    use crate::config::DialogueConfig;
    use crate::dialogue::SessionPhase;
    use crate::input::InputState;
    use crate::layout::Monospace;
    use crate::render::{ImageAsset, RecordingSurface};
    use crate::stage::{ImageRegistry, Stage};
    use crate::types::{Color, Node, Program, StringTable};
    use std::thread;
    use std::time::{Duration, Instant};

    fn image(name: &str, width: u32, height: u32) -> ImageAsset {
        ImageAsset {
            name: name.to_string(),
            path: format!("{name}.png").into(),
            width,
            height,
        }
    }

    fn scene(start: Node) -> TextScene {
        let strings = StringTable::new("en-US")
            .with_line("line:hello", "Hello")
            .with_line("line:a", "A")
            .with_line("line:b", "B")
            .with_line("line:after", "After");
        let stage = Stage::new(
            ImageRegistry::new([image("barracks", 517, 600), image("bedroom", 517, 600)]),
            ImageRegistry::new([image("melusine", 200, 300)]),
            image("ui", 800, 600),
            "barracks",
        )
        .unwrap();
        let session = Session::new(
            Arc::new(Program::new("Test").with_node(start)),
            strings,
            stage,
            LoopFlags::new([("music", false)]),
            DialogueConfig::default(),
        );
        let players = vec![LoopPlayer::new(
            "music",
            Box::new(SilentSink::default()),
            Duration::from_secs(30),
            64,
            0.0,
        )];
        TextScene::new(
            session,
            DisplayConfig::default(),
            Box::new(Monospace::default()),
            players,
        )
        .unwrap()
    }

    fn tick(input: InputState) -> Tick {
        Tick { input, rate: 60.0 }
    }

    /// Draw every tick until `done` holds
    fn run_until(scene: &mut TextScene, done: impl Fn(&TextScene) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(scene) {
            assert!(Instant::now() < deadline, "scene did not settle");
            scene.update(&tick(InputState::default())).unwrap();
            scene.draw(&mut RecordingSurface::new());
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn branching() -> Node {
        Node::new("Start")
            .line("line:hello")
            .option("line:a", "a")
            .option("line:b", "b")
            .show_options()
            .label("a")
            .command("background bedroom")
            .line("line:after")
            .stop()
            .label("b")
            .stop()
    }

    #[test]
    fn draws_stage_then_text() {
        let mut scene = scene(branching());
        run_until(&mut scene, |s| s.choice_regions().len() == 2);

        let mut surface = RecordingSurface::new();
        scene.draw(&mut surface);
        assert_eq!(
            surface.images,
            vec![
                ("barracks".to_string(), Point::new(141, 0)),
                ("ui".to_string(), Point::new(0, 0)),
            ]
        );
        assert_eq!(surface.text_rows(7), vec!["Hello", "> A", "> B"]);

        let regions = scene.choice_regions();
        let box_ = DisplayConfig::default().dialogue_box;
        assert_eq!(regions[0].bounds.min, Point::new(151, 442 + 28));
        assert_eq!(regions[0].bounds.max.x, box_.max.x);
        assert_eq!(regions[1].bounds.min.y, 442 + 42);
        assert!(regions.iter().all(|r| r.seq == 1));
        scene.shutdown().unwrap();
    }

    #[test]
    fn hover_highlights_and_click_selects() {
        let mut scene = scene(branching());
        run_until(&mut scene, |s| s.choice_regions().len() == 2);

        let target = scene.choice_regions()[0].bounds.center();
        scene.update(&tick(InputState::hover(target))).unwrap();
        assert_eq!(scene.highlighted(), Some(0));

        let mut surface = RecordingSurface::new();
        scene.draw(&mut surface);
        assert!(surface.glyphs.iter().any(|g| g.color == Color::CYAN));

        scene.update(&tick(InputState::click(target))).unwrap();
        run_until(&mut scene, |s| s.is_finished());
        scene.draw(&mut RecordingSurface::new());

        assert_eq!(scene.session().stage().background().name, "bedroom");
        assert_eq!(scene.dialogue().current_node().prompt, "After");
        assert!(scene.choice_regions().is_empty());
    }

    #[test]
    fn click_outside_options_is_harmless() {
        let mut scene = scene(branching());
        run_until(&mut scene, |s| s.choice_regions().len() == 2);

        scene
            .update(&tick(InputState::click(Point::new(5, 5))))
            .unwrap();
        assert_eq!(scene.dialogue().phase(), SessionPhase::AwaitingChoice);
        assert_eq!(scene.dialogue().current_node().seq, 1);
        scene.shutdown().unwrap();
    }

    #[test]
    fn portrait_is_centred() {
        let mut scene = scene(Node::new("Start").command("char melusine").command("wait"));
        run_until(&mut scene, |s| s.dialogue().phase() == SessionPhase::AwaitingClick);

        let mut surface = RecordingSurface::new();
        scene.draw(&mut surface);
        assert_eq!(surface.images[1], ("melusine".to_string(), Point::new(300, 150)));
        scene.shutdown().unwrap();
    }

    #[test]
    fn script_errors_surface_once_from_update() {
        let mut scene = scene(Node::new("Start").command("teleport").stop());
        let deadline = Instant::now() + Duration::from_secs(5);
        let err = loop {
            assert!(Instant::now() < deadline);
            if let Err(err) = scene.update(&tick(InputState::default())) {
                break err;
            }
            thread::sleep(Duration::from_millis(1));
        };
        assert!(matches!(err, SessionError::Script(_)));
        assert!(scene.is_finished());
        assert!(scene.update(&tick(InputState::default())).is_ok());
    }

    #[test]
    fn loops_follow_script_flags() {
        let mut scene = scene(Node::new("Start").command("loopStart music").command("wait"));
        run_until(&mut scene, |s| s.dialogue().phase() == SessionPhase::AwaitingClick);
        scene.update(&tick(InputState::default())).unwrap();
        assert!(scene.session().loops().is_playing("music"));
        assert_eq!(scene.players()[0].volume(), 64);
        scene.shutdown().unwrap();
    }

    #[test]
    fn layout_is_fixed() {
        let mut scene = scene(Node::new("Start").stop());
        assert_eq!(scene.layout(1920, 1080), (800, 600));
        scene.shutdown().unwrap();
    }
}
