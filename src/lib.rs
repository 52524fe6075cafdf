//! # cloister
//!
//! A dialogue engine for visual novels. A compiled branching script runs on
//! its own interpreter thread while a fixed-tick scene draws the current
//! prompt and options and routes the player's clicks back.
//!
//! The interpreter and the scene share exactly two blocking points: option
//! selection (a rendezvous carrying the chosen index) and the `wait` command
//! (a click signal). Everything else the scene reads under a lock or through
//! atomic swaps.
//!
//! ## Quick Start
//!
//! ```rust
//! use cloister::{
//!     DialogueConfig, ImageAsset, ImageRegistry, LoopFlags, Node, NodeView, Program,
//!     Session, SessionPhase, Stage, StringTable,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let program = Program::new("Main").with_node(
//!     Node::new("Start")
//!         .line("line:hello")
//!         .option("line:stay", "stay")
//!         .show_options()
//!         .label("stay")
//!         .stop(),
//! );
//! let strings = StringTable::new("en-US")
//!     .with_line("line:hello", "Hello!")
//!     .with_line("line:stay", "Stay a while");
//! let image = |name: &str| ImageAsset {
//!     name: name.to_string(),
//!     path: format!("{name}.png").into(),
//!     width: 517,
//!     height: 600,
//! };
//! let stage = Stage::new(
//!     ImageRegistry::new([image("barracks")]),
//!     ImageRegistry::default(),
//!     image("ui"),
//!     "barracks",
//! )?;
//!
//! let session = Session::new(
//!     Arc::new(program),
//!     strings,
//!     stage,
//!     LoopFlags::default(),
//!     DialogueConfig::default(),
//! );
//! let (mut handle, mut runner) = session.start_dialogue()?;
//!
//! while handle.phase() != SessionPhase::AwaitingChoice {
//!     std::thread::yield_now();
//! }
//! let seq = handle.current_node().seq;
//! handle.submit_choice(seq, 0);
//! runner.join().transpose()?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod game;
pub mod input;
pub mod layout;
pub mod loader;
pub mod render;
pub mod runtime;
pub mod scene;
pub mod session;
pub mod stage;
pub mod types;

pub use audio::{AudioSink, LoopFlags, LoopPlayer, SilentSink};
pub use config::{AudioConfig, DialogueConfig, DisplayConfig, GameConfig};
pub use dialogue::{ChoiceDelivery, DialogueHandle, NodeView, SessionPhase};
pub use error::{DialogueError, LoadError, SessionError, VmError};
pub use game::{Game, Host, Scene};
pub use input::{InputState, Tick};
pub use layout::{Measure, Monospace};
pub use loader::{AssetRepository, FileSystemAssetRepository, LoadedAssets};
pub use render::{ImageAsset, RecordingSurface, Surface};
pub use runtime::{DialogueHandler, DialogueRunner, VirtualMachine};
pub use scene::TextScene;
pub use session::Session;
pub use stage::{ImageRegistry, Stage};
pub use types::{CurrentNode, Node, Program, StringTable, Value};
