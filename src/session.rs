//! The dialogue session context
//!
//! A [`Session`] owns everything the interpreter thread and the render thread
//! share: the program, the string table, stage and audio state, and the
//! dialogue synchronization. It is built once from loaded assets and passed
//! to both sides as an `Arc`.

use crate::audio::LoopFlags;
use crate::config::{DialogueConfig, GameConfig};
use crate::dialogue::{DialogueHandle, DialogueShared, SessionHandler};
use crate::error::{LoadError, SessionError};
use crate::loader::LoadedAssets;
use crate::runtime::{DialogueRunner, MapVariableStorage};
use crate::stage::{ImageRegistry, Stage};
use crate::types::{Program, StringTable};
use log::info;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Session {
    program: Arc<Program>,
    strings: StringTable,
    stage: Stage,
    loops: LoopFlags,
    dialogue: DialogueShared,
    settings: DialogueConfig,
    started: AtomicBool,
}

impl Session {
    pub fn new(
        program: Arc<Program>,
        strings: StringTable,
        stage: Stage,
        loops: LoopFlags,
        settings: DialogueConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            program,
            strings,
            stage,
            loops,
            dialogue: DialogueShared::new(),
            settings,
            started: AtomicBool::new(false),
        })
    }

    /// Build a session from loaded assets; fails if the manifest is inconsistent
    pub fn from_assets(assets: LoadedAssets, config: &GameConfig) -> Result<Arc<Self>, LoadError> {
        let LoadedAssets {
            program,
            strings,
            manifest,
        } = assets;

        if program.node(&config.dialogue.entry_node).is_none() {
            return Err(LoadError::MissingAsset {
                kind: "node",
                name: config.dialogue.entry_node.clone(),
            });
        }

        let stage = Stage::new(
            ImageRegistry::new(manifest.backgrounds),
            ImageRegistry::new(manifest.portraits),
            manifest.ui_frame,
            &manifest.default_background,
        )?;
        let loops = LoopFlags::new(
            manifest
                .tracks
                .iter()
                .map(|track| (track.name.as_str(), config.audio.track(&track.name).autoplay)),
        );

        Ok(Self::new(
            Arc::new(program),
            strings,
            stage,
            loops,
            config.dialogue.clone(),
        ))
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn loops(&self) -> &LoopFlags {
        &self.loops
    }

    pub fn dialogue(&self) -> &DialogueShared {
        &self.dialogue
    }

    pub fn settings(&self) -> &DialogueConfig {
        &self.settings
    }

    /// Spawn the interpreter at the configured entry node.
    ///
    /// A session runs at most one interpreter; later calls fail.
    pub fn start_dialogue(self: &Arc<Self>) -> Result<(DialogueHandle, DialogueRunner), SessionError> {
        let claim = self.claim_start().ok_or(SessionError::AlreadyStarted)?;

        let (sender, receiver) = crossbeam_channel::bounded(0);
        let handler = SessionHandler::new(Arc::clone(self), receiver);

        info!(
            "[Session] starting '{}' at node '{}'",
            self.program.name, self.settings.entry_node
        );
        let runner = DialogueRunner::spawn(
            Arc::clone(&self.program),
            &self.settings.entry_node,
            handler,
            MapVariableStorage::new(),
        )?;
        claim.commit();
        // built last: dropping a handle closes the session
        let handle = DialogueHandle::new(Arc::clone(self), sender);
        Ok((handle, runner))
    }

    /// Reserve the single interpreter slot; released again unless committed
    pub(crate) fn claim_start(&self) -> Option<StartClaim<'_>> {
        if self.started.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(StartClaim {
            started: &self.started,
            committed: false,
        })
    }
}

pub(crate) struct StartClaim<'a> {
    started: &'a AtomicBool,
    committed: bool,
}

impl StartClaim<'_> {
    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for StartClaim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.started.store(false, Ordering::Release);
        }
    }
}
