//! Scene-level display state
//!
//! The interpreter thread changes the background and portrait; the render
//! thread reads them every frame. Both are stored as atomic indices into
//! registries that never change after construction, so a swap is a single
//! store and a reader always sees one whole image or the other.

use crate::error::{DialogueError, LoadError};
use crate::render::{ImageAsset, ImageHandle};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const NO_PORTRAIT: usize = usize::MAX;

/// Immutable name-to-image table
#[derive(Debug, Default)]
pub struct ImageRegistry {
    names: HashMap<String, usize>,
    images: Vec<ImageHandle>,
}

impl ImageRegistry {
    pub fn new(assets: impl IntoIterator<Item = ImageAsset>) -> Self {
        let mut registry = Self::default();
        for asset in assets {
            match registry.names.get(&asset.name) {
                Some(&index) => registry.images[index] = Arc::new(asset),
                None => {
                    registry.names.insert(asset.name.clone(), registry.images.len());
                    registry.images.push(Arc::new(asset));
                }
            }
        }
        registry
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&ImageHandle> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Current background and character portrait
#[derive(Debug)]
pub struct Stage {
    backgrounds: ImageRegistry,
    portraits: ImageRegistry,
    ui_frame: ImageHandle,
    background: AtomicUsize,
    portrait: AtomicUsize,
    /// Number of background or portrait swaps so far
    revision: AtomicU64,
}

impl Stage {
    pub fn new(
        backgrounds: ImageRegistry,
        portraits: ImageRegistry,
        ui_frame: ImageAsset,
        initial_background: &str,
    ) -> Result<Self, LoadError> {
        let background =
            backgrounds
                .index_of(initial_background)
                .ok_or_else(|| LoadError::MissingAsset {
                    kind: "background",
                    name: initial_background.to_string(),
                })?;

        Ok(Self {
            backgrounds,
            portraits,
            ui_frame: Arc::new(ui_frame),
            background: AtomicUsize::new(background),
            portrait: AtomicUsize::new(NO_PORTRAIT),
            revision: AtomicU64::new(0),
        })
    }

    pub fn set_background(&self, name: &str) -> Result<(), DialogueError> {
        let index = self
            .backgrounds
            .index_of(name)
            .ok_or_else(|| DialogueError::UnknownBackground {
                name: name.to_string(),
            })?;
        debug!("[Stage] background -> {name}");
        self.background.store(index, Ordering::Release);
        self.revision.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Show a portrait, or hide it when `name` is `none`
    pub fn set_portrait(&self, name: &str) -> Result<(), DialogueError> {
        let index = if name == "none" {
            NO_PORTRAIT
        } else {
            self.portraits
                .index_of(name)
                .ok_or_else(|| DialogueError::UnknownCharacter {
                    name: name.to_string(),
                })?
        };
        debug!("[Stage] portrait -> {name}");
        self.portrait.store(index, Ordering::Release);
        self.revision.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn background(&self) -> ImageHandle {
        let index = self.background.load(Ordering::Acquire);
        // indices only ever come from the registry itself
        Arc::clone(&self.backgrounds.images[index])
    }

    pub fn portrait(&self) -> Option<ImageHandle> {
        let index = self.portrait.load(Ordering::Acquire);
        self.portraits.get(index).cloned()
    }

    pub fn ui_frame(&self) -> &ImageHandle {
        &self.ui_frame
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}
