//! Host-facing drawing interface
//!
//! The engine never rasterizes anything itself. It describes each frame as
//! image blits and positioned glyphs on a [`Surface`] the host provides.

use crate::types::{Color, Point};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// An image known to the asset manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Shared, immutable image reference
pub type ImageHandle = Arc<ImageAsset>;

/// A glyph placed by text layout; `position` is the top-left of its cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub position: Point,
    pub color: Color,
}

/// Render target for one frame
pub trait Surface {
    fn draw_image(&mut self, image: &ImageAsset, at: Point);
    fn draw_glyph(&mut self, glyph: Glyph);
}

/// Surface that records draw calls; used by headless hosts and tests
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingSurface {
    pub images: Vec<(String, Point)>,
    pub glyphs: Vec<Glyph>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyphs grouped into text rows, top to bottom.
    ///
    /// Assumes a monospace font `cell_width` pixels wide; skipped cells become spaces.
    pub fn text_rows(&self, cell_width: i32) -> Vec<String> {
        let cell_width = cell_width.max(1);
        let mut rows: Vec<(i32, Vec<&Glyph>)> = Vec::new();
        for glyph in &self.glyphs {
            match rows.iter_mut().find(|(y, _)| *y == glyph.position.y) {
                Some((_, row)) => row.push(glyph),
                None => rows.push((glyph.position.y, vec![glyph])),
            }
        }
        rows.sort_by_key(|(y, _)| *y);

        rows.into_iter()
            .map(|(_, mut row)| {
                row.sort_by_key(|g| g.position.x);
                let mut text = String::new();
                let mut next_x: Option<i32> = None;
                for glyph in row {
                    if let Some(x) = next_x {
                        let skipped = (glyph.position.x - x) / cell_width;
                        text.extend(std::iter::repeat_n(' ', skipped.max(0) as usize));
                    }
                    text.push(glyph.ch);
                    next_x = Some(glyph.position.x + cell_width);
                }
                text
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn draw_image(&mut self, image: &ImageAsset, at: Point) {
        self.images.push((image.name.clone(), at));
    }

    fn draw_glyph(&mut self, glyph: Glyph) {
        self.glyphs.push(glyph);
    }
}
