//! Word-wrapping text layout
//!
//! Text is laid out on a [`Feed`], a pen position that advances as glyphs are
//! placed. Words are never split: a word that does not fit on the current
//! line moves to the next one. Once the pen reaches the bottom of the box the
//! rest of the text is dropped.

use crate::render::{Glyph, Surface};
use crate::types::{Color, Point, Rect};

/// Font metrics
pub trait Measure {
    /// Horizontal advance of a glyph in pixels
    fn advance(&self, ch: char) -> f32;

    /// Distance between consecutive baselines in pixels
    fn line_height(&self) -> f32;

    fn text_width(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.advance(ch)).sum()
    }
}

/// Fixed-width font metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monospace {
    pub cell_width: f32,
    pub line_height: f32,
}

impl Monospace {
    pub fn new(cell_width: f32, line_height: f32) -> Self {
        Self {
            cell_width,
            line_height,
        }
    }
}

impl Default for Monospace {
    /// 12px pixel font at 1.15 line spacing
    fn default() -> Self {
        Self::new(7.0, 14.0)
    }
}

impl Measure for Monospace {
    fn advance(&self, _ch: char) -> f32 {
        self.cell_width
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// Pen position for sequential text drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feed {
    origin_x: f32,
    pub x: f32,
    pub y: f32,
    line_height: f32,
}

impl Feed {
    pub fn new(at: Point, line_height: f32) -> Self {
        Self {
            origin_x: at.x as f32,
            x: at.x as f32,
            y: at.y as f32,
            line_height,
        }
    }

    /// Move the pen past `ch` without drawing it
    pub fn advance(&mut self, ch: char, measure: &dyn Measure) {
        self.x += measure.advance(ch);
    }

    /// Return to the left margin one line down
    pub fn line_break(&mut self) {
        self.x = self.origin_x;
        self.y += self.line_height;
    }

    pub fn draw(&mut self, ch: char, color: Color, measure: &dyn Measure, surface: &mut dyn Surface) {
        surface.draw_glyph(Glyph {
            ch,
            position: Point::new(self.x.round() as i32, self.y.round() as i32),
            color,
        });
        self.advance(ch, measure);
    }
}

/// Style and metrics for [`draw_in_box`]
pub struct TextStyle<'a> {
    pub measure: &'a dyn Measure,
    pub color: Color,
}

/// Lay out `text` on `feed` inside `bounds` and return the area actually used.
///
/// Spaces move the pen without drawing. `\n` and `\r` each break the line, so
/// `\r\n` yields two breaks. Each word is measured before drawing and moves
/// to a new line if it would cross the right edge. Layout stops at the first
/// word whose line starts at or below the bottom edge.
pub fn draw_in_box(
    feed: &mut Feed,
    text: &str,
    bounds: Rect,
    style: &TextStyle<'_>,
    surface: &mut dyn Surface,
) -> Rect {
    let line_height = style.measure.line_height().ceil() as i32;
    let start = Point::new(feed.x.ceil() as i32, feed.y.floor() as i32);
    let mut used = Rect {
        min: start,
        max: start,
    };

    let mut index = 0;
    while let Some(ch) = text[index..].chars().next() {
        match ch {
            '\n' | '\r' => {
                feed.line_break();
                index += ch.len_utf8();
            }
            // spaces and other control characters only move the pen
            c if c <= ' ' => {
                feed.advance(' ', style.measure);
                index += c.len_utf8();
            }
            _ => {
                let word = next_word(&text[index..]);
                let width = style.measure.text_width(word);
                if (feed.x + width).ceil() as i32 > bounds.max.x {
                    feed.line_break();
                }

                if feed.y.floor() as i32 >= bounds.max.y {
                    return used;
                }
                used.max.x = used.max.x.max((feed.x + width).ceil() as i32);
                used.max.y = used.max.y.max(feed.y.floor() as i32 + line_height);

                for c in word.chars() {
                    feed.draw(c, style.color, style.measure, surface);
                }
                index += word.len();
            }
        }
    }
    used
}

/// The run of characters above U+0020 at the start of `text`
fn next_word(text: &str) -> &str {
    let end = text.find(|c: char| c <= ' ').unwrap_or(text.len());
    &text[..end]
}
