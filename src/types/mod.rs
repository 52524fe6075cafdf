//! Core types for the cloister library
//!
//! - Program: compiled dialogue nodes and instructions
//! - StringTable: localized line text
//! - CurrentNode: prompt and choices shared between interpreter and scene
//! - Geometry: screen points, rectangles and colors

pub mod geometry;
pub mod node;
pub mod program;
pub mod strings;

pub use geometry::{Color, Point, Rect};
pub use node::{CurrentNode, DialogueOption};
pub use program::{Instruction, Node, Program, Value};
pub use strings::{Line, StringTable};
