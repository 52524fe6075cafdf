//! The node currently presented to the player

use crate::types::strings::Line;
use serde::{Deserialize, Serialize};

/// An option offered at a branch point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogueOption {
    /// Position in the option list presented by the interpreter
    pub index: usize,
    pub line: Line,
    /// Label the interpreter jumps to when this option is chosen
    pub destination: String,
    /// False when the option's condition evaluated to false
    pub available: bool,
}

/// Prompt text and pending choices for the active node.
///
/// `seq` increases every time a new option list is published.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CurrentNode {
    pub prompt: String,
    pub choices: Vec<String>,
    pub options: Vec<DialogueOption>,
    pub seq: u64,
}

impl CurrentNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered line to the prompt
    pub fn append_line(&mut self, text: &str, separator: &str) {
        if !self.prompt.is_empty() {
            self.prompt.push_str(separator);
        }
        self.prompt.push_str(text);
    }

    /// Replace the pending choices with a freshly rendered list
    pub fn publish(&mut self, choices: Vec<String>, options: Vec<DialogueOption>) -> u64 {
        self.choices = choices;
        self.options = options;
        self.seq += 1;
        self.seq
    }

    /// Drop the prompt and any choices, keeping `seq`
    pub fn reset(&mut self) {
        self.prompt.clear();
        self.choices.clear();
        self.options.clear();
    }

    pub fn has_choices(&self) -> bool {
        !self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_line_separates_only_after_first() {
        let mut node = CurrentNode::new();
        node.append_line("Hello", "\n");
        node.append_line("there", "\n");
        assert_eq!(node.prompt, "Hello\nthere");
    }

    #[test]
    fn publish_supersedes_and_bumps_seq() {
        let mut node = CurrentNode::new();
        assert_eq!(node.publish(vec!["A".into(), "B".into()], Vec::new()), 1);
        assert_eq!(node.publish(vec!["C".into()], Vec::new()), 2);
        assert_eq!(node.choices, vec!["C".to_string()]);

        node.reset();
        assert!(!node.has_choices());
        assert_eq!(node.seq, 2);
    }
}
