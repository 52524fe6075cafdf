//! Callback interface the interpreter drives

use crate::error::DialogueError;
use crate::types::{DialogueOption, Line};

/// Receives interpreter output.
///
/// Every method runs on the interpreter thread. `options` and `command` may
/// block; the interpreter does not advance until they return.
pub trait DialogueHandler {
    fn node_start(&mut self, _name: &str) -> Result<(), DialogueError> {
        Ok(())
    }

    /// Line ids the node about to run may deliver
    fn prepare_for_lines(&mut self, _line_ids: &[String]) -> Result<(), DialogueError> {
        Ok(())
    }

    fn line(&mut self, line: Line) -> Result<(), DialogueError>;

    /// Present options and return the index of the chosen one
    fn options(&mut self, options: &[DialogueOption]) -> Result<usize, DialogueError>;

    fn command(&mut self, command: &str) -> Result<(), DialogueError>;

    fn node_complete(&mut self, _name: &str) -> Result<(), DialogueError> {
        Ok(())
    }

    fn dialogue_complete(&mut self) -> Result<(), DialogueError> {
        Ok(())
    }
}
