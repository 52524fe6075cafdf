//! Interpreter-side callbacks

use crate::dialogue::NodeView;
use crate::error::DialogueError;
use crate::runtime::DialogueHandler;
use crate::session::Session;
use crate::types::{DialogueOption, Line};
use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use std::sync::Arc;

/// Connects the interpreter to a [`Session`]
pub struct SessionHandler {
    session: Arc<Session>,
    choices: Receiver<usize>,
}

impl SessionHandler {
    pub(crate) fn new(session: Arc<Session>, choices: Receiver<usize>) -> Self {
        Self { session, choices }
    }

    fn wait(&mut self) -> Result<(), DialogueError> {
        let dialogue = self.session.dialogue();
        dialogue.clear_choices();
        debug!("[Command] waiting for click");
        dialogue.wait_for_click()?;
        dialogue.clear_prompt();
        Ok(())
    }

    fn set_loop(&self, name: &str, playing: bool) {
        let loops = self.session.loops();
        let known = if playing {
            loops.start(name)
        } else {
            loops.stop(name)
        };
        if !known {
            warn!("[Command] no audio loop named '{name}'");
        }
    }
}

impl DialogueHandler for SessionHandler {
    fn node_start(&mut self, name: &str) -> Result<(), DialogueError> {
        debug!("[Dialogue] entering node '{name}'");
        Ok(())
    }

    fn line(&mut self, line: Line) -> Result<(), DialogueError> {
        let text = self.session.strings().render(&line)?;
        self.session
            .dialogue()
            .append_line(&text, &self.session.settings().line_separator);
        Ok(())
    }

    fn options(&mut self, options: &[DialogueOption]) -> Result<usize, DialogueError> {
        let strings = self.session.strings();
        let choices = options
            .iter()
            .map(|option| strings.render(&option.line))
            .collect::<Result<Vec<_>, _>>()?;

        let dialogue = self.session.dialogue();
        let seq = dialogue.publish_options(choices, options.to_vec());
        debug!("[Branch] published {} options (seq {seq})", options.len());

        let index = self
            .choices
            .recv()
            .map_err(|_| DialogueError::SessionClosed)?;
        if index >= options.len() {
            return Err(DialogueError::ChoiceOutOfRange {
                index,
                count: options.len(),
            });
        }

        info!(
            "[Branch] selected option {index}: {}",
            dialogue
                .current_node()
                .choices
                .get(index)
                .map(String::as_str)
                .unwrap_or_default()
        );
        dialogue.finish_choice();
        Ok(index)
    }

    fn command(&mut self, command: &str) -> Result<(), DialogueError> {
        let mut tokens = command.split_whitespace();
        let name = tokens.next().ok_or(DialogueError::EmptyCommand)?;
        let mut argument = |argument: &'static str| {
            tokens.next().ok_or_else(|| DialogueError::MissingArgument {
                command: name.to_string(),
                argument,
            })
        };

        debug!("[Command] {command}");
        match name {
            "background" => self.session.stage().set_background(argument("image")?),
            "char" => self.session.stage().set_portrait(argument("character")?),
            "wait" => self.wait(),
            "loopStart" => {
                self.set_loop(argument("audio")?, true);
                Ok(())
            }
            "loopStop" => {
                self.set_loop(argument("audio")?, false);
                Ok(())
            }
            _ => Err(DialogueError::UnknownCommand {
                name: name.to_string(),
            }),
        }
    }

    fn dialogue_complete(&mut self) -> Result<(), DialogueError> {
        info!("[Dialogue] script complete");
        self.session.dialogue().complete();
        Ok(())
    }
}
