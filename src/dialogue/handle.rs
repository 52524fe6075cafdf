//! Render-side access to a running dialogue

use crate::dialogue::{NodeView, SessionPhase};
use crate::session::Session;
use crate::types::CurrentNode;
use crossbeam_channel::{SendTimeoutError, Sender};
use log::debug;
use std::sync::{Arc, RwLockReadGuard};
use std::time::Duration;

/// Upper bound on how long handing over a choice may block the render thread
const CHOICE_HANDOFF_TIMEOUT: Duration = Duration::from_millis(250);

/// Outcome of [`DialogueHandle::submit_choice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceDelivery {
    Delivered,
    /// Nothing was waiting for this choice
    Dropped,
}

/// Lets the scene read the current node and answer the interpreter
pub struct DialogueHandle {
    session: Arc<Session>,
    choices: Option<Sender<usize>>,
    delivered_seq: Option<u64>,
}

impl DialogueHandle {
    pub(crate) fn new(session: Arc<Session>, choices: Sender<usize>) -> Self {
        Self {
            session,
            choices: Some(choices),
            delivered_seq: None,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.dialogue().phase()
    }

    /// Answer the option list published as `seq`.
    ///
    /// Only the first answer to the list the interpreter is waiting on is
    /// delivered; anything else is dropped without blocking.
    pub fn submit_choice(&mut self, seq: u64, index: usize) -> ChoiceDelivery {
        let phase = self.phase();
        if phase != SessionPhase::AwaitingChoice {
            debug!("[Input] choice {index} ignored while {phase:?}");
            return ChoiceDelivery::Dropped;
        }
        let current = self.current_node().seq;
        if seq != current || self.delivered_seq == Some(seq) {
            debug!("[Input] stale choice {index} for seq {seq} (current {current})");
            return ChoiceDelivery::Dropped;
        }
        let Some(sender) = &self.choices else {
            return ChoiceDelivery::Dropped;
        };

        match sender.send_timeout(index, CHOICE_HANDOFF_TIMEOUT) {
            Ok(()) => {
                self.delivered_seq = Some(seq);
                ChoiceDelivery::Delivered
            }
            Err(SendTimeoutError::Timeout(_)) => {
                debug!("[Input] choice {index} timed out");
                ChoiceDelivery::Dropped
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                debug!("[Input] interpreter gone; choice {index} dropped");
                ChoiceDelivery::Dropped
            }
        }
    }

    /// Advance past a `wait`; harmless at any other time
    pub fn signal_click(&self) {
        self.session.dialogue().signal_click();
    }

    /// Unblock the interpreter wherever it waits; it then stops
    pub fn close(&mut self) {
        if self.choices.take().is_some() {
            self.session.dialogue().close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.choices.is_none()
    }
}

impl NodeView for DialogueHandle {
    fn current_node(&self) -> RwLockReadGuard<'_, CurrentNode> {
        self.session.dialogue().current_node()
    }
}

impl Drop for DialogueHandle {
    fn drop(&mut self) {
        self.close();
    }
}
