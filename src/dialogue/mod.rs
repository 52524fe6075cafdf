//! Dialogue synchronization between the interpreter and the scene
//!
//! The interpreter thread writes the [`CurrentNode`] through
//! [`SessionHandler`]; the render thread reads it through [`NodeView`] and
//! answers through [`DialogueHandle`]. Two independent blocking points exist:
//!
//! - option selection, a zero-capacity channel carrying the chosen index;
//! - the `wait` command, a condition variable woken by any click.
//!
//! [`SessionPhase`] records which of the two (if any) the interpreter is
//! blocked in, so input arriving at any other time can be dropped.

use crate::error::DialogueError;
use crate::types::{CurrentNode, DialogueOption};
use log::debug;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

mod handle;
mod handler;


pub use handle::{ChoiceDelivery, DialogueHandle};
pub use handler::SessionHandler;

/// What the interpreter thread is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not started yet, or executing between blocking points
    Running,
    /// Blocked until an option index arrives
    AwaitingChoice,
    /// Blocked in a `wait` command until the next click
    AwaitingClick,
    /// The script reached its end
    Complete,
    /// The session was shut down
    Closed,
}

/// Read-only access to the current node
pub trait NodeView {
    fn current_node(&self) -> RwLockReadGuard<'_, CurrentNode>;
}

#[derive(Debug, Default)]
struct ClickState {
    generation: u64,
    closed: bool,
}

/// State shared by both sides of a dialogue session
#[derive(Debug)]
pub struct DialogueShared {
    node: RwLock<CurrentNode>,
    phase: Mutex<SessionPhase>,
    click: Mutex<ClickState>,
    clicked: Condvar,
}

impl Default for DialogueShared {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DialogueShared {
    pub fn new() -> Self {
        Self {
            node: RwLock::new(CurrentNode::new()),
            phase: Mutex::new(SessionPhase::Running),
            click: Mutex::new(ClickState::default()),
            clicked: Condvar::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    /// Move to `phase` unless the session is already closed
    fn set_phase(&self, phase: SessionPhase) {
        let mut current = lock(&self.phase);
        if *current != SessionPhase::Closed {
            *current = phase;
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut CurrentNode) -> R) -> R {
        let mut node = self.node.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut node)
    }

    pub(crate) fn append_line(&self, text: &str, separator: &str) {
        self.update(|node| node.append_line(text, separator));
    }

    /// Replace the choices and mark the interpreter as awaiting one
    pub(crate) fn publish_options(
        &self,
        choices: Vec<String>,
        options: Vec<DialogueOption>,
    ) -> u64 {
        let seq = self.update(|node| node.publish(choices, options));
        self.set_phase(SessionPhase::AwaitingChoice);
        seq
    }

    /// A choice was consumed: start a fresh node
    pub(crate) fn finish_choice(&self) {
        self.update(CurrentNode::reset);
        self.set_phase(SessionPhase::Running);
    }

    pub(crate) fn clear_choices(&self) {
        self.update(|node| {
            node.choices.clear();
            node.options.clear();
        });
    }

    pub(crate) fn clear_prompt(&self) {
        self.update(CurrentNode::reset);
    }

    pub(crate) fn complete(&self) {
        self.set_phase(SessionPhase::Complete);
    }

    /// Block until the next click after this call, or until the session closes
    pub(crate) fn wait_for_click(&self) -> Result<(), DialogueError> {
        let mut state = lock(&self.click);
        let start = state.generation;
        self.set_phase(SessionPhase::AwaitingClick);
        while state.generation == start && !state.closed {
            state = self
                .clicked
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return Err(DialogueError::SessionClosed);
        }
        drop(state);
        self.set_phase(SessionPhase::Running);
        Ok(())
    }

    /// Wake a pending `wait`; a no-op when nothing waits
    pub fn signal_click(&self) {
        let mut state = lock(&self.click);
        state.generation += 1;
        self.clicked.notify_all();
    }

    /// Release any blocked `wait` and refuse further blocking
    pub fn close(&self) {
        debug!("[Session] closing dialogue");
        *lock(&self.phase) = SessionPhase::Closed;
        let mut state = lock(&self.click);
        state.closed = true;
        self.clicked.notify_all();
    }
}

impl NodeView for DialogueShared {
    fn current_node(&self) -> RwLockReadGuard<'_, CurrentNode> {
        self.node.read().unwrap_or_else(PoisonError::into_inner)
    }
}
