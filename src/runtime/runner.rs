//! Runs the interpreter on a dedicated thread

use super::{DialogueHandler, VariableStorage, VirtualMachine};
use crate::error::{SessionError, VmError};
use crate::types::Program;
use log::{error, info};
use std::sync::Arc;
use std::thread;

/// Handle to an interpreter running on its own thread
pub struct DialogueRunner {
    join: Option<thread::JoinHandle<Result<(), VmError>>>,
}

impl DialogueRunner {
    /// Start `program` at `entry` on a new thread named `cloister_dialogue`
    pub fn spawn<H, S>(
        program: Arc<Program>,
        entry: &str,
        handler: H,
        vars: S,
    ) -> Result<Self, SessionError>
    where
        H: DialogueHandler + Send + 'static,
        S: VariableStorage + Send + 'static,
    {
        let entry = entry.to_string();
        let join = thread::Builder::new()
            .name("cloister_dialogue".to_string())
            .spawn(move || {
                let mut vm = VirtualMachine::new(program, handler, vars);
                let result = vm.run(&entry);
                match &result {
                    Ok(()) => info!("[Engine] interpreter thread finished"),
                    Err(err) if err.is_session_closed() => {
                        info!("[Engine] interpreter stopped: session closed")
                    }
                    Err(err) => error!("[Engine] interpreter fault: {err}"),
                }
                result
            })
            .map_err(SessionError::Spawn)?;

        Ok(Self { join: Some(join) })
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(|join| join.is_finished())
    }

    /// Collect the interpreter's result if it has finished.
    ///
    /// Returns `Some` exactly once.
    pub fn poll(&mut self) -> Option<Result<(), SessionError>> {
        if !self.join.as_ref()?.is_finished() {
            return None;
        }
        self.join()
    }

    /// Block until the interpreter thread exits
    pub fn join(&mut self) -> Option<Result<(), SessionError>> {
        let join = self.join.take()?;
        let result = match join.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) if err.is_session_closed() => Ok(()),
            Ok(Err(err)) => Err(SessionError::Script(err)),
            Err(_) => Err(SessionError::InterpreterPanicked),
        };
        Some(result)
    }
}
