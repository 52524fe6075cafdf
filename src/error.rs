//! Error types for each layer of the engine
//!
//! Loading failures are fatal at startup. Interpreter and handler failures are
//! fatal to the dialogue session and surface through the scene's `update`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the program, string table or asset manifest
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data in {}: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    #[error("{kind} '{name}' is not in the asset manifest")]
    MissingAsset { kind: &'static str, name: String },

    #[error("async runtime error: {message}")]
    Runtime { message: String },
}

impl LoadError {
    pub fn invalid_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the dialogue handler while servicing interpreter callbacks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DialogueError {
    #[error("no text for line '{id}' in the string table")]
    MissingLine { id: String },

    #[error("empty command")]
    EmptyCommand,

    #[error("unrecognized command '{name}'")]
    UnknownCommand { name: String },

    #[error("command '{command}' is missing its {argument} argument")]
    MissingArgument {
        command: String,
        argument: &'static str,
    },

    #[error("unknown background '{name}'")]
    UnknownBackground { name: String },

    #[error("unknown character '{name}'")]
    UnknownCharacter { name: String },

    #[error("choice {index} out of range for {count} published options")]
    ChoiceOutOfRange { index: usize, count: usize },

    #[error("dialogue session was closed")]
    SessionClosed,
}

/// Interpreter faults. All of them end the dialogue session.
#[derive(Debug, Error)]
pub enum VmError {
    #[error("unknown node '{node}'")]
    UnknownNode { node: String },

    #[error("unknown label '{label}' in node '{node}'")]
    UnknownLabel { node: String, label: String },

    #[error("stack underflow in node '{node}' at instruction {pc}")]
    StackUnderflow { node: String, pc: usize },

    #[error("type mismatch in node '{node}': expected {expected}, found {found}")]
    TypeMismatch {
        node: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("division by zero in node '{node}'")]
    DivisionByZero { node: String },

    #[error("variable '{name}' is not declared")]
    UndeclaredVariable { name: String },

    #[error("variable '{name}' holds a {expected} and cannot store a {found}")]
    StorageTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("option {index} out of range for {count} options")]
    OptionOutOfRange { index: usize, count: usize },

    #[error("option {index} is not available")]
    UnavailableOption { index: usize },

    #[error("{callback} failed in node '{node}'")]
    Callback {
        callback: &'static str,
        node: String,
        #[source]
        source: DialogueError,
    },
}

impl VmError {
    /// True when the run ended because the session shut down, not a script fault
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            VmError::Callback {
                source: DialogueError::SessionClosed,
                ..
            }
        )
    }
}

/// Errors surfaced to the host loop
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("dialogue script failed")]
    Script(#[from] VmError),

    #[error("dialogue already started for this session")]
    AlreadyStarted,

    #[error("failed to spawn the interpreter thread")]
    Spawn(#[source] std::io::Error),

    #[error("interpreter thread panicked")]
    InterpreterPanicked,

    #[error("audio track '{track}': {message}")]
    Audio { track: String, message: String },
}
