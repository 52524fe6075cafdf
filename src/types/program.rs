//! Compiled dialogue program representation
//!
//! A program is a set of named nodes. Each node is a flat list of
//! stack-machine instructions plus a label table used by jumps and options.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Compiled dialogue program, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Program {
    /// Program name, usually the source file stem
    pub name: String,
    /// Nodes keyed by node name
    pub nodes: HashMap<String, Node>,
    /// Declared variables and their initial values
    #[serde(default)]
    pub initial_values: HashMap<String, Value>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a node, replacing any node with the same name
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node.name.clone(), node);
        self
    }

    /// Declare a variable with its initial value
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.initial_values.insert(name.into(), value);
        self
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Check that every static jump target resolves within its node
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.nodes.is_empty() {
            anyhow::bail!("program '{}' has no nodes", self.name);
        }

        for node in self.nodes.values() {
            for (pc, instruction) in node.instructions.iter().enumerate() {
                let target = match instruction {
                    Instruction::JumpTo { label } | Instruction::JumpIfFalse { label } => label,
                    Instruction::AddOption { destination, .. } => destination,
                    _ => continue,
                };
                if !node.labels.contains_key(target) {
                    anyhow::bail!(
                        "node '{}' instruction {} references undefined label '{}'",
                        node.name,
                        pc,
                        target
                    );
                }
            }

            if let Some((label, index)) = node
                .labels
                .iter()
                .find(|(_, index)| **index > node.instructions.len())
            {
                anyhow::bail!(
                    "label '{}' in node '{}' points past the end ({} > {})",
                    label,
                    node.name,
                    index,
                    node.instructions.len()
                );
            }
        }

        Ok(())
    }
}

/// A single node of the program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub instructions: Vec<Instruction>,
    /// Label to instruction index
    #[serde(default)]
    pub labels: HashMap<String, usize>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append an instruction
    pub fn push(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Mark the position of the next instruction with a label
    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.labels.insert(name.into(), self.instructions.len());
        self
    }

    pub fn line(self, line_id: impl Into<String>) -> Self {
        self.push(Instruction::RunLine {
            line_id: line_id.into(),
            substitutions: 0,
        })
    }

    pub fn command(self, text: impl Into<String>) -> Self {
        self.push(Instruction::RunCommand {
            text: text.into(),
            substitutions: 0,
        })
    }

    pub fn option(self, line_id: impl Into<String>, destination: impl Into<String>) -> Self {
        self.push(Instruction::AddOption {
            line_id: line_id.into(),
            destination: destination.into(),
            substitutions: 0,
            has_condition: false,
        })
    }

    pub fn show_options(self) -> Self {
        self.push(Instruction::ShowOptions)
    }

    pub fn jump_to(self, label: impl Into<String>) -> Self {
        self.push(Instruction::JumpTo {
            label: label.into(),
        })
    }

    pub fn stop(self) -> Self {
        self.push(Instruction::Stop)
    }

    /// Line ids this node may display, in instruction order
    pub fn line_ids(&self) -> Vec<String> {
        self.instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::RunLine { line_id, .. } | Instruction::AddOption { line_id, .. } => {
                    Some(line_id.clone())
                }
                _ => None,
            })
            .collect()
    }
}

/// Stack-machine instruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Jump to a label in the current node
    JumpTo { label: String },
    /// Pop a label name and jump to it
    Jump,
    /// Deliver a line, popping `substitutions` values for its placeholders
    RunLine {
        line_id: String,
        #[serde(default)]
        substitutions: usize,
    },
    /// Deliver a command, popping `substitutions` values for its placeholders
    RunCommand {
        text: String,
        #[serde(default)]
        substitutions: usize,
    },
    /// Accumulate an option; pops a bool first when `has_condition` is set
    AddOption {
        line_id: String,
        destination: String,
        #[serde(default)]
        substitutions: usize,
        #[serde(default)]
        has_condition: bool,
    },
    /// Present accumulated options and jump to the chosen destination
    ShowOptions,
    PushString { value: String },
    PushFloat { value: f64 },
    PushBool { value: bool },
    PushNull,
    /// Jump if the top of the stack is false; the value stays on the stack
    JumpIfFalse { label: String },
    Pop,
    CallFunc { name: String },
    PushVariable { name: String },
    /// Store the top of the stack; the value stays on the stack
    StoreVariable { name: String },
    Stop,
    /// Pop a node name and transfer control to it
    RunNode,
}

/// Runtime value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
