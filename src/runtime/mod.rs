//! Dialogue interpreter
//!
//! Executes a compiled [`Program`] from an entry node, driving a
//! [`DialogueHandler`] for lines, options and commands. `run` only returns
//! once the dialogue ends or a fault occurs, so it is normally started on its
//! own thread through [`runner::DialogueRunner`].

use crate::error::{DialogueError, VmError};
use crate::types::{DialogueOption, Instruction, Line, Node, Program, Value, strings};
use log::{debug, info, trace};
use std::collections::HashMap;
use std::sync::Arc;

mod functions;
pub mod handler;
pub mod runner;
pub mod storage;


pub use handler::DialogueHandler;
pub use runner::DialogueRunner;
pub use storage::{MapVariableStorage, VariableStorage};

/// What the main loop should do after an instruction
enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Default)]
struct ExecState {
    node: String,
    pc: usize,
    stack: Vec<Value>,
    options: Vec<DialogueOption>,
}

/// Stack-machine interpreter for a single dialogue run
pub struct VirtualMachine<H, S> {
    program: Arc<Program>,
    handler: H,
    vars: S,
    state: ExecState,
    visits: HashMap<String, usize>,
}

impl<H: DialogueHandler, S: VariableStorage> VirtualMachine<H, S> {
    pub fn new(program: Arc<Program>, handler: H, vars: S) -> Self {
        Self {
            program,
            handler,
            vars,
            state: ExecState::default(),
            visits: HashMap::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn variables(&self) -> &S {
        &self.vars
    }

    /// Number of times each node has been completed during this run
    pub fn visit_count(&self, node: &str) -> usize {
        self.visits.get(node).copied().unwrap_or(0)
    }

    /// Run from `entry` until the dialogue ends
    pub fn run(&mut self, entry: &str) -> Result<(), VmError> {
        let program = Arc::clone(&self.program);
        for (name, value) in &program.initial_values {
            if !self.vars.contains(name) {
                self.vars.set(name, value.clone())?;
            }
        }

        info!("[Engine] running program '{}' from node '{}'", program.name, entry);
        self.enter_node(&program, entry)?;

        loop {
            let node = program
                .node(&self.state.node)
                .ok_or_else(|| VmError::UnknownNode {
                    node: self.state.node.clone(),
                })?;

            let Some(instruction) = node.instructions.get(self.state.pc) else {
                trace!("[Engine] fell off the end of node '{}'", node.name);
                self.complete_node()?;
                break;
            };

            trace!(
                "[Engine] {}:{} {:?}",
                node.name, self.state.pc, instruction
            );
            self.state.pc += 1;

            match self.execute(&program, node, instruction)? {
                Flow::Continue => {}
                Flow::Stop => break,
            }
        }

        info!("[Engine] dialogue complete");
        self.callback("dialogue_complete", |h| h.dialogue_complete())
    }

    fn execute(
        &mut self,
        program: &Program,
        node: &Node,
        instruction: &Instruction,
    ) -> Result<Flow, VmError> {
        match instruction {
            Instruction::JumpTo { label } => self.jump(node, label)?,
            Instruction::Jump => {
                let label = self.pop_string()?;
                self.jump(node, &label)?;
            }
            Instruction::RunLine {
                line_id,
                substitutions,
            } => {
                let substitutions = self.pop_substitutions(*substitutions)?;
                let line = Line::with_substitutions(line_id.clone(), substitutions);
                self.callback("line", |h| h.line(line))?;
            }
            Instruction::RunCommand {
                text,
                substitutions,
            } => {
                let substitutions = self.pop_substitutions(*substitutions)?;
                let command = strings::substitute(text, &substitutions);
                debug!("[Command] {}", command);
                self.callback("command", |h| h.command(&command))?;
            }
            Instruction::AddOption {
                line_id,
                destination,
                substitutions,
                has_condition,
            } => {
                let available = if *has_condition {
                    self.pop_bool()?
                } else {
                    true
                };
                let substitutions = self.pop_substitutions(*substitutions)?;
                self.state.options.push(DialogueOption {
                    index: self.state.options.len(),
                    line: Line::with_substitutions(line_id.clone(), substitutions),
                    destination: destination.clone(),
                    available,
                });
            }
            Instruction::ShowOptions => return self.show_options(node),
            Instruction::PushString { value } => self.push(Value::String(value.clone())),
            Instruction::PushFloat { value } => self.push(Value::Number(*value)),
            Instruction::PushBool { value } => self.push(Value::Bool(*value)),
            Instruction::PushNull => self.push(Value::Null),
            Instruction::JumpIfFalse { label } => {
                let top = self.peek()?;
                let condition = top.as_bool().ok_or_else(|| VmError::TypeMismatch {
                    node: node.name.clone(),
                    expected: "bool",
                    found: top.type_name(),
                })?;
                if !condition {
                    self.jump(node, label)?;
                }
            }
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::CallFunc { name } => {
                let mut ops = functions::Operands {
                    stack: &mut self.state.stack,
                    node: &node.name,
                    pc: self.state.pc - 1,
                };
                functions::call(name, &mut ops, &self.visits)?;
            }
            Instruction::PushVariable { name } => {
                let value = self
                    .vars
                    .get(name)
                    .ok_or_else(|| VmError::UndeclaredVariable { name: name.clone() })?;
                self.push(value);
            }
            Instruction::StoreVariable { name } => {
                let value = self.peek()?.clone();
                self.vars.set(name, value)?;
            }
            Instruction::Stop => {
                self.complete_node()?;
                return Ok(Flow::Stop);
            }
            Instruction::RunNode => {
                let next = self.pop_string()?;
                self.complete_node()?;
                self.enter_node(program, &next)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn show_options(&mut self, node: &Node) -> Result<Flow, VmError> {
        let options = std::mem::take(&mut self.state.options);
        if options.is_empty() {
            // nothing to choose from: the dialogue ends here
            info!("[Branch] no options in node '{}', stopping", node.name);
            self.complete_node()?;
            return Ok(Flow::Stop);
        }

        debug!(
            "[Branch] presenting {} options in node '{}'",
            options.len(),
            node.name
        );
        let index = self.callback("options", |h| h.options(&options))?;
        let chosen = options.get(index).ok_or(VmError::OptionOutOfRange {
            index,
            count: options.len(),
        })?;
        if !chosen.available {
            return Err(VmError::UnavailableOption { index });
        }

        debug!(
            "[Branch] option {} selected, jumping to '{}'",
            index, chosen.destination
        );
        self.jump(node, &chosen.destination)?;
        Ok(Flow::Continue)
    }

    fn enter_node(&mut self, program: &Program, name: &str) -> Result<(), VmError> {
        let node = program.node(name).ok_or_else(|| VmError::UnknownNode {
            node: name.to_string(),
        })?;

        self.state.node = node.name.clone();
        self.state.pc = 0;
        self.state.options.clear();

        info!("[Engine] entering node '{}'", node.name);
        self.callback("node_start", |h| h.node_start(&node.name))?;
        let line_ids = node.line_ids();
        self.callback("prepare_for_lines", |h| h.prepare_for_lines(&line_ids))
    }

    fn complete_node(&mut self) -> Result<(), VmError> {
        let name = self.state.node.clone();
        *self.visits.entry(name.clone()).or_insert(0) += 1;
        self.callback("node_complete", |h| h.node_complete(&name))
    }

    fn jump(&mut self, node: &Node, label: &str) -> Result<(), VmError> {
        self.state.pc = *node.labels.get(label).ok_or_else(|| VmError::UnknownLabel {
            node: node.name.clone(),
            label: label.to_string(),
        })?;
        Ok(())
    }

    /// Invoke a handler callback, tagging failures with the callback and node
    fn callback<T>(
        &mut self,
        callback: &'static str,
        f: impl FnOnce(&mut H) -> Result<T, DialogueError>,
    ) -> Result<T, VmError> {
        f(&mut self.handler).map_err(|source| VmError::Callback {
            callback,
            node: self.state.node.clone(),
            source,
        })
    }

    fn push(&mut self, value: Value) {
        self.state.stack.push(value);
    }

    fn underflow(&self) -> VmError {
        VmError::StackUnderflow {
            node: self.state.node.clone(),
            pc: self.state.pc.saturating_sub(1),
        }
    }

    fn pop(&mut self) -> Result<Value, VmError> {
        match self.state.stack.pop() {
            Some(value) => Ok(value),
            None => Err(self.underflow()),
        }
    }

    fn peek(&self) -> Result<&Value, VmError> {
        self.state.stack.last().ok_or_else(|| self.underflow())
    }

    fn pop_bool(&mut self) -> Result<bool, VmError> {
        let value = self.pop()?;
        value.as_bool().ok_or_else(|| VmError::TypeMismatch {
            node: self.state.node.clone(),
            expected: "bool",
            found: value.type_name(),
        })
    }

    fn pop_string(&mut self) -> Result<String, VmError> {
        match self.pop()? {
            Value::String(s) => Ok(s),
            other => Err(VmError::TypeMismatch {
                node: self.state.node.clone(),
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Pop `count` values; the deepest one becomes substitution `{0}`
    fn pop_substitutions(&mut self, count: usize) -> Result<Vec<String>, VmError> {
        let mut substitutions = vec![String::new(); count];
        for slot in substitutions.iter_mut().rev() {
            *slot = self.pop()?.to_string();
        }
        Ok(substitutions)
    }
}
