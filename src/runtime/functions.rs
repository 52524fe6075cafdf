//! Built-in functions available to `CallFunc`

use crate::error::VmError;
use crate::types::Value;
use std::collections::HashMap;

/// Operand stack view used while evaluating a function call
pub(crate) struct Operands<'a> {
    pub stack: &'a mut Vec<Value>,
    pub node: &'a str,
    pub pc: usize,
}

impl Operands<'_> {
    fn pop(&mut self) -> Result<Value, VmError> {
        self.stack.pop().ok_or_else(|| VmError::StackUnderflow {
            node: self.node.to_string(),
            pc: self.pc,
        })
    }

    fn pop_number(&mut self) -> Result<f64, VmError> {
        let value = self.pop()?;
        value.as_number().ok_or_else(|| self.mismatch("number", &value))
    }

    fn pop_bool(&mut self) -> Result<bool, VmError> {
        let value = self.pop()?;
        value.as_bool().ok_or_else(|| self.mismatch("bool", &value))
    }

    fn pop_string(&mut self) -> Result<String, VmError> {
        match self.pop()? {
            Value::String(s) => Ok(s),
            other => Err(self.mismatch("string", &other)),
        }
    }

    /// Pop the right operand, then the left
    fn pop_numbers(&mut self) -> Result<(f64, f64), VmError> {
        let rhs = self.pop_number()?;
        let lhs = self.pop_number()?;
        Ok((lhs, rhs))
    }

    fn pop_bools(&mut self) -> Result<(bool, bool), VmError> {
        let rhs = self.pop_bool()?;
        let lhs = self.pop_bool()?;
        Ok((lhs, rhs))
    }

    fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(value.into());
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> VmError {
        VmError::TypeMismatch {
            node: self.node.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

/// Evaluate a built-in, popping its arguments and pushing its result
pub(crate) fn call(
    name: &str,
    ops: &mut Operands<'_>,
    visits: &HashMap<String, usize>,
) -> Result<(), VmError> {
    match name {
        "Number.Add" => {
            let (a, b) = ops.pop_numbers()?;
            ops.push(a + b);
        }
        "Number.Minus" => {
            let (a, b) = ops.pop_numbers()?;
            ops.push(a - b);
        }
        "Number.Multiply" => {
            let (a, b) = ops.pop_numbers()?;
            ops.push(a * b);
        }
        "Number.Divide" | "Number.Modulo" => {
            let (a, b) = ops.pop_numbers()?;
            if b == 0.0 {
                return Err(VmError::DivisionByZero {
                    node: ops.node.to_string(),
                });
            }
            ops.push(if name == "Number.Divide" { a / b } else { a % b });
        }
        "Number.UnaryMinus" => {
            let a = ops.pop_number()?;
            ops.push(-a);
        }
        "GreaterThan" | "GreaterThanOrEqualTo" | "LessThan" | "LessThanOrEqualTo" => {
            let (a, b) = ops.pop_numbers()?;
            let result = match name {
                "GreaterThan" => a > b,
                "GreaterThanOrEqualTo" => a >= b,
                "LessThan" => a < b,
                _ => a <= b,
            };
            ops.push(result);
        }
        "EqualTo" | "NotEqualTo" => {
            let b = ops.pop()?;
            let a = ops.pop()?;
            ops.push((a == b) == (name == "EqualTo"));
        }
        "Bool.And" => {
            let (a, b) = ops.pop_bools()?;
            ops.push(a && b);
        }
        "Bool.Or" => {
            let (a, b) = ops.pop_bools()?;
            ops.push(a || b);
        }
        "Bool.Xor" => {
            let (a, b) = ops.pop_bools()?;
            ops.push(a ^ b);
        }
        "Bool.Not" => {
            let a = ops.pop_bool()?;
            ops.push(!a);
        }
        "String.Add" => {
            let b = ops.pop_string()?;
            let a = ops.pop_string()?;
            ops.push(Value::String(a + &b));
        }
        "visited" => {
            let node = ops.pop_string()?;
            ops.push(visits.get(&node).is_some_and(|count| *count > 0));
        }
        "visited_count" => {
            let node = ops.pop_string()?;
            ops.push(visits.get(&node).copied().unwrap_or(0) as f64);
        }
        _ => {
            return Err(VmError::UnknownFunction {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
