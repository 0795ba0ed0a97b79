use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::bytecode::op::ArrayKind;

/// A runtime value. Booleans are ints holding 0 or 1.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Str(Rc<str>),
    Array(Rc<RefCell<ArrayObject>>),
    PrintStream,
    Null,
}

#[derive(Debug)]
pub struct ArrayObject {
    pub kind: ArrayKind,
    pub items: Vec<Value>,
}

impl Value {
    pub fn new_array(kind: ArrayKind, len: usize) -> Self {
        let empty = match kind {
            ArrayKind::Int | ArrayKind::Bool => Value::Int(0),
            ArrayKind::Reference(_) => Value::Null,
        };
        Value::Array(Rc::new(RefCell::new(ArrayObject {
            kind,
            items: vec![empty; len],
        })))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::PrintStream => "print stream",
            Value::Null => "null",
        }
    }
}

impl PartialEq for Value {
    /// Ints and strings compare by value, arrays by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::PrintStream, Value::PrintStream) | (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

pub fn format_bool(n: i32) -> &'static str {
    if n != 0 { "true" } else { "false" }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(array) => {
                let array = array.borrow();
                write!(f, "[")?;
                for (i, item) in array.items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match (&array.kind, item) {
                        (ArrayKind::Bool, Value::Int(n)) => write!(f, "{}", format_bool(*n))?,
                        _ => write!(f, "{}", item)?,
                    }
                }
                write!(f, "]")
            }
            Value::PrintStream => write!(f, "<stdout>"),
            Value::Null => write!(f, "null"),
        }
    }
}
