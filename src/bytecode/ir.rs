use serde::{Deserialize, Serialize};

use crate::bytecode::op::{Insn, Label};

/// Instruction buffer a method is emitted into.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    code: Vec<Insn>,
    next_label: u32,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, not yet placed label.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    pub fn emit(&mut self, insn: Insn) {
        self.code.push(insn);
    }

    pub fn place(&mut self, label: Label) {
        self.code.push(Insn::Label(label));
    }

    pub fn code(&self) -> &[Insn] {
        &self.code
    }

    pub fn into_code(self) -> Vec<Insn> {
        self.code
    }
}

/// A compiled method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    pub name: String,
    /// JVM method descriptor, e.g. `([Ljava/lang/String;)V`.
    pub descriptor: String,
    /// Deepest operand stack reached by `code`.
    pub max_stack: u16,
    pub code: Vec<Insn>,
}

/// The executable unit handed to the container writer.
///
/// Convention: `entry` is a public static method taking the argument array
/// and returning nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassUnit {
    pub name: String,
    pub entry: MethodBody,
}

impl ClassUnit {
    /// Serializes the unit with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::Constant;

    #[test]
    fn test_labels_are_fresh() {
        let mut buf = CodeBuffer::new();
        let a = buf.new_label();
        let b = buf.new_label();
        assert_ne!(a, b);
        assert!(buf.code().is_empty());
    }

    #[test]
    fn test_place_emits_label_marker() {
        let mut buf = CodeBuffer::new();
        let l = buf.new_label();
        buf.emit(Insn::Goto(l));
        buf.place(l);
        assert_eq!(buf.into_code(), vec![Insn::Goto(l), Insn::Label(l)]);
    }

    #[test]
    fn test_postcard_bytes_decode_back() {
        let unit = ClassUnit {
            name: "Main".to_string(),
            entry: MethodBody {
                name: "main".to_string(),
                descriptor: "([Ljava/lang/String;)V".to_string(),
                max_stack: 2,
                code: vec![
                    Insn::Const(Constant::Str("hi".to_string())),
                    Insn::Pop,
                    Insn::Return,
                ],
            },
        };
        let bytes = unit.to_bytes().unwrap();
        assert_eq!(ClassUnit::from_bytes(&bytes).unwrap(), unit);
    }
}
