use serde::{Deserialize, Serialize};

// =============================================================================
// INSN - Target stack-machine instructions
// =============================================================================

/// Branch target. Placed in the code with [`Insn::Label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Constant loaded by [`Insn::Const`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Int(i32),
    Bool(bool),
    Str(String),
}

/// Element kind of a primitive or reference array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayKind {
    Int,
    Bool,
    /// Array of references to the named class.
    Reference(String),
}

/// Overload of `PrintStream.println` to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintKind {
    /// `(I)V`
    Int,
    /// `(Z)V`
    Bool,
    /// `(Ljava/lang/Object;)V`
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Insn {
    // literals
    Const(Constant),

    // int arithmetic
    IAdd,
    ISub,
    IMul,
    IDiv,
    IRem,

    // int bitwise
    IShl,
    IShr,
    IUShr,
    IAnd,
    IOr,
    IXor,

    // stack ops, single-slot values only
    Dup,
    /// `( a b -- b a b )`
    DupX1,
    Swap,
    Pop,

    // ==========================================================================
    // Branches
    // ==========================================================================
    /// Pop an int, jump if it is zero.
    IfEq(Label),
    /// Pop a reference, jump if it is null.
    IfNull(Label),
    /// Pop two ints `a b`, jump if `a == b`.
    IfICmpEq(Label),
    IfICmpNe(Label),
    IfICmpLt(Label),
    IfICmpLe(Label),
    IfICmpGt(Label),
    IfICmpGe(Label),
    Goto(Label),

    /// Marks the position of a label. Not an executable instruction.
    Label(Label),

    // arrays
    /// `( count -- arr )`
    NewArray(ArrayKind),
    /// `( arr index value -- )`
    ArrayStore(ArrayKind),

    // output
    /// Push the standard output stream.
    GetPrintStream,
    /// `( stream value -- )`
    Println(PrintKind),

    Return,
}

impl Insn {
    /// The label this instruction may transfer control to.
    pub fn branch_target(&self) -> Option<Label> {
        use Insn::*;
        match self {
            IfEq(l) | IfNull(l) | IfICmpEq(l) | IfICmpNe(l) | IfICmpLt(l) | IfICmpLe(l)
            | IfICmpGt(l) | IfICmpGe(l) | Goto(l) => Some(*l),
            _ => None,
        }
    }

    /// Returns `(pops, pushes)` on the operand stack.
    pub fn stack_effect(&self) -> (usize, usize) {
        use Insn::*;
        match self {
            Const(_) => (0, 1),

            IAdd | ISub | IMul | IDiv | IRem => (2, 1),
            IShl | IShr | IUShr | IAnd | IOr | IXor => (2, 1),

            Dup => (1, 2),
            DupX1 => (2, 3),
            Swap => (2, 2),
            Pop => (1, 0),

            IfEq(_) | IfNull(_) => (1, 0),
            IfICmpEq(_) | IfICmpNe(_) | IfICmpLt(_) | IfICmpLe(_) | IfICmpGt(_)
            | IfICmpGe(_) => (2, 0),
            Goto(_) | Label(_) => (0, 0),

            NewArray(_) => (1, 1),
            ArrayStore(_) => (3, 0),

            GetPrintStream => (0, 1),
            Println(_) => (2, 0),

            Return => (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_targets() {
        assert_eq!(Insn::Goto(Label(3)).branch_target(), Some(Label(3)));
        assert_eq!(Insn::IfICmpGe(Label(1)).branch_target(), Some(Label(1)));
        assert_eq!(Insn::Label(Label(1)).branch_target(), None);
        assert_eq!(Insn::IAdd.branch_target(), None);
    }

    #[test]
    fn test_stack_effects() {
        assert_eq!(Insn::Const(Constant::Int(1)).stack_effect(), (0, 1));
        assert_eq!(Insn::DupX1.stack_effect(), (2, 3));
        assert_eq!(Insn::ArrayStore(ArrayKind::Int).stack_effect(), (3, 0));
        assert_eq!(Insn::Println(PrintKind::Object).stack_effect(), (2, 0));
    }
}
