//! Bytecode instruction set for the Quip virtual machine

/// Bytecode operation codes
///
/// This is a stack-based instruction set. Most operations pop operands from
/// the stack and push results back onto it. Every instruction carries three
/// signed operand slots; `operand_count` says how many are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ===== Stack Operations =====
    /// Push a constant from the constant pool onto the stack
    /// Operand a: constant index
    PushConstant,

    /// Pop and discard the top of stack
    Pop,

    /// Duplicate the top of stack
    Dup,

    // ===== Variables =====
    /// Load a variable from the environment onto the stack
    /// Operand a: name index
    PushVar,

    /// Pop the top of stack into a variable in the environment
    /// Operand a: name index
    SetVar,

    // ===== Arithmetic Operations =====
    /// Add: pop two values (right, left), push left + right
    Add,

    /// Subtract: pop two values (right, left), push left - right
    Sub,

    /// Multiply: pop two values (right, left), push left * right
    Mul,

    /// Divide: pop two values (right, left), push left / right.
    /// Division by zero yields positive infinity, never an error.
    Div,

    /// Modulo: pop two values (right, left), push the floating-point
    /// remainder of left / right
    Mod,

    /// Negate: pop one value, push its arithmetic negation
    Neg,

    // ===== Comparison Operations =====
    /// Equal: pop two values, push 1.0 if equal, else 0.0
    Eq,

    /// Not equal: pop two values, push 1.0 if not equal, else 0.0
    Ne,

    /// Less than: pop two values, push 1.0 if left < right, else 0.0
    Lt,

    /// Less than or equal: pop two values, push 1.0 if left <= right
    Le,

    /// Greater than: pop two values, push 1.0 if left > right, else 0.0
    Gt,

    /// Greater than or equal: pop two values, push 1.0 if left >= right
    Ge,

    // ===== Logical Operations =====
    /// Logical NOT: pop one value, push 1.0 if it was falsy, else 0.0
    Not,

    // ===== Short-Circuit Evaluation =====
    /// Marks the start of a short-circuit `and`/`or` expression. No-op at
    /// execution time; kept so each expression forms a begin/eval/end triad.
    BoolBegin,

    /// Pop the left operand of `and`. If falsy, push 0.0 and jump to the
    /// matching `BoolEnd`; otherwise fall through into the right operand.
    /// Operand a: instruction index of the matching `BoolEnd`
    AndEval,

    /// Pop the left operand of `or`. If truthy, push 1.0 and jump to the
    /// matching `BoolEnd`; otherwise fall through into the right operand.
    /// Operand a: instruction index of the matching `BoolEnd`
    OrEval,

    /// Close a short-circuit expression: pop the result value and push its
    /// truth coercion as 1.0 or 0.0
    BoolEnd,

    // ===== Control Flow =====
    /// Unconditional jump
    /// Operand a: absolute instruction index
    Jump,

    /// Pop a condition; jump if it is falsy
    /// Operand a: absolute instruction index
    JumpIfFalse,

    // ===== Output =====
    /// Pop one value and write its rendering to the primary output channel
    Say,

    /// Pop one value and write its rendering to the secondary output channel
    Echo,

    // ===== Object Operations (stubbed at execution) =====
    /// Field access: pop the object, push a placeholder
    /// Operand a: name index of the field
    GetField,

    /// Method call: pop the arguments and the receiver, push a placeholder
    /// Operand a: name index of the method
    /// Operand b: argument count
    CallMethod,

    /// Instance construction: pop the arguments, push a placeholder
    /// Operand a: name index of the class
    /// Operand b: argument count
    NewClass,

    /// Tuple construction: pop the elements, push a placeholder
    /// Operand a: element count
    MakeTuple,

    // ===== Termination =====
    /// Terminate execution immediately, discarding remaining instructions
    Return,
}

impl OpCode {
    /// Returns how many of the instruction's operand slots are meaningful
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            OpCode::Pop
            | OpCode::Dup
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div
            | OpCode::Mod
            | OpCode::Neg
            | OpCode::Eq
            | OpCode::Ne
            | OpCode::Lt
            | OpCode::Le
            | OpCode::Gt
            | OpCode::Ge
            | OpCode::Not
            | OpCode::BoolBegin
            | OpCode::BoolEnd
            | OpCode::Say
            | OpCode::Echo
            | OpCode::Return => 0,

            OpCode::PushConstant
            | OpCode::PushVar
            | OpCode::SetVar
            | OpCode::AndEval
            | OpCode::OrEval
            | OpCode::Jump
            | OpCode::JumpIfFalse
            | OpCode::GetField
            | OpCode::MakeTuple => 1,

            OpCode::CallMethod | OpCode::NewClass => 2,
        }
    }

    /// Returns true if operand a is an instruction index to jump to
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            OpCode::Jump | OpCode::JumpIfFalse | OpCode::AndEval | OpCode::OrEval
        )
    }

    /// Returns a human-readable name for the opcode
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::PushConstant => "PUSH_CONSTANT",
            OpCode::Pop => "POP",
            OpCode::Dup => "DUP",
            OpCode::PushVar => "PUSH_VAR",
            OpCode::SetVar => "SET_VAR",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",
            OpCode::Neg => "NEG",
            OpCode::Eq => "EQ",
            OpCode::Ne => "NE",
            OpCode::Lt => "LT",
            OpCode::Le => "LE",
            OpCode::Gt => "GT",
            OpCode::Ge => "GE",
            OpCode::Not => "NOT",
            OpCode::BoolBegin => "BOOL_BEGIN",
            OpCode::AndEval => "AND_EVAL",
            OpCode::OrEval => "OR_EVAL",
            OpCode::BoolEnd => "BOOL_END",
            OpCode::Jump => "JMP",
            OpCode::JumpIfFalse => "IF_FALSE_JMP",
            OpCode::Say => "SAY",
            OpCode::Echo => "ECHO",
            OpCode::GetField => "GET_FIELD",
            OpCode::CallMethod => "CALL_METHOD",
            OpCode::NewClass => "NEW_CLASS",
            OpCode::MakeTuple => "MAKE_TUPLE",
            OpCode::Return => "RET",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // Match all variants by their discriminant
        match value {
            0 => Ok(OpCode::PushConstant),
            1 => Ok(OpCode::Pop),
            2 => Ok(OpCode::Dup),
            3 => Ok(OpCode::PushVar),
            4 => Ok(OpCode::SetVar),
            5 => Ok(OpCode::Add),
            6 => Ok(OpCode::Sub),
            7 => Ok(OpCode::Mul),
            8 => Ok(OpCode::Div),
            9 => Ok(OpCode::Mod),
            10 => Ok(OpCode::Neg),
            11 => Ok(OpCode::Eq),
            12 => Ok(OpCode::Ne),
            13 => Ok(OpCode::Lt),
            14 => Ok(OpCode::Le),
            15 => Ok(OpCode::Gt),
            16 => Ok(OpCode::Ge),
            17 => Ok(OpCode::Not),
            18 => Ok(OpCode::BoolBegin),
            19 => Ok(OpCode::AndEval),
            20 => Ok(OpCode::OrEval),
            21 => Ok(OpCode::BoolEnd),
            22 => Ok(OpCode::Jump),
            23 => Ok(OpCode::JumpIfFalse),
            24 => Ok(OpCode::Say),
            25 => Ok(OpCode::Echo),
            26 => Ok(OpCode::GetField),
            27 => Ok(OpCode::CallMethod),
            28 => Ok(OpCode::NewClass),
            29 => Ok(OpCode::MakeTuple),
            30 => Ok(OpCode::Return),
            _ => Err(value),
        }
    }
}
