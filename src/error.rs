//! Error types shared by the loader and the runtime.
use thiserror::Error;

/// Result type for whole-program operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while navigating the constant pool. These can surface while
/// loading (attribute and method names) and while executing (call sites).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstantPoolError {
    #[error("invalid constant pool index {index} (pool has {count} entries)")]
    InvalidConstantIndex { index: u16, count: usize },

    #[error("constant #{index} is {found}, expected {expected}")]
    MalformedConstantPool {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },
}

/// `LoadError` represents everything that can go wrong while decoding a
/// class file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEndOfInput { offset: usize },

    #[error("invalid class file: {reason}")]
    InvalidFormat { reason: String },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("unsupported feature: {feature}")]
    UnsupportedFeature { feature: String },

    #[error("constant #{index} is not valid UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("method {method} has no Code attribute")]
    MissingCode { method: String },

    #[error("method {method} has more than one Code attribute")]
    DuplicateCode { method: String },

    #[error("malformed method descriptor {descriptor:?}")]
    InvalidDescriptor { descriptor: String },

    #[error(transparent)]
    ConstantPool(#[from] ConstantPoolError),
}

/// Faults raised by the array heap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("invalid heap reference {handle}")]
    InvalidHeapReference { handle: i32 },

    #[error("index {index} out of bounds for array {handle} of length {length}")]
    ArrayIndexOutOfBounds { handle: i32, index: i32, length: i32 },
}

/// `RuntimeError` represents the possible failures that can occur while
/// executing bytecode. All of them abort the run.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("division by zero at pc {pc}")]
    DivisionByZero { pc: usize },

    #[error(transparent)]
    Heap(#[from] HeapError),

    #[error(transparent)]
    ConstantPool(#[from] ConstantPoolError),

    #[error("method {name}{descriptor} not found")]
    MethodNotFound { name: String, descriptor: String },

    #[error("missing static method main([Ljava/lang/String;)V")]
    MissingMainMethod,

    #[error("main() should return void but returned {value}")]
    MainReturnedValue { value: i32 },

    #[error("operand stack overflow at pc {pc} (max stack {max_stack})")]
    OperandStackOverflow { pc: usize, max_stack: usize },

    #[error("operand stack underflow at pc {pc}")]
    OperandStackUnderflow { pc: usize },

    #[error("local variable index {index} out of range (max locals {max_locals})")]
    InvalidLocalIndex { index: usize, max_locals: usize },

    #[error("unknown opcode {opcode:#04x} at pc {pc}")]
    UnknownOpcode { opcode: u8, pc: usize },

    #[error("instruction at pc {pc} runs past the end of the code")]
    TruncatedInstruction { pc: usize },

    #[error("branch at pc {pc} targets {target}, outside the method body")]
    InvalidBranchTarget { pc: usize, target: isize },

    #[error("call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Top-level error for loading and running a class file.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
