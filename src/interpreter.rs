//! Interpreter for JVM bytecode.
use std::io::Write;
use std::mem;

use log::{debug, trace};

use crate::bytecode::OPCode;
use crate::error::RuntimeError;
use crate::jvm::Method;
use crate::runtime::{Result, Runtime};

/// Execution state of a single method invocation: a bounded operand stack,
/// the locals array and the program counter into the method's code.
#[derive(Debug)]
pub struct Frame<'a> {
    code: &'a [u8],
    stack: Vec<i32>,
    max_stack: usize,
    locals: Vec<i32>,
    pc: usize,
}

impl<'a> Frame<'a> {
    /// Create a frame for `method`. `locals` is padded with zeros up to
    /// `max_locals` and may not exceed it.
    pub fn new(method: &'a Method, mut locals: Vec<i32>) -> Result<Self> {
        let max_locals = method.max_locals as usize;
        if locals.len() > max_locals {
            return Err(RuntimeError::InvalidLocalIndex {
                index: locals.len() - 1,
                max_locals,
            });
        }
        locals.resize(max_locals, 0);
        Ok(Self {
            code: &method.code,
            stack: Vec::with_capacity(method.max_stack as usize),
            max_stack: method.max_stack as usize,
            locals,
            pc: 0,
        })
    }

    fn push(&mut self, value: i32) -> Result<()> {
        if self.stack.len() >= self.max_stack {
            return Err(RuntimeError::OperandStackOverflow {
                pc: self.pc,
                max_stack: self.max_stack,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<i32> {
        self.stack
            .pop()
            .ok_or(RuntimeError::OperandStackUnderflow { pc: self.pc })
    }

    fn peek(&self) -> Result<i32> {
        self.stack
            .last()
            .copied()
            .ok_or(RuntimeError::OperandStackUnderflow { pc: self.pc })
    }

    fn local(&self, index: usize) -> Result<i32> {
        self.locals
            .get(index)
            .copied()
            .ok_or(RuntimeError::InvalidLocalIndex {
                index,
                max_locals: self.locals.len(),
            })
    }

    fn local_mut(&mut self, index: usize) -> Result<&mut i32> {
        let max_locals = self.locals.len();
        self.locals
            .get_mut(index)
            .ok_or(RuntimeError::InvalidLocalIndex { index, max_locals })
    }

    /// Operand byte at `offset` past the current opcode.
    fn u1(&self, offset: usize) -> Result<u8> {
        self.code
            .get(self.pc + offset)
            .copied()
            .ok_or(RuntimeError::TruncatedInstruction { pc: self.pc })
    }

    fn i1(&self, offset: usize) -> Result<i8> {
        Ok(self.u1(offset)? as i8)
    }

    /// Big-endian 16-bit operand starting at `offset`.
    fn u2(&self, offset: usize) -> Result<u16> {
        Ok(u16::from_be_bytes([self.u1(offset)?, self.u1(offset + 1)?]))
    }

    fn i2(&self, offset: usize) -> Result<i16> {
        Ok(self.u2(offset)? as i16)
    }

    /// Jump by `offset` relative to the current opcode.
    fn branch(&mut self, offset: i16) -> Result<()> {
        let target = self.pc as isize + isize::from(offset);
        if target < 0 || target as usize >= self.code.len() {
            return Err(RuntimeError::InvalidBranchTarget {
                pc: self.pc,
                target,
            });
        }
        self.pc = target as usize;
        Ok(())
    }
}

/// What the dispatch loop does after a single instruction.
enum Flow<'a> {
    Next,
    Call(Frame<'a>),
    Return(Option<i32>),
}

/// Applies a binary integer instruction with JVM semantics: two's
/// complement wraparound and shift distances masked to 5 bits.
fn binary_op(opcode: OPCode, value1: i32, value2: i32, pc: usize) -> Result<i32> {
    let result = match opcode {
        OPCode::IAdd => value1.wrapping_add(value2),
        OPCode::ISub => value1.wrapping_sub(value2),
        OPCode::IMul => value1.wrapping_mul(value2),
        OPCode::IDiv | OPCode::IRem if value2 == 0 => {
            return Err(RuntimeError::DivisionByZero { pc })
        }
        OPCode::IDiv => value1.wrapping_div(value2),
        OPCode::IRem => value1.wrapping_rem(value2),
        OPCode::IAnd => value1 & value2,
        OPCode::IOr => value1 | value2,
        OPCode::IXor => value1 ^ value2,
        OPCode::IShl => value1.wrapping_shl(value2 as u32),
        OPCode::IShr => value1.wrapping_shr(value2 as u32),
        OPCode::IUShr => (value1 as u32).wrapping_shr(value2 as u32) as i32,
        _ => unreachable!("{opcode:?} is not a binary operation"),
    };
    Ok(result)
}

/// Evaluates the condition of an `if<cond>` / `if_icmp<cond>` branch.
fn condition(opcode: OPCode, value1: i32, value2: i32) -> bool {
    match opcode {
        OPCode::IfEq | OPCode::IfICmpEq => value1 == value2,
        OPCode::IfNe | OPCode::IfICmpNe => value1 != value2,
        OPCode::IfLt | OPCode::IfICmpLt => value1 < value2,
        OPCode::IfGe | OPCode::IfICmpGe => value1 >= value2,
        OPCode::IfGt | OPCode::IfICmpGt => value1 > value2,
        OPCode::IfLe | OPCode::IfICmpLe => value1 <= value2,
        _ => unreachable!("{opcode:?} is not a conditional branch"),
    }
}

impl<'a, W: Write> Runtime<'a, W> {
    /// Runs `frame` until its method returns or falls off the end of its
    /// code. Callers waiting on a callee are parked on `self.frames`, so
    /// guest recursion does not grow the host stack.
    pub(crate) fn interpret(&mut self, frame: Frame<'a>) -> Result<Option<i32>> {
        let base = self.frames.len();
        let result = self.dispatch(frame, base);
        self.frames.truncate(base);
        result
    }

    fn dispatch(&mut self, mut frame: Frame<'a>, base: usize) -> Result<Option<i32>> {
        loop {
            let value = match self.step(&mut frame)? {
                Flow::Next => continue,
                Flow::Call(callee) => {
                    // Depth of the frame currently running.
                    let depth = self.frames.len() + 1;
                    let limit = self.config().max_call_depth;
                    if depth >= limit {
                        return Err(RuntimeError::CallDepthExceeded { limit });
                    }
                    let caller = mem::replace(&mut frame, callee);
                    self.frames.push(caller);
                    continue;
                }
                Flow::Return(value) => value,
            };
            if self.frames.len() <= base {
                return Ok(value);
            }
            match self.frames.pop() {
                Some(caller) => frame = caller,
                None => return Ok(value),
            }
            if let Some(value) = value {
                frame.push(value)?;
            }
        }
    }

    /// Executes the instruction at `frame.pc`.
    fn step(&mut self, frame: &mut Frame<'a>) -> Result<Flow<'a>> {
        let pc = frame.pc;
        let Some(&byte) = frame.code.get(pc) else {
            return Ok(Flow::Return(None));
        };
        let opcode = OPCode::from(byte);
        trace!("pc {pc:>4}: {opcode:?} stack={:?}", frame.stack);

        match opcode {
            OPCode::NOP => {}
            OPCode::IconstM1
            | OPCode::Iconst0
            | OPCode::Iconst1
            | OPCode::Iconst2
            | OPCode::Iconst3
            | OPCode::Iconst4
            | OPCode::Iconst5 => {
                frame.push(i32::from(byte) - i32::from(OPCode::Iconst0 as u8))?;
            }
            OPCode::BiPush => {
                let value = frame.i1(1)?;
                frame.push(i32::from(value))?;
            }
            OPCode::SiPush => {
                let value = frame.i2(1)?;
                frame.push(i32::from(value))?;
            }
            OPCode::Ldc => {
                let index = frame.u1(1)?;
                let value = self
                    .class_file()
                    .constant_pool()
                    .integer_at(u16::from(index))?;
                frame.push(value)?;
            }
            OPCode::ILoad | OPCode::ALoad => {
                let index = frame.u1(1)?;
                let value = frame.local(index as usize)?;
                frame.push(value)?;
            }
            OPCode::ILoad0 | OPCode::ILoad1 | OPCode::ILoad2 | OPCode::ILoad3 => {
                let value = frame.local((byte - OPCode::ILoad0 as u8) as usize)?;
                frame.push(value)?;
            }
            OPCode::ALoad0 | OPCode::ALoad1 | OPCode::ALoad2 | OPCode::ALoad3 => {
                let value = frame.local((byte - OPCode::ALoad0 as u8) as usize)?;
                frame.push(value)?;
            }
            OPCode::IStore | OPCode::AStore => {
                let index = frame.u1(1)?;
                let value = frame.pop()?;
                *frame.local_mut(index as usize)? = value;
            }
            OPCode::IStore0 | OPCode::IStore1 | OPCode::IStore2 | OPCode::IStore3 => {
                let value = frame.pop()?;
                *frame.local_mut((byte - OPCode::IStore0 as u8) as usize)? = value;
            }
            OPCode::AStore0 | OPCode::AStore1 | OPCode::AStore2 | OPCode::AStore3 => {
                let value = frame.pop()?;
                *frame.local_mut((byte - OPCode::AStore0 as u8) as usize)? = value;
            }
            OPCode::IInc => {
                let index = frame.u1(1)?;
                let constant = frame.i1(2)?;
                let local = frame.local_mut(index as usize)?;
                *local = local.wrapping_add(i32::from(constant));
            }
            OPCode::IAdd
            | OPCode::ISub
            | OPCode::IMul
            | OPCode::IDiv
            | OPCode::IRem
            | OPCode::IAnd
            | OPCode::IOr
            | OPCode::IXor
            | OPCode::IShl
            | OPCode::IShr
            | OPCode::IUShr => {
                let value2 = frame.pop()?;
                let value1 = frame.pop()?;
                frame.push(binary_op(opcode, value1, value2, pc)?)?;
            }
            OPCode::INeg => {
                let value = frame.pop()?;
                frame.push(value.wrapping_neg())?;
            }
            OPCode::IfEq
            | OPCode::IfNe
            | OPCode::IfLt
            | OPCode::IfGe
            | OPCode::IfGt
            | OPCode::IfLe => {
                let offset = frame.i2(1)?;
                let value = frame.pop()?;
                if condition(opcode, value, 0) {
                    frame.branch(offset)?;
                    return Ok(Flow::Next);
                }
            }
            OPCode::IfICmpEq
            | OPCode::IfICmpNe
            | OPCode::IfICmpLt
            | OPCode::IfICmpGe
            | OPCode::IfICmpGt
            | OPCode::IfICmpLe => {
                let offset = frame.i2(1)?;
                let value2 = frame.pop()?;
                let value1 = frame.pop()?;
                if condition(opcode, value1, value2) {
                    frame.branch(offset)?;
                    return Ok(Flow::Next);
                }
            }
            OPCode::Goto => {
                let offset = frame.i2(1)?;
                frame.branch(offset)?;
                return Ok(Flow::Next);
            }
            OPCode::IReturn | OPCode::AReturn => {
                return Ok(Flow::Return(Some(frame.pop()?)));
            }
            OPCode::Return => return Ok(Flow::Return(None)),
            OPCode::Dup => {
                let value = frame.peek()?;
                frame.push(value)?;
            }
            // Only used to fetch `System.out` ahead of the print routine.
            OPCode::GetStatic => {
                frame.u2(1)?;
            }
            OPCode::InvokeVirtual => {
                frame.u2(1)?;
                let value = frame.pop()?;
                writeln!(self.out, "{value}")?;
            }
            OPCode::InvokeStatic => {
                let index = frame.u2(1)?;
                let callee = self.invoke_static(frame, index)?;
                // The caller resumes after the call once the callee returns.
                frame.pc += opcode.size();
                return Ok(Flow::Call(callee));
            }
            OPCode::NewArray => {
                frame.u1(1)?;
                let count = frame.pop()?;
                let handle = self.heap.allocate(count);
                frame.push(handle)?;
            }
            OPCode::ArrayLength => {
                let handle = frame.pop()?;
                let length = self.heap.get(handle)?.length();
                frame.push(length)?;
            }
            OPCode::IALoad => {
                let index = frame.pop()?;
                let handle = frame.pop()?;
                let value = self.heap.load(handle, index)?;
                frame.push(value)?;
            }
            OPCode::IAStore => {
                let value = frame.pop()?;
                let index = frame.pop()?;
                let handle = frame.pop()?;
                self.heap.store(handle, index, value)?;
            }
            OPCode::Unspecified => {
                return Err(RuntimeError::UnknownOpcode { opcode: byte, pc });
            }
        }
        frame.pc += opcode.size();
        Ok(Flow::Next)
    }

    /// Resolves the `Methodref` at `index` and pops its arguments off
    /// `frame`, returning the callee's frame.
    fn invoke_static(&mut self, frame: &mut Frame<'a>, index: u16) -> Result<Frame<'a>> {
        let class_file = self.class_file();
        let method = match class_file.find_method_by_constant_index(index)? {
            Some(method) => method,
            None => {
                let (name, descriptor) = class_file.constant_pool().method_name_and_type(index)?;
                return Err(RuntimeError::MethodNotFound {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                });
            }
        };

        let count = method.parameter_count();
        let max_locals = method.max_locals as usize;
        if count > max_locals {
            return Err(RuntimeError::InvalidLocalIndex {
                index: count - 1,
                max_locals,
            });
        }
        let mut locals = vec![0; max_locals];
        // The last argument is on top of the stack.
        for slot in locals[..count].iter_mut().rev() {
            *slot = frame.pop()?;
        }
        debug!(
            "invokestatic {}{} args={:?} (depth {})",
            method.name,
            method.descriptor,
            &locals[..count],
            self.frames.len() + 2
        );
        Frame::new(method, locals)
    }
}
