//! JVM runtime module responsible for creating a new runtime
//! environment and running programs.
use std::io::Write;

use log::{debug, info};

use crate::error::RuntimeError;
use crate::heap::Heap;
use crate::interpreter::Frame;
use crate::jvm::{JVMClassFile, Method};

pub(crate) type Result<T> = std::result::Result<T, RuntimeError>;

/// Default limit on nested method invocations.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

/// Tunables for a `Runtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Deepest chain of nested invocations allowed before the run is
    /// aborted with `CallDepthExceeded`. `main` counts as depth 1.
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// `Runtime` represents an execution context for a loaded class. It owns
/// the array heap, the output stream the print routine writes to and the
/// stack of frames suspended in a call. Each `invokestatic` runs the callee
/// in a fresh `Frame` while the caller waits on `frames`.
pub struct Runtime<'a, W: Write> {
    class_file: &'a JVMClassFile,
    pub(crate) heap: Heap,
    pub(crate) out: W,
    pub(crate) frames: Vec<Frame<'a>>,
    config: RuntimeConfig,
}

impl<'a, W: Write> Runtime<'a, W> {
    pub fn new(class_file: &'a JVMClassFile, out: W) -> Self {
        Self::with_config(class_file, out, RuntimeConfig::default())
    }

    pub fn with_config(class_file: &'a JVMClassFile, out: W, config: RuntimeConfig) -> Self {
        Self {
            class_file,
            heap: Heap::new(),
            out,
            frames: Vec::new(),
            config,
        }
    }

    pub fn class_file(&self) -> &'a JVMClassFile {
        self.class_file
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs the program entry point `main(String[])` with zeroed locals.
    /// `main` must return void.
    pub fn run(&mut self) -> Result<()> {
        let main = self
            .class_file
            .entry_point()
            .ok_or(RuntimeError::MissingMainMethod)?;
        info!("running {}{}", main.name, main.descriptor);
        let locals = vec![0; main.max_locals as usize];
        match self.execute(main, locals)? {
            Some(value) => Err(RuntimeError::MainReturnedValue { value }),
            None => {
                self.out.flush()?;
                Ok(())
            }
        }
    }

    /// Calls `method` with `args` in declaration order, the remaining
    /// locals start at zero.
    pub fn invoke(&mut self, method: &'a Method, args: &[i32]) -> Result<Option<i32>> {
        let max_locals = method.max_locals as usize;
        if args.len() > max_locals {
            return Err(RuntimeError::InvalidLocalIndex {
                index: args.len() - 1,
                max_locals,
            });
        }
        let mut locals = vec![0; max_locals];
        locals[..args.len()].copy_from_slice(args);
        self.execute(method, locals)
    }

    /// Runs `method` until it returns, yielding its result if it has one.
    pub fn execute(&mut self, method: &'a Method, locals: Vec<i32>) -> Result<Option<i32>> {
        if self.frames.len() >= self.config.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        let frame = Frame::new(method, locals)?;
        debug!(
            "enter {}{} (depth {})",
            method.name,
            method.descriptor,
            self.frames.len() + 1
        );
        self.interpret(frame)
    }

    /// Releases the heap and hands back the output stream.
    pub fn finish(self) -> W {
        self.heap.teardown();
        self.out
    }
}
