//! A small JVM that loads a single class file and interprets its
//! integer-only static methods.
pub mod bytecode;
pub mod constant_pool;
pub mod descriptor;
pub mod error;
pub mod heap;
pub mod interpreter;
pub mod jvm;
pub mod reader;
pub mod runtime;

pub use error::{ConstantPoolError, Error, HeapError, LoadError, Result, RuntimeError};
pub use jvm::{load_class_file, read_class_file, JVMClassFile, JVMParser, Method};
pub use runtime::{Runtime, RuntimeConfig};

use std::io::Write;
use std::path::Path;

/// Loads the class file at `path` and runs its `main` method, printing to
/// `out`.
pub fn run_class_file<W: Write>(path: &Path, out: W, config: RuntimeConfig) -> Result<W> {
    let class_file = load_class_file(path)?;
    let mut runtime = Runtime::with_config(&class_file, out, config);
    runtime.run()?;
    Ok(runtime.finish())
}
