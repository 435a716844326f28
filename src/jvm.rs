//! Lightweight implementation of a parser and decoder for JVM bytecode
//! class files.
use std::fs;
use std::path::Path;

use log::debug;

use crate::constant_pool::{
    CPInfo, ConstantPool, CONSTANT_CLASS, CONSTANT_FIELD_REF, CONSTANT_INTEGER,
    CONSTANT_METHOD_REF, CONSTANT_NAME_AND_TYPE, CONSTANT_UTF8,
};
use crate::descriptor::MethodDescriptor;
use crate::error::{ConstantPoolError, LoadError};
use crate::reader::BinaryReader;

type Result<T> = std::result::Result<T, LoadError>;

pub const CLASS_MAGIC: u32 = 0xCAFE_BABE;
pub const ACC_STATIC: u16 = 0x0008;
/// Name javac gives the implicit constructor, the only method allowed to
/// be non-static.
pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const MAIN_METHOD: &str = "main";
pub const MAIN_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

/// Java class method representation for the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    signature: MethodDescriptor,
}

impl Method {
    /// Build a method, validating its descriptor.
    pub fn new(
        name: impl Into<String>,
        descriptor: impl Into<String>,
        access_flags: u16,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        let signature = MethodDescriptor::parse(&descriptor)?;
        Ok(Self {
            name: name.into(),
            descriptor,
            access_flags,
            max_stack,
            max_locals,
            code,
            signature,
        })
    }

    /// Number of operand stack values a call to this method pops.
    pub fn parameter_count(&self) -> usize {
        self.signature.arg_types.len()
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }
}

/// In-memory class: its constant pool and method table. Nothing mutates it
/// after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JVMClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub constant_pool: ConstantPool,
    pub methods: Vec<Method>,
}

impl JVMClassFile {
    /// Build a class directly from its parts.
    pub fn new(constant_pool: ConstantPool, methods: Vec<Method>) -> Self {
        Self {
            minor_version: 0,
            major_version: 0,
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            constant_pool,
            methods,
        }
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Find a method by exact name and descriptor.
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|method| method.name == name && method.descriptor == descriptor)
    }

    /// Resolve the `Methodref` at `index` to one of this class's methods.
    pub fn find_method_by_constant_index(
        &self,
        index: u16,
    ) -> std::result::Result<Option<&Method>, ConstantPoolError> {
        let (name, descriptor) = self.constant_pool.method_name_and_type(index)?;
        Ok(self.find_method(name, descriptor))
    }

    /// Returns program entry point, the `main(String[])` method.
    pub fn entry_point(&self) -> Option<&Method> {
        self.find_method(MAIN_METHOD, MAIN_DESCRIPTOR)
    }
}

/// `JVMParser` decodes a class file into a `JVMClassFile`, rejecting any
/// feature the runtime cannot execute.
pub struct JVMParser<'a> {
    reader: BinaryReader<'a>,
}

impl<'a> JVMParser<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<JVMClassFile> {
        let mut parser = JVMParser {
            reader: BinaryReader::new(bytes),
        };
        parser.class_file()
    }

    fn class_file(&mut self) -> Result<JVMClassFile> {
        let magic = self.reader.read_u4()?;
        if magic != CLASS_MAGIC {
            return Err(LoadError::InvalidFormat {
                reason: format!("bad magic number {magic:#010x}"),
            });
        }
        let minor_version = self.reader.read_u2()?;
        let major_version = self.reader.read_u2()?;

        let constant_pool = self.constant_pool()?;

        let access_flags = self.reader.read_u2()?;
        let this_class = self.reader.read_u2()?;
        let super_class = self.reader.read_u2()?;
        let interfaces_count = self.reader.read_u2()?;
        if interfaces_count != 0 {
            return Err(LoadError::UnsupportedFeature {
                feature: format!("{interfaces_count} interface(s)"),
            });
        }
        let fields_count = self.reader.read_u2()?;
        if fields_count != 0 {
            return Err(LoadError::UnsupportedFeature {
                feature: format!("{fields_count} field(s)"),
            });
        }

        let methods = self.methods(&constant_pool)?;
        debug!(
            "loaded class file v{major_version}.{minor_version}: {} constants, {} methods",
            constant_pool.len(),
            methods.len()
        );

        Ok(JVMClassFile {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            constant_pool,
            methods,
        })
    }

    fn constant_pool(&mut self) -> Result<ConstantPool> {
        // The stored count includes the unused entry at index 0.
        let count = self.reader.read_u2()?.saturating_sub(1);
        let mut entries = Vec::with_capacity(count as usize);
        for index in 1..=count {
            let tag = self.reader.read_u1()?;
            let entry = match tag {
                CONSTANT_UTF8 => {
                    let length = self.reader.read_u2()?;
                    let bytes = self.reader.read_bytes(length as usize)?;
                    let bytes = String::from_utf8(bytes)
                        .map_err(|_| LoadError::InvalidUtf8 { index })?;
                    CPInfo::ConstantUtf8 { bytes }
                }
                CONSTANT_INTEGER => CPInfo::ConstantInteger {
                    value: self.reader.read_u4()? as i32,
                },
                CONSTANT_CLASS => CPInfo::ConstantClass {
                    name_index: self.reader.read_u2()?,
                },
                CONSTANT_FIELD_REF => CPInfo::ConstantFieldRef {
                    class_index: self.reader.read_u2()?,
                    name_and_type_index: self.reader.read_u2()?,
                },
                CONSTANT_METHOD_REF => CPInfo::ConstantMethodRef {
                    class_index: self.reader.read_u2()?,
                    name_and_type_index: self.reader.read_u2()?,
                },
                CONSTANT_NAME_AND_TYPE => CPInfo::ConstantNameAndType {
                    name_index: self.reader.read_u2()?,
                    descriptor_index: self.reader.read_u2()?,
                },
                _ => return Err(LoadError::UnknownConstantTag { tag, index }),
            };
            entries.push(entry);
        }
        Ok(ConstantPool::new(entries))
    }

    fn methods(&mut self, constant_pool: &ConstantPool) -> Result<Vec<Method>> {
        let count = self.reader.read_u2()?;
        let mut methods = Vec::with_capacity(count as usize);
        for _ in 0..count {
            methods.push(self.method(constant_pool)?);
        }
        Ok(methods)
    }

    fn method(&mut self, constant_pool: &ConstantPool) -> Result<Method> {
        let access_flags = self.reader.read_u2()?;
        let name_index = self.reader.read_u2()?;
        let descriptor_index = self.reader.read_u2()?;
        let attributes_count = self.reader.read_u2()?;

        let name = constant_pool.utf8_at(name_index)?;
        let descriptor = constant_pool.utf8_at(descriptor_index)?;
        if name != CONSTRUCTOR_NAME && access_flags & ACC_STATIC == 0 {
            return Err(LoadError::UnsupportedFeature {
                feature: format!("non-static method {name}{descriptor}"),
            });
        }

        let mut code = None;
        for _ in 0..attributes_count {
            let attribute_name_index = self.reader.read_u2()?;
            let attribute_length = self.reader.read_u4()? as usize;
            let attribute_end = self.reader.position() + attribute_length;
            if constant_pool.utf8_at(attribute_name_index)? == "Code" {
                if code.is_some() {
                    return Err(LoadError::DuplicateCode {
                        method: format!("{name}{descriptor}"),
                    });
                }
                code = Some(self.code_attribute()?);
            }
            // Skip whatever is left of the attribute.
            self.reader.skip_to(attribute_end)?;
        }

        let (max_stack, max_locals, code) = code.ok_or_else(|| LoadError::MissingCode {
            method: format!("{name}{descriptor}"),
        })?;
        Method::new(name, descriptor, access_flags, max_stack, max_locals, code)
    }

    fn code_attribute(&mut self) -> Result<(u16, u16, Vec<u8>)> {
        let max_stack = self.reader.read_u2()?;
        let max_locals = self.reader.read_u2()?;
        let code_length = self.reader.read_u4()?;
        let code = self.reader.read_bytes(code_length as usize)?;
        Ok((max_stack, max_locals, code))
    }
}

/// Read a class file from disk.
pub fn read_class_file(path: &Path) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Read and parse the class file at `path`.
pub fn load_class_file(path: &Path) -> Result<JVMClassFile> {
    let bytes = read_class_file(path)?;
    JVMParser::parse(&bytes)
}
