//! Constant pool entries and index-based navigation over them.
use crate::error::ConstantPoolError;

type Result<T> = std::result::Result<T, ConstantPoolError>;

pub const CONSTANT_UTF8: u8 = 1;
pub const CONSTANT_INTEGER: u8 = 3;
pub const CONSTANT_CLASS: u8 = 7;
pub const CONSTANT_FIELD_REF: u8 = 9;
pub const CONSTANT_METHOD_REF: u8 = 10;
pub const CONSTANT_NAME_AND_TYPE: u8 = 12;

/// A single constant pool entry. Indices stored inside entries are 1-based
/// references back into the same pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CPInfo {
    ConstantUtf8 {
        bytes: String,
    },
    ConstantInteger {
        value: i32,
    },
    ConstantClass {
        name_index: u16,
    },
    ConstantFieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    ConstantMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    ConstantNameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
}

impl CPInfo {
    /// Human readable entry kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConstantUtf8 { .. } => "Utf8",
            Self::ConstantInteger { .. } => "Integer",
            Self::ConstantClass { .. } => "Class",
            Self::ConstantFieldRef { .. } => "Fieldref",
            Self::ConstantMethodRef { .. } => "Methodref",
            Self::ConstantNameAndType { .. } => "NameAndType",
        }
    }
}

/// The constant pool of a loaded class. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<CPInfo>,
}

impl ConstantPool {
    pub fn new(entries: Vec<CPInfo>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at the 1-based `index`.
    pub fn entry_at(&self, index: u16) -> Result<&CPInfo> {
        (index as usize)
            .checked_sub(1)
            .and_then(|slot| self.entries.get(slot))
            .ok_or(ConstantPoolError::InvalidConstantIndex {
                index,
                count: self.entries.len(),
            })
    }

    /// Returns the text of the Utf8 entry at `index`.
    pub fn utf8_at(&self, index: u16) -> Result<&str> {
        match self.entry_at(index)? {
            CPInfo::ConstantUtf8 { bytes } => Ok(bytes),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Returns the value of the Integer entry at `index`.
    pub fn integer_at(&self, index: u16) -> Result<i32> {
        match self.entry_at(index)? {
            CPInfo::ConstantInteger { value } => Ok(*value),
            other => Err(mismatch(index, "Integer", other)),
        }
    }

    /// Follows `Methodref -> NameAndType` starting at `method_ref` and
    /// returns the method's `(name, descriptor)` pair.
    pub fn method_name_and_type(&self, method_ref: u16) -> Result<(&str, &str)> {
        let name_and_type_index = match self.entry_at(method_ref)? {
            CPInfo::ConstantMethodRef {
                name_and_type_index,
                ..
            } => *name_and_type_index,
            other => return Err(mismatch(method_ref, "Methodref", other)),
        };
        let (name_index, descriptor_index) = match self.entry_at(name_and_type_index)? {
            CPInfo::ConstantNameAndType {
                name_index,
                descriptor_index,
            } => (*name_index, *descriptor_index),
            other => return Err(mismatch(name_and_type_index, "NameAndType", other)),
        };
        Ok((self.utf8_at(name_index)?, self.utf8_at(descriptor_index)?))
    }
}

fn mismatch(index: u16, expected: &'static str, found: &CPInfo) -> ConstantPoolError {
    ConstantPoolError::MalformedConstantPool {
        index,
        expected,
        found: found.kind(),
    }
}
