//! Method descriptor parsing.
use std::sync::OnceLock;

use regex::Regex;

use crate::error::LoadError;

/// Field types that can appear in a method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseTypeKind {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Void,
    /// `L<class name>;`
    Reference(String),
    /// `[<component>`, the component lives in `Type::sub_t`.
    List,
}

/// Descriptor value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub t: BaseTypeKind,
    pub sub_t: Option<Box<Type>>,
}

impl Type {
    fn base(t: BaseTypeKind) -> Self {
        Self { t, sub_t: None }
    }
}

/// Parsed form of a method descriptor such as `(I[I)V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub arg_types: Vec<Type>,
    pub return_type: Type,
}

impl MethodDescriptor {
    /// Parse a method descriptor, returns the argument types and the return
    /// type.
    pub fn parse(descriptor: &str) -> Result<Self, LoadError> {
        let invalid = || LoadError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
        };
        let caps = method_pattern().captures(descriptor).ok_or_else(invalid)?;
        let mut args = caps.get(1).map_or("", |m| m.as_str());
        let ret = caps.get(2).map_or("", |m| m.as_str());

        let mut arg_types = Vec::new();
        while !args.is_empty() {
            let (t, rest) = decode_type(args).ok_or_else(invalid)?;
            if t.t == BaseTypeKind::Void {
                return Err(invalid());
            }
            arg_types.push(t);
            args = rest;
        }

        let return_type = match decode_type(ret) {
            Some((t, "")) => t,
            _ => return Err(invalid()),
        };
        Ok(Self {
            arg_types,
            return_type,
        })
    }
}

/// Number of operand stack values a call to a method with this descriptor
/// consumes. Every parameter, arrays and references included, is one slot.
pub fn count_parameters(descriptor: &str) -> Result<usize, LoadError> {
    Ok(MethodDescriptor::parse(descriptor)?.arg_types.len())
}

fn method_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\(([^)]*)\)(.+)$").expect("method descriptor pattern is valid")
    })
}

/// Decodes the first type of `s`, returning it together with the
/// unconsumed remainder.
fn decode_type(s: &str) -> Option<(Type, &str)> {
    let mut chars = s.chars();
    let t = match chars.next()? {
        'B' => BaseTypeKind::Byte,
        'C' => BaseTypeKind::Char,
        'D' => BaseTypeKind::Double,
        'F' => BaseTypeKind::Float,
        'I' => BaseTypeKind::Int,
        'J' => BaseTypeKind::Long,
        'S' => BaseTypeKind::Short,
        'Z' => BaseTypeKind::Boolean,
        'V' => BaseTypeKind::Void,
        'L' => {
            let rest = &s[1..];
            let end = rest.find(';')?;
            if end == 0 {
                return None;
            }
            return Some((
                Type::base(BaseTypeKind::Reference(rest[..end].to_string())),
                &rest[end + 1..],
            ));
        }
        '[' => {
            let (component, rest) = decode_type(&s[1..])?;
            if component.t == BaseTypeKind::Void {
                return None;
            }
            return Some((
                Type {
                    t: BaseTypeKind::List,
                    sub_t: Some(Box::new(component)),
                },
                rest,
            ));
        }
        _ => return None,
    };
    Some((Type::base(t), chars.as_str()))
}
