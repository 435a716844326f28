//! Assembler for the small class files the integration tests load.
#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// A raw method attribute.
pub struct Attribute {
    pub name: String,
    pub body: Vec<u8>,
}

impl Attribute {
    /// A `Code` attribute with an empty exception table and no nested
    /// attributes.
    pub fn code(max_stack: u16, max_locals: u16, code: &[u8]) -> Self {
        let mut body = Vec::new();
        body.write_u16::<BigEndian>(max_stack).unwrap();
        body.write_u16::<BigEndian>(max_locals).unwrap();
        body.write_u32::<BigEndian>(code.len() as u32).unwrap();
        body.extend_from_slice(code);
        // exception_table_length, attributes_count
        body.write_u16::<BigEndian>(0).unwrap();
        body.write_u16::<BigEndian>(0).unwrap();
        Self {
            name: "Code".to_string(),
            body,
        }
    }

    pub fn other(name: &str, body: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_vec(),
        }
    }
}

struct MethodEntry {
    access_flags: u16,
    name: String,
    descriptor: String,
    attributes: Vec<Attribute>,
}

/// Raw constant pool entry, already encoded without its tag.
enum Constant {
    Utf8(String),
    Integer(i32),
    Class(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    NameAndType(u16, u16),
    Raw(u8, Vec<u8>),
}

/// Builds a class file byte by byte. Constants are deduplicated so that
/// helpers can be called freely.
pub struct ClassBuilder {
    magic: u32,
    constants: Vec<Constant>,
    this_class: u16,
    interfaces: Vec<u16>,
    fields_count: u16,
    methods: Vec<MethodEntry>,
}

impl ClassBuilder {
    pub fn new(class_name: &str) -> Self {
        let mut builder = Self {
            magic: 0xCAFE_BABE,
            constants: Vec::new(),
            this_class: 0,
            interfaces: Vec::new(),
            fields_count: 0,
            methods: Vec::new(),
        };
        builder.this_class = builder.class(class_name);
        builder
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        let index = self.class(name);
        self.interfaces.push(index);
        self
    }

    /// Declares `count` fields. The field table itself is left empty since
    /// the loader rejects the count before reading it.
    pub fn fields(mut self, count: u16) -> Self {
        self.fields_count = count;
        self
    }

    fn push(&mut self, constant: Constant) -> u16 {
        self.constants.push(constant);
        self.constants.len() as u16
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        for (i, constant) in self.constants.iter().enumerate() {
            if let Constant::Utf8(existing) = constant {
                if existing == text {
                    return i as u16 + 1;
                }
            }
        }
        self.push(Constant::Utf8(text.to_string()))
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.push(Constant::Integer(value))
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.push(Constant::Class(name_index))
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.push(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn method_ref(&mut self, name: &str, descriptor: &str) -> u16 {
        let class_index = self.this_class;
        let nat = self.name_and_type(name, descriptor);
        self.push(Constant::MethodRef(class_index, nat))
    }

    /// `java/io/PrintStream.println(I)V`, the target of every print.
    pub fn println_ref(&mut self) -> u16 {
        let class_index = self.class("java/io/PrintStream");
        let nat = self.name_and_type("println", "(I)V");
        self.push(Constant::MethodRef(class_index, nat))
    }

    /// `java/lang/System.out`, loaded by `getstatic` before printing.
    pub fn system_out_ref(&mut self) -> u16 {
        let class_index = self.class("java/lang/System");
        let nat = self.name_and_type("out", "Ljava/io/PrintStream;");
        self.push(Constant::FieldRef(class_index, nat))
    }

    pub fn raw_constant(&mut self, tag: u8, payload: &[u8]) -> u16 {
        self.push(Constant::Raw(tag, payload.to_vec()))
    }

    pub fn method(
        mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> Self {
        for attribute in &attributes {
            let name = attribute.name.clone();
            self.utf8(&name);
        }
        self.utf8(name);
        self.utf8(descriptor);
        self.methods.push(MethodEntry {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes,
        });
        self
    }

    /// Adds a public static method with a single Code attribute.
    pub fn static_method(
        self,
        name: &str,
        descriptor: &str,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
    ) -> Self {
        self.method(
            ACC_PUBLIC | ACC_STATIC,
            name,
            descriptor,
            vec![Attribute::code(max_stack, max_locals, code)],
        )
    }

    /// The constructor javac emits: `aload_0; invokespecial Object.<init>; return`.
    pub fn default_constructor(mut self) -> Self {
        let object = self.class("java/lang/Object");
        let nat = self.name_and_type("<init>", "()V");
        let init = self.push(Constant::MethodRef(object, nat));
        let [hi, lo] = init.to_be_bytes();
        self.method(
            ACC_PUBLIC,
            "<init>",
            "()V",
            vec![Attribute::code(1, 1, &[0x2a, 0xb7, hi, lo, 0xb1])],
        )
    }

    fn constant_index(&self, text: &str) -> u16 {
        self.constants
            .iter()
            .position(|c| matches!(c, Constant::Utf8(s) if s == text))
            .map(|i| i as u16 + 1)
            .expect("constant was interned when the method was added")
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_u32::<BigEndian>(self.magic).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(52).unwrap();

        out.write_u16::<BigEndian>(self.constants.len() as u16 + 1)
            .unwrap();
        for constant in &self.constants {
            match constant {
                Constant::Utf8(text) => {
                    out.write_u8(1).unwrap();
                    out.write_u16::<BigEndian>(text.len() as u16).unwrap();
                    out.extend_from_slice(text.as_bytes());
                }
                Constant::Integer(value) => {
                    out.write_u8(3).unwrap();
                    out.write_i32::<BigEndian>(*value).unwrap();
                }
                Constant::Class(name) => {
                    out.write_u8(7).unwrap();
                    out.write_u16::<BigEndian>(*name).unwrap();
                }
                Constant::FieldRef(class, nat) => {
                    out.write_u8(9).unwrap();
                    out.write_u16::<BigEndian>(*class).unwrap();
                    out.write_u16::<BigEndian>(*nat).unwrap();
                }
                Constant::MethodRef(class, nat) => {
                    out.write_u8(10).unwrap();
                    out.write_u16::<BigEndian>(*class).unwrap();
                    out.write_u16::<BigEndian>(*nat).unwrap();
                }
                Constant::NameAndType(name, descriptor) => {
                    out.write_u8(12).unwrap();
                    out.write_u16::<BigEndian>(*name).unwrap();
                    out.write_u16::<BigEndian>(*descriptor).unwrap();
                }
                Constant::Raw(tag, payload) => {
                    out.write_u8(*tag).unwrap();
                    out.extend_from_slice(payload);
                }
            }
        }

        // access_flags, this_class, super_class
        out.write_u16::<BigEndian>(ACC_PUBLIC).unwrap();
        out.write_u16::<BigEndian>(self.this_class).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(self.interfaces.len() as u16)
            .unwrap();
        for interface in &self.interfaces {
            out.write_u16::<BigEndian>(*interface).unwrap();
        }
        out.write_u16::<BigEndian>(self.fields_count).unwrap();

        out.write_u16::<BigEndian>(self.methods.len() as u16).unwrap();
        for method in &self.methods {
            out.write_u16::<BigEndian>(method.access_flags).unwrap();
            out.write_u16::<BigEndian>(self.constant_index(&method.name))
                .unwrap();
            out.write_u16::<BigEndian>(self.constant_index(&method.descriptor))
                .unwrap();
            out.write_u16::<BigEndian>(method.attributes.len() as u16)
                .unwrap();
            for attribute in &method.attributes {
                out.write_u16::<BigEndian>(self.constant_index(&attribute.name))
                    .unwrap();
                out.write_u32::<BigEndian>(attribute.body.len() as u32)
                    .unwrap();
                out.extend_from_slice(&attribute.body);
            }
        }

        // Class attributes.
        out.write_u16::<BigEndian>(0).unwrap();
        out
    }
}

/// Splits a constant pool index into the two operand bytes of an
/// instruction.
pub fn index_bytes(index: u16) -> [u8; 2] {
    index.to_be_bytes()
}
