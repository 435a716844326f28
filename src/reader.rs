//! Big-endian reader over an in-memory class file.
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::LoadError;

type Result<T> = std::result::Result<T, LoadError>;

/// `BinaryReader` decodes the unsigned big-endian integers the class file
/// format is built from. Every read either consumes exactly the requested
/// bytes or fails with `UnexpectedEndOfInput`.
#[derive(Debug)]
pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> BinaryReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Current read offset from the start of the input.
    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    pub fn read_u1(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_u2(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<BigEndian>()?)
    }

    pub fn read_u4(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<BigEndian>()?)
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len)?;
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Moves the cursor forward to the absolute offset `end`. Seeking
    /// backwards is a format error since attributes never overlap.
    pub fn skip_to(&mut self, end: usize) -> Result<()> {
        let position = self.position();
        if end < position {
            return Err(LoadError::InvalidFormat {
                reason: format!(
                    "attribute ends at byte {end} but its contents run to byte {position}"
                ),
            });
        }
        self.ensure(end - position)?;
        self.cursor.set_position(end as u64);
        Ok(())
    }

    fn ensure(&self, len: usize) -> Result<()> {
        if self.remaining() < len {
            return Err(LoadError::UnexpectedEndOfInput {
                offset: self.position(),
            });
        }
        Ok(())
    }
}
