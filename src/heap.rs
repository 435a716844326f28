//! Append-only heap of integer arrays addressed by integer handles.
use log::debug;

use crate::error::HeapError;

type Result<T> = std::result::Result<T, HeapError>;

/// An `int[]` allocated by `newarray`. The requested length is kept as is,
/// even when negative, while the backing storage holds `max(length, 0)`
/// zero-initialized elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapArray {
    length: i32,
    elements: Vec<i32>,
}

impl HeapArray {
    fn new(length: i32) -> Self {
        Self {
            length,
            elements: vec![0; length.max(0) as usize],
        }
    }

    /// Length requested at allocation time.
    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn elements(&self) -> &[i32] {
        &self.elements
    }

    fn slot(&self, handle: i32, index: i32) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&slot| slot < self.elements.len())
            .ok_or(HeapError::ArrayIndexOutOfBounds {
                handle,
                index,
                length: self.length,
            })
    }
}

/// `Heap` owns every array for the lifetime of the run. Handles are
/// assigned sequentially from 0 and never reused.
#[derive(Debug, Default)]
pub struct Heap {
    arrays: Vec<HeapArray>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new array and returns its handle.
    pub fn allocate(&mut self, length: i32) -> i32 {
        let handle = self.arrays.len() as i32;
        self.arrays.push(HeapArray::new(length));
        handle
    }

    pub fn get(&self, handle: i32) -> Result<&HeapArray> {
        usize::try_from(handle)
            .ok()
            .and_then(|index| self.arrays.get(index))
            .ok_or(HeapError::InvalidHeapReference { handle })
    }

    pub fn get_mut(&mut self, handle: i32) -> Result<&mut HeapArray> {
        usize::try_from(handle)
            .ok()
            .and_then(|index| self.arrays.get_mut(index))
            .ok_or(HeapError::InvalidHeapReference { handle })
    }

    /// Reads element `index` of the array behind `handle`.
    pub fn load(&self, handle: i32, index: i32) -> Result<i32> {
        let array = self.get(handle)?;
        let slot = array.slot(handle, index)?;
        Ok(array.elements[slot])
    }

    /// Writes `value` into element `index` of the array behind `handle`.
    pub fn store(&mut self, handle: i32, index: i32, value: i32) -> Result<()> {
        let array = self.get_mut(handle)?;
        let slot = array.slot(handle, index)?;
        array.elements[slot] = value;
        Ok(())
    }

    /// Number of arrays allocated so far.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Releases every array at once. Consumes the heap so no handle can be
    /// dereferenced afterwards.
    pub fn teardown(self) {
        debug!("releasing {} heap arrays", self.arrays.len());
    }
}
