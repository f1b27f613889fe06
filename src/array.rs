//! Array: contiguous, growable storage of fixed-size elements.
//!
//! Elements are opaque `element_size`-byte records. Capacity grows in
//! powers of two and is never given back by shrinking; `front`, `back` and
//! `end` are computed from the current length on every call.

use crate::alloc::{Allocator, Heap, RawBuf};
use crate::error::{Error, Result};

pub struct Array<'a, A: ?Sized + Allocator = Heap> {
    buf: RawBuf<'a, A>,
    element_size: usize,
    len: usize,
}

impl Array<'static, Heap> {
    /// Array on the process heap.
    pub fn new(element_size: usize) -> Result<Self> {
        Self::new_in(element_size, &Heap)
    }
}

impl<'a, A: ?Sized + Allocator> Array<'a, A> {
    /// Empty array; nothing is allocated until the first growth.
    pub fn new_in(element_size: usize, alloc: &'a A) -> Result<Self> {
        if element_size == 0 {
            return Err(Error::InvalidArgument("element size must be non-zero"));
        }
        if !alloc.is_complete() {
            return Err(Error::IncompleteAllocator);
        }
        Ok(Self {
            buf: RawBuf::empty(alloc),
            element_size,
            len: 0,
        })
    }

    /// Copy into a fresh array on the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::new_in(self.element_size, self.buf.allocator())?;
        copy.resize(self.len)?;
        copy.as_bytes_mut().copy_from_slice(self.as_bytes());
        Ok(copy)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements storable without reallocating.
    pub fn capacity(&self) -> usize {
        self.buf.len() / self.element_size
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn allocator(&self) -> &'a A {
        self.buf.allocator()
    }

    fn reserve_exact(&mut self, capacity: usize) -> Result<()> {
        let bytes = capacity
            .checked_mul(self.element_size)
            .ok_or(Error::CapacityOverflow)?;
        self.buf.resize(bytes)
    }

    /// Set the length. Growing past capacity reallocates to the next power of
    /// two; growing within capacity exposes whatever bytes the slots held
    /// before. Shrinking never releases memory.
    pub fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len > self.capacity() {
            let capacity = new_len
                .checked_next_power_of_two()
                .ok_or(Error::CapacityOverflow)?;
            self.reserve_exact(capacity)?;
        }
        self.len = new_len;
        Ok(())
    }

    fn span(&self, index: usize) -> core::ops::Range<usize> {
        let start = index * self.element_size;
        start..start + self.element_size
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let span = self.span(index);
        Some(&self.buf.as_slice()[span])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.len {
            return None;
        }
        let span = self.span(index);
        Some(&mut self.buf.as_mut_slice()[span])
    }

    fn check_element(&self, element: Option<&[u8]>) -> Result<()> {
        match element {
            Some(e) if e.len() != self.element_size => {
                Err(Error::InvalidArgument("element length differs from element size"))
            }
            _ => Ok(()),
        }
    }

    /// Overwrite the element at `index`; `None` zero-fills it.
    pub fn set(&mut self, index: usize, element: Option<&[u8]>) -> Result<&mut [u8]> {
        self.check_element(element)?;
        let len = self.len;
        let slot = self
            .get_mut(index)
            .ok_or(Error::OutOfBounds { index, len })?;
        write_element(slot, element);
        Ok(slot)
    }

    pub fn front(&self) -> Option<&[u8]> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&[u8]> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Address one past the last element, or `None` when empty.
    pub fn end(&self) -> Option<*const u8> {
        if self.is_empty() {
            return None;
        }
        Some(self.as_bytes().as_ptr_range().end)
    }

    /// Insert at `index` (which may equal `len`), shifting the tail up one
    /// slot. `None` zero-fills the new element.
    pub fn insert(&mut self, index: usize, element: Option<&[u8]>) -> Result<&mut [u8]> {
        self.check_element(element)?;
        if index > self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        if self.len >= self.capacity() {
            let capacity = match self.capacity() {
                0 => 1,
                n => n.checked_mul(2).ok_or(Error::CapacityOverflow)?,
            };
            self.reserve_exact(capacity)?;
        }
        let size = self.element_size;
        let start = index * size;
        let end = self.len * size;
        self.buf.as_mut_slice().copy_within(start..end, start + size);
        self.len += 1;
        let span = self.span(index);
        let slot = &mut self.buf.as_mut_slice()[span];
        write_element(slot, element);
        Ok(slot)
    }

    pub fn push_back(&mut self, element: Option<&[u8]>) -> Result<&mut [u8]> {
        self.insert(self.len, element)
    }

    pub fn push_front(&mut self, element: Option<&[u8]>) -> Result<&mut [u8]> {
        self.insert(0, element)
    }

    /// Remove the element at `index`, shifting the tail down one slot.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let size = self.element_size;
        let start = (index + 1) * size;
        let end = self.len * size;
        self.buf.as_mut_slice().copy_within(start..end, index * size);
        self.len -= 1;
        Ok(())
    }

    pub fn pop_back(&mut self) -> Result<()> {
        match self.len.checked_sub(1) {
            Some(last) => self.remove(last),
            None => Err(Error::OutOfBounds { index: 0, len: 0 }),
        }
    }

    pub fn pop_front(&mut self) -> Result<()> {
        self.remove(0)
    }

    /// Drop every element; capacity is kept.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The live elements as one contiguous byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf.as_slice()[..self.len * self.element_size]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let end = self.len * self.element_size;
        &mut self.buf.as_mut_slice()[..end]
    }

    pub fn iter(&self) -> core::slice::ChunksExact<'_, u8> {
        self.as_bytes().chunks_exact(self.element_size)
    }
}

fn write_element(slot: &mut [u8], element: Option<&[u8]>) {
    match element {
        Some(e) => slot.copy_from_slice(e),
        None => slot.fill(0),
    }
}

impl<A: ?Sized + Allocator> core::fmt::Debug for Array<'_, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Array")
            .field("element_size", &self.element_size)
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
