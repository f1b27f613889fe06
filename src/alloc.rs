//! Allocator capability and the owned byte block every container stores
//! its bytes in.
//!
//! Containers never reach for the global allocator on their own: they are
//! handed an `&'a A` at construction and route every allocate, reallocate
//! and release through it. The borrow makes the "allocator outlives the
//! container" rule a compile-time fact.
//!
//! All raw-pointer handling of the crate is confined to this module
//! (`RawBuf`); the containers above it work on byte slices.

use crate::error::{Error, Result};
use core::cell::Cell;
use core::marker::PhantomData;
use core::ops::Range;
use core::ptr::NonNull;
use std::alloc::Layout;

/// Alignment of every block handed out by [`Heap`].
const HEAP_ALIGN: usize = core::mem::align_of::<usize>();

/// Memory capability set: allocate, reallocate, release.
///
/// Requests always have a non-zero size. A failed `reallocate` must leave
/// the original block untouched and valid.
///
/// # Safety
///
/// `allocate` and `reallocate` must return blocks valid for reads and
/// writes of the requested size until they are released or reallocated.
/// `release` and `reallocate` are only ever called with blocks obtained
/// from the same allocator, together with their current size.
pub unsafe trait Allocator {
    /// Allocate `size` bytes; `None` on failure.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Resize `block` from `old_size` to `new_size` bytes, preserving the
    /// common prefix.
    ///
    /// # Safety
    ///
    /// `block` must be live, from this allocator, and `old_size` bytes long.
    unsafe fn reallocate(
        &self,
        block: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>>;

    /// Give `block` back.
    ///
    /// # Safety
    ///
    /// `block` must be live, from this allocator, and `size` bytes long.
    unsafe fn release(&self, block: NonNull<u8>, size: usize);

    /// Whether all three capabilities are present. Containers refuse to
    /// build on an incomplete allocator.
    fn is_complete(&self) -> bool {
        true
    }
}

/// Default allocator backed by the process heap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Heap;

unsafe impl Allocator for Heap {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let layout = Layout::from_size_align(size, HEAP_ALIGN).ok()?;
        // SAFETY: layout has a non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn reallocate(
        &self,
        block: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        if new_size == 0 {
            return None;
        }
        // Rejects sizes that would overflow isize once rounded to the alignment.
        Layout::from_size_align(new_size, HEAP_ALIGN).ok()?;
        let old = Layout::from_size_align_unchecked(old_size, HEAP_ALIGN);
        NonNull::new(std::alloc::realloc(block.as_ptr(), old, new_size))
    }

    unsafe fn release(&self, block: NonNull<u8>, size: usize) {
        let layout = Layout::from_size_align_unchecked(size, HEAP_ALIGN);
        std::alloc::dealloc(block.as_ptr(), layout);
    }
}

/// Allocation function: `(size) -> block`.
pub type AllocFn = unsafe fn(usize) -> Option<NonNull<u8>>;
/// Reallocation function: `(block, old_size, new_size) -> block`.
pub type ReallocFn = unsafe fn(NonNull<u8>, usize, usize) -> Option<NonNull<u8>>;
/// Release function: `(block, size)`.
pub type FreeFn = unsafe fn(NonNull<u8>, usize);

/// Allocator assembled from three plain functions, any of which may be
/// missing.
///
/// A default-constructed `FnAllocator` has no capabilities at all and is
/// rejected by every container.
#[derive(Debug, Default, Clone, Copy)]
pub struct FnAllocator {
    alloc: Option<AllocFn>,
    realloc: Option<ReallocFn>,
    free: Option<FreeFn>,
}

impl FnAllocator {
    /// # Safety
    ///
    /// The functions must uphold the contract of [`Allocator`] as a set.
    pub const unsafe fn from_fns(
        alloc: Option<AllocFn>,
        realloc: Option<ReallocFn>,
        free: Option<FreeFn>,
    ) -> Self {
        Self {
            alloc,
            realloc,
            free,
        }
    }
}

unsafe impl Allocator for FnAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let alloc = self.alloc?;
        // SAFETY: upheld by the caller of `from_fns`.
        unsafe { alloc(size) }
    }

    unsafe fn reallocate(
        &self,
        block: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        let realloc = self.realloc?;
        realloc(block, old_size, new_size)
    }

    unsafe fn release(&self, block: NonNull<u8>, size: usize) {
        if let Some(free) = self.free {
            free(block, size);
        }
    }

    fn is_complete(&self) -> bool {
        self.alloc.is_some() && self.realloc.is_some() && self.free.is_some()
    }
}

/// Wrapper that counts live blocks and bytes, and can be told to start
/// failing after a number of successful requests.
///
/// Uses `Cell`, so it is `!Sync` like the containers it serves.
#[derive(Debug, Default)]
pub struct Tracking<A = Heap> {
    inner: A,
    live_blocks: Cell<usize>,
    live_bytes: Cell<usize>,
    budget: Cell<Option<usize>>,
}

impl<A> Tracking<A> {
    pub const fn new(inner: A) -> Self {
        Self {
            inner,
            live_blocks: Cell::new(0),
            live_bytes: Cell::new(0),
            budget: Cell::new(None),
        }
    }

    /// Blocks allocated and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.get()
    }

    /// Bytes allocated and not yet released.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }

    /// Let `successes` more allocate/reallocate requests through, then fail
    /// every request until [`Tracking::never_fail`] is called.
    pub fn fail_after(&self, successes: usize) {
        self.budget.set(Some(successes));
    }

    pub fn never_fail(&self) {
        self.budget.set(None);
    }

    fn admit(&self) -> bool {
        match self.budget.get() {
            None => true,
            Some(0) => false,
            Some(n) => {
                self.budget.set(Some(n - 1));
                true
            }
        }
    }
}

unsafe impl<A: Allocator> Allocator for Tracking<A> {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if !self.admit() {
            return None;
        }
        let block = self.inner.allocate(size)?;
        self.live_blocks.set(self.live_blocks.get() + 1);
        self.live_bytes.set(self.live_bytes.get() + size);
        Some(block)
    }

    unsafe fn reallocate(
        &self,
        block: NonNull<u8>,
        old_size: usize,
        new_size: usize,
    ) -> Option<NonNull<u8>> {
        if !self.admit() {
            return None;
        }
        let block = self.inner.reallocate(block, old_size, new_size)?;
        self.live_bytes
            .set(self.live_bytes.get() - old_size + new_size);
        Some(block)
    }

    unsafe fn release(&self, block: NonNull<u8>, size: usize) {
        self.inner.release(block, size);
        self.live_blocks.set(self.live_blocks.get() - 1);
        self.live_bytes.set(self.live_bytes.get() - size);
    }

    fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }
}

fn alloc_failed(size: usize) -> Error {
    log::debug!("allocation of {size} bytes failed");
    Error::AllocFailed { size }
}

/// Owned, initialized byte block living in an injected allocator.
///
/// An empty block holds no allocation. Growth zero-fills the new tail so
/// the whole block can always be viewed as `&[u8]`.
pub(crate) struct RawBuf<'a, A: ?Sized + Allocator> {
    ptr: NonNull<u8>,
    len: usize,
    alloc: &'a A,
}

impl<'a, A: ?Sized + Allocator> RawBuf<'a, A> {
    pub(crate) fn empty(alloc: &'a A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            alloc,
        }
    }

    pub(crate) fn zeroed(len: usize, alloc: &'a A) -> Result<Self> {
        let mut buf = Self::empty(alloc);
        buf.resize(len)?;
        Ok(buf)
    }

    /// Change the block length. On failure the block is left as it was.
    pub(crate) fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len == self.len {
            return Ok(());
        }
        if new_len == 0 {
            // SAFETY: non-empty blocks always own a live allocation of `len` bytes.
            unsafe { self.alloc.release(self.ptr, self.len) };
            self.ptr = NonNull::dangling();
            self.len = 0;
            return Ok(());
        }
        let ptr = if self.len == 0 {
            self.alloc.allocate(new_len)
        } else {
            // SAFETY: as above.
            unsafe { self.alloc.reallocate(self.ptr, self.len, new_len) }
        }
        .ok_or_else(|| alloc_failed(new_len))?;
        if new_len > self.len {
            // SAFETY: the block is new_len bytes long; zero the part past the old length.
            unsafe { ptr.as_ptr().add(self.len).write_bytes(0, new_len - self.len) };
        }
        self.ptr = ptr;
        self.len = new_len;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: `len` initialized bytes (dangling-but-aligned when empty).
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn allocator(&self) -> &'a A {
        self.alloc
    }
}

impl<A: ?Sized + Allocator> Drop for RawBuf<'_, A> {
    fn drop(&mut self) {
        if self.len > 0 {
            // SAFETY: non-empty blocks own a live allocation of `len` bytes.
            unsafe { self.alloc.release(self.ptr, self.len) };
        }
    }
}

/// Append-only store of `Copy` records in an injected allocator.
///
/// Records live as raw bytes in a `RawBuf` and move in and out with
/// unaligned reads and writes, so blocks of any alignment will do. `E` must
/// not be zero-sized.
pub(crate) struct Arena<'a, E: Copy, A: ?Sized + Allocator> {
    buf: RawBuf<'a, A>,
    len: usize,
    _records: PhantomData<E>,
}

impl<'a, E: Copy, A: ?Sized + Allocator> Arena<'a, E, A> {
    const RECORD: usize = core::mem::size_of::<E>();

    pub(crate) fn new(alloc: &'a A) -> Self {
        Self {
            buf: RawBuf::empty(alloc),
            len: 0,
            _records: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len() / Self::RECORD
    }

    /// Make room for one more record. On failure nothing changes.
    pub(crate) fn reserve_one(&mut self) -> Result<()> {
        if self.len < self.capacity() {
            return Ok(());
        }
        let capacity = match self.capacity() {
            0 => 4,
            n => n.checked_mul(2).ok_or(Error::CapacityOverflow)?,
        };
        let size = capacity
            .checked_mul(Self::RECORD)
            .ok_or(Error::CapacityOverflow)?;
        self.buf.resize(size)
    }

    /// Give back the block of an arena that never received a record.
    pub(crate) fn release_if_empty(&mut self) {
        if self.len == 0 {
            // shrinking to zero only releases
            let _ = self.buf.resize(0);
        }
    }

    /// Append into room made by [`Arena::reserve_one`]; returns the index.
    pub(crate) fn push(&mut self, record: E) -> usize {
        let index = self.len;
        self.write(index, record);
        self.len += 1;
        index
    }

    pub(crate) fn get(&self, index: usize) -> E {
        assert!(index < self.len, "arena index {index} out of bounds");
        let bytes = &self.buf.as_slice()[Self::span(index)];
        // SAFETY: every slot below `len` holds a record stored by `write`.
        unsafe { bytes.as_ptr().cast::<E>().read_unaligned() }
    }

    pub(crate) fn set(&mut self, index: usize, record: E) {
        assert!(index < self.len, "arena index {index} out of bounds");
        self.write(index, record);
    }

    fn write(&mut self, index: usize, record: E) {
        let bytes = &mut self.buf.as_mut_slice()[Self::span(index)];
        // SAFETY: `bytes` is exactly `size_of::<E>()` bytes of the block.
        unsafe { bytes.as_mut_ptr().cast::<E>().write_unaligned(record) }
    }

    fn span(index: usize) -> Range<usize> {
        let at = index * Self::RECORD;
        at..at + Self::RECORD
    }
}
