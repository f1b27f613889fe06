//! Length-tracked strings.
//!
//! [`Str`] owns its bytes and keeps a NUL right after them, so
//! `as_bytes_with_nul` always works. [`ScopedStr`] is a borrowed view over
//! caller memory that already ends in NUL; it has no release operation, so
//! there is nothing to free by mistake.

use crate::alloc::{Allocator, Heap, RawBuf};
use crate::error::{Error, Result};
use core::ffi::CStr;
use core::fmt;

/// Strings usable as dictionary keys. The key is the bytes including the
/// terminating NUL.
pub trait StrKey {
    fn bytes_with_nul(&self) -> &[u8];
}

/// Owned string in an injected allocator.
pub struct Str<'a, A: ?Sized + Allocator = Heap> {
    // len + 1 bytes, the last one always 0
    buf: RawBuf<'a, A>,
}

impl Str<'static, Heap> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_in(bytes, &Heap)
    }

    pub fn with_len(len: usize) -> Result<Self> {
        Self::with_len_in(len, &Heap)
    }

    pub fn from_fmt(args: fmt::Arguments<'_>) -> Result<Self> {
        Self::from_fmt_in(&Heap, args)
    }
}

impl<'a, A: ?Sized + Allocator> Str<'a, A> {
    /// Zero-filled string of `len` bytes.
    pub fn with_len_in(len: usize, alloc: &'a A) -> Result<Self> {
        if !alloc.is_complete() {
            return Err(Error::IncompleteAllocator);
        }
        let size = len.checked_add(1).ok_or(Error::CapacityOverflow)?;
        Ok(Self {
            buf: RawBuf::zeroed(size, alloc)?,
        })
    }

    pub fn from_bytes_in(bytes: &[u8], alloc: &'a A) -> Result<Self> {
        let mut s = Self::with_len_in(bytes.len(), alloc)?;
        s.as_bytes_mut().copy_from_slice(bytes);
        Ok(s)
    }

    /// Format into an exactly-sized string: one pass measures, the second
    /// writes into the allocation.
    ///
    /// ```
    /// use chained_collections::{alloc::Heap, Str};
    ///
    /// let s = Str::from_fmt_in(&Heap, format_args!("{}-{}", "bucket", 13)).unwrap();
    /// assert_eq!(s.as_bytes(), b"bucket-13");
    /// assert_eq!(s.as_bytes_with_nul(), b"bucket-13\0");
    /// ```
    pub fn from_fmt_in(alloc: &'a A, args: fmt::Arguments<'_>) -> Result<Self> {
        let mut measure = Measure(0);
        fmt::write(&mut measure, args).map_err(|_| Error::Format)?;

        let mut s = Self::with_len_in(measure.0, alloc)?;
        let mut fill = Fill {
            out: s.as_bytes_mut(),
            pos: 0,
        };
        fmt::write(&mut fill, args).map_err(|_| Error::Format)?;
        if fill.pos != measure.0 {
            // Display impls that write differently on each call
            return Err(Error::Format);
        }
        Ok(s)
    }

    /// Copy into a new string on the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_bytes_in(self.as_bytes(), self.allocator())
    }

    /// Copy into a new string on another allocator.
    pub fn clone_in<'b, B: ?Sized + Allocator>(&self, alloc: &'b B) -> Result<Str<'b, B>> {
        Str::from_bytes_in(self.as_bytes(), alloc)
    }

    /// Length in bytes, not counting the NUL.
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        let len = self.len();
        &self.buf.as_slice()[..len]
    }

    /// The contents, excluding the NUL, which stays in place.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.buf.as_mut_slice()[..len]
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn to_str(&self) -> core::result::Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    pub fn as_scoped(&self) -> ScopedStr<'_> {
        ScopedStr {
            bytes: self.as_bytes_with_nul(),
        }
    }

    pub fn allocator(&self) -> &'a A {
        self.buf.allocator()
    }
}

impl<A: ?Sized + Allocator> StrKey for Str<'_, A> {
    fn bytes_with_nul(&self) -> &[u8] {
        self.as_bytes_with_nul()
    }
}

impl<A: ?Sized + Allocator> fmt::Debug for Str<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<A: ?Sized + Allocator> fmt::Display for Str<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl<A: ?Sized + Allocator, B: ?Sized + Allocator> PartialEq<Str<'_, B>> for Str<'_, A> {
    fn eq(&self, other: &Str<'_, B>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: ?Sized + Allocator> Eq for Str<'_, A> {}

impl<A: ?Sized + Allocator> PartialEq<[u8]> for Str<'_, A> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<A: ?Sized + Allocator> PartialEq<str> for Str<'_, A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

/// Borrowed, NUL-terminated view over caller memory.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopedStr<'s> {
    // includes the trailing NUL
    bytes: &'s [u8],
}

impl<'s> ScopedStr<'s> {
    pub fn from_cstr(s: &'s CStr) -> Self {
        Self {
            bytes: s.to_bytes_with_nul(),
        }
    }

    /// `None` unless `bytes` ends in NUL. Interior NULs are allowed and are
    /// part of the string.
    pub fn from_bytes_with_nul(bytes: &'s [u8]) -> Option<Self> {
        match bytes.last() {
            Some(0) => Some(Self { bytes }),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &'s [u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    pub fn as_bytes_with_nul(&self) -> &'s [u8] {
        self.bytes
    }

    pub fn to_str(&self) -> core::result::Result<&'s str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }
}

impl StrKey for ScopedStr<'_> {
    fn bytes_with_nul(&self) -> &[u8] {
        self.bytes
    }
}

impl StrKey for CStr {
    fn bytes_with_nul(&self) -> &[u8] {
        self.to_bytes_with_nul()
    }
}

impl fmt::Debug for ScopedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
    }
}

impl PartialEq<[u8]> for ScopedStr<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

/// Counts the bytes a format would produce.
struct Measure(usize);

impl fmt::Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 = self.0.checked_add(s.len()).ok_or(fmt::Error)?;
        Ok(())
    }
}

/// Writes into a pre-sized buffer, refusing to overrun it.
struct Fill<'b> {
    out: &'b mut [u8],
    pos: usize,
}

impl fmt::Write for Fill<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos.checked_add(s.len()).ok_or(fmt::Error)?;
        let dst = self.out.get_mut(self.pos..end).ok_or(fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}
