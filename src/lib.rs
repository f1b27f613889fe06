//! chained-collections: allocator-parameterized containers for code that
//! cannot lean on a standard runtime: an untyped growable array, a
//! length-tracked string, and a chained hash dictionary over byte keys.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep every owned byte in memory the caller chose, and keep the
//!   dictionary's behavior (prime table sizes, chaining order, stateless
//!   iteration) fully predictable.
//! - Layers:
//!   - `alloc`: the `Allocator` capability (allocate / reallocate /
//!     release) plus `RawBuf`, the owned byte block every container stores
//!     its bytes in. All raw-pointer handling lives here.
//!   - `hash`: FNV-1a, byte equality and prime sizing.
//!   - `Array`, `Str`: resizable buffers on top of `RawBuf`.
//!   - `Dict`: chained dictionary; entries in an allocator-owned arena
//!     linked by index, keys packed into one byte `Array`, chain heads in
//!     a `RawBuf` table.
//!
//! Constraints
//! - Single-threaded: containers hold `&'a A` and raw blocks, so they are
//!   `!Send`/`!Sync`.
//! - The allocator outlives every container built from it; the `'a`
//!   lifetime makes that a compile-time fact.
//! - Failures are values: no panics on allocation failure, and a failed
//!   operation leaves its container exactly as it was.
//!
//! Dictionary invariants
//! - `bucket_count` is prime and at least 2 (`next_prime(hint)`).
//! - Every entry sits in the chain at `hash mod bucket_count`; new entries
//!   are prepended.
//! - Keys are unique under the equality function, which only ever sees
//!   slices of equal length.
//! - After an insert, `len * LOAD_FACTOR >= bucket_count` triggers a resize
//!   to `next_prime(len * LOAD_FACTOR)` buckets.
//!
//! Ownership
//! - Key bytes are copied into the dictionary's allocator at insert.
//! - Values are borrowed (`Option<&'v T>`) and never dropped by the
//!   dictionary; overwriting a key forgets the previous reference.
//! - String-keyed operations use the string bytes plus the terminating NUL
//!   as the key, everywhere.
//!
//! Notes and non-goals
//! - No key removal.
//! - No thread-safety.
//! - Stateless iteration (`Dict::next_key`) re-hashes the previous key on
//!   every step; `Dict::iter` walks with a bucket + chain cursor instead.

pub mod alloc;
mod array;
mod dict;
mod dict_proptest;
mod error;
pub mod hash;
mod string;

// Public surface
pub use array::Array;
pub use dict::{Dict, Iter, Keys, LOAD_FACTOR};
pub use error::{Error, Result};
pub use string::{ScopedStr, Str, StrKey};
