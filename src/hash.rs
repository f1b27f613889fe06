//! Hash and equality capabilities for byte keys, and the prime sizing the
//! dictionary table relies on.

/// Key hashing capability.
pub type HashFn = fn(&[u8]) -> u64;

/// Key equality capability. Only ever called with slices of equal length.
pub type EqFn = fn(&[u8], &[u8]) -> bool;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, 64-bit. The default [`HashFn`].
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Exact byte comparison. The default [`EqFn`].
pub fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// Trial division; table sizes stay small enough for this to be cheap.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime strictly greater than `n`; 2 for `n <= 1`.
pub fn next_prime(n: usize) -> usize {
    if n <= 1 {
        return 2;
    }
    let mut candidate = n + 1;
    while !is_prime(candidate as u64) {
        candidate += 1;
    }
    candidate
}
